//! Human readable sample values.

use std::fmt;

/// What a sample counts, resolved once from the profile type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleUnit {
    Bytes,
    Count,
    Nanoseconds,
}

struct UnitLadder {
    base: &'static str,
    steps: &'static [(f64, &'static str)],
}

const BYTE_UNITS: UnitLadder = UnitLadder {
    base: "B",
    steps: &[
        (1024.0, "KB"),
        (1024.0, "MB"),
        (1024.0, "GB"),
        (1024.0, "TB"),
        (1024.0, "PB"),
        (1024.0, "EB"),
    ],
};

const COUNT_UNITS: UnitLadder = UnitLadder {
    base: "",
    steps: &[
        (1000.0, "K"),
        (1000.0, "M"),
        (1000.0, "G"),
        (1000.0, "T"),
        (1000.0, "P"),
        (1000.0, "E"),
    ],
};

// Applied after converting to seconds.
const SECOND_UNITS: UnitLadder = UnitLadder {
    base: "seconds",
    steps: &[(60.0, "minutes"), (60.0, "hours"), (24.0, "days")],
};

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

impl SampleUnit {
    /// Parses the unit out of a `type:name:unit:period_type:period_unit`
    /// identifier such as `memory:alloc_objects:count::`.
    pub fn from_profile_type_id(id: &str) -> Option<SampleUnit> {
        let fields: Vec<&str> = id.split(':').collect();
        if fields.len() != 5 {
            return None;
        }
        match fields[2] {
            "bytes" => Some(SampleUnit::Bytes),
            "count" => Some(SampleUnit::Count),
            "nanoseconds" => Some(SampleUnit::Nanoseconds),
            _ => None,
        }
    }

    fn percent_title(self) -> &'static str {
        match self {
            SampleUnit::Bytes => "% of total RAM",
            SampleUnit::Count => "% of total objects",
            SampleUnit::Nanoseconds => "% of total time",
        }
    }

    fn unit_title(self) -> &'static str {
        match self {
            SampleUnit::Bytes => "RAM",
            SampleUnit::Count => "Allocated objects",
            SampleUnit::Nanoseconds => "Time",
        }
    }
}

/// Formats a raw sample value in the unit's ladder, e.g. `8.03 GB`.
pub fn format_value(value: f64, unit: SampleUnit) -> String {
    let (value, ladder) = match unit {
        SampleUnit::Bytes => (value, &BYTE_UNITS),
        SampleUnit::Count => (value, &COUNT_UNITS),
        SampleUnit::Nanoseconds => (value / NANOS_PER_SECOND, &SECOND_UNITS),
    };

    let mut value = value;
    let mut suffix = ladder.base;
    for &(divider, step_suffix) in ladder.steps {
        if value < divider {
            break;
        }
        value /= divider;
        suffix = step_suffix;
    }

    let number = format_decimal(value);
    if suffix.is_empty() {
        number
    } else {
        format!("{number} {suffix}")
    }
}

/// Shortest representation, rounded to 2 decimals only when it has more.
fn format_decimal(value: f64) -> String {
    let plain = value.to_string();
    match plain.split_once('.') {
        Some((_, fraction)) if fraction.len() > 2 => format!("{value:.2}"),
        _ => plain,
    }
}

/// Share of the total with 2 decimal places.
pub fn format_percent(value: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (10000.0 * (value as f64 / total as f64)).round() / 100.0
}

/// Groups thousands with commas.
pub fn format_samples(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// What the pointer tooltip shows for one bar.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipData {
    pub name: String,
    pub percent_title: &'static str,
    pub percent_value: f64,
    pub unit_title: &'static str,
    pub unit_value: String,
    pub samples: String,
}

impl TooltipData {
    pub fn new(label: &str, value: u64, total: u64, unit: Option<SampleUnit>) -> Self {
        let (percent_title, unit_title, unit_value) = match unit {
            Some(unit) => (
                unit.percent_title(),
                unit.unit_title(),
                format_value(value as f64, unit),
            ),
            None => ("% of total", "Count", value.to_string()),
        };
        TooltipData {
            name: label.to_string(),
            percent_title,
            percent_value: format_percent(value, total),
            unit_title,
            unit_value,
            samples: format_samples(value),
        }
    }
}

impl fmt::Display for TooltipData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}: {}%", self.percent_title, self.percent_value)?;
        writeln!(f, "{}: {}", self.unit_title, self.unit_value)?;
        write!(f, "Samples: {}", self.samples)
    }
}

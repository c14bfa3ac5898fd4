//! The "top functions" table.
//!
//! Costs are merged by label only: two frames with the same name at
//! different depths or call sites end up in the same row.

use std::collections::HashMap;

use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Row, Table, presets::UTF8_FULL};

use crate::levels::Levels;
use crate::search::fuzzy_match;
use crate::units::{SampleUnit, format_samples, format_value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SymbolTotals {
    pub self_value: u64,
    pub total: u64,
}

/// Sums self and total samples per label across every level.
pub fn aggregate(levels: &Levels) -> HashMap<&str, SymbolTotals> {
    let mut table: HashMap<&str, SymbolTotals> = HashMap::new();
    for frame in levels.frames() {
        let entry = table.entry(frame.label.as_str()).or_default();
        entry.self_value += frame.self_value;
        entry.total += frame.value;
    }
    table
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cost {
    pub value: u64,
    pub formatted: String,
}

impl Cost {
    fn new(value: u64, unit: Option<SampleUnit>) -> Self {
        let formatted = match unit {
            Some(unit) => format_value(value as f64, unit),
            None => format_samples(value),
        };
        Cost { value, formatted }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopTableRow {
    pub symbol: String,
    pub self_cost: Cost,
    pub total: Cost,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopTable {
    rows: Vec<TopTableRow>,
}

impl TopTable {
    /// Rows sorted by self descending, then total descending, then symbol.
    pub fn build(levels: &Levels, unit: Option<SampleUnit>) -> TopTable {
        let mut rows: Vec<TopTableRow> = aggregate(levels)
            .into_iter()
            .map(|(symbol, totals)| TopTableRow {
                symbol: symbol.to_string(),
                self_cost: Cost::new(totals.self_value, unit),
                total: Cost::new(totals.total, unit),
            })
            .collect();
        rows.sort_by(|a, b| {
            b.self_cost
                .value
                .cmp(&a.self_cost.value)
                .then_with(|| b.total.value.cmp(&a.total.value))
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        TopTable { rows }
    }

    pub fn rows(&self) -> &[TopTableRow] {
        &self.rows
    }

    /// Keeps the rows whose symbol matches the search query.
    pub fn filter(&self, query: &str) -> TopTable {
        TopTable {
            rows: self
                .rows
                .iter()
                .filter(|row| fuzzy_match(&row.symbol, query))
                .cloned()
                .collect(),
        }
    }

    /// Renders at most `limit` rows as a text table.
    pub fn render(&self, limit: Option<usize>) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(Row::from(vec![
                Cell::new("Symbol").fg(Color::Cyan),
                Cell::new("Self").fg(Color::Cyan),
                Cell::new("Total").fg(Color::Cyan),
            ]));

        let limit = limit.unwrap_or(self.rows.len());
        for row in self.rows.iter().take(limit) {
            table.add_row(Row::from(vec![
                Cell::new(&row.symbol),
                Cell::new(&row.self_cost.formatted).set_alignment(CellAlignment::Right),
                Cell::new(&row.total.formatted).set_alignment(CellAlignment::Right),
            ]));
        }
        table.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::{ProfileNode, bushy_tree, flatten};

    fn recursive_levels() -> Levels {
        flatten(&ProfileNode::with_children(
            "total",
            0,
            100,
            vec![
                ProfileNode::with_children(
                    "main",
                    10,
                    60,
                    vec![ProfileNode::with_children(
                        "parse",
                        20,
                        50,
                        vec![ProfileNode::leaf("parse", 30)],
                    )],
                ),
                ProfileNode::with_children("worker", 0, 40, vec![ProfileNode::leaf("parse", 40)]),
            ],
        ))
        .unwrap()
    }

    #[test]
    fn test_merges_by_label() {
        let levels = recursive_levels();
        let table = aggregate(&levels);

        assert_eq!(table.len(), 4);
        assert_eq!(
            table["parse"],
            SymbolTotals {
                self_value: 90,
                total: 120
            }
        );
        assert_eq!(
            table["main"],
            SymbolTotals {
                self_value: 10,
                total: 60
            }
        );
    }

    #[test]
    fn test_totals_are_preserved() {
        let levels = flatten(&bushy_tree(11, 6)).unwrap();
        let table = aggregate(&levels);

        let self_sum: u64 = table.values().map(|t| t.self_value).sum();
        let total_sum: u64 = table.values().map(|t| t.total).sum();
        assert_eq!(self_sum, levels.frames().map(|f| f.self_value).sum::<u64>());
        assert_eq!(total_sum, levels.frames().map(|f| f.value).sum::<u64>());
        // Every sample is self time of exactly one frame.
        assert_eq!(self_sum, levels.total());
    }

    #[test]
    fn test_rows_sorted_by_self() {
        let table = TopTable::build(&recursive_levels(), None);
        let symbols: Vec<&str> = table.rows().iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["parse", "main", "total", "worker"]);
        assert_eq!(table.rows()[0].self_cost.formatted, "90");
    }

    #[test]
    fn test_formatted_with_unit() {
        let levels = flatten(&ProfileNode::leaf("alloc", 3 * 1024 * 1024)).unwrap();
        let table = TopTable::build(&levels, Some(SampleUnit::Bytes));
        assert_eq!(table.rows()[0].total.formatted, "3 MB");
        assert_eq!(table.rows()[0].self_cost.value, 3 * 1024 * 1024);
    }

    #[test]
    fn test_filter() {
        let table = TopTable::build(&recursive_levels(), None);
        let filtered = table.filter("PAR");
        assert_eq!(filtered.rows().len(), 1);
        assert_eq!(filtered.rows()[0].symbol, "parse");
        assert_eq!(table.filter("").rows().len(), 4);
    }

    #[test]
    fn test_render() {
        let table = TopTable::build(&recursive_levels(), None);
        let text = table.render(Some(2));
        assert!(text.contains("Symbol"));
        assert!(text.contains("parse"));
        assert!(text.contains("main"));
        assert!(!text.contains("worker"));
    }
}

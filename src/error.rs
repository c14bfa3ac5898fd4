use std::io;

use thiserror::Error;

/// The supplied profile violates the call tree invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlattenError {
    #[error("frame {label:?} has a negative sample count ({count})")]
    NegativeCount { label: String, count: i64 },
    #[error("frame {label:?} has self ({self_value}) greater than total ({value})")]
    SelfExceedsValue {
        label: String,
        self_value: u64,
        value: u64,
    },
    #[error("children of {label:?} sum to {children}, more than its total ({value})")]
    ChildrenExceedParent {
        label: String,
        children: u64,
        value: u64,
    },
    #[error("row {row} jumps from level {from} to level {to}")]
    LevelJump { row: usize, from: usize, to: usize },
    #[error("first row is at level {0}, expected 0")]
    MissingRoot(usize),
    #[error("more than one root frame (row {0})")]
    MultipleRoots(usize),
    #[error("level {level} has {len} values, not a multiple of 4")]
    RaggedLevel { level: usize, len: usize },
    #[error("level {level} references unknown name index {index}")]
    UnknownName { level: usize, index: i64 },
    #[error("root frame starts at offset {0}, expected 0")]
    RootOffset(u64),
    #[error("offsets on level {level} overflow the sample range")]
    OffsetOverflow { level: usize },
}

/// The viewport cannot be mapped to pixels.
#[derive(Debug, Error, PartialEq)]
pub enum ViewportError {
    #[error("degenerate viewport range [{range_min}, {range_max}]")]
    Degenerate { range_min: f64, range_max: f64 },
    #[error("no bar {bar_index} on level {level_index}")]
    NoSuchBar {
        level_index: usize,
        bar_index: usize,
    },
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid profile document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("profile document must contain exactly one of `tree`, `rows` or `flamebearer`")]
    AmbiguousDocument,
    #[error("no valid stack lines found")]
    EmptyStacks,
    #[error("sample count of stack {stack:?} overflows")]
    CountOverflow { stack: String },
    #[error(transparent)]
    Flatten(#[from] FlattenError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

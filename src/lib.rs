//! Flame graph layout and interaction engine.
//!
//! A sampled call tree is flattened into per-depth [`levels::Levels`], laid
//! out as pixel rectangles for a zoomable viewport ([`layout::layout`]),
//! hit-tested back to bars ([`hittest::hit_test`]) and aggregated into a
//! symbol table ([`toptable::aggregate`]). [`session::Session`] ties these
//! together with the viewport and search state of one interactive view.

pub mod collapsed;
pub mod config;
pub mod error;
pub mod flamegraph;
pub mod hittest;
pub mod input;
pub mod layout;
pub mod levels;
pub mod scale;
pub mod search;
pub mod session;
pub mod toptable;
pub mod units;
pub mod viewport;

//! TOML configuration. Every field has a default, so an empty file (or no
//! file at all) gives the stock flame graph.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

/// Pixel constants of the layout engine.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    pub pixels_per_level: f64,
    /// Bars this narrow or narrower merge with adjacent narrow siblings.
    pub collapse_threshold: f64,
    /// Bars narrower than this are not emitted at all.
    pub hide_threshold: f64,
    pub label_threshold: f64,
    pub bar_border_width: f64,
    pub bar_text_padding_left: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            pixels_per_level: 22.0,
            collapse_threshold: 10.0,
            hide_threshold: 0.5,
            label_threshold: 20.0,
            bar_border_width: 0.5,
            bar_text_padding_left: 4.0,
        }
    }
}

/// Settings of the SVG painter used by the command line tool.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    pub width: f64,
    pub font_size: f64,
    pub title: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            width: 1200.0,
            font_size: 13.5,
            title: "Flame Graph".to_string(),
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Config, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Config::default()),
        }
    }
}

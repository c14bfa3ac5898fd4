use std::path::PathBuf;

use clap::{Parser, Subcommand};
use flamelevel::session::BarRef;

/// Lays out, searches and summarises flame graphs
#[derive(Parser)]
#[command(name = "flamelevel")]
#[command(version)]
#[command(about = "Lays out, searches and summarises flame graphs")]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Profile type identifier such as `memory:alloc_space:bytes:space:bytes`
    #[arg(long, global = true)]
    pub profile_type: Option<String>,

    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a flame graph to an SVG file
    Render {
        /// Input profile (JSON document or collapsed stacks)
        input: PathBuf,

        /// Output SVG file path
        #[arg(short, long, default_value = "flamegraph.svg")]
        output: PathBuf,

        /// Width in pixels (overrides the config)
        #[arg(long)]
        width: Option<f64>,

        /// Zoom into a bar, given as LEVEL:BAR
        #[arg(long, value_parser = parse_bar_ref, conflicts_with = "click")]
        zoom: Option<BarRef>,

        /// Zoom into the bar under a pixel position, given as X,Y
        #[arg(long, value_parser = parse_point)]
        click: Option<(f64, f64)>,

        /// Highlight frames matching this search
        #[arg(short, long)]
        query: Option<String>,

        /// Title (overrides the config)
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        subtitle: Option<String>,
    },
    /// Print the symbols with the most self samples
    Top {
        input: PathBuf,

        /// Number of rows to print
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,

        /// Only list symbols matching this search
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Show the bar under a pixel position
    Hit {
        input: PathBuf,

        #[arg(short, long, allow_negative_numbers = true)]
        x: f64,

        #[arg(short, long, allow_negative_numbers = true)]
        y: f64,

        /// Width in pixels (overrides the config)
        #[arg(long)]
        width: Option<f64>,
    },
}

fn parse_bar_ref(s: &str) -> Result<BarRef, String> {
    let (level, bar) = s
        .split_once(':')
        .ok_or_else(|| format!("expected LEVEL:BAR, got {s:?}"))?;
    Ok(BarRef {
        level_index: level.trim().parse().map_err(|e| format!("bad level: {e}"))?,
        bar_index: bar.trim().parse().map_err(|e| format!("bad bar: {e}"))?,
    })
}

fn parse_point(s: &str) -> Result<(f64, f64), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {s:?}"))?;
    Ok((
        x.trim().parse().map_err(|e| format!("bad x: {e}"))?,
        y.trim().parse().map_err(|e| format!("bad y: {e}"))?,
    ))
}

mod cli;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Commands};
use flamelevel::config::Config;
use flamelevel::flamegraph::generate_flamegraph;
use flamelevel::input::load_profile;
use flamelevel::session::Session;
use flamelevel::units::SampleUnit;

fn open_session(input: &Path, profile_type: Option<&str>, config: &Config) -> Result<Session> {
    let profile = load_profile(input).with_context(|| format!("failed to load {}", input.display()))?;
    let unit = match profile_type {
        Some(id) => {
            let unit = SampleUnit::from_profile_type_id(id);
            if unit.is_none() {
                log::warn!("unknown profile type {id:?}, showing raw samples");
            }
            unit
        }
        None => profile.unit(),
    };
    Ok(Session::new(profile.levels, unit, config.layout.clone()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let config = Config::load_or_default(cli.config.as_deref()).context("failed to load config")?;
    let profile_type = cli.profile_type.as_deref();

    match cli.command {
        Commands::Render {
            input,
            output,
            width,
            zoom,
            click,
            query,
            title,
            subtitle,
        } => {
            let mut session = open_session(&input, profile_type, &config)?;
            let mut render_config = config.render.clone();
            if let Some(width) = width {
                render_config.width = width;
            }
            if let Some(title) = title {
                render_config.title = title;
            }

            if let Some(bar) = zoom {
                session.zoom_to(bar).context("cannot zoom")?;
            }
            if let Some((x, y)) = click {
                if session.click(x, y, render_config.width).is_none() {
                    log::warn!("no bar at {x},{y}, rendering the whole graph");
                }
            }
            if let Some(query) = query {
                session.set_query(query);
            }

            let svg = generate_flamegraph(&session, &render_config, subtitle.as_deref());
            fs::write(&output, svg).with_context(|| format!("failed to write {}", output.display()))?;
            println!("wrote {}", output.display());
        }
        Commands::Top { input, limit, query } => {
            let mut session = open_session(&input, profile_type, &config)?;
            if let Some(query) = query {
                session.set_query(query);
            }
            println!("{}", session.top_table().render(Some(limit)));
        }
        Commands::Hit { input, x, y, width } => {
            let session = open_session(&input, profile_type, &config)?;
            let width = width.unwrap_or(config.render.width);
            match (session.hit_test(x, y, width), session.tooltip(x, y, width)) {
                (Some(bar), Some(tooltip)) => {
                    println!("level {} bar {}", bar.level_index, bar.bar_index);
                    println!("{tooltip}");
                }
                _ => println!("no bar at {x},{y}"),
            }
        }
    }

    Ok(())
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line host that generates a Tank Arena and plans a tank route
//! across it.

mod config;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;
use tank_arena_core::{CellCoord, ObstacleOverlay, OverlayHost, TileLayout, WorldType};
use tank_arena_system_pathfinding::Pathfinder;
use tank_arena_world::{
    query, GenerationPacing, GenerationProgress, PatternPreset, Terrain, TerrainEvent,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{ArenaConfig, PatternSource};

const DEFAULT_LOG_FILTER: &str = "info";

/// Generates a Tank Arena maze and optionally plans a route across it.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file with arena settings. Flags override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of tile columns.
    #[arg(long)]
    columns: Option<u32>,

    /// Number of tile rows.
    #[arg(long)]
    rows: Option<u32>,

    /// Generation algorithm, e.g. `prim` or `radial-prim`.
    #[arg(short, long)]
    world_type: Option<WorldType>,

    /// Seed pattern preset.
    #[arg(short, long)]
    pattern: Option<PatternPreset>,

    /// Random seed.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Multiplier for the per-tick generation budget.
    #[arg(long)]
    rate: Option<u32>,

    /// Extra obstacle cell as `column,row`. May be repeated.
    #[arg(long = "obstacle", value_parser = parse_cell)]
    obstacles: Vec<CellCoord>,

    /// Route start as `column,row`. Defaults to the carve's start room.
    #[arg(long, value_parser = parse_cell)]
    from: Option<CellCoord>,

    /// Route target as `column,row`.
    #[arg(long, value_parser = parse_cell)]
    to: Option<CellCoord>,

    /// Log filter directive. Falls back to `RUST_LOG`, then `info`.
    #[arg(long)]
    log: Option<String>,
}

impl Args {
    /// Applies flag values on top of the file configuration.
    fn apply(&self, config: &mut ArenaConfig) {
        if let Some(columns) = self.columns {
            config.columns = columns;
        }
        if let Some(rows) = self.rows {
            config.rows = rows;
        }
        if let Some(world_type) = self.world_type {
            config.world_type = world_type;
        }
        if let Some(preset) = self.pattern {
            config.pattern = PatternSource::Preset(preset);
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(rate) = self.rate {
            config.generation_rate = rate;
        }
        config.obstacles.extend(
            self.obstacles
                .iter()
                .map(|cell| [cell.column(), cell.row()]),
        );
    }
}

fn parse_cell(value: &str) -> Result<CellCoord, String> {
    let (column, row) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `column,row`, got `{value}`"))?;
    let column = column
        .trim()
        .parse()
        .map_err(|error| format!("invalid column in `{value}`: {error}"))?;
    let row = row
        .trim()
        .parse()
        .map_err(|error| format!("invalid row in `{value}`: {error}"))?;
    Ok(CellCoord::new(column, row))
}

fn init_tracing(directive: Option<&str>) {
    let filter = match directive {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Entry point for the Tank Arena command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log.as_deref());

    let mut config = match &args.config {
        Some(path) => ArenaConfig::load(path)?,
        None => ArenaConfig::default(),
    };
    args.apply(&mut config);
    config.validate().context("invalid arena settings")?;
    info!(
        columns = config.columns,
        rows = config.rows,
        world_type = %config.world_type,
        pattern = %config.pattern.describe(),
        seed = ?config.seed,
        "building arena"
    );

    let mut terrain = Terrain::new();
    let mut events = Vec::new();
    terrain
        .init_world(&config.terrain_config(), &mut events)
        .context("failed to initialize terrain")?;
    terrain
        .generate_world(None)
        .context("failed to start terrain generation")?;

    let budget = GenerationPacing::new(config.generation_rate).steps_per_tick(config.columns);
    let mut ticks = 1_usize;
    while terrain
        .step_generation(budget, &mut events)
        .context("terrain generation failed")?
        == GenerationProgress::InProgress
    {
        ticks += 1;
    }
    let opened = events
        .iter()
        .filter(|event| matches!(event, TerrainEvent::WallOpened { .. }))
        .count();
    info!(ticks, budget, opened, "arena ready");

    let layout = TileLayout::new(config.columns, config.rows, config.tile_size, config.tile_size);
    let mut overlay = ObstacleOverlay::new(config.columns, config.rows);
    for cell in config.obstacle_cells() {
        overlay.occupy(cell);
    }
    let view = query::terrain_view(&terrain);

    let mut route = Vec::new();
    if let Some(target) = args.to {
        let from = args
            .from
            .or_else(|| query::start_room(&terrain))
            .context("no route start: pass --from for world types without a start room")?;
        let host = OverlayHost::new(&layout, &overlay);
        let waypoints: Option<Vec<Vec3>> =
            Pathfinder::new().find_path(&view, &host, layout.cell_position(from), target);
        match waypoints {
            Some(waypoints) => {
                route = waypoints
                    .iter()
                    .filter_map(|waypoint| layout.cell_under(*waypoint))
                    .collect();
                info!(%from, %target, steps = route.len().saturating_sub(1), "route planned");
                for waypoint in &waypoints {
                    println!("waypoint {waypoint}");
                }
            }
            None => warn!(%from, %target, "no route between cells"),
        }
    }

    print!("{}", render::render_map(&view, &overlay, &route));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_parse_from_column_row_pairs() {
        assert_eq!(parse_cell("3,4"), Ok(CellCoord::new(3, 4)));
        assert_eq!(parse_cell(" 10 , 0 "), Ok(CellCoord::new(10, 0)));
        assert!(parse_cell("3").is_err());
        assert!(parse_cell("-1,2").is_err());
    }

    #[test]
    fn flags_override_file_values() {
        let args = Args::parse_from([
            "tank-arena",
            "--columns",
            "9",
            "--world-type",
            "symmetric-prim",
            "--pattern",
            "maze2",
            "--obstacle",
            "1,2",
        ]);
        let mut config = ArenaConfig::default();
        config.seed = Some(5);

        args.apply(&mut config);

        assert_eq!(config.columns, 9);
        assert_eq!(config.rows, ArenaConfig::default().rows);
        assert_eq!(config.world_type, WorldType::SymmetricPrim);
        assert_eq!(config.pattern, PatternSource::Preset(PatternPreset::Maze2));
        assert_eq!(config.seed, Some(5));
        assert_eq!(config.obstacles, vec![[1, 2]]);
    }
}

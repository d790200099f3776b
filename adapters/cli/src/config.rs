use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tank_arena_core::{CellCoord, WorldType};
use tank_arena_world::{PatternPreset, SeedPattern, TerrainConfig, TerrainThresholds};

const DEFAULT_COLUMNS: u32 = 21;
const DEFAULT_ROWS: u32 = 21;
const DEFAULT_TILE_SIZE: f32 = 1.0;
const DEFAULT_GENERATION_RATE: u32 = 2;

/// Seed pattern named by preset or spelled out row by row.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub(crate) enum PatternSource {
    /// One of the bundled presets.
    Preset(PatternPreset),
    /// Custom rows, authored top to bottom.
    Custom(SeedPattern),
}

impl Default for PatternSource {
    fn default() -> Self {
        Self::Preset(PatternPreset::default())
    }
}

impl PatternSource {
    /// Builds the pattern the terrain will stamp.
    #[must_use]
    pub(crate) fn resolve(&self) -> SeedPattern {
        match self {
            Self::Preset(preset) => preset.pattern(),
            Self::Custom(pattern) => pattern.clone(),
        }
    }

    /// Short description for log output.
    #[must_use]
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Preset(preset) => preset.to_string(),
            Self::Custom(pattern) => format!("custom {}x{}", pattern.columns(), pattern.rows()),
        }
    }
}

/// Arena settings read from a TOML file. Every field is optional.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ArenaConfig {
    /// Number of tile columns.
    pub(crate) columns: u32,
    /// Number of tile rows.
    pub(crate) rows: u32,
    /// Generation algorithm.
    pub(crate) world_type: WorldType,
    /// Seed pattern stamped before carving.
    pub(crate) pattern: PatternSource,
    /// Random seed. Omit for a different arena on every run.
    pub(crate) seed: Option<u64>,
    /// Edge length of a tile in world units.
    pub(crate) tile_size: f32,
    /// Multiplier for the per-tick generation budget.
    pub(crate) generation_rate: u32,
    /// Cells occupied by dynamic obstacles, as `[column, row]` pairs.
    pub(crate) obstacles: Vec<[u32; 2]>,
    /// Stamping thresholds.
    pub(crate) thresholds: TerrainThresholds,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
            world_type: WorldType::default(),
            pattern: PatternSource::default(),
            seed: None,
            tile_size: DEFAULT_TILE_SIZE,
            generation_rate: DEFAULT_GENERATION_RATE,
            obstacles: Vec::new(),
            thresholds: TerrainThresholds::default(),
        }
    }
}

impl ArenaConfig {
    /// Reads and validates a configuration file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read arena config at {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("invalid arena config at {}", path.display()))
    }

    /// Parses and validates configuration contents.
    pub(crate) fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).context("failed to parse arena config toml contents")?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the terrain or layout cannot use.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.columns == 0 || self.rows == 0 {
            bail!(
                "arena must be at least 1x1, got {}x{}",
                self.columns,
                self.rows
            );
        }
        if !self.tile_size.is_finite() || self.tile_size <= 0.0 {
            bail!("tile size must be a positive number, got {}", self.tile_size);
        }
        if let Some(cell) = self
            .obstacle_cells()
            .find(|cell| cell.column() >= self.columns || cell.row() >= self.rows)
        {
            bail!(
                "obstacle {cell} lies outside the {}x{} arena",
                self.columns,
                self.rows
            );
        }
        Ok(())
    }

    /// Obstacle cells in file order.
    pub(crate) fn obstacle_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.obstacles
            .iter()
            .map(|[column, row]| CellCoord::new(*column, *row))
    }

    /// Terrain parameters derived from the arena settings.
    #[must_use]
    pub(crate) fn terrain_config(&self) -> TerrainConfig {
        let config = TerrainConfig::new(
            self.columns,
            self.rows,
            self.world_type,
            self.pattern.resolve(),
        )
        .with_thresholds(self.thresholds);
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tank_arena_core::TileKind;

    #[test]
    fn empty_file_uses_defaults() {
        let config = ArenaConfig::from_toml_str("").expect("empty config is valid");

        assert_eq!(config, ArenaConfig::default());
    }

    #[test]
    fn preset_names_and_world_types_parse() {
        let config = ArenaConfig::from_toml_str(
            r#"
columns = 15
rows = 11
world_type = "radial_prim"
pattern = "cavern2"
seed = 42
obstacles = [[3, 4], [5, 6]]

[thresholds]
seal_border_above = 12
"#,
        )
        .expect("config is valid");

        assert_eq!(config.world_type, WorldType::RadialPrim);
        assert_eq!(config.pattern, PatternSource::Preset(PatternPreset::Cavern2));
        assert_eq!(config.thresholds.seal_border_above, 12);
        assert_eq!(config.thresholds.collapse_wall_variants_above, 5);
        assert_eq!(
            config.obstacle_cells().collect::<Vec<_>>(),
            vec![CellCoord::new(3, 4), CellCoord::new(5, 6)]
        );

        let terrain = config.terrain_config();
        assert_eq!(terrain.seed, Some(42));
        assert_eq!((terrain.columns, terrain.rows), (15, 11));
    }

    #[test]
    fn custom_patterns_parse_row_by_row() {
        let config = ArenaConfig::from_toml_str(
            r#"
pattern = [
    [{ kind = "Wall" }, { kind = "Room" }],
    [{ kind = "Pillar" }, { kind = "Wall", parent = [-1, 0] }],
]
"#,
        )
        .expect("config is valid");

        let PatternSource::Custom(pattern) = &config.pattern else {
            panic!("expected a custom pattern, got {:?}", config.pattern);
        };
        assert_eq!((pattern.columns(), pattern.rows()), (2, 2));
        let seed = pattern.cell_for(CellCoord::new(1, 0));
        assert_eq!(seed.kind, TileKind::Wall);
        assert_eq!(seed.parent_offset(), Some((-1, 0)));
        assert_eq!(config.pattern.describe(), "custom 2x2");
    }

    #[test]
    fn ragged_custom_patterns_are_rejected() {
        let result = ArenaConfig::from_toml_str(
            r#"
pattern = [
    [{ kind = "Wall" }, { kind = "Room" }],
    [{ kind = "Pillar" }],
]
"#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn invalid_settings_are_rejected() {
        assert!(ArenaConfig::from_toml_str("columns = 0").is_err());
        assert!(ArenaConfig::from_toml_str("tile_size = -2.0").is_err());
        assert!(ArenaConfig::from_toml_str("obstacles = [[30, 1]]").is_err());
        assert!(ArenaConfig::from_toml_str("world_type = \"hexagonal\"").is_err());
        assert!(ArenaConfig::from_toml_str("colour = \"red\"").is_err());
    }
}

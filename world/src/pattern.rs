//! Seed patterns stamped across the terrain before carving.

use std::{fmt, str::FromStr};

use serde::Deserialize;
use tank_arena_core::{CellCoord, TileKind};
use thiserror::Error;

/// Static data for a single cell of a seed pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct SeedCell {
    /// Tile kind stamped onto every grid cell that maps to this pattern cell.
    pub kind: TileKind,
    /// Offset from the grid cell to its group parent. `(0, 0)` means no parent.
    #[serde(default)]
    pub parent: (i32, i32),
}

impl SeedCell {
    /// Creates an ungrouped pattern cell.
    #[must_use]
    pub const fn new(kind: TileKind) -> Self {
        Self {
            kind,
            parent: (0, 0),
        }
    }

    /// Creates a pattern cell grouped with the cell at the provided offset.
    #[must_use]
    pub const fn child_of(kind: TileKind, dx: i32, dy: i32) -> Self {
        Self {
            kind,
            parent: (dx, dy),
        }
    }

    /// Parent offset, if the cell is grouped with a neighbour.
    #[must_use]
    pub const fn parent_offset(&self) -> Option<(i32, i32)> {
        match self.parent {
            (0, 0) => None,
            offset => Some(offset),
        }
    }
}

/// Reasons a seed pattern is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PatternError {
    /// The pattern has no rows or its first row has no cells.
    #[error("seed pattern must contain at least one cell")]
    Empty,
    /// A row's length differs from the first row's.
    #[error("seed pattern row {row} has {found} cells, expected {expected}")]
    Ragged {
        /// Index of the offending row as authored.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
}

/// Small repeating template tiled across the whole grid.
///
/// Rows are authored top to bottom the way they read on screen, while grid
/// rows grow northward, so lookups flip the row axis: grid row zero reads the
/// last authored row.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<Vec<SeedCell>>")]
pub struct SeedPattern {
    rows: Vec<Vec<SeedCell>>,
}

impl SeedPattern {
    /// Builds a pattern from authored rows, rejecting empty or ragged input.
    pub fn new(rows: Vec<Vec<SeedCell>>) -> Result<Self, PatternError> {
        let expected = rows.first().map_or(0, Vec::len);
        if expected == 0 {
            return Err(PatternError::Empty);
        }
        if let Some((row, cells)) = rows
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != expected)
        {
            return Err(PatternError::Ragged {
                row,
                expected,
                found: cells.len(),
            });
        }
        Ok(Self { rows })
    }

    /// Number of pattern columns.
    #[must_use]
    pub fn columns(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Number of pattern rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    /// Pattern cell that governs the provided grid cell.
    #[must_use]
    pub fn cell_for(&self, cell: CellCoord) -> SeedCell {
        let rows = self.rows();
        let columns = self.columns();
        let row = (rows - 1) - (cell.row() as usize % rows);
        let column = cell.column() as usize % columns;
        self.rows[row][column]
    }
}

impl TryFrom<Vec<Vec<SeedCell>>> for SeedPattern {
    type Error = PatternError;

    fn try_from(rows: Vec<Vec<SeedCell>>) -> Result<Self, Self::Error> {
        Self::new(rows)
    }
}

/// Seed patterns shipped with the game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternPreset {
    /// Single-cell rooms and walls on a 2x2 lattice.
    #[default]
    Maze1,
    /// Single-cell rooms joined by two-cell walls on a 3x3 lattice.
    Maze2,
    /// Irregular wall groups that carve into open caverns.
    Cavern1,
    /// Diagonal bands of grouped walls on a 5x5 lattice.
    Cavern2,
    /// Rooms ringed by walls and corner pillars.
    Experiment,
}

impl PatternPreset {
    /// Every preset, in declaration order.
    pub const ALL: [PatternPreset; 5] = [
        PatternPreset::Maze1,
        PatternPreset::Maze2,
        PatternPreset::Cavern1,
        PatternPreset::Cavern2,
        PatternPreset::Experiment,
    ];

    /// Stable lowercase name used by configuration files and the CLI.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Maze1 => "maze1",
            Self::Maze2 => "maze2",
            Self::Cavern1 => "cavern1",
            Self::Cavern2 => "cavern2",
            Self::Experiment => "experiment",
        }
    }

    /// Builds the preset's pattern.
    #[must_use]
    pub fn pattern(self) -> SeedPattern {
        use TileKind::{Pillar, Room, Wall, WallA, WallB};

        let cell = SeedCell::new;
        let child = SeedCell::child_of;
        let rows = match self {
            Self::Maze1 => vec![
                vec![cell(WallA), cell(Room)],
                vec![cell(Pillar), cell(WallB)],
            ],
            Self::Maze2 => vec![
                vec![child(WallA, 0, -1), cell(Pillar), cell(Pillar)],
                vec![cell(WallA), cell(Pillar), cell(Pillar)],
                vec![cell(Room), cell(WallB), child(WallB, -1, 0)],
            ],
            Self::Cavern1 => vec![
                vec![cell(Room), cell(WallB), child(WallB, -1, 0)],
                vec![cell(WallA), child(WallA, -1, 0), child(WallB, -1, 1)],
                vec![child(WallA, 0, 1), child(WallB, 0, -1), child(WallA, 1, 0)],
            ],
            Self::Cavern2 => vec![
                vec![
                    cell(WallA),
                    child(WallB, 1, 0),
                    cell(WallB),
                    child(WallA, 0, 1),
                    cell(Room),
                ],
                vec![
                    child(WallA, 0, 1),
                    cell(Room),
                    cell(WallA),
                    child(WallB, 1, 0),
                    cell(WallB),
                ],
                vec![
                    child(WallB, 1, 0),
                    cell(WallB),
                    child(WallA, 0, 1),
                    cell(Room),
                    cell(WallA),
                ],
                vec![
                    cell(Room),
                    cell(WallA),
                    child(WallB, 1, 0),
                    cell(WallB),
                    child(WallA, 0, 1),
                ],
                vec![
                    cell(WallB),
                    child(WallA, 0, 1),
                    cell(Room),
                    cell(WallA),
                    child(WallB, 1, 0),
                ],
            ],
            Self::Experiment => vec![
                vec![cell(Pillar), cell(Wall), cell(Pillar)],
                vec![cell(Wall), cell(Room), cell(Wall)],
                vec![cell(Pillar), cell(Wall), cell(Pillar)],
            ],
        };

        Self::build(rows)
    }

    fn build(rows: Vec<Vec<SeedCell>>) -> SeedPattern {
        // Presets are rectangular and non-empty.
        SeedPattern { rows }
    }
}

impl fmt::Display for PatternPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PatternPreset {
    type Err = UnknownPreset;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|preset| preset.name() == normalized)
            .ok_or_else(|| UnknownPreset(value.to_owned()))
    }
}

/// Error returned when parsing an unrecognised preset name.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown seed pattern preset `{0}`")]
pub struct UnknownPreset(pub String);

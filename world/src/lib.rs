#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative terrain state for Tank Arena.
//!
//! A [`Terrain`] is initialized from a [`TerrainConfig`], which stamps a seed
//! pattern across the grid and groups tiles together. Generation then runs
//! incrementally through [`Terrain::step_generation`] so hosts can spread the
//! carve over several frames. Everything adapters may read lives in
//! [`query`].

mod carve;
mod pattern;
mod tiles;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use tank_arena_core::{CellCoord, TileKind, WorldType};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    carve::{CarveOrder, CarveStep, Carver},
    tiles::{TileGrid, TileId},
};

pub use pattern::{PatternError, PatternPreset, SeedCell, SeedPattern, UnknownPreset};
pub use tiles::GroupingError;

/// Fraction of each axis excluded on both sides when choosing the start room
/// of a mirrored carve.
const MIRRORED_START_BIAS_PERCENT: u64 = 45;
/// Random draws spent looking for a centred start room before settling for any.
const MIRRORED_START_ATTEMPTS: usize = 100;
/// Default multiplier applied to the per-tick generation budget.
const DEFAULT_GENERATION_RATE: u32 = 2;

/// Grid size thresholds that change how seed patterns are stamped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TerrainThresholds {
    /// Border tiles become pillars once both dimensions exceed this value.
    pub seal_border_above: u32,
    /// Authoring wall variants collapse into plain walls once the column
    /// count exceeds this value.
    pub collapse_wall_variants_above: u32,
}

impl Default for TerrainThresholds {
    fn default() -> Self {
        Self {
            seal_border_above: 10,
            collapse_wall_variants_above: 5,
        }
    }
}

/// Parameters for [`Terrain::init_world`].
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainConfig {
    /// Number of tile columns.
    pub columns: u32,
    /// Number of tile rows.
    pub rows: u32,
    /// Algorithm used to build the terrain.
    pub world_type: WorldType,
    /// Template stamped across the grid by Prim-family world types.
    pub pattern: SeedPattern,
    /// Seed for the terrain's random source. `None` keeps the current source.
    pub seed: Option<u64>,
    /// Size thresholds applied while stamping.
    pub thresholds: TerrainThresholds,
}

impl TerrainConfig {
    /// Creates a configuration with default thresholds and no explicit seed.
    #[must_use]
    pub fn new(columns: u32, rows: u32, world_type: WorldType, pattern: SeedPattern) -> Self {
        Self {
            columns,
            rows,
            world_type,
            pattern,
            seed: None,
            thresholds: TerrainThresholds::default(),
        }
    }

    /// Seeds the terrain's random source during initialization.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Overrides the stamping thresholds.
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: TerrainThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }
}

/// Errors reported by terrain operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TerrainError {
    /// One of the grid dimensions was zero.
    #[error("terrain dimensions must be at least 1x1, got {columns}x{rows}")]
    InvalidDimensions {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },
    /// The seed pattern could not be used.
    #[error("invalid seed pattern: {0}")]
    InvalidPattern(#[from] PatternError),
    /// The seed pattern's parent offsets produced an invalid grouping.
    #[error("invalid tile grouping: {0}")]
    Grouping(#[from] GroupingError),
    /// The operation needs an initialized terrain.
    #[error("terrain has not been initialized")]
    NotInitialized,
    /// Stepping was requested before generation started.
    #[error("terrain generation has not been started")]
    GenerationNotStarted,
    /// Generation already ran on the current layout.
    #[error("terrain generation already started; initialize again to regenerate")]
    GenerationAlreadyStarted,
    /// A Prim-family world type found no room to start carving from.
    #[error("world type {0} needs at least one room in the seed pattern")]
    NoRooms(WorldType),
    /// The world type cannot be used for the requested operation.
    #[error("world type {world_type} is not supported by {operation}")]
    UnsupportedWorldType {
        /// Offending world type.
        world_type: WorldType,
        /// Operation that rejected it.
        operation: &'static str,
    },
}

/// Notifications emitted while the terrain changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TerrainEvent {
    /// The grid was rebuilt from a configuration.
    Initialized {
        /// Number of tile columns.
        columns: u32,
        /// Number of tile rows.
        rows: u32,
        /// Number of room groups available to the carver.
        rooms: usize,
    },
    /// A wall group was opened. Carries the group's root cell.
    WallOpened {
        /// Root cell of the opened group.
        wall: CellCoord,
    },
    /// Generation finished.
    Generated {
        /// World type that produced the terrain.
        world_type: WorldType,
        /// Number of wall groups opened by the carve.
        opened_walls: usize,
    },
}

/// Outcome of a bounded generation step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationProgress {
    /// Work remains.
    InProgress,
    /// The terrain is fully generated.
    Done,
}

/// Spreads generation across host ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GenerationPacing {
    /// Multiplier applied to the per-tick step budget.
    pub rate: u32,
}

impl Default for GenerationPacing {
    fn default() -> Self {
        Self {
            rate: DEFAULT_GENERATION_RATE,
        }
    }
}

impl GenerationPacing {
    /// Creates a pacing with the provided rate.
    #[must_use]
    pub const fn new(rate: u32) -> Self {
        Self { rate }
    }

    /// Steps to run per tick on a grid with `columns` columns: the rate times
    /// two plus one step per sixteen columns, and never less than one.
    #[must_use]
    pub fn steps_per_tick(&self, columns: u32) -> usize {
        let budget = f64::from(self.rate) * (2.0 + f64::from(columns) / 16.0);
        (budget.floor() as usize).max(1)
    }
}

#[derive(Clone, Debug)]
enum Generation {
    /// Nothing to carve; the next step finishes.
    Settle,
    /// Assign random kinds row by row.
    Scatter { next_row: u32 },
    /// Carve the maze.
    Carve(Carver),
}

#[derive(Clone, Debug)]
enum Phase {
    Uninitialized,
    Initialized,
    Generating(Generation),
    Generated { opened_walls: usize },
}

/// Terrain grid plus the generator that shapes it.
#[derive(Debug)]
pub struct Terrain {
    world_type: WorldType,
    grid: TileGrid,
    rooms: Vec<TileId>,
    start_room: Option<TileId>,
    rng: ChaCha8Rng,
    phase: Phase,
}

impl Default for Terrain {
    fn default() -> Self {
        Self::new()
    }
}

impl Terrain {
    /// Creates an empty, uninitialized terrain with an entropy-seeded source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            world_type: WorldType::default(),
            grid: TileGrid::default(),
            rooms: Vec::new(),
            start_room: None,
            rng: ChaCha8Rng::seed_from_u64(rand::random()),
            phase: Phase::Uninitialized,
        }
    }

    /// Rebuilds the grid from `config`.
    ///
    /// Any previous grid and generation progress is discarded. On error the
    /// terrain is left untouched.
    pub fn init_world(
        &mut self,
        config: &TerrainConfig,
        out_events: &mut Vec<TerrainEvent>,
    ) -> Result<(), TerrainError> {
        let TerrainConfig {
            columns,
            rows,
            world_type,
            ref pattern,
            seed,
            thresholds,
        } = *config;
        if columns == 0 || rows == 0 {
            return Err(TerrainError::InvalidDimensions { columns, rows });
        }

        let grid = match world_type {
            WorldType::Empty => TileGrid::new(columns, rows, TileKind::Room),
            WorldType::Random => {
                let mut grid = TileGrid::new(columns, rows, TileKind::Undefined);
                seal_border(&mut grid);
                grid
            }
            _ => stamp(columns, rows, pattern, thresholds)?,
        };
        let rooms: Vec<TileId> = grid
            .ids()
            .filter(|id| grid.parent(*id).is_none() && grid.kind(*id) == TileKind::Room)
            .collect();

        if let Some(seed) = seed {
            self.rng = ChaCha8Rng::seed_from_u64(seed);
        }
        self.world_type = world_type;
        self.grid = grid;
        self.rooms = rooms;
        self.start_room = None;
        self.phase = Phase::Initialized;

        info!(
            columns,
            rows,
            world_type = %world_type,
            rooms = self.rooms.len(),
            "terrain initialized"
        );
        out_events.push(TerrainEvent::Initialized {
            columns,
            rows,
            rooms: self.rooms.len(),
        });
        Ok(())
    }

    /// Starts generating the initialized grid.
    ///
    /// Passing a seed reseeds the random source first. Generation advances
    /// through [`Terrain::step_generation`] or [`Terrain::run_generation`].
    pub fn generate_world(&mut self, seed: Option<u64>) -> Result<(), TerrainError> {
        match self.phase {
            Phase::Uninitialized => return Err(TerrainError::NotInitialized),
            Phase::Generating(_) | Phase::Generated { .. } => {
                return Err(TerrainError::GenerationAlreadyStarted)
            }
            Phase::Initialized => {}
        }
        if let Some(seed) = seed {
            self.rng = ChaCha8Rng::seed_from_u64(seed);
        }

        let generation = match self.world_type {
            WorldType::Empty => Generation::Settle,
            WorldType::Random => Generation::Scatter { next_row: 0 },
            world_type => {
                let order = CarveOrder::for_world_type(world_type).ok_or(
                    TerrainError::UnsupportedWorldType {
                        world_type,
                        operation: "generate_world",
                    },
                )?;
                let start_room = self.pick_start_room()?;
                self.start_room = Some(start_room);
                debug!(
                    start = %self.grid.cell(start_room),
                    world_type = %world_type,
                    "carving from start room"
                );
                Generation::Carve(Carver::new(&self.grid, order, start_room))
            }
        };
        self.phase = Phase::Generating(generation);
        Ok(())
    }

    /// Runs at most `max_steps` generation steps. A budget of zero still runs
    /// one step.
    pub fn step_generation(
        &mut self,
        max_steps: usize,
        out_events: &mut Vec<TerrainEvent>,
    ) -> Result<GenerationProgress, TerrainError> {
        let generation = match &mut self.phase {
            Phase::Uninitialized => return Err(TerrainError::NotInitialized),
            Phase::Initialized => return Err(TerrainError::GenerationNotStarted),
            Phase::Generated { .. } => return Ok(GenerationProgress::Done),
            Phase::Generating(generation) => generation,
        };

        let mut finished = None;
        for _ in 0..max_steps.max(1) {
            match generation {
                Generation::Settle => {
                    finished = Some(0);
                }
                Generation::Scatter { next_row } => {
                    scatter_row(&mut self.grid, *next_row, &mut self.rng);
                    *next_row += 1;
                    if *next_row >= self.grid.dimensions().1 {
                        finished = Some(0);
                    }
                }
                Generation::Carve(carver) => {
                    if carver.step(&mut self.grid, &mut self.rng, out_events)
                        == CarveStep::Exhausted
                    {
                        finished = Some(carver.opened_walls());
                    }
                }
            }
            if finished.is_some() {
                break;
            }
        }

        let Some(opened_walls) = finished else {
            return Ok(GenerationProgress::InProgress);
        };
        self.phase = Phase::Generated { opened_walls };
        info!(
            world_type = %self.world_type,
            opened_walls,
            "terrain generated"
        );
        out_events.push(TerrainEvent::Generated {
            world_type: self.world_type,
            opened_walls,
        });
        Ok(GenerationProgress::Done)
    }

    /// Steps generation until it completes.
    pub fn run_generation(&mut self, out_events: &mut Vec<TerrainEvent>) -> Result<(), TerrainError> {
        while self.step_generation(usize::MAX, out_events)? == GenerationProgress::InProgress {}
        Ok(())
    }

    /// Changes how the remaining walls of a running carve are picked.
    ///
    /// Only Prim-family types are accepted, and only while carving.
    pub fn switch_world_type(&mut self, world_type: WorldType) -> Result<(), TerrainError> {
        let carver = match &mut self.phase {
            Phase::Uninitialized => return Err(TerrainError::NotInitialized),
            Phase::Initialized => return Err(TerrainError::GenerationNotStarted),
            Phase::Generating(Generation::Carve(carver)) => carver,
            Phase::Generating(_) | Phase::Generated { .. } => {
                return Err(TerrainError::UnsupportedWorldType {
                    world_type,
                    operation: "switch_world_type",
                })
            }
        };
        let order =
            CarveOrder::for_world_type(world_type).ok_or(TerrainError::UnsupportedWorldType {
                world_type,
                operation: "switch_world_type",
            })?;
        carver.set_order(order);
        debug!(from = %self.world_type, to = %world_type, "world type switched");
        self.world_type = world_type;
        Ok(())
    }

    fn pick_start_room(&mut self) -> Result<TileId, TerrainError> {
        if self.rooms.is_empty() {
            return Err(TerrainError::NoRooms(self.world_type));
        }
        let mirrored = matches!(
            self.world_type,
            WorldType::SymmetricPrim | WorldType::RadialPrim
        );
        if mirrored {
            let (columns, rows) = self.grid.dimensions();
            let column_bias = start_bias(columns);
            let row_bias = start_bias(rows);
            for _ in 0..MIRRORED_START_ATTEMPTS {
                let room = self.rooms[self.rng.gen_range(0..self.rooms.len())];
                let cell = self.grid.cell(room);
                let centred_column = cell.column() >= column_bias
                    && cell.column() <= columns.saturating_sub(column_bias);
                let centred_row =
                    cell.row() >= row_bias && cell.row() <= rows.saturating_sub(row_bias);
                if centred_column && centred_row {
                    return Ok(room);
                }
            }
        }
        Ok(self.rooms[self.rng.gen_range(0..self.rooms.len())])
    }
}

fn start_bias(extent: u32) -> u32 {
    (u64::from(extent) * MIRRORED_START_BIAS_PERCENT / 100) as u32
}

/// Stamps the seed pattern and resolves tile groups.
fn stamp(
    columns: u32,
    rows: u32,
    pattern: &SeedPattern,
    thresholds: TerrainThresholds,
) -> Result<TileGrid, TerrainError> {
    let mut grid = TileGrid::new(columns, rows, TileKind::Undefined);
    let collapse = columns > thresholds.collapse_wall_variants_above;
    let seal = columns > thresholds.seal_border_above && rows > thresholds.seal_border_above;
    let mut pending: Vec<Option<TileId>> = vec![None; grid.len()];
    let mut sealed = vec![false; grid.len()];

    for id in grid.ids().collect::<Vec<_>>() {
        let cell = grid.cell(id);
        let seed = pattern.cell_for(cell);
        let kind = if seal && on_border(cell, columns, rows) {
            sealed[id.index()] = true;
            TileKind::Pillar
        } else if collapse {
            seed.kind.collapse_wall_variant()
        } else {
            seed.kind
        };
        grid.set_kind(id, kind);

        pending[id.index()] = seed
            .parent_offset()
            .and_then(|(dx, dy)| cell.offset(dx, dy))
            .and_then(|parent| grid.id(parent));
    }

    for id in grid.ids().collect::<Vec<_>>() {
        if sealed[id.index()] {
            continue;
        }
        let Some(first) = pending[id.index()] else {
            continue;
        };
        if let Some(root) = resolve_root(&grid, &pending, &sealed, id, first)? {
            grid.link_parent(id, root)?;
        }
    }
    Ok(grid)
}

/// Follows parent offsets from `origin` until a tile without a parent offset
/// is reached. Chains that touch a sealed tile leave `origin` ungrouped.
fn resolve_root(
    grid: &TileGrid,
    pending: &[Option<TileId>],
    sealed: &[bool],
    origin: TileId,
    first: TileId,
) -> Result<Option<TileId>, GroupingError> {
    let cycle = || GroupingError::ParentCycle {
        cell: grid.cell(origin),
    };
    let mut current = first;
    for _ in 0..pending.len() {
        if current == origin {
            return Err(cycle());
        }
        if sealed[current.index()] {
            return Ok(None);
        }
        match pending[current.index()] {
            Some(next) => current = next,
            None => return Ok(Some(current)),
        }
    }
    Err(cycle())
}

fn on_border(cell: CellCoord, columns: u32, rows: u32) -> bool {
    cell.column() == 0 || cell.row() == 0 || cell.column() == columns - 1 || cell.row() == rows - 1
}

fn seal_border(grid: &mut TileGrid) {
    let (columns, rows) = grid.dimensions();
    for id in grid.ids().collect::<Vec<_>>() {
        if on_border(grid.cell(id), columns, rows) {
            grid.set_kind(id, TileKind::Pillar);
        }
    }
}

fn scatter_row<R: Rng>(grid: &mut TileGrid, row: u32, rng: &mut R) {
    let (columns, rows) = grid.dimensions();
    for column in 0..columns {
        let Some(id) = grid.id(CellCoord::new(column, row)) else {
            continue;
        };
        let kind = if on_border(CellCoord::new(column, row), columns, rows) {
            TileKind::Pillar
        } else {
            TileKind::ALL[rng.gen_range(0..TileKind::ALL.len())]
        };
        grid.set_kind(id, kind);
    }
}

/// Query functions that provide read-only access to the terrain.
pub mod query {
    use tank_arena_core::{CellCoord, OpenSides, TerrainView, TileKind, WorldType};

    use super::{Phase, Terrain, TileGrid, TileId};

    /// Borrowed handle to a single tile.
    #[derive(Clone, Copy, Debug)]
    pub struct TileRef<'a> {
        grid: &'a TileGrid,
        id: TileId,
    }

    impl<'a> TileRef<'a> {
        /// Cell occupied by the tile.
        #[must_use]
        pub fn cell(&self) -> CellCoord {
            self.grid.cell(self.id)
        }

        /// Current kind of the tile.
        #[must_use]
        pub fn kind(&self) -> TileKind {
            self.grid.kind(self.id)
        }

        /// Reports whether tanks can drive across the tile.
        #[must_use]
        pub fn is_open(&self) -> bool {
            self.kind().is_open()
        }

        /// Reports whether the tile is the root of its group.
        #[must_use]
        pub fn is_root(&self) -> bool {
            self.grid.parent(self.id).is_none()
        }

        /// Parent tile, when the tile belongs to another tile's group.
        #[must_use]
        pub fn parent(&self) -> Option<TileRef<'a>> {
            self.grid.parent(self.id).map(|id| TileRef {
                grid: self.grid,
                id,
            })
        }

        /// Root tile of the tile's group.
        #[must_use]
        pub fn root(&self) -> TileRef<'a> {
            TileRef {
                grid: self.grid,
                id: self.grid.root(self.id),
            }
        }

        /// Cells of the tile's children. Empty for children and lone tiles.
        #[must_use]
        pub fn children(&self) -> Vec<CellCoord> {
            self.grid
                .children(self.id)
                .iter()
                .map(|child| self.grid.cell(*child))
                .collect()
        }

        /// Cells of every member of the tile's group, root first.
        #[must_use]
        pub fn group(&self) -> Vec<CellCoord> {
            self.grid
                .group(self.id)
                .into_iter()
                .map(|member| self.grid.cell(member))
                .collect()
        }
    }

    /// Reports whether [`Terrain::init_world`] has succeeded.
    #[must_use]
    pub fn is_initialized(terrain: &Terrain) -> bool {
        !matches!(terrain.phase, Phase::Uninitialized)
    }

    /// Reports whether generation has completed.
    #[must_use]
    pub fn is_generated(terrain: &Terrain) -> bool {
        matches!(terrain.phase, Phase::Generated { .. })
    }

    /// Reports whether generation is running.
    #[must_use]
    pub fn is_generating(terrain: &Terrain) -> bool {
        matches!(terrain.phase, Phase::Generating(_))
    }

    /// World type the terrain was initialized with, or last switched to.
    #[must_use]
    pub fn world_type(terrain: &Terrain) -> WorldType {
        terrain.world_type
    }

    /// Column and row counts of the current grid.
    #[must_use]
    pub fn dimensions(terrain: &Terrain) -> (u32, u32) {
        terrain.grid.dimensions()
    }

    /// Number of wall groups opened by a finished carve.
    #[must_use]
    pub fn opened_walls(terrain: &Terrain) -> Option<usize> {
        match terrain.phase {
            Phase::Generated { opened_walls } => Some(opened_walls),
            _ => None,
        }
    }

    /// Tile at `cell`, or `None` outside the grid.
    #[must_use]
    pub fn tile(terrain: &Terrain, cell: CellCoord) -> Option<TileRef<'_>> {
        terrain.grid.id(cell).map(|id| TileRef {
            grid: &terrain.grid,
            id,
        })
    }

    /// Row-major index of `cell`, or `None` outside the grid.
    #[must_use]
    pub fn linear_index(terrain: &Terrain, cell: CellCoord) -> Option<usize> {
        terrain.grid.id(cell).map(TileId::index)
    }

    /// Read-only view of every tile kind.
    #[must_use]
    pub fn terrain_view(terrain: &Terrain) -> TerrainView<'_> {
        let (columns, rows) = terrain.grid.dimensions();
        TerrainView::new(terrain.grid.kinds(), columns, rows)
    }

    /// Which neighbours of `cell` are open.
    #[must_use]
    pub fn open_sides(terrain: &Terrain, cell: CellCoord) -> OpenSides {
        terrain_view(terrain).open_sides(cell)
    }

    /// Root cells of the room groups found at initialization, row-major.
    #[must_use]
    pub fn room_roots(terrain: &Terrain) -> Vec<CellCoord> {
        terrain
            .rooms
            .iter()
            .map(|room| terrain.grid.cell(*room))
            .collect()
    }

    /// Room the carve started from, once generation has begun.
    #[must_use]
    pub fn start_room(terrain: &Terrain) -> Option<CellCoord> {
        terrain.start_room.map(|room| terrain.grid.cell(room))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maze1(columns: u32, rows: u32, world_type: WorldType) -> TerrainConfig {
        TerrainConfig::new(columns, rows, world_type, PatternPreset::Maze1.pattern()).with_seed(11)
    }

    #[test]
    fn pacing_scales_with_width() {
        let pacing = GenerationPacing::default();

        assert_eq!(pacing.steps_per_tick(9), 5);
        assert_eq!(pacing.steps_per_tick(32), 8);
        assert_eq!(GenerationPacing::new(0).steps_per_tick(64), 1);
    }

    #[test]
    fn start_bias_floors() {
        assert_eq!(start_bias(9), 4);
        assert_eq!(start_bias(21), 9);
        assert_eq!(start_bias(1), 0);
    }

    #[test]
    fn zero_sized_grids_are_rejected() {
        let mut terrain = Terrain::new();
        let mut events = Vec::new();

        let result = terrain.init_world(&maze1(0, 4, WorldType::Prim), &mut events);

        assert_eq!(
            result,
            Err(TerrainError::InvalidDimensions {
                columns: 0,
                rows: 4
            })
        );
        assert!(events.is_empty());
        assert!(!query::is_initialized(&terrain));
    }

    #[test]
    fn stepping_before_generation_is_an_error() {
        let mut terrain = Terrain::new();
        let mut events = Vec::new();
        assert_eq!(
            terrain.step_generation(1, &mut events),
            Err(TerrainError::NotInitialized)
        );

        terrain
            .init_world(&maze1(5, 5, WorldType::Prim), &mut events)
            .expect("init succeeds");

        assert_eq!(
            terrain.step_generation(1, &mut events),
            Err(TerrainError::GenerationNotStarted)
        );
    }

    #[test]
    fn empty_world_settles_in_one_step() {
        let mut terrain = Terrain::new();
        let mut events = Vec::new();
        terrain
            .init_world(&maze1(4, 3, WorldType::Empty), &mut events)
            .expect("init succeeds");
        terrain.generate_world(None).expect("generation starts");

        let progress = terrain.step_generation(1, &mut events).expect("step");

        assert_eq!(progress, GenerationProgress::Done);
        assert_eq!(query::terrain_view(&terrain).dimensions(), (4, 3));
        assert!((0..4)
            .flat_map(|column| (0..3).map(move |row| CellCoord::new(column, row)))
            .all(|cell| query::tile(&terrain, cell).map(|tile| tile.kind()) == Some(TileKind::Room)));
        assert_eq!(
            events.last(),
            Some(&TerrainEvent::Generated {
                world_type: WorldType::Empty,
                opened_walls: 0,
            })
        );
    }

    #[test]
    fn random_world_scatters_inside_a_pillar_border() {
        let mut terrain = Terrain::new();
        let mut events = Vec::new();
        terrain
            .init_world(&maze1(6, 5, WorldType::Random), &mut events)
            .expect("init succeeds");
        terrain.generate_world(Some(3)).expect("generation starts");

        assert_eq!(
            terrain.step_generation(2, &mut events),
            Ok(GenerationProgress::InProgress)
        );
        terrain.run_generation(&mut events).expect("generation completes");

        for column in 0..6 {
            for row in [0, 4] {
                let tile = query::tile(&terrain, CellCoord::new(column, row)).expect("inside");
                assert_eq!(tile.kind(), TileKind::Pillar);
            }
        }
        assert!(query::is_generated(&terrain));
    }

    #[test]
    fn switching_to_a_non_prim_type_mid_carve_is_rejected() {
        let mut terrain = Terrain::new();
        let mut events = Vec::new();
        terrain
            .init_world(&maze1(9, 9, WorldType::Prim), &mut events)
            .expect("init succeeds");
        terrain.generate_world(None).expect("generation starts");

        assert_eq!(
            terrain.switch_world_type(WorldType::Random),
            Err(TerrainError::UnsupportedWorldType {
                world_type: WorldType::Random,
                operation: "switch_world_type",
            })
        );
        terrain
            .switch_world_type(WorldType::LinearPrim)
            .expect("prim family switch is accepted");
        terrain.run_generation(&mut events).expect("generation completes");

        assert_eq!(query::world_type(&terrain), WorldType::LinearPrim);
    }

    #[test]
    fn pattern_without_rooms_cannot_be_carved() {
        let pattern = SeedPattern::new(vec![vec![SeedCell::new(TileKind::Pillar)]])
            .expect("pattern is valid");
        let config = TerrainConfig::new(4, 4, WorldType::Prim, pattern);
        let mut terrain = Terrain::new();
        let mut events = Vec::new();
        terrain.init_world(&config, &mut events).expect("init succeeds");

        assert_eq!(
            terrain.generate_world(None),
            Err(TerrainError::NoRooms(WorldType::Prim))
        );
    }
}

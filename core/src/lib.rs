#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tank Arena terrain crates.
//!
//! This crate defines the vocabulary that connects the terrain generator, the
//! pathfinding system and the hosts embedding them. The world crate owns the
//! authoritative tile grid and exposes it through a read-only [`TerrainView`];
//! systems consume that view together with a [`PathHost`] that answers the
//! spatial and occupancy questions only the host can answer.

use std::{fmt, str::FromStr};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Rows grow northward: row zero is the southern edge of the arena, which is
/// also how seed patterns are authored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Applies a signed offset, returning `None` when either axis would go negative.
    ///
    /// Upper bounds are not checked; callers validate against their grid.
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32) -> Option<CellCoord> {
        let column = self.column.checked_add_signed(dx)?;
        let row = self.row.checked_add_signed(dy)?;
        Some(CellCoord::new(column, row))
    }

    /// Cell adjacent in the provided direction, if it has non-negative coordinates.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<CellCoord> {
        let (dx, dy) = direction.delta();
        self.offset(dx, dy)
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.column, self.row)
    }
}

/// Cardinal movement directions available to tanks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward increasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward decreasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Every direction in the order neighbours are explored.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// Column and row delta applied when stepping in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, 1),
            Self::East => (1, 0),
            Self::South => (0, -1),
            Self::West => (-1, 0),
        }
    }
}

/// State of a single tile in the terrain grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Tile that was never assigned a type.
    #[default]
    Undefined,
    /// Open floor that the carver connects together.
    Room,
    /// Closed wall that the carver may open.
    Wall,
    /// Permanently closed tile.
    Pillar,
    /// Wall that the carver opened into a corridor.
    WallOpen,
    /// Authoring variant of [`TileKind::Wall`], kept distinct on tiny grids.
    WallA,
    /// Second authoring variant of [`TileKind::Wall`].
    WallB,
}

impl TileKind {
    /// Every tile kind, used when scattering random tiles.
    pub const ALL: [TileKind; 7] = [
        TileKind::Undefined,
        TileKind::Room,
        TileKind::Wall,
        TileKind::Pillar,
        TileKind::WallOpen,
        TileKind::WallA,
        TileKind::WallB,
    ];

    /// Reports whether tanks can drive across the tile.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Room | Self::WallOpen)
    }

    /// Maps the authoring wall variants onto [`TileKind::Wall`].
    #[must_use]
    pub const fn collapse_wall_variant(self) -> Self {
        match self {
            Self::WallA | Self::WallB => Self::Wall,
            other => other,
        }
    }

    /// Single character used by text renderers.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Undefined => '?',
            Self::Room => '.',
            Self::Wall => '#',
            Self::Pillar => '@',
            Self::WallOpen => ',',
            Self::WallA => 'a',
            Self::WallB => 'b',
        }
    }
}

/// Procedural algorithm used to build the terrain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldType {
    /// Every tile is open floor.
    Empty,
    /// Tiles receive uniformly random kinds inside a pillar border.
    Random,
    /// Randomized Prim's algorithm over wall groups.
    #[default]
    Prim,
    /// Prim's algorithm mirrored across the vertical centre line.
    SymmetricPrim,
    /// Prim's algorithm mirrored across both centre lines.
    RadialPrim,
    /// Prim's algorithm that sweeps the frontier from its ends.
    LinearPrim,
}

impl WorldType {
    /// Every world type, in declaration order.
    pub const ALL: [WorldType; 6] = [
        WorldType::Empty,
        WorldType::Random,
        WorldType::Prim,
        WorldType::SymmetricPrim,
        WorldType::RadialPrim,
        WorldType::LinearPrim,
    ];

    /// Reports whether the world type carves a maze with Prim's algorithm.
    #[must_use]
    pub const fn is_prim_family(self) -> bool {
        matches!(
            self,
            Self::Prim | Self::SymmetricPrim | Self::RadialPrim | Self::LinearPrim
        )
    }

    /// Stable lowercase name used by configuration files and the CLI.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Random => "random",
            Self::Prim => "prim",
            Self::SymmetricPrim => "symmetric_prim",
            Self::RadialPrim => "radial_prim",
            Self::LinearPrim => "linear_prim",
        }
    }
}

impl fmt::Display for WorldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WorldType {
    type Err = UnknownWorldType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.name() == normalized)
            .ok_or_else(|| UnknownWorldType(value.to_owned()))
    }
}

/// Error returned when parsing an unrecognised world type name.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown world type `{0}`")]
pub struct UnknownWorldType(pub String);

/// Which cardinal neighbours of a cell are open.
///
/// Hosts use the mask to choose road and verge visuals for a tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct OpenSides {
    /// Neighbour at the next row is open.
    pub north: bool,
    /// Neighbour at the next column is open.
    pub east: bool,
    /// Neighbour at the previous row is open.
    pub south: bool,
    /// Neighbour at the previous column is open.
    pub west: bool,
}

impl OpenSides {
    /// Number of open neighbours.
    #[must_use]
    pub fn count(&self) -> usize {
        [self.north, self.east, self.south, self.west]
            .into_iter()
            .filter(|open| *open)
            .count()
    }

    /// Reports whether the neighbour in the provided direction is open.
    #[must_use]
    pub const fn is_open(&self, direction: Direction) -> bool {
        match direction {
            Direction::North => self.north,
            Direction::East => self.east,
            Direction::South => self.south,
            Direction::West => self.west,
        }
    }
}

/// Read-only view into the dense tile grid.
#[derive(Clone, Copy, Debug)]
pub struct TerrainView<'a> {
    kinds: &'a [TileKind],
    columns: u32,
    rows: u32,
}

impl<'a> TerrainView<'a> {
    /// Captures a new terrain view backed by the provided row-major tile slice.
    ///
    /// Cells past the end of a short slice read as missing and closed.
    #[must_use]
    pub fn new(kinds: &'a [TileKind], columns: u32, rows: u32) -> Self {
        Self {
            kinds,
            columns,
            rows,
        }
    }

    /// Provides the dimensions of the underlying grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Number of cells covered by the grid dimensions.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Reports whether the cell lies within the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Row-major index of the cell, if it lies within the grid.
    #[must_use]
    pub fn linear_index(&self, cell: CellCoord) -> Option<usize> {
        linear_index(self.columns, self.rows, cell)
    }

    /// Tile kind stored at the cell.
    #[must_use]
    pub fn kind(&self, cell: CellCoord) -> Option<TileKind> {
        self.linear_index(cell)
            .and_then(|index| self.kinds.get(index).copied())
    }

    /// Reports whether the cell exists and is statically open.
    #[must_use]
    pub fn is_open(&self, cell: CellCoord) -> bool {
        self.kind(cell).is_some_and(TileKind::is_open)
    }

    /// Collects which cardinal neighbours of the cell are open.
    #[must_use]
    pub fn open_sides(&self, cell: CellCoord) -> OpenSides {
        let open = |direction: Direction| cell.step(direction).is_some_and(|n| self.is_open(n));
        OpenSides {
            north: open(Direction::North),
            east: open(Direction::East),
            south: open(Direction::South),
            west: open(Direction::West),
        }
    }
}

/// Row-major index of `cell` within a `columns` by `rows` grid.
#[must_use]
pub fn linear_index(columns: u32, rows: u32, cell: CellCoord) -> Option<usize> {
    if cell.column() >= columns || cell.row() >= rows {
        return None;
    }
    let row = usize::try_from(cell.row()).ok()?;
    let column = usize::try_from(cell.column()).ok()?;
    let width = usize::try_from(columns).ok()?;
    row.checked_mul(width)?.checked_add(column)
}

/// Host services the pathfinder consumes.
///
/// Implementations must be side-effect free: a single search may ask about
/// the same cell more than once.
pub trait PathHost {
    /// Cell directly beneath the world position, or `None` when off the grid.
    fn cell_under(&self, position: Vec3) -> Option<CellCoord>;

    /// Reports whether a dynamic obstacle currently stands on the cell.
    fn is_cell_occupied(&self, cell: CellCoord) -> bool;

    /// World position of the cell's centre.
    fn cell_position(&self, cell: CellCoord) -> Vec3;
}

/// Mapping between grid cells and world positions on the ground plane.
///
/// Cell centres sit at `origin + (column * tile_width, 0, row * tile_depth)`;
/// each tile extends half a tile in every horizontal direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileLayout {
    origin: Vec3,
    tile_width: f32,
    tile_depth: f32,
    columns: u32,
    rows: u32,
}

impl TileLayout {
    /// Creates a layout whose first cell is centred on the world origin.
    #[must_use]
    pub const fn new(columns: u32, rows: u32, tile_width: f32, tile_depth: f32) -> Self {
        Self {
            origin: Vec3::ZERO,
            tile_width,
            tile_depth,
            columns,
            rows,
        }
    }

    /// Creates a layout centred on the world origin.
    #[must_use]
    pub fn centered(columns: u32, rows: u32, tile_width: f32, tile_depth: f32) -> Self {
        let span_x = columns.saturating_sub(1) as f32 * tile_width;
        let span_z = rows.saturating_sub(1) as f32 * tile_depth;
        Self::new(columns, rows, tile_width, tile_depth)
            .with_origin(Vec3::new(span_x * -0.5, 0.0, span_z * -0.5))
    }

    /// Overrides the world position of the first cell's centre.
    #[must_use]
    pub fn with_origin(mut self, origin: Vec3) -> Self {
        self.origin = origin;
        self
    }

    /// World position of the first cell's centre.
    #[must_use]
    pub const fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Dimensions of the grid covered by the layout.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// World position of the cell's centre.
    #[must_use]
    pub fn cell_position(&self, cell: CellCoord) -> Vec3 {
        self.origin
            + Vec3::new(
                cell.column() as f32 * self.tile_width,
                0.0,
                cell.row() as f32 * self.tile_depth,
            )
    }

    /// Cell whose footprint contains the position, ignoring height.
    #[must_use]
    pub fn cell_under(&self, position: Vec3) -> Option<CellCoord> {
        if self.tile_width <= 0.0 || self.tile_depth <= 0.0 {
            return None;
        }

        let local = position - self.origin;
        let column = (local.x / self.tile_width + 0.5).floor();
        let row = (local.z / self.tile_depth + 0.5).floor();
        if !column.is_finite() || !row.is_finite() || column < 0.0 || row < 0.0 {
            return None;
        }
        if column >= self.columns as f32 || row >= self.rows as f32 {
            return None;
        }

        Some(CellCoord::new(column as u32, row as u32))
    }
}

/// Dense grid of cells currently blocked by dynamic obstacles.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObstacleOverlay {
    columns: u32,
    rows: u32,
    cells: Vec<bool>,
}

impl ObstacleOverlay {
    /// Creates an overlay with every cell free.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![false; capacity],
        }
    }

    /// Marks the cell as occupied. Cells outside the grid are ignored.
    pub fn occupy(&mut self, cell: CellCoord) {
        if let Some(slot) = self.slot_mut(cell) {
            *slot = true;
        }
    }

    /// Marks the cell as free.
    pub fn vacate(&mut self, cell: CellCoord) {
        if let Some(slot) = self.slot_mut(cell) {
            *slot = false;
        }
    }

    /// Frees every cell.
    pub fn clear(&mut self) {
        self.cells.fill(false);
    }

    /// Reports whether something currently stands on the cell.
    #[must_use]
    pub fn is_occupied(&self, cell: CellCoord) -> bool {
        linear_index(self.columns, self.rows, cell)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(false)
    }

    /// Iterates over the occupied cells in row-major order.
    pub fn occupied_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        let columns = self.columns.max(1);
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, occupied)| **occupied)
            .filter_map(move |(index, _)| {
                let index = u32::try_from(index).ok()?;
                Some(CellCoord::new(index % columns, index / columns))
            })
    }

    /// Provides the dimensions of the overlay.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    fn slot_mut(&mut self, cell: CellCoord) -> Option<&mut bool> {
        let index = linear_index(self.columns, self.rows, cell)?;
        self.cells.get_mut(index)
    }
}

/// [`PathHost`] backed by a [`TileLayout`] and an [`ObstacleOverlay`].
#[derive(Clone, Copy, Debug)]
pub struct OverlayHost<'a> {
    layout: &'a TileLayout,
    overlay: &'a ObstacleOverlay,
}

impl<'a> OverlayHost<'a> {
    /// Combines a layout and an overlay into a host.
    #[must_use]
    pub const fn new(layout: &'a TileLayout, overlay: &'a ObstacleOverlay) -> Self {
        Self { layout, overlay }
    }
}

impl PathHost for OverlayHost<'_> {
    fn cell_under(&self, position: Vec3) -> Option<CellCoord> {
        self.layout.cell_under(position)
    }

    fn is_cell_occupied(&self, cell: CellCoord) -> bool {
        self.overlay.is_occupied(cell)
    }

    fn cell_position(&self, cell: CellCoord) -> Vec3 {
        self.layout.cell_position(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn offset_rejects_negative_coordinates() {
        let cell = CellCoord::new(0, 2);
        assert_eq!(cell.offset(-1, 0), None);
        assert_eq!(cell.offset(0, -2), Some(CellCoord::new(0, 0)));
        assert_eq!(cell.step(Direction::North), Some(CellCoord::new(0, 3)));
    }

    #[test]
    fn only_rooms_and_opened_walls_are_open() {
        let open: Vec<TileKind> = TileKind::ALL
            .into_iter()
            .filter(|kind| kind.is_open())
            .collect();
        assert_eq!(open, vec![TileKind::Room, TileKind::WallOpen]);
    }

    #[test]
    fn wall_variants_collapse_to_wall() {
        assert_eq!(TileKind::WallA.collapse_wall_variant(), TileKind::Wall);
        assert_eq!(TileKind::WallB.collapse_wall_variant(), TileKind::Wall);
        assert_eq!(TileKind::Pillar.collapse_wall_variant(), TileKind::Pillar);
    }

    #[test]
    fn world_type_parses_cli_spellings() {
        assert_eq!("radial-prim".parse(), Ok(WorldType::RadialPrim));
        assert_eq!(" Prim ".parse(), Ok(WorldType::Prim));
        assert!("maze".parse::<WorldType>().is_err());
    }

    #[test]
    fn tile_kind_round_trips_through_bincode() {
        let bytes = bincode::serialize(&TileKind::WallOpen).expect("serialize");
        let restored: TileKind = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, TileKind::WallOpen);
    }

    #[test]
    fn terrain_view_reports_open_sides() {
        let kinds = [
            TileKind::Pillar,
            TileKind::Room,
            TileKind::Pillar,
            TileKind::Room,
            TileKind::Room,
            TileKind::WallOpen,
            TileKind::Pillar,
            TileKind::Wall,
            TileKind::Pillar,
        ];
        let view = TerrainView::new(&kinds, 3, 3);
        let sides = view.open_sides(CellCoord::new(1, 1));

        assert!(sides.south);
        assert!(sides.east);
        assert!(sides.west);
        assert!(!sides.north);
        assert_eq!(sides.count(), 3);
    }

    #[test]
    fn short_tile_slices_leave_trailing_cells_closed() {
        let kinds = [TileKind::Room; 4];
        let view = TerrainView::new(&kinds, 3, 3);

        assert_eq!(view.cell_count(), 9);
        assert_eq!(view.linear_index(CellCoord::new(2, 2)), Some(8));
        assert_eq!(view.kind(CellCoord::new(2, 2)), None);
        assert!(!view.is_open(CellCoord::new(1, 1)));
        assert!(view.is_open(CellCoord::new(0, 1)));
    }

    #[test]
    fn layout_maps_positions_back_to_cells() {
        let layout = TileLayout::new(4, 3, 3.0, 3.0);
        let cell = CellCoord::new(2, 1);
        let centre = layout.cell_position(cell);

        assert_eq!(centre, Vec3::new(6.0, 0.0, 3.0));
        assert_eq!(layout.cell_under(centre), Some(cell));
        assert_eq!(layout.cell_under(centre + Vec3::new(1.4, 5.0, -1.4)), Some(cell));
        assert_eq!(layout.cell_under(Vec3::new(-2.0, 0.0, 0.0)), None);
        assert_eq!(layout.cell_under(Vec3::new(11.0, 0.0, 0.0)), None);
    }

    #[test]
    fn centered_layout_straddles_origin() {
        let layout = TileLayout::centered(3, 3, 2.0, 2.0);
        assert_eq!(layout.cell_under(Vec3::ZERO), Some(CellCoord::new(1, 1)));
    }

    #[test]
    fn overlay_ignores_cells_outside_the_grid() {
        let mut overlay = ObstacleOverlay::new(2, 2);
        overlay.occupy(CellCoord::new(1, 0));
        overlay.occupy(CellCoord::new(5, 5));

        assert!(overlay.is_occupied(CellCoord::new(1, 0)));
        assert!(!overlay.is_occupied(CellCoord::new(5, 5)));
        assert_eq!(
            overlay.occupied_cells().collect::<Vec<_>>(),
            vec![CellCoord::new(1, 0)]
        );

        overlay.vacate(CellCoord::new(1, 0));
        assert_eq!(overlay.occupied_cells().count(), 0);
    }
}

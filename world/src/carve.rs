//! Randomized Prim carving over wall groups.

use std::collections::VecDeque;

use rand::Rng;
use tank_arena_core::{CellCoord, TileKind, WorldType};
use tracing::trace;

use crate::{
    tiles::{TileGrid, TileId},
    TerrainEvent,
};

/// Mirror applied to every wall the carver picks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Symmetry {
    /// Mirror across the vertical centre line.
    Horizontal,
    /// Mirror across both centre lines and through the centre point.
    Radial,
}

/// Strategy used to pick the next frontier wall.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CarveOrder {
    /// Uniformly random frontier wall.
    Random,
    /// Alternate between the oldest and newest frontier walls.
    Linear,
    /// Random frontier wall whose mirror images are carved with it.
    Mirrored(Symmetry),
}

impl CarveOrder {
    /// Order used by a Prim-family world type.
    #[must_use]
    pub(crate) const fn for_world_type(world_type: WorldType) -> Option<Self> {
        match world_type {
            WorldType::Prim => Some(Self::Random),
            WorldType::LinearPrim => Some(Self::Linear),
            WorldType::SymmetricPrim => Some(Self::Mirrored(Symmetry::Horizontal)),
            WorldType::RadialPrim => Some(Self::Mirrored(Symmetry::Radial)),
            WorldType::Empty | WorldType::Random => None,
        }
    }
}

/// Whether a single carver step did any work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CarveStep {
    /// A wall was examined or opened.
    Progressed,
    /// Nothing is left to examine.
    Exhausted,
}

/// Disjoint sets over room roots, tracking which rooms are already joined by
/// opened walls.
#[derive(Clone, Debug)]
struct RoomRegions {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl RoomRegions {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    fn find(&mut self, index: usize) -> usize {
        let mut root = index;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = index;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) -> bool {
        let a = self.find(a);
        let b = self.find(b);
        if a == b {
            return false;
        }
        match self.rank[a].cmp(&self.rank[b]) {
            std::cmp::Ordering::Less => self.parent[a] = b,
            std::cmp::Ordering::Greater => self.parent[b] = a,
            std::cmp::Ordering::Equal => {
                self.parent[b] = a;
                self.rank[a] = self.rank[a].saturating_add(1);
            }
        }
        true
    }
}

/// Incremental maze carver.
///
/// Each call to [`Carver::step`] examines at most one wall so hosts can spread
/// generation over several frames.
#[derive(Clone, Debug)]
pub(crate) struct Carver {
    order: CarveOrder,
    start_room: TileId,
    frontier: Vec<TileId>,
    in_frontier: Vec<bool>,
    reached: Vec<bool>,
    mirrored: VecDeque<(TileId, bool)>,
    regions: RoomRegions,
    opened_walls: usize,
}

impl Carver {
    /// Seeds the frontier with the walls around `start_room`.
    pub(crate) fn new(grid: &TileGrid, order: CarveOrder, start_room: TileId) -> Self {
        let len = grid.len();
        let mut carver = Self {
            order,
            start_room,
            frontier: Vec::new(),
            in_frontier: vec![false; len],
            reached: vec![false; len],
            mirrored: VecDeque::new(),
            regions: RoomRegions::new(len),
            opened_walls: 0,
        };
        carver.reach(grid, start_room);
        carver
    }

    #[must_use]
    pub(crate) const fn opened_walls(&self) -> usize {
        self.opened_walls
    }

    /// Switches the wall selection strategy without resetting progress.
    pub(crate) fn set_order(&mut self, order: CarveOrder) {
        self.order = order;
    }

    /// Examines one wall.
    pub(crate) fn step<R: Rng>(
        &mut self,
        grid: &mut TileGrid,
        rng: &mut R,
        out_events: &mut Vec<TerrainEvent>,
    ) -> CarveStep {
        if let Some((wall, open)) = self.mirrored.pop_front() {
            self.leave_frontier(wall);
            if open && grid.kind(wall) == TileKind::Wall {
                self.open(grid, wall, out_events);
            }
            return CarveStep::Progressed;
        }

        let Some(wall) = self.pick(rng) else {
            return match self.bridge(grid) {
                Some(orbit) => {
                    for wall in orbit {
                        self.leave_frontier(wall);
                        self.open(grid, wall, out_events);
                    }
                    CarveStep::Progressed
                }
                None => CarveStep::Exhausted,
            };
        };

        let orbit = self.orbit(grid, wall);
        let open = match self.order {
            CarveOrder::Mirrored(_) => self.orbit_opens(grid, &orbit),
            CarveOrder::Random | CarveOrder::Linear => self.wall_opens(grid, wall),
        };
        self.leave_frontier(wall);
        if open {
            self.open(grid, wall, out_events);
        }
        self.mirrored
            .extend(orbit.into_iter().skip(1).map(|image| (image, open)));
        CarveStep::Progressed
    }

    fn pick<R: Rng>(&self, rng: &mut R) -> Option<TileId> {
        let len = self.frontier.len();
        if len == 0 {
            return None;
        }
        let index = match self.order {
            CarveOrder::Random | CarveOrder::Mirrored(_) => rng.gen_range(0..len),
            CarveOrder::Linear if len >= 2 && len % 2 == 1 => len - 1,
            CarveOrder::Linear => 0,
        };
        Some(self.frontier[index])
    }

    /// The wall followed by its distinct mirror images that are closed walls.
    fn orbit(&self, grid: &TileGrid, wall: TileId) -> Vec<TileId> {
        let mut orbit = vec![wall];
        let CarveOrder::Mirrored(symmetry) = self.order else {
            return orbit;
        };

        let (columns, rows) = grid.dimensions();
        let cell = grid.cell(wall);
        let mirror_column = columns - 1 - cell.column();
        let mirror_row = rows - 1 - cell.row();
        let images = match symmetry {
            Symmetry::Horizontal => vec![(mirror_column, cell.row())],
            Symmetry::Radial => vec![
                (mirror_column, cell.row()),
                (mirror_column, mirror_row),
                (cell.column(), mirror_row),
            ],
        };

        for (column, row) in images {
            if let Some(root) = grid.root_of_kind(CellCoord::new(column, row), TileKind::Wall) {
                if !orbit.contains(&root) {
                    orbit.push(root);
                }
            }
        }
        orbit
    }

    /// A lone wall opens when it touches at least two rooms and exactly one of
    /// them is still cut off from the start room.
    fn wall_opens(&mut self, grid: &TileGrid, wall: TileId) -> bool {
        let rooms = grid.adjacent_roots(wall, TileKind::Room);
        if rooms.len() < 2 {
            return false;
        }
        let home = self.regions.find(self.start_room.index());
        let outside = rooms
            .iter()
            .filter(|room| self.regions.find(room.index()) != home)
            .count();
        outside == 1
    }

    /// Every member of an orbit opens or none does. Members must each touch
    /// two rooms, one of them must reach a single cut-off room, and opening
    /// the whole orbit must not join rooms that are already joined.
    fn orbit_opens(&mut self, grid: &TileGrid, orbit: &[TileId]) -> bool {
        let home = self.regions.find(self.start_room.index());
        let mut joins = LocalUnion::default();
        let mut extends_home = false;

        for wall in orbit {
            let rooms = grid.adjacent_roots(*wall, TileKind::Room);
            if rooms.len() < 2 {
                return false;
            }
            let regions: Vec<usize> = rooms
                .iter()
                .map(|room| self.regions.find(room.index()))
                .collect();
            if regions.iter().filter(|region| **region != home).count() == 1 {
                extends_home = true;
            }
            for region in &regions[1..] {
                if !joins.union(regions[0], *region) {
                    return false;
                }
            }
        }
        extends_home
    }

    /// Orbit that joins the start room's region to another one while closing
    /// the fewest loops. Ties go to the first orbit in row-major order.
    ///
    /// Symmetric orbits that straddle a pillar centre cannot join the
    /// quadrants without one loop, so a bridge may close loops when no
    /// loop-free orbit exists.
    fn bridge(&mut self, grid: &TileGrid) -> Option<Vec<TileId>> {
        if !matches!(self.order, CarveOrder::Mirrored(_)) {
            return None;
        }
        let candidates: Vec<TileId> = grid
            .ids()
            .filter(|id| grid.parent(*id).is_none() && grid.kind(*id) == TileKind::Wall)
            .collect();

        let mut best: Option<(usize, Vec<TileId>)> = None;
        for wall in candidates {
            let orbit = self.orbit(grid, wall);
            let Some(loops) = self.bridge_loops(grid, &orbit) else {
                continue;
            };
            if loops == 0 {
                return Some(orbit);
            }
            if best.as_ref().map_or(true, |(fewest, _)| loops < *fewest) {
                best = Some((loops, orbit));
            }
        }
        best.map(|(_, orbit)| orbit)
    }

    /// Loops closed by opening `orbit` as a bridge, or `None` when no member
    /// joins the start room's region to another region.
    fn bridge_loops(&mut self, grid: &TileGrid, orbit: &[TileId]) -> Option<usize> {
        let home = self.regions.find(self.start_room.index());
        let mut joins = LocalUnion::default();
        let mut joins_home = false;
        let mut loops = 0;

        for wall in orbit {
            let rooms = grid.adjacent_roots(*wall, TileKind::Room);
            if rooms.len() < 2 {
                return None;
            }
            let regions: Vec<usize> = rooms
                .iter()
                .map(|room| self.regions.find(room.index()))
                .collect();
            if regions.contains(&home) && regions.iter().any(|region| *region != home) {
                joins_home = true;
            }
            for region in &regions[1..] {
                if !joins.union(regions[0], *region) {
                    loops += 1;
                }
            }
        }
        joins_home.then_some(loops)
    }

    fn open(&mut self, grid: &mut TileGrid, wall: TileId, out_events: &mut Vec<TerrainEvent>) {
        for member in grid.group(wall) {
            grid.set_kind(member, TileKind::WallOpen);
        }
        self.opened_walls += 1;
        let cell = grid.cell(wall);
        trace!(%cell, "opened wall");
        out_events.push(TerrainEvent::WallOpened { wall: cell });

        let rooms = grid.adjacent_roots(wall, TileKind::Room);
        if let Some(first) = rooms.first() {
            for room in &rooms[1..] {
                let _ = self.regions.union(first.index(), room.index());
            }
        }
        for room in rooms {
            self.reach(grid, room);
        }
    }

    /// Marks a room as reached and queues its closed walls.
    fn reach(&mut self, grid: &TileGrid, room: TileId) {
        if self.reached[room.index()] {
            return;
        }
        self.reached[room.index()] = true;
        for wall in grid.adjacent_roots(room, TileKind::Wall) {
            if !self.in_frontier[wall.index()] {
                self.in_frontier[wall.index()] = true;
                self.frontier.push(wall);
            }
        }
    }

    fn leave_frontier(&mut self, wall: TileId) {
        if !self.in_frontier[wall.index()] {
            return;
        }
        self.in_frontier[wall.index()] = false;
        if let Some(position) = self.frontier.iter().position(|queued| *queued == wall) {
            let _ = self.frontier.remove(position);
        }
    }
}

/// Scratch union over region representatives for a single orbit decision.
#[derive(Debug, Default)]
struct LocalUnion {
    parent: Vec<(usize, usize)>,
}

impl LocalUnion {
    fn find(&self, mut key: usize) -> usize {
        while let Some((_, next)) = self.parent.iter().find(|(from, _)| *from == key) {
            key = *next;
        }
        key
    }

    fn union(&mut self, a: usize, b: usize) -> bool {
        let a = self.find(a);
        let b = self.find(b);
        if a == b {
            return false;
        }
        self.parent.push((b, a));
        true
    }
}

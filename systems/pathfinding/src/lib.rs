#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grid A* pathfinding for tanks crossing the generated terrain.
//!
//! The search runs over four-connected cells with unit edge costs and a
//! Manhattan heuristic. A cell is blocked when its tile is closed or when the
//! host reports a dynamic obstacle on it at the moment the search first looks
//! at the cell.

use std::{cmp::Ordering, collections::BinaryHeap};

use glam::Vec3;
use tank_arena_core::{CellCoord, Direction, PathHost, TerrainView};
use tracing::trace;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum NodeState {
    #[default]
    Unvisited,
    Blocked,
    Open,
    Closed,
}

#[derive(Clone, Copy, Debug, Default)]
struct PathNode {
    classified: bool,
    g: u32,
    h: u32,
    state: NodeState,
    predecessor: Option<usize>,
}

/// Entry in the open set. Ordered so the binary heap pops the lowest `f`,
/// then the lowest `h`, then the earliest push.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenEntry {
    f: u32,
    h: u32,
    g: u32,
    sequence: u64,
    index: usize,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reusable A* search workspace.
///
/// The node table and open set are kept between calls so repeated searches
/// on the same grid do not reallocate. Each search starts from a clean table.
#[derive(Debug, Default)]
pub struct Pathfinder {
    nodes: Vec<PathNode>,
    touched: Vec<usize>,
    open: BinaryHeap<OpenEntry>,
    sequence: u64,
}

impl Pathfinder {
    /// Creates a pathfinder with an empty workspace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds a route from the world position `from` to the centre of `target`.
    ///
    /// Waypoints are cell centres as reported by the host, starting with the
    /// cell under `from` and ending with `target`. Returns `None` when `from`
    /// is off the grid, when either end is blocked, or when no route exists.
    pub fn find_path<H>(
        &mut self,
        view: &TerrainView<'_>,
        host: &H,
        from: Vec3,
        target: CellCoord,
    ) -> Option<Vec<Vec3>>
    where
        H: PathHost + ?Sized,
    {
        let Some(start) = host.cell_under(from) else {
            trace!(?from, "path start is off the grid");
            return None;
        };
        let cells = self.find_cell_path(view, start, target, |cell| host.is_cell_occupied(cell))?;
        Some(
            cells
                .into_iter()
                .map(|cell| host.cell_position(cell))
                .collect(),
        )
    }

    /// Finds a route between two cells, start and target included.
    ///
    /// `is_occupied` is asked at most once per cell and search.
    pub fn find_cell_path<F>(
        &mut self,
        view: &TerrainView<'_>,
        start: CellCoord,
        target: CellCoord,
        mut is_occupied: F,
    ) -> Option<Vec<CellCoord>>
    where
        F: FnMut(CellCoord) -> bool,
    {
        let start_index = view.linear_index(start)?;
        let target_index = view.linear_index(target)?;
        self.reset(view.cell_count());

        if self.classify(view, start_index, start, target, &mut is_occupied) == NodeState::Blocked
        {
            trace!(%start, %target, "path start is blocked");
            return None;
        }
        if self.classify(view, target_index, target, target, &mut is_occupied)
            == NodeState::Blocked
        {
            trace!(%start, %target, "path target is blocked");
            return None;
        }

        self.push(start_index, 0, None);
        let mut expanded = 0_usize;
        while let Some(entry) = self.open.pop() {
            let node = self.nodes[entry.index];
            if node.state != NodeState::Open || entry.g != node.g {
                continue;
            }
            if entry.index == target_index {
                let path = self.trace_back(view, target_index);
                trace!(%start, %target, expanded, waypoints = path.len(), "path found");
                return Some(path);
            }

            self.nodes[entry.index].state = NodeState::Closed;
            expanded += 1;

            let cell = cell_at(view, entry.index);
            for direction in Direction::ALL {
                let Some(neighbor) = cell.step(direction) else {
                    continue;
                };
                let Some(index) = view.linear_index(neighbor) else {
                    continue;
                };
                match self.classify(view, index, neighbor, target, &mut is_occupied) {
                    NodeState::Blocked | NodeState::Closed => continue,
                    NodeState::Unvisited | NodeState::Open => {}
                }

                let tentative = node.g + 1;
                let neighbor_node = self.nodes[index];
                if neighbor_node.state == NodeState::Unvisited || tentative < neighbor_node.g {
                    self.push(index, tentative, Some(entry.index));
                }
            }
        }

        trace!(%start, %target, expanded, "no path");
        None
    }

    fn reset(&mut self, cell_count: usize) {
        for index in self.touched.drain(..) {
            if let Some(node) = self.nodes.get_mut(index) {
                *node = PathNode::default();
            }
        }
        self.nodes.resize(cell_count, PathNode::default());
        self.open.clear();
        self.sequence = 0;
    }

    /// Looks at a cell for the first time during this search, recording its
    /// heuristic and whether it is blocked. Returns the cell's state.
    fn classify<F>(
        &mut self,
        view: &TerrainView<'_>,
        index: usize,
        cell: CellCoord,
        target: CellCoord,
        is_occupied: &mut F,
    ) -> NodeState
    where
        F: FnMut(CellCoord) -> bool,
    {
        let node = &mut self.nodes[index];
        if node.classified {
            return node.state;
        }
        node.classified = true;
        node.h = cell.manhattan_distance(target);
        if !view.is_open(cell) || is_occupied(cell) {
            node.state = NodeState::Blocked;
        }
        self.touched.push(index);
        node.state
    }

    fn push(&mut self, index: usize, g: u32, predecessor: Option<usize>) {
        let node = &mut self.nodes[index];
        node.g = g;
        node.state = NodeState::Open;
        node.predecessor = predecessor;
        self.open.push(OpenEntry {
            f: g + node.h,
            h: node.h,
            g,
            sequence: self.sequence,
            index,
        });
        self.sequence += 1;
    }

    fn trace_back(&self, view: &TerrainView<'_>, target_index: usize) -> Vec<CellCoord> {
        let mut path = vec![cell_at(view, target_index)];
        let mut current = target_index;
        while let Some(previous) = self.nodes[current].predecessor {
            path.push(cell_at(view, previous));
            current = previous;
        }
        path.reverse();
        path
    }
}

fn cell_at(view: &TerrainView<'_>, index: usize) -> CellCoord {
    let (columns, _) = view.dimensions();
    let columns = columns.max(1) as usize;
    CellCoord::new((index % columns) as u32, (index / columns) as u32)
}

//! Dense tile storage with parent/child grouping.

use tank_arena_core::{CellCoord, Direction, TileKind};
use thiserror::Error;

/// Neighbour scan order used when collecting adjacent groups.
const ADJACENCY_ORDER: [Direction; 4] = [
    Direction::East,
    Direction::West,
    Direction::North,
    Direction::South,
];

/// Index of a tile inside the grid arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct TileId(usize);

impl TileId {
    /// Position of the tile inside per-tile side tables.
    #[must_use]
    pub(crate) const fn index(self) -> usize {
        self.0
    }
}

/// Reasons a parent link between two tiles is refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GroupingError {
    /// A tile named itself as its parent.
    #[error("tile {cell} cannot be its own parent")]
    SelfParent {
        /// Offending tile.
        cell: CellCoord,
    },
    /// The child already belongs to another group.
    #[error("tile {cell} already has a parent")]
    AlreadyParented {
        /// Offending tile.
        cell: CellCoord,
    },
    /// The requested parent is itself a child.
    #[error("tile {parent} cannot adopt {cell} because it is a child")]
    ParentIsChild {
        /// Tile being linked.
        cell: CellCoord,
        /// Requested parent.
        parent: CellCoord,
    },
    /// The parent already lists the child.
    #[error("tile {parent} already lists {cell} as a child")]
    DuplicateChild {
        /// Tile being linked.
        cell: CellCoord,
        /// Requested parent.
        parent: CellCoord,
    },
    /// The child is the root of its own group.
    #[error("tile {cell} has children and cannot join another group")]
    ChildHasChildren {
        /// Offending tile.
        cell: CellCoord,
    },
    /// Following parent offsets from the tile never reaches a root.
    #[error("parent offsets starting at {cell} form a cycle")]
    ParentCycle {
        /// Tile whose chain loops.
        cell: CellCoord,
    },
}

#[derive(Clone, Debug, Default)]
struct GroupLinks {
    parent: Option<TileId>,
    children: Vec<TileId>,
}

/// Row-major arena of tiles.
///
/// Groups are one level deep: a root owns every child and children never own
/// tiles of their own.
#[derive(Clone, Debug, Default)]
pub(crate) struct TileGrid {
    columns: u32,
    rows: u32,
    kinds: Vec<TileKind>,
    links: Vec<GroupLinks>,
}

impl TileGrid {
    /// Allocates a grid with every tile set to `fill`.
    pub(crate) fn new(columns: u32, rows: u32, fill: TileKind) -> Self {
        let count = columns as usize * rows as usize;
        Self {
            columns,
            rows,
            kinds: vec![fill; count],
            links: vec![GroupLinks::default(); count],
        }
    }

    /// Column and row counts.
    #[must_use]
    pub(crate) const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Number of tiles in the arena.
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Dense kind storage in row-major order.
    #[must_use]
    pub(crate) fn kinds(&self) -> &[TileKind] {
        &self.kinds
    }

    /// Every tile id in row-major order.
    pub(crate) fn ids(&self) -> impl Iterator<Item = TileId> {
        (0..self.kinds.len()).map(TileId)
    }

    /// Resolves a cell into a tile id when it lies inside the grid.
    #[must_use]
    pub(crate) fn id(&self, cell: CellCoord) -> Option<TileId> {
        tank_arena_core::linear_index(self.columns, self.rows, cell).map(TileId)
    }

    /// Cell occupied by the tile.
    #[must_use]
    pub(crate) fn cell(&self, id: TileId) -> CellCoord {
        let columns = self.columns.max(1) as usize;
        CellCoord::new((id.0 % columns) as u32, (id.0 / columns) as u32)
    }

    #[must_use]
    pub(crate) fn kind(&self, id: TileId) -> TileKind {
        self.kinds[id.0]
    }

    pub(crate) fn set_kind(&mut self, id: TileId, kind: TileKind) {
        self.kinds[id.0] = kind;
    }

    #[must_use]
    pub(crate) fn parent(&self, id: TileId) -> Option<TileId> {
        self.links[id.0].parent
    }

    #[must_use]
    pub(crate) fn children(&self, id: TileId) -> &[TileId] {
        &self.links[id.0].children
    }

    /// Root of the group containing the tile.
    #[must_use]
    pub(crate) fn root(&self, id: TileId) -> TileId {
        self.parent(id).unwrap_or(id)
    }

    /// Root followed by its children.
    #[must_use]
    pub(crate) fn group(&self, id: TileId) -> Vec<TileId> {
        let root = self.root(id);
        let mut members = Vec::with_capacity(1 + self.children(root).len());
        members.push(root);
        members.extend_from_slice(self.children(root));
        members
    }

    /// Root of the group covering `cell`, if the cell is inside the grid.
    #[must_use]
    pub(crate) fn root_at(&self, cell: CellCoord) -> Option<TileId> {
        self.id(cell).map(|id| self.root(id))
    }

    /// Root of the group covering `cell`, if that root has the requested kind.
    #[must_use]
    pub(crate) fn root_of_kind(&self, cell: CellCoord, kind: TileKind) -> Option<TileId> {
        self.root_at(cell).filter(|root| self.kind(*root) == kind)
    }

    /// Distinct group roots of the requested kind bordering the tile's group.
    #[must_use]
    pub(crate) fn adjacent_roots(&self, id: TileId, kind: TileKind) -> Vec<TileId> {
        let members = self.group(id);
        let mut roots = Vec::new();
        for member in &members {
            let cell = self.cell(*member);
            for direction in ADJACENCY_ORDER {
                let Some(root) = cell.step(direction).and_then(|next| self.root_at(next)) else {
                    continue;
                };
                if self.kind(root) == kind && !members.contains(&root) && !roots.contains(&root) {
                    roots.push(root);
                }
            }
        }
        roots
    }

    /// Makes `child` a member of the group rooted at `parent`.
    pub(crate) fn link_parent(&mut self, child: TileId, parent: TileId) -> Result<(), GroupingError> {
        let cell = self.cell(child);
        let parent_cell = self.cell(parent);
        if child == parent {
            return Err(GroupingError::SelfParent { cell });
        }
        if self.links[child.0].parent.is_some() {
            return Err(GroupingError::AlreadyParented { cell });
        }
        if self.links[parent.0].parent.is_some() {
            return Err(GroupingError::ParentIsChild {
                cell,
                parent: parent_cell,
            });
        }
        if !self.links[child.0].children.is_empty() {
            return Err(GroupingError::ChildHasChildren { cell });
        }
        if self.links[parent.0].children.contains(&child) {
            return Err(GroupingError::DuplicateChild {
                cell,
                parent: parent_cell,
            });
        }

        self.links[child.0].parent = Some(parent);
        self.links[parent.0].children.push(child);
        Ok(())
    }
}

use derive_more::{derive::Constructor, Display, From};

/// Stable identity of a tile
///
/// Identifiers come from a monotonic counter owned by the grid and are never
/// reused. Clones of a grid keep the identifiers of the original, which makes
/// structural comparison between clones possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From)]
pub struct TileId(pub u32);

/// What occupies a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileKind {
    /// Placeholder without edges
    Spacer,
    /// Routing node splitting a multi-layer edge into single-layer hops
    Dummy,
    /// Application vertex, `vertex` is its insertion index in the owning graph
    Domain { vertex: usize },
    /// Application vertex with a caller-provided position
    Pinned {
        vertex: usize,
        layer: usize,
        row: usize,
    },
}

/// A directed edge between two tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Constructor)]
pub struct Edge {
    pub source: TileId,
    pub target: TileId,
}

/// A cell of the grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub(crate) id: TileId,
    pub(crate) kind: TileKind,
    pub(crate) layer: usize,
    pub(crate) row: usize,
    /// Sources of the incoming edges, in insertion order
    pub(crate) incoming: Vec<TileId>,
    /// Targets of the outgoing edges, in insertion order
    pub(crate) outgoing: Vec<TileId>,
}

impl Tile {
    pub(crate) fn new(id: TileId, kind: TileKind) -> Self {
        Self {
            id,
            kind,
            layer: 0,
            row: 0,
            incoming: Vec::new(),
            outgoing: Vec::new(),
        }
    }

    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn kind(&self) -> TileKind {
        self.kind
    }

    pub fn layer(&self) -> usize {
        self.layer
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn is_spacer(&self) -> bool {
        matches!(self.kind, TileKind::Spacer)
    }

    pub fn is_dummy(&self) -> bool {
        matches!(self.kind, TileKind::Dummy)
    }

    pub fn is_domain(&self) -> bool {
        matches!(self.kind, TileKind::Domain { .. } | TileKind::Pinned { .. })
    }

    /// Insertion index of the application vertex, if this is a domain tile
    pub fn vertex(&self) -> Option<usize> {
        match self.kind {
            TileKind::Domain { vertex } | TileKind::Pinned { vertex, .. } => Some(vertex),
            TileKind::Spacer | TileKind::Dummy => None,
        }
    }

    /// Fixed `(layer, row)` of a pinned vertex
    pub fn pin(&self) -> Option<(usize, usize)> {
        match self.kind {
            TileKind::Pinned { layer, row, .. } => Some((layer, row)),
            _ => None,
        }
    }

    pub fn incoming(&self) -> &[TileId] {
        &self.incoming
    }

    pub fn outgoing(&self) -> &[TileId] {
        &self.outgoing
    }
}

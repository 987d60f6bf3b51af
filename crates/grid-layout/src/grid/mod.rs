mod crossings;
mod dummies;
mod layers;
mod mutation;
mod packing;

use crate::geometry::Position;
use crate::tile::{Edge, Tile, TileId, TileKind};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Index, IndexMut};
use thiserror::Error;

pub use crossings::Fitness;

/// Errors that can occur while building or preparing a grid
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError<N>
where
    N: fmt::Debug,
{
    /// An edge refers to a vertex that was never added
    #[error("unknown vertex {0:?}")]
    UnknownVertex(N),

    /// The graph contains a cycle at the given vertex
    #[error("graph contains a cycle at vertex {0:?}")]
    GraphHasCycle(N),

    /// A pinned vertex sits at or before the layer of one of its predecessors
    #[error("vertex {vertex:?} is pinned to layer {layer} but needs at least layer {required}")]
    PinnedLayerConflict {
        vertex: N,
        layer: usize,
        required: usize,
    },

    /// Zero or several tiles without outgoing edges
    #[error("expected exactly one sink, found {0}")]
    NoUniqueSink(usize),
}

impl<N: fmt::Debug> LayoutError<N> {
    /// Translate the vertex carried by the error
    pub fn map_vertex<M, F>(self, f: F) -> LayoutError<M>
    where
        M: fmt::Debug,
        F: FnOnce(N) -> M,
    {
        match self {
            LayoutError::UnknownVertex(n) => LayoutError::UnknownVertex(f(n)),
            LayoutError::GraphHasCycle(n) => LayoutError::GraphHasCycle(f(n)),
            LayoutError::PinnedLayerConflict {
                vertex,
                layer,
                required,
            } => LayoutError::PinnedLayerConflict {
                vertex: f(vertex),
                layer,
                required,
            },
            LayoutError::NoUniqueSink(count) => LayoutError::NoUniqueSink(count),
        }
    }
}

/// Layered grid of tiles
///
/// Tiles live in an arena keyed by [`TileId`], layers store the ids in row
/// order. Edges are kept as id lists on both endpoints, so cloning a grid is
/// a plain copy and clones never share any state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    next_id: u32,
    tiles: BTreeMap<TileId, Tile>,
    layers: Vec<Vec<TileId>>,
    /// Domain tiles in vertex insertion order
    vertices: Vec<TileId>,
}

impl Index<TileId> for Grid {
    type Output = Tile;

    fn index(&self, id: TileId) -> &Tile {
        &self.tiles[&id]
    }
}

impl IndexMut<TileId> for Grid {
    fn index_mut(&mut self, id: TileId) -> &mut Tile {
        match self.tiles.get_mut(&id) {
            Some(tile) => tile,
            None => panic!("tile {id} is not part of the grid"),
        }
    }
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn new_tile(&mut self, kind: TileKind) -> TileId {
        let id = TileId(self.next_id);
        self.next_id += 1;
        self.tiles.insert(id, Tile::new(id, kind));
        id
    }

    pub(crate) fn add_vertex(&mut self, kind: TileKind) -> TileId {
        let id = self.new_tile(kind);
        self.vertices.push(id);
        id
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(&id)
    }

    pub fn tile_at(&self, layer: usize, row: usize) -> Option<&Tile> {
        let id = self.layers.get(layer)?.get(row)?;
        self.tiles.get(id)
    }

    pub fn position(&self, id: TileId) -> Position {
        let tile = &self[id];
        Position::new(tile.layer, tile.row)
    }

    /// Domain tiles in vertex insertion order
    pub fn vertices(&self) -> &[TileId] {
        &self.vertices
    }

    pub fn layers(&self) -> &[Vec<TileId>] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Number of rows, i.e. the size of the largest layer
    pub fn rows(&self) -> usize {
        self.layers.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_rectangular(&self) -> bool {
        let rows = self.rows();
        self.layers.iter().all(|layer| layer.len() == rows)
    }

    /// All edges, ordered by source id and then by insertion
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.tiles.values().flat_map(|tile| {
            tile.outgoing
                .iter()
                .map(move |&target| Edge::new(tile.id, target))
        })
    }

    pub fn edge_count(&self) -> usize {
        self.tiles.values().map(|tile| tile.outgoing.len()).sum()
    }

    /// Add an edge unless the same ordered pair is already connected
    pub(crate) fn add_edge(&mut self, source: TileId, target: TileId) -> bool {
        if self[source].outgoing.contains(&target) {
            return false;
        }
        self[source].outgoing.push(target);
        self[target].incoming.push(source);
        true
    }

    pub(crate) fn remove_edge(&mut self, source: TileId, target: TileId) {
        self[source].outgoing.retain(|&t| t != target);
        self[target].incoming.retain(|&s| s != source);
    }

    /// The dummy tile feeding into `id`, if any
    pub fn dummy_predecessor(&self, id: TileId) -> Option<TileId> {
        self[id]
            .incoming
            .iter()
            .copied()
            .find(|&pred| self[pred].is_dummy())
    }

    /// Dummy tiles feeding into `id`, walking backwards until a non-dummy
    pub fn corridor(&self, id: TileId) -> Vec<TileId> {
        let mut corridor = Vec::new();
        let mut current = id;
        while let Some(pred) = self.dummy_predecessor(current) {
            corridor.push(pred);
            current = pred;
        }
        corridor
    }

    /// Whether every corridor shares the row of the domain tile it leads to
    pub fn is_aligned(&self) -> bool {
        self.vertices.iter().all(|&v| {
            let row = self[v].row;
            self.corridor(v).iter().all(|&d| self[d].row == row)
        })
    }

    pub(crate) fn ensure_layers(&mut self, count: usize) {
        if self.layers.len() < count {
            self.layers.resize_with(count, Vec::new);
        }
    }

    /// Append a tile at the bottom of a layer
    pub(crate) fn push_to_layer(&mut self, layer: usize, id: TileId) {
        self.ensure_layers(layer + 1);
        let row = self.layers[layer].len();
        self.layers[layer].push(id);
        let tile = &mut self[id];
        tile.layer = layer;
        tile.row = row;
    }

    /// Pad every layer with spacers until it has `rows` rows
    pub(crate) fn pad_rows(&mut self, rows: usize) {
        for layer in 0..self.layers.len() {
            while self.layers[layer].len() < rows {
                let spacer = self.new_tile(TileKind::Spacer);
                self.push_to_layer(layer, spacer);
            }
        }
    }

    /// Put a tile into a cell, returning the previous occupant
    pub(crate) fn set_cell(&mut self, layer: usize, row: usize, id: TileId) -> TileId {
        let previous = std::mem::replace(&mut self.layers[layer][row], id);
        let tile = &mut self[id];
        tile.layer = layer;
        tile.row = row;
        previous
    }

    /// Replace a whole layer and update the positions of its tiles
    pub(crate) fn set_layer(&mut self, layer: usize, ids: Vec<TileId>) {
        self.layers[layer] = ids;
        self.reindex_layer(layer);
    }

    pub(crate) fn reindex_layer(&mut self, layer: usize) {
        for row in 0..self.layers[layer].len() {
            let id = self.layers[layer][row];
            let tile = &mut self[id];
            tile.layer = layer;
            tile.row = row;
        }
    }

    /// Swap two cells of a layer and update both positions
    pub(crate) fn swap_cells(&mut self, layer: usize, a: usize, b: usize) {
        self.layers[layer].swap(a, b);
        for row in [a, b] {
            let id = self.layers[layer][row];
            self[id].row = row;
        }
    }

    pub(crate) fn remove_tile(&mut self, id: TileId) {
        self.tiles.remove(&id);
    }

    fn is_spacer_row(&self, row: usize) -> bool {
        self.layers
            .iter()
            .all(|layer| layer.get(row).map_or(true, |&id| self[id].is_spacer()))
    }

    /// Delete a row if it only holds spacers in every layer
    ///
    /// Rows below the deleted one move up by one and keep their order.
    pub fn delete_row(&mut self, row: usize) -> bool {
        if row >= self.rows() || !self.is_spacer_row(row) {
            return false;
        }

        for layer in 0..self.layers.len() {
            if row < self.layers[layer].len() {
                let spacer = self.layers[layer].remove(row);
                self.tiles.remove(&spacer);
                self.reindex_layer(layer);
            }
        }
        true
    }

    /// Delete every row from `first` on holding only spacers, returns the
    /// number of deleted rows
    ///
    /// Rows above `first` are kept so that tiles in them do not move.
    pub(crate) fn prune_spacer_rows(&mut self, first: usize) -> usize {
        let mut deleted = 0;
        let mut row = self.rows();
        while row > first {
            row -= 1;
            if self.delete_row(row) {
                deleted += 1;
            }
        }
        deleted
    }

    /// Text dump of the grid, one line per row
    ///
    /// `label` turns a vertex insertion index into the text shown inside the
    /// domain tile.
    pub fn dump<F>(&self, label: F) -> GridDump<'_, F>
    where
        F: Fn(usize) -> String,
    {
        GridDump { grid: self, label }
    }
}

/// [`fmt::Display`] adaptor returned by [`Grid::dump`]
pub struct GridDump<'a, F> {
    grid: &'a Grid,
    label: F,
}

impl<F> GridDump<'_, F>
where
    F: Fn(usize) -> String,
{
    fn cell(&self, tile: &Tile) -> String {
        match tile.kind {
            TileKind::Spacer => " ".to_string(),
            TileKind::Dummy => format!("F{}", tile.id),
            TileKind::Domain { vertex } | TileKind::Pinned { vertex, .. } => {
                format!("D{}({})", tile.id, (self.label)(vertex))
            }
        }
    }
}

impl<F> fmt::Display for GridDump<'_, F>
where
    F: Fn(usize) -> String,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grid = self.grid;
        let cells: Vec<Vec<String>> = grid
            .layers
            .iter()
            .map(|layer| layer.iter().map(|&id| self.cell(&grid[id])).collect())
            .collect();
        let width = cells
            .iter()
            .flatten()
            .map(String::len)
            .chain((0..cells.len()).map(|layer| format!("S{layer}").len()))
            .max()
            .unwrap_or(1);

        write!(f, "   ")?;
        for layer in 0..cells.len() {
            write!(f, "{:>width$} ", format!("S{layer}"))?;
        }
        writeln!(f)?;

        for row in 0..grid.rows() {
            write!(f, "Z{row} ")?;
            for layer in &cells {
                let cell = layer.get(row).map(String::as_str).unwrap_or(" ");
                write!(f, "{cell:>width$} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

use crate::grid::{Fitness, Grid, LayoutError};
use crate::tile::{TileId, TileKind};
use crate::LayoutSearch;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use tracing::{debug, info};

/// Collects vertices and edges before the grid is laid out
///
/// Vertices are identified by an arbitrary payload key and keep their
/// insertion order, which drives the initial row order of the layout.
#[derive(Debug, Clone)]
pub struct GraphBuilder<T> {
    payloads: Vec<T>,
    index: HashMap<T, usize>,
    grid: Grid,
}

impl<T> Default for GraphBuilder<T> {
    fn default() -> Self {
        Self {
            payloads: Vec::new(),
            index: HashMap::new(),
            grid: Grid::new(),
        }
    }
}

impl<T> GraphBuilder<T>
where
    T: Eq + Hash + Clone + fmt::Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, payload: T, pin: Option<(usize, usize)>) -> &mut Self {
        if self.index.contains_key(&payload) {
            return self;
        }

        let vertex = self.payloads.len();
        let kind = match pin {
            Some((layer, row)) => TileKind::Pinned { vertex, layer, row },
            None => TileKind::Domain { vertex },
        };
        self.grid.add_vertex(kind);
        self.index.insert(payload.clone(), vertex);
        self.payloads.push(payload);
        self
    }

    /// Add a vertex, a payload that is already known is ignored
    pub fn add_vertex(&mut self, payload: T) -> &mut Self {
        self.insert(payload, None)
    }

    /// Add a vertex with a fixed position in the final grid
    pub fn add_pinned_vertex(&mut self, payload: T, layer: usize, row: usize) -> &mut Self {
        self.insert(payload, Some((layer, row)))
    }

    fn tile_of(&self, payload: &T) -> Result<TileId, LayoutError<T>> {
        self.index
            .get(payload)
            .map(|&vertex| self.grid.vertices()[vertex])
            .ok_or_else(|| LayoutError::UnknownVertex(payload.clone()))
    }

    /// Connect two known vertices, connecting the same pair twice is a no-op
    ///
    /// # Errors
    /// Returns [`LayoutError::UnknownVertex`] if either payload was never added
    pub fn add_edge(&mut self, source: &T, target: &T) -> Result<&mut Self, LayoutError<T>> {
        let source = self.tile_of(source)?;
        let target = self.tile_of(target)?;
        self.grid.add_edge(source, target);
        Ok(self)
    }

    /// Number of edges on the longest path from a source to `payload`
    pub fn longest_path_to_source(&self, payload: &T) -> Result<usize, LayoutError<T>> {
        let tile = self.tile_of(payload)?;
        self.grid
            .longest_path_to_source(tile)
            .map_err(|e| e.map_vertex(|id| payload_of(&self.grid, &self.payloads, id)))
    }

    /// Assign layers, split long edges into corridors and pack the rows
    ///
    /// # Errors
    /// Returns an error if the graph contains a cycle or if a pinned vertex
    /// cannot sit in its layer
    pub fn prepare(self) -> Result<Graph<T>, LayoutError<T>> {
        let Self {
            payloads,
            index,
            mut grid,
        } = self;
        grid.assign_layers()
            .map_err(|e| e.map_vertex(|id| payload_of(&grid, &payloads, id)))?;
        grid.add_dummies();
        grid.merge_dummies();
        grid.pack();

        debug!(
            "Prepared {} vertices into a {}x{} grid",
            payloads.len(),
            grid.layer_count(),
            grid.rows()
        );

        Ok(Graph {
            payloads,
            index,
            grid,
        })
    }
}

/// Payload of a domain tile referenced by an error
fn payload_of<T: Clone>(grid: &Grid, payloads: &[T], id: TileId) -> T {
    let vertex = grid[id].vertex().unwrap_or_default();
    payloads[vertex].clone()
}

/// A laid out graph, ready to be searched for a better arrangement
#[derive(Debug, Clone)]
pub struct Graph<T> {
    payloads: Vec<T>,
    index: HashMap<T, usize>,
    grid: Grid,
}

impl<T> Graph<T>
where
    T: Eq + Hash + Clone + fmt::Debug,
{
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// The domain tile of a payload
    pub fn tile_of(&self, payload: &T) -> Option<TileId> {
        self.index
            .get(payload)
            .map(|&vertex| self.grid.vertices()[vertex])
    }

    /// The payload carried by a tile, `None` for spacers and dummies
    pub fn payload(&self, id: TileId) -> Option<&T> {
        let vertex = self.grid.tile(id)?.vertex()?;
        self.payloads.get(vertex)
    }

    /// Payloads in insertion order
    pub fn payloads(&self) -> &[T] {
        &self.payloads
    }

    pub fn fitness(&self) -> Fitness {
        self.grid.fitness()
    }

    /// Move the only vertex without successors to the top row of its layer
    ///
    /// # Errors
    /// Returns [`LayoutError::NoUniqueSink`] if there is no sink or several
    pub fn promote_sink_to_top(&mut self) -> Result<bool, LayoutError<T>> {
        self.grid
            .promote_sink_to_top()
            .map_err(|e| e.map_vertex(|id| payload_of(&self.grid, &self.payloads, id)))
    }

    /// Replace the grid with the best arrangement the search finds
    pub fn optimize<S>(&mut self, search: &S) -> Fitness
    where
        S: LayoutSearch,
    {
        let before = self.grid.fitness();
        self.grid = search.search(&self.grid);
        let after = self.grid.fitness();
        info!("Optimized layout from {before} to {after}");
        after
    }
}

impl<T> fmt::Display for Graph<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dump = self.grid.dump(|vertex| self.payloads[vertex].to_string());
        write!(f, "{dump}")
    }
}

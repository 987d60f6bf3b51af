//! Grid layout for directed acyclic graphs
//!
//! This crate places the vertices of a DAG on a discrete grid of layers
//! (columns) and rows, Sugiyama style, and then searches for a row order
//! with few edge crossings and few bends. It is meant for text diagrams of
//! job dependency graphs, where every vertex takes exactly one cell.
//!
//! # Pipeline
//!
//! 1. [`GraphBuilder`] collects vertices (any hashable payload) and edges.
//! 2. [`GraphBuilder::prepare`] assigns layers by longest path, splits edges
//!    spanning several layers into corridors of dummy tiles, merges
//!    converging corridors and packs the rows so corridors run straight.
//! 3. A [`LayoutSearch`] engine ([`ShuffleSearch`] or [`GeneticSearch`])
//!    improves the row order, scored by [`Fitness`].
//!
//! # Example
//!
//! ```
//! use grid_layout::{GraphBuilder, ShuffleSearch};
//!
//! let mut builder = GraphBuilder::new();
//! builder.add_vertex("fetch").add_vertex("build").add_vertex("test");
//! builder.add_edge(&"fetch", &"build")?.add_edge(&"build", &"test")?;
//!
//! let mut graph = builder.prepare()?;
//! let fitness = graph.optimize(&ShuffleSearch::default());
//! assert_eq!(fitness.crossings, 0);
//!
//! // Walk the grid the way a renderer would
//! for layer in graph.grid().layers() {
//!     for &id in layer {
//!         let tile = &graph.grid()[id];
//!         if let Some(name) = graph.payload(id) {
//!             println!("{name} at row {}", tile.row());
//!         }
//!     }
//! }
//! # Ok::<(), grid_layout::LayoutError<&str>>(())
//! ```

mod engine;
mod geometry;
mod graph;
mod grid;
mod tile;

pub mod search;

pub use engine::LayoutSearch;
pub use geometry::{Position, Segment};
pub use graph::{Graph, GraphBuilder};
pub use grid::{Fitness, Grid, GridDump, LayoutError};
pub use search::{GeneticSearch, ShuffleSearch};
pub use tile::{Edge, Tile, TileId, TileKind};

use crate::Grid;

/// A search strategy improving the row order of a prepared grid
///
/// Implementations never touch the input grid, they work on clones and hand
/// back the best arrangement they found. Layers, tiles and edges of the
/// returned grid are the same as the input's, only rows differ.
pub trait LayoutSearch {
    /// Search for a better arrangement of `grid`
    fn search(&self, grid: &Grid) -> Grid;
}

use super::{Grid, LayoutError};
use crate::tile::TileId;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use std::collections::HashMap;
use tracing::debug;

impl Grid {
    /// Order the domain tiles so that every edge points forward
    fn topological_order(&self) -> Result<Vec<TileId>, LayoutError<TileId>> {
        let mut graph = DiGraphMap::new();
        for &vertex in &self.vertices {
            graph.add_node(vertex);
        }
        for &vertex in &self.vertices {
            for &succ in &self[vertex].outgoing {
                graph.add_edge(vertex, succ, ());
            }
        }

        toposort(&graph, None).map_err(|cycle| LayoutError::GraphHasCycle(cycle.node_id()))
    }

    /// Longest path from a source for every domain tile
    ///
    /// Sources get 0, every other tile gets one more than its deepest
    /// predecessor. With `honor_pins`, pinned tiles keep their fixed layer and
    /// their successors are measured from it.
    fn longest_paths(
        &self,
        honor_pins: bool,
    ) -> Result<HashMap<TileId, usize>, LayoutError<TileId>> {
        let order = self.topological_order()?;
        let mut depth: HashMap<TileId, usize> = HashMap::with_capacity(order.len());

        for vertex in order {
            let tile = &self[vertex];
            let required = tile
                .incoming
                .iter()
                .map(|pred| depth.get(pred).map_or(0, |&d| d + 1))
                .max()
                .unwrap_or(0);

            let layer = match tile.pin() {
                Some((layer, _)) if honor_pins => {
                    if layer < required {
                        return Err(LayoutError::PinnedLayerConflict {
                            vertex,
                            layer,
                            required,
                        });
                    }
                    layer
                }
                _ => required,
            };
            depth.insert(vertex, layer);
        }

        Ok(depth)
    }

    /// Number of edges on the longest path from any source to `vertex`
    ///
    /// Pins are ignored, this is the purely structural distance.
    pub fn longest_path_to_source(&self, vertex: TileId) -> Result<usize, LayoutError<TileId>> {
        if self.tile(vertex).map_or(true, |tile| !tile.is_domain()) {
            return Err(LayoutError::UnknownVertex(vertex));
        }
        let depth = self.longest_paths(false)?;
        Ok(depth.get(&vertex).copied().unwrap_or(0))
    }

    /// Put every domain tile into the layer given by its longest path
    ///
    /// Tiles are appended in vertex insertion order, rows are provisional
    /// until packing.
    pub(crate) fn assign_layers(&mut self) -> Result<(), LayoutError<TileId>> {
        let depth = self.longest_paths(true)?;

        self.layers.clear();
        for i in 0..self.vertices.len() {
            let vertex = self.vertices[i];
            let layer = depth.get(&vertex).copied().unwrap_or(0);
            self.push_to_layer(layer, vertex);
        }

        debug!(
            "Assigned {} vertices to {} layers",
            self.vertices.len(),
            self.layers.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TileKind;
    use test_log::test;

    fn grid_with(count: usize, edges: &[(usize, usize)]) -> (Grid, Vec<TileId>) {
        let mut grid = Grid::new();
        let ids: Vec<TileId> = (0..count)
            .map(|vertex| grid.add_vertex(TileKind::Domain { vertex }))
            .collect();
        for &(s, t) in edges {
            grid.add_edge(ids[s], ids[t]);
        }
        (grid, ids)
    }

    #[test]
    fn test_layers_follow_longest_path() {
        let (mut grid, ids) = grid_with(4, &[(0, 1), (1, 2), (0, 3), (3, 2)]);
        grid.assign_layers().unwrap();
        assert_eq!(grid[ids[0]].layer(), 0);
        assert_eq!(grid[ids[1]].layer(), 1);
        assert_eq!(grid[ids[3]].layer(), 1);
        assert_eq!(grid[ids[2]].layer(), 2);
        assert_eq!(grid.layers()[1], vec![ids[1], ids[3]]);
    }

    #[test]
    fn test_isolated_vertex_is_a_source() {
        let (mut grid, ids) = grid_with(3, &[(0, 1)]);
        grid.assign_layers().unwrap();
        assert_eq!(grid[ids[2]].layer(), 0);
        assert_eq!(grid.layers()[0], vec![ids[0], ids[2]]);
    }

    #[test]
    fn test_cycle_is_reported() {
        let (mut grid, _) = grid_with(3, &[(0, 1), (1, 2), (2, 0)]);
        assert!(matches!(
            grid.assign_layers(),
            Err(LayoutError::GraphHasCycle(_))
        ));
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let (mut grid, ids) = grid_with(1, &[(0, 0)]);
        assert_eq!(
            grid.assign_layers(),
            Err(LayoutError::GraphHasCycle(ids[0]))
        );
    }

    #[test]
    fn test_pinned_layer_conflict() {
        let mut grid = Grid::new();
        let a = grid.add_vertex(TileKind::Domain { vertex: 0 });
        let b = grid.add_vertex(TileKind::Domain { vertex: 1 });
        let c = grid.add_vertex(TileKind::Pinned {
            vertex: 2,
            layer: 1,
            row: 0,
        });
        grid.add_edge(a, b);
        grid.add_edge(b, c);
        assert_eq!(
            grid.assign_layers(),
            Err(LayoutError::PinnedLayerConflict {
                vertex: c,
                layer: 1,
                required: 2,
            })
        );
    }

    #[test]
    fn test_longest_path_to_source_rejects_unknown_tiles() {
        let (grid, _) = grid_with(2, &[(0, 1)]);
        assert_eq!(
            grid.longest_path_to_source(TileId(42)),
            Err(LayoutError::UnknownVertex(TileId(42)))
        );
    }
}

use super::Grid;
use crate::tile::{Edge, TileId, TileKind};
use tracing::{debug, trace};

impl Grid {
    /// Split every edge spanning more than one layer into a chain of dummies
    ///
    /// Afterwards every edge connects two adjacent layers and all layers are
    /// padded with spacers to the same number of rows. Returns the number of
    /// dummies created.
    pub(crate) fn add_dummies(&mut self) -> usize {
        let long_edges: Vec<Edge> = self
            .vertices
            .iter()
            .flat_map(|&source| {
                self[source]
                    .outgoing
                    .iter()
                    .map(move |&target| Edge::new(source, target))
            })
            .filter(|edge| self[edge.target].layer > self[edge.source].layer + 1)
            .collect();

        let mut created = 0;
        for edge in long_edges {
            self.remove_edge(edge.source, edge.target);

            let mut previous = edge.source;
            for layer in self[edge.source].layer + 1..self[edge.target].layer {
                let dummy = self.new_tile(TileKind::Dummy);
                self.push_to_layer(layer, dummy);
                self.add_edge(previous, dummy);
                previous = dummy;
                created += 1;
            }
            self.add_edge(previous, edge.target);
            trace!("Split {edge:?} into a corridor ending at {previous}");
        }

        let rows = self.rows();
        self.pad_rows(rows);

        debug!("Added {created} dummies, grid is {rows} rows high");
        created
    }

    /// Collapse converging dummies so every vertex has a single corridor
    ///
    /// Returns the number of dummies that were merged away.
    pub(crate) fn merge_dummies(&mut self) -> usize {
        let mut merged = 0;
        for i in 0..self.vertices.len() {
            let vertex = self.vertices[i];
            merged += self.merge_into(vertex);
        }
        debug!("Merged {merged} dummies");
        merged
    }

    fn merge_into(&mut self, target: TileId) -> usize {
        let dummies: Vec<TileId> = self[target]
            .incoming
            .iter()
            .copied()
            .filter(|&pred| self[pred].is_dummy())
            .collect();

        let Some((&primary, rest)) = dummies.split_first() else {
            return 0;
        };
        if rest.is_empty() {
            return 0;
        }

        for &dummy in rest {
            for succ in self[dummy].outgoing.clone() {
                self.remove_edge(dummy, succ);
                self.add_edge(primary, succ);
            }
            for pred in self[dummy].incoming.clone() {
                self.remove_edge(pred, dummy);
                self.add_edge(pred, primary);
            }

            let (layer, row) = (self[dummy].layer, self[dummy].row);
            let spacer = self.new_tile(TileKind::Spacer);
            self.set_cell(layer, row, spacer);
            self.remove_tile(dummy);
            trace!("Merged dummy {dummy} into {primary}");
        }

        // The merged sources may converge again one layer further up
        rest.len() + self.merge_into(primary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn layered(count: usize, edges: &[(usize, usize)]) -> (Grid, Vec<TileId>) {
        let mut grid = Grid::new();
        let ids: Vec<TileId> = (0..count)
            .map(|vertex| grid.add_vertex(TileKind::Domain { vertex }))
            .collect();
        for &(s, t) in edges {
            grid.add_edge(ids[s], ids[t]);
        }
        grid.assign_layers().unwrap();
        (grid, ids)
    }

    fn assert_unit_edges(grid: &Grid) {
        for edge in grid.edges() {
            assert_eq!(
                grid[edge.target].layer(),
                grid[edge.source].layer() + 1,
                "{edge:?} spans more than one layer"
            );
        }
    }

    #[test]
    fn test_long_edge_becomes_a_corridor() {
        // 0 -> 1 -> 2 -> 3 and 0 -> 3
        let (mut grid, ids) = layered(4, &[(0, 1), (1, 2), (2, 3), (0, 3)]);
        assert_eq!(grid.add_dummies(), 2);
        assert_unit_edges(&grid);
        assert!(grid.is_rectangular());
        assert_eq!(grid.rows(), 2);

        let corridor = grid.corridor(ids[3]);
        assert_eq!(corridor.len(), 2);
        assert_eq!(grid[corridor[1]].incoming(), &[ids[0]]);
        assert_eq!(grid[ids[3]].incoming().len(), 2);
    }

    #[test]
    fn test_converging_corridors_are_merged() {
        // 0 -> 1 -> 2 -> 3, plus 4 -> 3 and 5 -> 3 which both span three layers
        let (mut grid, ids) = layered(6, &[(0, 1), (1, 2), (2, 3), (4, 3), (5, 3)]);
        assert_eq!(grid.add_dummies(), 4);
        let edges_before = grid.edge_count();

        assert_eq!(grid.merge_dummies(), 2);
        assert_unit_edges(&grid);
        assert!(grid.is_rectangular());

        let dummies: Vec<TileId> = grid[ids[3]]
            .incoming()
            .iter()
            .copied()
            .filter(|&pred| grid[pred].is_dummy())
            .collect();
        assert_eq!(dummies.len(), 1);

        let corridor = grid.corridor(ids[3]);
        assert_eq!(corridor.len(), 2);
        let head = grid[corridor[1]].incoming().to_vec();
        assert!(head.contains(&ids[4]) && head.contains(&ids[5]));
        // Two dummies and their two duplicate edges are gone
        assert_eq!(grid.edge_count(), edges_before - 2);
        assert_eq!(grid.edges().filter(|e| grid[e.source].is_dummy()).count(), 2);
    }

    #[test]
    fn test_single_corridor_is_left_alone() {
        let (mut grid, _) = layered(4, &[(0, 1), (1, 2), (2, 3), (0, 3)]);
        grid.add_dummies();
        let before = grid.clone();
        assert_eq!(grid.merge_dummies(), 0);
        assert_eq!(grid, before);
    }
}

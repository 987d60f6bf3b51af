use super::DEFAULT_SEED;
use crate::{Grid, LayoutSearch};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// Greedy hill climbing by shuffling the layers where edges cross
///
/// Each attempt shuffles every layer that receives a crossing edge, one
/// layer at a time. A shuffle is kept when the number of crossings did not
/// grow, otherwise the last kept arrangement is restored.
#[derive(Debug, Clone)]
pub struct ShuffleSearch {
    /// Maximum number of rounds over the crossing layers
    pub max_attempts: usize,

    /// Seed of the random generator, equal seeds give equal layouts
    pub seed: u64,
}

impl Default for ShuffleSearch {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            seed: DEFAULT_SEED,
        }
    }
}

impl ShuffleSearch {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }
}

impl LayoutSearch for ShuffleSearch {
    fn search(&self, grid: &Grid) -> Grid {
        let mut best = grid.clone();
        let mut best_crossings = best.crossings();
        if best_crossings == 0 {
            return best;
        }

        let mut rng = Pcg32::seed_from_u64(self.seed);
        let mut current = best.clone();

        for attempt in 0..self.max_attempts {
            let layers: BTreeSet<usize> = current
                .crossing_edges()
                .iter()
                .map(|edge| current[edge.target].layer())
                .collect();

            for layer in layers {
                shuffle_layer(&mut current, layer, &mut rng);
                let crossings = current.crossings();
                if crossings <= best_crossings {
                    trace!("Attempt {attempt}: layer {layer} shuffled to {crossings} crossings");
                    best = current.clone();
                    best_crossings = crossings;
                } else {
                    current = best.clone();
                }

                if best_crossings == 0 {
                    debug!("Removed all crossings after {} attempts", attempt + 1);
                    return best;
                }
            }
        }

        debug!(
            "Gave up after {} attempts with {best_crossings} crossings",
            self.max_attempts
        );
        best
    }
}

/// Fisher-Yates shuffle of a layer made of corridor-preserving swaps
///
/// Swaps the grid refuses are skipped, so corridors stay aligned.
fn shuffle_layer<R>(grid: &mut Grid, layer: usize, rng: &mut R)
where
    R: Rng + ?Sized,
{
    let rows = grid.layers()[layer].len();
    for i in (1..rows).rev() {
        let j = rng.random_range(0..=i);
        if i != j {
            grid.swap_tiles(layer, i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GraphBuilder;
    use test_log::test;

    fn crossed_plan() -> Grid {
        let mut graph = GraphBuilder::new();
        for v in ["start", "save", "info", "dbva", "frel", "ende"] {
            graph.add_vertex(v);
        }
        for (s, t) in [
            ("start", "save"),
            ("start", "dbva"),
            ("save", "frel"),
            ("dbva", "info"),
            ("info", "ende"),
            ("frel", "ende"),
        ] {
            graph.add_edge(&s, &t).unwrap();
        }
        graph.prepare().unwrap().grid().clone()
    }

    #[test]
    fn test_uncrossed_grid_is_returned_as_is() {
        let mut graph = GraphBuilder::new();
        graph.add_vertex(1).add_vertex(2);
        graph.add_edge(&1, &2).unwrap();
        let grid = graph.prepare().unwrap().grid().clone();
        assert_eq!(ShuffleSearch::default().search(&grid), grid);
    }

    #[test]
    fn test_shuffle_removes_crossings() {
        let grid = crossed_plan();
        assert_eq!(grid.crossings(), 2);

        let best = ShuffleSearch::new(11).search(&grid);
        assert_eq!(best.crossings(), 0);
        assert!(best.is_aligned());
        assert_eq!(grid.crossings(), 2, "input grid must not change");
    }

    #[test]
    fn test_same_seed_same_layout() {
        let grid = crossed_plan();
        let search = ShuffleSearch::new(5);
        assert_eq!(search.search(&grid), search.search(&grid));
    }

    #[test]
    fn test_never_worse_than_input() {
        let grid = crossed_plan();
        let search = ShuffleSearch {
            max_attempts: 1,
            seed: 1,
        };
        assert!(search.search(&grid).crossings() <= grid.crossings());
    }
}

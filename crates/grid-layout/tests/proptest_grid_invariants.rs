//! Property tests for the structural invariants of prepared grids
//!
//! Random DAGs are generated by only allowing edges from a lower to a higher
//! vertex number.

use grid_layout::{Graph, GraphBuilder, Grid, LayoutSearch, ShuffleSearch};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::collections::HashSet;

fn build(count: usize, edges: &[(usize, usize)]) -> GraphBuilder<usize> {
    let mut builder = GraphBuilder::new();
    for v in 0..count {
        builder.add_vertex(v);
    }
    for &(a, b) in edges {
        let (a, b) = (a % count, b % count);
        if a < b {
            builder.add_edge(&a, &b).unwrap();
        }
    }
    builder
}

fn dag() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1usize..12).prop_flat_map(|count| {
        (
            Just(count),
            prop::collection::vec((0..count, 0..count), 0..24),
        )
    })
}

fn prepared(count: usize, edges: &[(usize, usize)]) -> Graph<usize> {
    build(count, edges).prepare().unwrap()
}

fn assert_structure(grid: &Grid) {
    assert!(grid.is_rectangular());
    assert!(grid.is_aligned());
    for edge in grid.edges() {
        assert_eq!(grid[edge.target].layer(), grid[edge.source].layer() + 1);
    }
    for (layer, ids) in grid.layers().iter().enumerate() {
        for (row, &id) in ids.iter().enumerate() {
            assert_eq!(grid.position(id), grid_layout::Position::new(layer, row));
        }
    }
}

proptest! {
    #[test]
    fn prepared_grids_are_well_formed((count, edges) in dag()) {
        let graph = prepared(count, &edges);
        let grid = graph.grid();
        assert_structure(grid);

        // Every vertex is placed exactly once
        let placed: Vec<_> = grid
            .layers()
            .iter()
            .flatten()
            .filter(|&&id| grid[id].is_domain())
            .collect();
        prop_assert_eq!(placed.len(), count);
        let unique: HashSet<_> = placed.iter().collect();
        prop_assert_eq!(unique.len(), count);

        // No row is made of spacers only
        for row in 0..grid.rows() {
            prop_assert!(grid.layers().iter().any(|layer| !grid[layer[row]].is_spacer()));
        }
    }

    #[test]
    fn layers_follow_longest_paths((count, edges) in dag()) {
        let builder = build(count, &edges);
        let depths: Vec<usize> = (0..count)
            .map(|v| builder.longest_path_to_source(&v).unwrap())
            .collect();
        let graph = builder.prepare().unwrap();
        for v in 0..count {
            let tile = graph.tile_of(&v).unwrap();
            prop_assert_eq!(graph.grid()[tile].layer(), depths[v]);
        }
        for &(a, b) in &edges {
            let (a, b) = (a % count, b % count);
            if a < b {
                prop_assert!(depths[a] < depths[b]);
            }
        }
    }

    #[test]
    fn refused_swaps_change_nothing(
        (count, edges) in dag(),
        layer in 0usize..12,
        from in 0usize..12,
        to in 0usize..12,
    ) {
        let mut graph = prepared(count, &edges);
        let before = graph.grid().clone();
        if graph.grid_mut().swap_tiles(layer, from, to) {
            assert_structure(graph.grid());
        } else {
            prop_assert_eq!(graph.grid(), &before);
        }
    }

    #[test]
    fn mutation_keeps_structure((count, edges) in dag(), seed in any::<u64>()) {
        let graph = prepared(count, &edges);
        let original = graph.grid().clone();
        let mut clone = original.clone();
        let mut rng = Pcg32::seed_from_u64(seed);
        for _ in 0..20 {
            clone.mutate(&mut rng);
        }
        assert_structure(&clone);
        prop_assert_eq!(clone.edges().collect::<Vec<_>>(), original.edges().collect::<Vec<_>>());
        // The original never sees the clone's moves
        prop_assert_eq!(graph.grid(), &original);
    }

    #[test]
    fn shuffle_search_never_adds_crossings((count, edges) in dag(), seed in any::<u64>()) {
        let graph = prepared(count, &edges);
        let search = ShuffleSearch { max_attempts: 5, seed };
        let best = search.search(graph.grid());
        assert_structure(&best);
        prop_assert!(best.crossings() <= graph.grid().crossings());
    }
}

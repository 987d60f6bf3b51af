use super::Grid;
use crate::geometry::Segment;
use crate::tile::Edge;
use derive_more::derive::Constructor;
use std::collections::BTreeSet;
use std::fmt;

/// Quality of a layout, lower is better
///
/// Ordering is lexicographic: fewer crossings always win, line switches only
/// break ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Constructor)]
pub struct Fitness {
    /// Number of edges crossing at least one other edge
    pub crossings: usize,
    /// Number of edges whose end points sit in different rows
    pub line_switches: usize,
}

impl Fitness {
    pub const PERFECT: Fitness = Fitness {
        crossings: 0,
        line_switches: 0,
    };
}

impl fmt::Display for Fitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} crossings, {} line switches",
            self.crossings, self.line_switches
        )
    }
}

impl Grid {
    /// All edges crossing at least one other edge leaving the same layer
    pub fn crossing_edges(&self) -> BTreeSet<Edge> {
        let mut crossing = BTreeSet::new();

        for layer in &self.layers {
            let segments: Vec<(Edge, Segment)> = layer
                .iter()
                .flat_map(|&source| {
                    self[source].outgoing.iter().map(move |&target| {
                        (
                            Edge::new(source, target),
                            Segment::new(self.position(source), self.position(target)),
                        )
                    })
                })
                .collect();

            for (i, (edge, segment)) in segments.iter().enumerate() {
                for (other_edge, other_segment) in &segments[i + 1..] {
                    if segment.crosses(other_segment) {
                        crossing.insert(*edge);
                        crossing.insert(*other_edge);
                    }
                }
            }
        }

        crossing
    }

    pub fn crossings(&self) -> usize {
        self.crossing_edges().len()
    }

    pub fn line_switches(&self) -> usize {
        self.edges()
            .filter(|edge| self[edge.source].row != self[edge.target].row)
            .count()
    }

    pub fn fitness(&self) -> Fitness {
        Fitness::new(self.crossings(), self.line_switches())
    }
}

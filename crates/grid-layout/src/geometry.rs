use derive_more::derive::Constructor;

/// Discrete grid coordinate, `layer` is the horizontal axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Constructor)]
pub struct Position {
    pub layer: usize,
    pub row: usize,
}

/// Straight segment between two grid positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Constructor)]
pub struct Segment {
    pub from: Position,
    pub to: Position,
}

impl Segment {
    /// Whether the two segments intersect strictly inside both of them
    ///
    /// Touching at an end point, overlapping collinear segments and parallel
    /// segments never count as an intersection.
    pub fn crosses(&self, other: &Segment) -> bool {
        let (x1, y1) = coords(self.from);
        let (x2, y2) = coords(self.to);
        let (x3, y3) = coords(other.from);
        let (x4, y4) = coords(other.to);

        let denominator = (y4 - y3) * (x2 - x1) - (x4 - x3) * (y2 - y1);
        if denominator == 0 {
            return false;
        }

        let ua = ((x4 - x3) * (y1 - y3) - (y4 - y3) * (x1 - x3)) as f64 / denominator as f64;
        let ub = ((x2 - x1) * (y1 - y3) - (y2 - y1) * (x1 - x3)) as f64 / denominator as f64;

        ua > 0.0 && ua < 1.0 && ub > 0.0 && ub < 1.0
    }
}

fn coords(p: Position) -> (i64, i64) {
    (p.layer as i64, p.row as i64)
}

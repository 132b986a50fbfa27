//! Ordered, per-direction comparison of frame sequences

use crate::diff::{diff_tokens, render};
use crate::frame::{Direction, FrameSequence};

/// Outcome of comparing one direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionComparison {
    pub direction: Direction,
    pub expected: Vec<String>,
    pub actual: Vec<String>,
    pub equal: bool,
    /// First position at which the two sequences disagree
    pub first_divergence: Option<usize>,
    /// Rendered diff, present only when `equal` is false
    pub diff: Option<String>,
}

/// Outcome of comparing both directions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub sent: DirectionComparison,
    pub recv: DirectionComparison,
}

impl Comparison {
    pub fn passed(&self) -> bool {
        self.sent.equal && self.recv.equal
    }

    pub fn direction(&self, direction: Direction) -> &DirectionComparison {
        match direction {
            Direction::Sent => &self.sent,
            Direction::Recv => &self.recv,
        }
    }

    /// Directions that did not match, in reporting order
    pub fn failures(&self) -> impl Iterator<Item = &DirectionComparison> {
        [&self.sent, &self.recv].into_iter().filter(|d| !d.equal)
    }
}

/// Compare reference (`expected`) and candidate (`actual`) traces
pub fn compare(expected: &FrameSequence, actual: &FrameSequence) -> Comparison {
    Comparison {
        sent: compare_direction(
            Direction::Sent,
            &expected.hexes(Direction::Sent),
            &actual.hexes(Direction::Sent),
        ),
        recv: compare_direction(
            Direction::Recv,
            &expected.hexes(Direction::Recv),
            &actual.hexes(Direction::Recv),
        ),
    }
}

/// Compare two ordered payload lists for one direction
///
/// Equal means same length and same payload at every position.
pub fn compare_direction<S: AsRef<str>>(
    direction: Direction,
    expected: &[S],
    actual: &[S],
) -> DirectionComparison {
    let expected: Vec<String> = expected.iter().map(|s| s.as_ref().to_string()).collect();
    let actual: Vec<String> = actual.iter().map(|s| s.as_ref().to_string()).collect();

    let equal = expected.join("\n") == actual.join("\n");

    let (first_divergence, diff) = if equal {
        (None, None)
    } else {
        let first = expected
            .iter()
            .zip(actual.iter())
            .position(|(e, a)| e != a)
            .unwrap_or_else(|| expected.len().min(actual.len()));
        let entries = diff_tokens(&expected, &actual);
        (Some(first), Some(render(&entries, "reference", "candidate")))
    };

    DirectionComparison {
        direction,
        expected,
        actual,
        equal,
        first_divergence,
        diff,
    }
}

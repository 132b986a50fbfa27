//! Parity run results

use crate::error::{HarnessError, HarnessResult};
use parity_trace::{Comparison, Direction, DirectionComparison, FrameSequence};
use std::fmt;

/// One direction whose reference and candidate sequences differ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceMismatch {
    pub direction: Direction,
    pub expected_count: usize,
    pub actual_count: usize,
    pub first_divergence: Option<usize>,
    pub diff: String,
}

impl From<&DirectionComparison> for SequenceMismatch {
    fn from(cmp: &DirectionComparison) -> Self {
        Self {
            direction: cmp.direction,
            expected_count: cmp.expected.len(),
            actual_count: cmp.actual.len(),
            first_divergence: cmp.first_divergence,
            diff: cmp.diff.clone().unwrap_or_default(),
        }
    }
}

impl fmt::Display for SequenceMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames do not match (reference {}, candidate {}",
            self.direction, self.expected_count, self.actual_count
        )?;
        if let Some(pos) = self.first_divergence {
            write!(f, ", first divergence at frame {}", pos)?;
        }
        f.write_str(")")
    }
}

/// Everything a completed parity run found
#[derive(Debug)]
pub struct ParityReport {
    pub reference_label: String,
    pub candidate_label: String,
    /// Priority position of the candidate discovery chose
    pub candidate_index: usize,
    pub reference: FrameSequence,
    pub candidate: FrameSequence,
    pub comparison: Comparison,
}

impl ParityReport {
    /// True iff both directions are equal
    pub fn passed(&self) -> bool {
        self.comparison.passed()
    }

    /// (reference, candidate) frame counts for one direction
    pub fn counts(&self, direction: Direction) -> (usize, usize) {
        (
            self.reference.count(direction),
            self.candidate.count(direction),
        )
    }

    /// One entry per direction that failed, SENT before RECV
    pub fn mismatches(&self) -> Vec<SequenceMismatch> {
        self.comparison
            .failures()
            .map(SequenceMismatch::from)
            .collect()
    }

    /// Turn a failing report into a `Mismatch` error
    pub fn into_result(self) -> HarnessResult<Self> {
        let mismatches = self.mismatches();
        if mismatches.is_empty() {
            Ok(self)
        } else {
            Err(HarnessError::Mismatch { mismatches })
        }
    }

    /// Print a summary of the comparison
    pub fn print_summary(&self) {
        println!("\n=== Frame Parity Summary ===");
        println!("Reference: {}", self.reference_label);
        println!(
            "Candidate: {} (candidate #{})",
            self.candidate_label,
            self.candidate_index + 1
        );
        println!();

        for direction in Direction::ALL {
            let cmp = self.comparison.direction(direction);
            let (reference, candidate) = self.counts(direction);
            if cmp.equal {
                println!(
                    "✅ {} - PASS (reference {}, candidate {})",
                    direction, reference, candidate
                );
            } else {
                println!(
                    "❌ {} - FAIL (reference {}, candidate {})",
                    direction, reference, candidate
                );
                if let Some(diff) = &cmp.diff {
                    for line in diff.lines() {
                        println!("   {}", line);
                    }
                }
            }
        }

        println!();
        if self.passed() {
            println!("✅ Frame sequences match");
        } else {
            println!("❌ {} direction(s) differ", self.mismatches().len());
        }
    }
}

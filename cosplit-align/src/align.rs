//! Two-pointer alignment scan
//!
//! Walks the actual and expected split strings in lockstep. Matching
//! characters advance both sides; a boundary marker on only one side is
//! either reconciled with a nearby marker on the other side (an infix
//! difference) or counted as a false positive/negative. Plain character
//! mismatches are tolerated a bounded number of times in a row.

use crate::error::{AlignError, Result};
use crate::outcome::Alignment;

/// Canonical split marker used by test sets
pub const BOUNDARY_MARKER: char = '_';

/// Lookahead window for infixes, also the number of consecutive plain
/// mismatches that make two strings unreconcilable
pub const INFIX_TOLERANCE: usize = 4;

/// Alignment scorer for a given marker and infix tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aligner {
    marker: char,
    infix_tolerance: usize,
}

impl Default for Aligner {
    fn default() -> Self {
        Self::new(BOUNDARY_MARKER, INFIX_TOLERANCE)
    }
}

impl Aligner {
    /// Create an aligner
    pub const fn new(marker: char, infix_tolerance: usize) -> Self {
        Self {
            marker,
            infix_tolerance,
        }
    }

    /// Score `actual` against `expected`
    ///
    /// Indices in [`AlignError::Misaligned`] are character (not byte)
    /// positions.
    pub fn score(&self, actual: &str, expected: &str) -> Result<Alignment> {
        let actual: Vec<char> = actual.chars().collect();
        let expected: Vec<char> = expected.chars().collect();

        let mut i = 0;
        let mut j = 0;
        let mut tolerance = self.infix_tolerance;
        let mut alignment = Alignment::default();

        loop {
            match (i >= actual.len(), j >= expected.len()) {
                (true, true) => return Ok(alignment),
                (true, false) | (false, true) => {
                    return Err(AlignError::Misaligned {
                        actual_index: i,
                        expected_index: j,
                    })
                }
                (false, false) => {}
            }

            let a = actual[i];
            let e = expected[j];

            if a == e {
                if a == self.marker {
                    alignment.true_positives += 1;
                }
                i += 1;
                j += 1;
                tolerance = self.infix_tolerance;
            } else if a == self.marker {
                // actual split early, expected may re-insert an infix first
                match self.lookahead_after(&actual, i, &expected[j..]) {
                    0 => alignment.false_positives += 1,
                    skip => {
                        alignment.true_positives += 1;
                        j += skip;
                    }
                }
                i += 1;
            } else if e == self.marker {
                match self.lookahead_after(&expected, j, &actual[i..]) {
                    0 => alignment.false_negatives += 1,
                    skip => {
                        alignment.true_positives += 1;
                        i += skip;
                    }
                }
                j += 1;
            } else {
                tolerance = tolerance.saturating_sub(1);
                if tolerance == 0 {
                    return Err(AlignError::Misaligned {
                        actual_index: i,
                        expected_index: j,
                    });
                }
                i += 1;
                j += 1;
            }
        }
    }

    /// Look for the marker at `split[at]` in `ahead`, keyed on the
    /// character that follows it
    fn lookahead_after(&self, split: &[char], at: usize, ahead: &[char]) -> usize {
        split
            .get(at + 1)
            .map_or(0, |&next| self.lookahead(next, ahead))
    }

    /// Scan the first `infix_tolerance` characters of `ahead` for a marker
    /// immediately followed by `next`
    ///
    /// Returns the offset just past that marker, or 0 when there is none.
    pub fn lookahead(&self, next: char, ahead: &[char]) -> usize {
        ahead
            .iter()
            .take(self.infix_tolerance)
            .enumerate()
            .find(|&(k, &c)| c == self.marker && ahead.get(k + 1) == Some(&next))
            .map_or(0, |(k, _)| k + 1)
    }
}

/// Score with the default marker and tolerance
pub fn score(actual: &str, expected: &str) -> Result<Alignment> {
    Aligner::default().score(actual, expected)
}

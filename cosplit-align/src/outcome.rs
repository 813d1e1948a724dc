//! Per-word alignment tallies and their classification

/// Boundary tallies for one aligned word
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Alignment {
    /// Expected boundaries the candidate missed
    pub false_negatives: usize,
    /// Candidate boundaries absent from the expected split
    pub false_positives: usize,
    /// Boundaries present in both splits
    pub true_positives: usize,
}

/// Word-level classification of an alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitOutcome {
    /// Every expected boundary was found and nothing else
    CorrectlySplit,
    /// Non-compound left unsplit
    PassedThrough,
    /// At least one boundary was invented
    IncorrectlySplit,
    /// No invented boundaries, but some expected ones are missing
    MissedSplit,
}

impl Alignment {
    /// Create an alignment from raw counts
    pub fn new(false_negatives: usize, false_positives: usize, true_positives: usize) -> Self {
        Self {
            false_negatives,
            false_positives,
            true_positives,
        }
    }

    /// `(false_negatives, false_positives, true_positives)`
    pub fn as_tuple(&self) -> (usize, usize, usize) {
        (
            self.false_negatives,
            self.false_positives,
            self.true_positives,
        )
    }

    /// Whether the gold standard contains at least one boundary
    pub fn is_compound(&self) -> bool {
        self.true_positives > 0 || self.false_negatives > 0
    }

    /// Classify the word
    pub fn outcome(&self) -> SplitOutcome {
        match (self.false_negatives, self.false_positives, self.true_positives) {
            (0, 0, 0) => SplitOutcome::PassedThrough,
            (0, 0, _) => SplitOutcome::CorrectlySplit,
            (_, fp, _) if fp > 0 => SplitOutcome::IncorrectlySplit,
            _ => SplitOutcome::MissedSplit,
        }
    }
}

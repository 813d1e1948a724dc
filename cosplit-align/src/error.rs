//! Alignment error types (deterministic only)

use std::fmt;

/// Errors raised while aligning two split strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlignError {
    /// The strings do not describe the same underlying word
    Misaligned {
        /// Character index reached in the actual split
        actual_index: usize,
        /// Character index reached in the expected split
        expected_index: usize,
    },
}

impl fmt::Display for AlignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignError::Misaligned {
                actual_index,
                expected_index,
            } => write!(
                f,
                "misaligned at actual index {actual_index}, expected index {expected_index}"
            ),
        }
    }
}

impl std::error::Error for AlignError {}

/// Result type for alignment operations
pub type Result<T> = std::result::Result<T, AlignError>;

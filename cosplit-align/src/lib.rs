//! Boundary alignment scoring for compound splits
//!
//! Compares a candidate segmentation of a word against a gold-standard
//! segmentation. Both are plain strings in which a reserved boundary marker
//! (`_` by default) denotes a split point, e.g. `kwaliteits_controle`.
//!
//! The scan classifies every split point as a true positive, false positive
//! or false negative. Linking infixes that one side re-inserts at a boundary
//! (`huis_jacht` against `huizen_jacht`) are tolerated inside a small
//! lookahead window; larger divergence surfaces as [`AlignError::Misaligned`].
//!
//! # Example
//!
//! ```rust
//! use cosplit_align::{score, SplitOutcome};
//!
//! let alignment = score("huis_jacht", "huizen_jacht").unwrap();
//! assert_eq!(alignment.as_tuple(), (0, 0, 1));
//! assert_eq!(alignment.outcome(), SplitOutcome::CorrectlySplit);
//! ```

#![warn(missing_docs)]

pub mod align;
pub mod error;
pub mod outcome;

pub use align::{score, Aligner, BOUNDARY_MARKER, INFIX_TOLERANCE};
pub use error::{AlignError, Result};
pub use outcome::{Alignment, SplitOutcome};

//! Input handling module

pub mod glob_resolver;
pub mod test_set;

pub use glob_resolver::resolve_patterns;
pub use test_set::{load_test_set, load_test_sets};

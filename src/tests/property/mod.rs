//! Property-based tests.
//!
//! - `chapter_props`: chapter list derivation
//!   - Output is strictly ascending (sorted, no duplicates)
//!   - Only keys that parse as positive integers contribute
//!   - Every listed chapter resolves to its text
//!   - The next unwritten chapter is never already written
//!
//! By default proptest runs 256 cases per property; override with
//! `PROPTEST_CASES`.

mod chapter_props;

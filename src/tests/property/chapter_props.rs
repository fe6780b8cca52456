//! Property-based tests for chapter list derivation
//!
//! Tests invariants:
//! - Output is strictly ascending
//! - Every output number comes from a key that parses to it
//! - Every positive numeric key is present in the output
//! - Every listed chapter resolves to its text
//! - The next unwritten chapter is absent and everything below it is present

use std::collections::BTreeMap;

use proptest::prelude::*;

use crate::core::api::ProjectState;
use crate::core::derive::{chapter_numbers, next_unwritten_chapter};

// ============================================================================
// Strategies for generating test inputs
// ============================================================================

/// Chapter keys as a backend might produce them, including junk.
fn arb_key() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => (0u32..60).prop_map(|n| n.to_string()),
        1 => (1u32..60).prop_map(|n| format!("0{n}")),
        1 => (1u32..60).prop_map(|n| format!(" {n} ")),
        1 => Just("-1".to_string()),
        1 => Just("1.5".to_string()),
        1 => Just(String::new()),
        1 => "[a-z]{1,8}",
    ]
}

fn arb_project() -> impl Strategy<Value = ProjectState> {
    prop::collection::vec(arb_key(), 0..30).prop_map(|keys| {
        let chapters: BTreeMap<String, String> =
            keys.into_iter().map(|k| (k, "text".to_string())).collect();
        ProjectState {
            chapters,
            ..ProjectState::default()
        }
    })
}

fn parsed(key: &str) -> Option<u32> {
    key.trim().parse::<u32>().ok().filter(|n| *n > 0)
}

proptest! {
    #[test]
    fn prop_strictly_ascending(project in arb_project()) {
        let numbers = chapter_numbers(&project);
        prop_assert!(numbers.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn prop_only_numeric_keys_contribute(project in arb_project()) {
        let numbers = chapter_numbers(&project);
        for n in &numbers {
            prop_assert!(*n > 0);
            prop_assert!(project.chapters.keys().any(|k| parsed(k) == Some(*n)));
        }
        for key in project.chapters.keys() {
            if let Some(n) = parsed(key) {
                prop_assert!(numbers.contains(&n));
            }
        }
    }

    #[test]
    fn prop_listed_chapters_have_text(project in arb_project()) {
        for n in chapter_numbers(&project) {
            prop_assert!(project.chapter_text(n).is_some(), "chapter {} has no text", n);
        }
    }

    #[test]
    fn prop_next_unwritten_is_first_gap(project in arb_project()) {
        let numbers = chapter_numbers(&project);
        let next = next_unwritten_chapter(&project);
        prop_assert!(next >= 1);
        prop_assert!(!numbers.contains(&next));
        for n in 1..next {
            prop_assert!(numbers.contains(&n));
        }
    }
}

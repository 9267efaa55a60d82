//! Test assertions for item outcomes.

use serde_json::Value;

use crate::runner::ItemOutcome;

/// Asserts that the item was extracted.
pub fn assert_item_succeeded(outcome: &ItemOutcome) {
    assert!(
        outcome.is_success(),
        "Expected item {} to succeed, got: {:?}",
        outcome.index,
        outcome.result
    );
}

/// Asserts that the item failed.
pub fn assert_item_failed(outcome: &ItemOutcome) {
    assert!(
        !outcome.is_success(),
        "Expected item {} to fail, got: {:?}",
        outcome.index,
        outcome.result
    );
}

/// Asserts that a successful item holds `expected` under `name`.
pub fn assert_item_field(outcome: &ItemOutcome, name: &str, expected: &Value) {
    assert_item_succeeded(outcome);
    let actual = outcome.item().and_then(|item| item.get(name));
    assert_eq!(
        actual,
        Some(expected),
        "Unexpected value for '{}' in item {}",
        name,
        outcome.index
    );
}

//! Custom Test Assertions
//!
//! Assertion helpers for domain types that give more meaningful failure
//! messages than bare `assert_eq!`.

use core_kernel::Money;
use domain_claims::{ClaimStatus, ClaimTimelineEntry, TRANSITIONS};
use rust_decimal::Decimal;

/// Asserts a Money amount, ignoring scale (`1200` equals `1200.00`)
pub fn assert_money_eq(actual: &Money, expected: Decimal) {
    assert_eq!(
        actual.amount(),
        expected,
        "Money amount mismatch: actual={}, expected={} {}",
        actual,
        expected,
        actual.currency().code()
    );
}

/// Asserts that a Money value is zero
pub fn assert_money_zero(money: &Money) {
    assert!(
        money.is_zero(),
        "Expected zero money, got {} {}",
        money.currency().symbol(),
        money.amount()
    );
}

/// Asserts that a timeline is a connected walk over table edges
///
/// The first entry must leave `pending_validation`, each entry must start
/// where the previous one ended, and timestamps must never go backwards.
pub fn assert_timeline_chain(entries: &[ClaimTimelineEntry]) {
    let mut current = ClaimStatus::PendingValidation;
    let mut last_at = None;

    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(
            entry.previous_status, current,
            "Timeline entry {} starts at {} but the claim was {}",
            i, entry.previous_status, current
        );
        assert!(
            TRANSITIONS
                .iter()
                .any(|rule| rule.from == entry.previous_status && rule.to == entry.new_status),
            "Timeline entry {} records {} -> {}, which is not a workflow edge",
            i,
            entry.previous_status,
            entry.new_status
        );
        if let Some(last) = last_at {
            assert!(
                entry.changed_at >= last,
                "Timeline entry {} at {} precedes the previous entry at {}",
                i,
                entry.changed_at,
                last
            );
        }
        current = entry.new_status;
        last_at = Some(entry.changed_at);
    }
}

/// Asserts the sequence of statuses a timeline walked through
pub fn assert_status_path(entries: &[ClaimTimelineEntry], expected: &[ClaimStatus]) {
    let path: Vec<ClaimStatus> = entries.iter().map(|e| e.new_status).collect();
    assert_eq!(path, expected, "Unexpected status path");
}

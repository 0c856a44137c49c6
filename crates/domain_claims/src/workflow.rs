//! Claim status lifecycle and the transition table
//!
//! Every allowed edge of the claims state machine, together with the role
//! that may drive it, is listed once in [`TRANSITIONS`]. Nothing else in the
//! crate decides whether a status change is legal.
//!
//! ```text
//!                       ┌──────────────── rejected ◄───────────── (any non-terminal)
//!                       │
//! pending_validation ─► in_review ─► approved ─► liquidated ─► paid
//!        ▲                  │
//!        │                  ▼
//!        └──────── requires_changes   (resubmitted by the reporting custodian)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{Actor, Role, UserId};
use crate::error::ClaimError;

/// Claim status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Reported by a custodian, waiting for a manager to pick it up
    PendingValidation,
    /// Under review by a manager
    InReview,
    /// Sent back to the reporting custodian for corrections
    RequiresChanges,
    /// Approved for settlement
    Approved,
    /// Settlement amount computed
    Liquidated,
    /// Settlement paid out (terminal)
    Paid,
    /// Rejected (terminal)
    Rejected,
}

impl ClaimStatus {
    pub const ALL: [ClaimStatus; 7] = [
        ClaimStatus::PendingValidation,
        ClaimStatus::InReview,
        ClaimStatus::RequiresChanges,
        ClaimStatus::Approved,
        ClaimStatus::Liquidated,
        ClaimStatus::Paid,
        ClaimStatus::Rejected,
    ];

    /// Returns the snake_case name used on the wire and in storage
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::PendingValidation => "pending_validation",
            ClaimStatus::InReview => "in_review",
            ClaimStatus::RequiresChanges => "requires_changes",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Liquidated => "liquidated",
            ClaimStatus::Paid => "paid",
            ClaimStatus::Rejected => "rejected",
        }
    }

    /// Terminal states have no outgoing edges
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClaimStatus::Paid | ClaimStatus::Rejected)
    }

    /// True once a settlement amount has been fixed
    pub fn is_settled(&self) -> bool {
        matches!(self, ClaimStatus::Liquidated | ClaimStatus::Paid)
    }

    /// Days a claim may sit in this status before it counts as overdue
    pub fn overdue_threshold_days(&self) -> Option<i64> {
        match self {
            ClaimStatus::RequiresChanges => Some(8),
            ClaimStatus::InReview => Some(30),
            ClaimStatus::Liquidated => Some(2),
            _ => None,
        }
    }

    /// Statuses reachable from this one in a single transition
    pub fn allowed_targets(&self) -> Vec<ClaimStatus> {
        TRANSITIONS
            .iter()
            .filter(|rule| rule.from == *self)
            .map(|rule| rule.to)
            .collect()
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClaimStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ClaimError::validation(format!("unknown claim status '{}'", s)))
    }
}

/// Who may drive a given edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredRole {
    /// Any manager
    Manager,
    /// The custodian who originally reported the claim, and nobody else
    ReportingCustodian,
}

/// One allowed edge of the claims state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub from: ClaimStatus,
    pub to: ClaimStatus,
    pub required: RequiredRole,
}

const fn rule(from: ClaimStatus, to: ClaimStatus, required: RequiredRole) -> TransitionRule {
    TransitionRule { from, to, required }
}

/// The complete edge set
///
/// Rejection is allowed from every non-terminal status.
pub const TRANSITIONS: &[TransitionRule] = {
    use ClaimStatus::*;
    use RequiredRole::*;
    &[
        rule(PendingValidation, InReview, Manager),
        rule(InReview, Approved, Manager),
        rule(InReview, RequiresChanges, Manager),
        rule(RequiresChanges, PendingValidation, ReportingCustodian),
        rule(Approved, Liquidated, Manager),
        rule(Liquidated, Paid, Manager),
        rule(PendingValidation, Rejected, Manager),
        rule(InReview, Rejected, Manager),
        rule(RequiresChanges, Rejected, Manager),
        rule(Approved, Rejected, Manager),
        rule(Liquidated, Rejected, Manager),
    ]
};

/// Looks up the edge `from -> to`
pub fn find_rule(from: ClaimStatus, to: ClaimStatus) -> Option<&'static TransitionRule> {
    TRANSITIONS.iter().find(|rule| rule.from == from && rule.to == to)
}

/// Validates that `actor` may move a claim reported by `reported_by` from
/// `from` to `to`
///
/// The edge is checked before the role, so a request out of a terminal state
/// is always an invalid transition regardless of who sends it.
pub fn authorize_transition(
    from: ClaimStatus,
    to: ClaimStatus,
    actor: &Actor,
    reported_by: UserId,
) -> Result<&'static TransitionRule, ClaimError> {
    let rule = find_rule(from, to).ok_or(ClaimError::InvalidTransition { from, to })?;

    match (rule.required, actor.role) {
        (RequiredRole::Manager, Role::Manager) => Ok(rule),
        (RequiredRole::ReportingCustodian, Role::Custodian) if actor.user_id == reported_by => Ok(rule),
        (RequiredRole::ReportingCustodian, Role::Custodian) => Err(ClaimError::unauthorized(format!(
            "only the reporting custodian may move a claim from {} to {}",
            from, to
        ))),
        (required, role) => Err(ClaimError::unauthorized(format!(
            "role {} may not move a claim from {} to {} (requires {:?})",
            role, from, to, required
        ))),
    }
}

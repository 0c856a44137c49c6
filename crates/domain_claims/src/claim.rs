//! Claim aggregate

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Actor, AssetId, ClaimId, Money, PolicyId, UserId};
use crate::error::ClaimError;
use crate::workflow::{authorize_transition, ClaimStatus};

/// Formats a human claim number, e.g. `SIN-2026-000042`
pub fn format_claim_number(year: i32, sequence: u32) -> String {
    format!("SIN-{}-{:06}", year, sequence)
}

/// Data supplied by a custodian when reporting a claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewClaim {
    pub policy_id: PolicyId,
    pub asset_id: AssetId,
    pub description: String,
    pub incident_date: NaiveDate,
    pub incident_location: Option<String>,
    pub estimate: Money,
}

/// A claim against a policy for damage to or loss of an asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Unique identifier
    pub id: ClaimId,
    /// Human claim number, immutable once assigned
    pub claim_number: String,
    pub policy_id: PolicyId,
    pub asset_id: AssetId,
    pub status: ClaimStatus,
    pub description: String,
    pub incident_date: NaiveDate,
    pub incident_location: Option<String>,
    /// Estimated loss reported by the custodian
    pub estimate: Money,
    /// Settlement amount, present only once liquidated
    pub settlement: Option<Money>,
    /// Custodian who reported the claim
    pub reported_by: UserId,
    /// Manager handling the claim
    pub assigned_to: Option<UserId>,
    pub rejection_reason: Option<String>,
    pub payment_date: Option<NaiveDate>,
    /// When the claim entered its current status
    pub status_changed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency counter, bumped on every write
    pub version: i64,
}

impl Claim {
    /// Creates a claim in `pending_validation`
    pub fn report(
        new: NewClaim,
        claim_number: String,
        reported_by: UserId,
        reported_at: DateTime<Utc>,
    ) -> Result<Self, ClaimError> {
        if new.description.trim().is_empty() {
            return Err(ClaimError::validation("description must not be empty"));
        }
        if new.estimate.is_negative() {
            return Err(ClaimError::validation("estimate must not be negative"));
        }
        if new.incident_date > reported_at.date_naive() {
            return Err(ClaimError::validation(format!(
                "incident date {} is after the report date {}",
                new.incident_date,
                reported_at.date_naive()
            )));
        }

        Ok(Self {
            id: ClaimId::new(),
            claim_number,
            policy_id: new.policy_id,
            asset_id: new.asset_id,
            status: ClaimStatus::PendingValidation,
            description: new.description.trim().to_string(),
            incident_date: new.incident_date,
            incident_location: new.incident_location,
            estimate: new.estimate.round_to_currency(),
            settlement: None,
            reported_by,
            assigned_to: None,
            rejection_reason: None,
            payment_date: None,
            status_changed_at: reported_at,
            created_at: reported_at,
            updated_at: reported_at,
            version: 1,
        })
    }

    /// Returns true if the table has an edge from the current status
    pub fn can_transition_to(&self, target: ClaimStatus) -> bool {
        self.status.allowed_targets().contains(&target)
    }

    /// Applies a transition in memory and returns the previous status
    ///
    /// The caller persists the result with the pre-transition version.
    pub fn apply_transition(
        &mut self,
        request: &TransitionRequest,
        actor: &Actor,
        at: DateTime<Utc>,
    ) -> Result<ClaimStatus, ClaimError> {
        let from = self.status;
        let to = request.target;
        authorize_transition(from, to, actor, self.reported_by)?;

        if request.settlement.is_some() && to != ClaimStatus::Liquidated {
            return Err(ClaimError::InvalidSettlement(format!(
                "a settlement amount is only accepted when liquidating, not for {}",
                to
            )));
        }

        match to {
            ClaimStatus::Liquidated => {
                let settlement = self.validated_settlement(request.settlement)?;
                self.settlement = Some(settlement);
            }
            ClaimStatus::Rejected => {
                self.settlement = None;
                self.rejection_reason = request
                    .rejection_reason
                    .as_ref()
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty());
            }
            ClaimStatus::Paid => {
                self.payment_date = Some(at.date_naive());
            }
            _ => {}
        }

        self.status = to;
        self.status_changed_at = at;
        self.updated_at = at;
        self.version += 1;
        Ok(from)
    }

    fn validated_settlement(&self, requested: Option<Money>) -> Result<Money, ClaimError> {
        let settlement = requested.unwrap_or(self.estimate).round_to_currency();
        if settlement.is_negative() {
            return Err(ClaimError::InvalidSettlement(format!(
                "settlement {} is negative",
                settlement
            )));
        }
        if settlement.exceeds(&self.estimate)? {
            return Err(ClaimError::InvalidSettlement(format!(
                "settlement {} exceeds the estimate {}",
                settlement, self.estimate
            )));
        }
        Ok(settlement)
    }

    /// Sets the handling manager
    pub fn assign_to(&mut self, manager: UserId, at: DateTime<Utc>) -> Result<(), ClaimError> {
        if self.status.is_terminal() {
            return Err(ClaimError::ClaimClosed(self.claim_number.clone()));
        }
        self.assigned_to = Some(manager);
        self.updated_at = at.max(self.updated_at);
        self.version += 1;
        Ok(())
    }

    /// Whole days spent in the current status
    pub fn days_in_current_status(&self, now: DateTime<Utc>) -> i64 {
        (now - self.status_changed_at).num_days().max(0)
    }

    /// True when the claim sat in its status longer than the status allows
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status
            .overdue_threshold_days()
            .map(|threshold| self.days_in_current_status(now) > threshold)
            .unwrap_or(false)
    }

    /// Users interested in changes to this claim
    pub fn stakeholders(&self) -> Vec<UserId> {
        let mut users = vec![self.reported_by];
        users.extend(self.assigned_to);
        users
    }
}

/// A request to move a claim to another status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub target: ClaimStatus,
    /// Settlement for `liquidated`; defaults to the estimate
    pub settlement: Option<Money>,
    /// Reason recorded on `rejected`
    pub rejection_reason: Option<String>,
    /// Free-text notes stored on the timeline entry
    pub notes: Option<String>,
}

impl TransitionRequest {
    pub fn to(target: ClaimStatus) -> Self {
        Self {
            target,
            settlement: None,
            rejection_reason: None,
            notes: None,
        }
    }

    pub fn with_settlement(mut self, amount: Money) -> Self {
        self.settlement = Some(amount);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.rejection_reason = Some(reason.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn reported_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    fn claim_with_estimate(amount: rust_decimal::Decimal) -> (Claim, UserId) {
        let reporter = UserId::new();
        let new = NewClaim {
            policy_id: PolicyId::new(),
            asset_id: AssetId::new(),
            description: "Projector fell from ceiling mount".to_string(),
            incident_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            incident_location: Some("Building B, room 204".to_string()),
            estimate: Money::new(amount, Currency::USD),
        };
        let claim = Claim::report(new, format_claim_number(2026, 1), reporter, reported_at()).unwrap();
        (claim, reporter)
    }

    fn drive(claim: &mut Claim, path: &[ClaimStatus]) {
        let manager = Actor::manager(UserId::new());
        for (i, status) in path.iter().enumerate() {
            let at = reported_at() + Duration::hours(i as i64 + 1);
            claim.apply_transition(&TransitionRequest::to(*status), &manager, at).unwrap();
        }
    }

    #[test]
    fn test_report_starts_pending() {
        let (claim, reporter) = claim_with_estimate(dec!(500));
        assert_eq!(claim.status, ClaimStatus::PendingValidation);
        assert_eq!(claim.claim_number, "SIN-2026-000001");
        assert_eq!(claim.reported_by, reporter);
        assert_eq!(claim.version, 1);
        assert!(claim.settlement.is_none());
    }

    #[test]
    fn test_report_rejects_future_incident() {
        let new = NewClaim {
            policy_id: PolicyId::new(),
            asset_id: AssetId::new(),
            description: "Water damage".to_string(),
            incident_date: NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(),
            incident_location: None,
            estimate: Money::new(dec!(10), Currency::USD),
        };
        let result = Claim::report(new, "SIN-2026-000002".into(), UserId::new(), reported_at());
        assert!(matches!(result, Err(ClaimError::Validation(_))));
    }

    #[test]
    fn test_liquidation_defaults_to_estimate() {
        let (mut claim, _) = claim_with_estimate(dec!(750.00));
        drive(&mut claim, &[ClaimStatus::InReview, ClaimStatus::Approved, ClaimStatus::Liquidated]);
        assert_eq!(claim.settlement.unwrap().amount(), dec!(750.00));
        assert_eq!(claim.version, 4);
    }

    #[test]
    fn test_settlement_above_estimate_is_rejected() {
        let (mut claim, _) = claim_with_estimate(dec!(750.00));
        drive(&mut claim, &[ClaimStatus::InReview, ClaimStatus::Approved]);

        let request = TransitionRequest::to(ClaimStatus::Liquidated)
            .with_settlement(Money::new(dec!(750.01), Currency::USD));
        let result = claim.apply_transition(&request, &Actor::manager(UserId::new()), reported_at());

        assert!(matches!(result, Err(ClaimError::InvalidSettlement(_))));
        assert_eq!(claim.status, ClaimStatus::Approved);
        assert!(claim.settlement.is_none());
    }

    #[test]
    fn test_settlement_in_other_currency_is_rejected() {
        let (mut claim, _) = claim_with_estimate(dec!(750.00));
        drive(&mut claim, &[ClaimStatus::InReview, ClaimStatus::Approved]);

        let request = TransitionRequest::to(ClaimStatus::Liquidated)
            .with_settlement(Money::new(dec!(100), Currency::EUR));
        let result = claim.apply_transition(&request, &Actor::manager(UserId::new()), reported_at());
        assert!(matches!(result, Err(ClaimError::InvalidSettlement(_))));
    }

    #[test]
    fn test_paid_sets_payment_date() {
        let (mut claim, _) = claim_with_estimate(dec!(80));
        drive(
            &mut claim,
            &[ClaimStatus::InReview, ClaimStatus::Approved, ClaimStatus::Liquidated, ClaimStatus::Paid],
        );
        assert_eq!(claim.payment_date, Some(reported_at().date_naive()));
        assert!(claim.settlement.is_some());
    }

    #[test]
    fn test_rejecting_liquidated_claim_clears_settlement() {
        let (mut claim, _) = claim_with_estimate(dec!(80));
        drive(&mut claim, &[ClaimStatus::InReview, ClaimStatus::Approved, ClaimStatus::Liquidated]);

        let request = TransitionRequest::to(ClaimStatus::Rejected).with_reason("  duplicate claim ");
        claim
            .apply_transition(&request, &Actor::manager(UserId::new()), reported_at())
            .unwrap();

        assert!(claim.settlement.is_none());
        assert_eq!(claim.rejection_reason.as_deref(), Some("duplicate claim"));
    }

    #[test]
    fn test_overdue_thresholds() {
        let (mut claim, _) = claim_with_estimate(dec!(80));
        let start = reported_at();
        assert!(!claim.is_overdue(start + Duration::days(365)));

        drive(&mut claim, &[ClaimStatus::InReview]);
        let entered = claim.status_changed_at;
        assert!(!claim.is_overdue(entered + Duration::days(30)));
        assert!(claim.is_overdue(entered + Duration::days(31)));
    }

    #[test]
    fn test_assign_on_closed_claim_fails() {
        let (mut claim, _) = claim_with_estimate(dec!(80));
        drive(&mut claim, &[ClaimStatus::Rejected]);
        let result = claim.assign_to(UserId::new(), reported_at());
        assert!(matches!(result, Err(ClaimError::ClaimClosed(_))));
    }
}

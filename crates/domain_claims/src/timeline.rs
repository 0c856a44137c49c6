//! Append-only audit timeline of status changes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use core_kernel::{Actor, ClaimId, RequestContext, Role, TimelineEntryId, UserId};
use crate::claim::Claim;
use crate::workflow::ClaimStatus;

/// One recorded status change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimTimelineEntry {
    pub id: TimelineEntryId,
    pub claim_id: ClaimId,
    pub previous_status: ClaimStatus,
    pub new_status: ClaimStatus,
    pub changed_by: UserId,
    pub actor_role: Role,
    pub changed_at: DateTime<Utc>,
    pub ip_address: Option<IpAddr>,
    pub user_agent: Option<String>,
    pub notes: Option<String>,
}

impl ClaimTimelineEntry {
    /// Records the transition that just moved `claim` out of `previous`
    ///
    /// The entry takes the claim's `updated_at`, which the transition already
    /// clamped to be no earlier than the previous change.
    pub fn record(
        claim: &Claim,
        previous: ClaimStatus,
        actor: &Actor,
        context: &RequestContext,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: TimelineEntryId::new(),
            claim_id: claim.id,
            previous_status: previous,
            new_status: claim.status,
            changed_by: actor.user_id,
            actor_role: actor.role,
            changed_at: claim.updated_at,
            ip_address: context.ip_address,
            user_agent: context.user_agent.clone(),
            notes: notes.filter(|n| !n.trim().is_empty()),
        }
    }
}

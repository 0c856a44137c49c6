//! Persistence port for the claims domain

use async_trait::async_trait;

use core_kernel::{ClaimId, DomainPort, PolicyId, PortError};
use crate::claim::Claim;
use crate::document::ClaimDocument;
use crate::timeline::ClaimTimelineEntry;

/// Storage for claims, their timelines and documents
///
/// Writes to an existing claim are guarded by the claim's `version`: the
/// store only accepts the write when the stored version equals
/// `expected_version`, and otherwise returns [`PortError::Conflict`].
#[async_trait]
pub trait ClaimStore: DomainPort {
    /// Whether `policy_id` names a policy claims may be filed against
    async fn policy_exists(&self, policy_id: PolicyId) -> Result<bool, PortError>;

    /// Loads a claim by id
    async fn load_claim(&self, id: ClaimId) -> Result<Claim, PortError>;

    /// Persists a freshly reported claim
    async fn insert_claim(&self, claim: &Claim) -> Result<(), PortError>;

    /// Writes the claim and appends its timeline entry as one atomic unit
    async fn save_claim_with_timeline_entry(
        &self,
        claim: &Claim,
        entry: &ClaimTimelineEntry,
        expected_version: i64,
    ) -> Result<(), PortError>;

    /// Writes non-status changes to a claim (assignment)
    async fn update_claim(&self, claim: &Claim, expected_version: i64) -> Result<(), PortError>;

    /// Timeline of a claim, ascending by timestamp
    async fn timeline(&self, claim_id: ClaimId) -> Result<Vec<ClaimTimelineEntry>, PortError>;

    async fn save_document(&self, document: &ClaimDocument) -> Result<(), PortError>;

    async fn documents(&self, claim_id: ClaimId) -> Result<Vec<ClaimDocument>, PortError>;

    /// Next claim number sequence for a calendar year, starting at 1
    async fn next_claim_sequence(&self, year: i32) -> Result<u32, PortError>;

    /// Every claim not in a terminal status
    async fn list_open_claims(&self) -> Result<Vec<Claim>, PortError>;
}

/// In-memory store for tests and local development
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use tokio::sync::Mutex;

    #[derive(Debug, Default)]
    struct State {
        policies: HashSet<PolicyId>,
        claims: HashMap<ClaimId, Claim>,
        timeline: Vec<ClaimTimelineEntry>,
        documents: Vec<ClaimDocument>,
        sequences: HashMap<i32, u32>,
    }

    /// Keeps everything behind one mutex so a claim write and its timeline
    /// entry land together
    #[derive(Debug, Default)]
    pub struct InMemoryClaimStore {
        state: Mutex<State>,
    }

    impl InMemoryClaimStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Store that already knows the given policies
        pub fn with_policies(policies: impl IntoIterator<Item = PolicyId>) -> Self {
            let state = State {
                policies: policies.into_iter().collect(),
                ..State::default()
            };
            Self { state: Mutex::new(state) }
        }

        pub async fn register_policy(&self, policy_id: PolicyId) {
            self.state.lock().await.policies.insert(policy_id);
        }

        /// Stores a claim as-is, bypassing validation (test seeding)
        pub async fn seed(&self, claim: Claim) {
            self.state.lock().await.claims.insert(claim.id, claim);
        }

        fn check_version(stored: &Claim, expected_version: i64) -> Result<(), PortError> {
            if stored.version != expected_version {
                return Err(PortError::conflict(format!(
                    "claim {} is at version {}, expected {}",
                    stored.claim_number, stored.version, expected_version
                )));
            }
            Ok(())
        }
    }

    impl DomainPort for InMemoryClaimStore {}

    #[async_trait]
    impl ClaimStore for InMemoryClaimStore {
        async fn policy_exists(&self, policy_id: PolicyId) -> Result<bool, PortError> {
            Ok(self.state.lock().await.policies.contains(&policy_id))
        }

        async fn load_claim(&self, id: ClaimId) -> Result<Claim, PortError> {
            self.state
                .lock()
                .await
                .claims
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Claim", id))
        }

        async fn insert_claim(&self, claim: &Claim) -> Result<(), PortError> {
            let mut state = self.state.lock().await;
            if state.claims.values().any(|c| c.claim_number == claim.claim_number) {
                return Err(PortError::conflict(format!(
                    "claim number {} already exists",
                    claim.claim_number
                )));
            }
            state.claims.insert(claim.id, claim.clone());
            Ok(())
        }

        async fn save_claim_with_timeline_entry(
            &self,
            claim: &Claim,
            entry: &ClaimTimelineEntry,
            expected_version: i64,
        ) -> Result<(), PortError> {
            let mut state = self.state.lock().await;
            let stored = state
                .claims
                .get(&claim.id)
                .ok_or_else(|| PortError::not_found("Claim", claim.id))?;
            Self::check_version(stored, expected_version)?;

            state.claims.insert(claim.id, claim.clone());
            state.timeline.push(entry.clone());
            Ok(())
        }

        async fn update_claim(&self, claim: &Claim, expected_version: i64) -> Result<(), PortError> {
            let mut state = self.state.lock().await;
            let stored = state
                .claims
                .get(&claim.id)
                .ok_or_else(|| PortError::not_found("Claim", claim.id))?;
            Self::check_version(stored, expected_version)?;

            state.claims.insert(claim.id, claim.clone());
            Ok(())
        }

        async fn timeline(&self, claim_id: ClaimId) -> Result<Vec<ClaimTimelineEntry>, PortError> {
            let state = self.state.lock().await;
            let mut entries: Vec<_> = state
                .timeline
                .iter()
                .filter(|e| e.claim_id == claim_id)
                .cloned()
                .collect();
            entries.sort_by_key(|e| e.changed_at);
            Ok(entries)
        }

        async fn save_document(&self, document: &ClaimDocument) -> Result<(), PortError> {
            self.state.lock().await.documents.push(document.clone());
            Ok(())
        }

        async fn documents(&self, claim_id: ClaimId) -> Result<Vec<ClaimDocument>, PortError> {
            let state = self.state.lock().await;
            Ok(state
                .documents
                .iter()
                .filter(|d| d.claim_id == claim_id)
                .cloned()
                .collect())
        }

        async fn next_claim_sequence(&self, year: i32) -> Result<u32, PortError> {
            let mut state = self.state.lock().await;
            let next = state.sequences.entry(year).or_insert(0);
            *next += 1;
            Ok(*next)
        }

        async fn list_open_claims(&self) -> Result<Vec<Claim>, PortError> {
            let state = self.state.lock().await;
            let mut open: Vec<_> = state
                .claims
                .values()
                .filter(|c| !c.status.is_terminal())
                .cloned()
                .collect();
            open.sort_by(|a, b| a.claim_number.cmp(&b.claim_number));
            Ok(open)
        }
    }
}

//! Claims Workflow Domain
//!
//! This crate implements the lifecycle of a claim against a campus asset
//! policy, from the custodian's report through review, liquidation and
//! payment, with an append-only timeline of every status change.
//!
//! # Claim Lifecycle
//!
//! ```text
//! pending_validation -> in_review -> approved -> liquidated -> paid
//!                           |
//!                           +-> requires_changes -> pending_validation
//! (any non-terminal) -> rejected
//! ```

pub mod claim;
pub mod document;
pub mod error;
pub mod ports;
pub mod service;
pub mod timeline;
pub mod workflow;

pub use claim::{format_claim_number, Claim, NewClaim, TransitionRequest};
pub use document::{ClaimDocument, DocumentType, NewDocument};
pub use error::ClaimError;
pub use ports::ClaimStore;
pub use service::ClaimWorkflowService;
pub use timeline::ClaimTimelineEntry;
pub use workflow::{ClaimStatus, RequiredRole, TransitionRule, TRANSITIONS};

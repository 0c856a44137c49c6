//! Ports shared by every domain
//!
//! Domains talk to their collaborators (persistence, notification, audit)
//! only through traits. Each domain defines its own storage port and extends
//! the [`DomainPort`] marker; the notification and audit contracts are common
//! and live here.
//!
//! ```text
//!            ┌────────────────────────────┐
//!            │   Domain services          │
//!            │ (ClaimWorkflowService, …)  │
//!            └─────────────┬──────────────┘
//!                          │ port traits
//!        ┌─────────────────┼──────────────────┐
//!        ▼                 ▼                  ▼
//!   ClaimStore       NotificationPort      AuditSink
//!   BillingStore     (fire-and-forget)    (post-commit)
//!        │                 │                  │
//!   PostgreSQL /      log / email         audit_log table
//!   in-memory
//! ```

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identifiers::{AuditEventId, UserId};

/// Error type for port operations
///
/// Every adapter, internal or in-memory, reports failures through this type
/// so domain services can translate them uniformly.
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// A write lost a race against another writer
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
    },

    /// A validation error occurred in the adapter
    #[error("Validation error: {message}")]
    Validation {
        message: String,
    },

    /// Connection to the underlying system failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An internal error occurred
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict {
            message: message.into(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
        }
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if this error indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    /// Returns true if this error indicates a lost write race
    pub fn is_conflict(&self) -> bool {
        matches!(self, PortError::Conflict { .. })
    }

    /// Returns true if the failure is transient and the call may be retried
    pub fn is_transient(&self) -> bool {
        matches!(self, PortError::Connection { .. })
    }
}

/// Marker trait for all domain ports
///
/// Ports are shared across request handlers, so implementations must be
/// thread-safe.
pub trait DomainPort: Send + Sync + 'static {}

/// Health status for an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Health check result for an adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub adapter_id: String,
    pub status: AdapterHealth,
    pub latency_ms: u64,
    pub message: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl HealthCheckResult {
    pub fn healthy(adapter_id: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            status: AdapterHealth::Healthy,
            latency_ms,
            message: None,
            checked_at: Utc::now(),
        }
    }

    pub fn unhealthy(adapter_id: impl Into<String>, latency_ms: u64, message: impl Into<String>) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            status: AdapterHealth::Unhealthy,
            latency_ms,
            message: Some(message.into()),
            checked_at: Utc::now(),
        }
    }
}

/// Trait for adapters that support health checks
#[async_trait]
pub trait HealthCheckable: Send + Sync {
    async fn health_check(&self) -> HealthCheckResult;
}

// ============================================================================
// Notification
// ============================================================================

/// Kinds of events the system notifies users about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ClaimReported,
    ClaimStatusChanged,
    ClaimDocumentUploaded,
    ClaimAssigned,
    InvoiceGenerated,
    InvoiceStatusChanged,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::ClaimReported => "claim_reported",
            NotificationKind::ClaimStatusChanged => "claim_status_changed",
            NotificationKind::ClaimDocumentUploaded => "claim_document_uploaded",
            NotificationKind::ClaimAssigned => "claim_assigned",
            NotificationKind::InvoiceGenerated => "invoice_generated",
            NotificationKind::InvoiceStatusChanged => "invoice_status_changed",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification handed to the notification collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub kind: NotificationKind,
    /// Display id of the claim or invoice the event is about
    pub subject_id: String,
    pub recipients: Vec<UserId>,
    pub message: String,
}

impl NotificationEvent {
    pub fn new(
        kind: NotificationKind,
        subject_id: impl fmt::Display,
        recipients: Vec<UserId>,
        message: impl Into<String>,
    ) -> Self {
        let mut recipients = recipients;
        recipients.sort();
        recipients.dedup();
        Self {
            kind,
            subject_id: subject_id.to_string(),
            recipients,
            message: message.into(),
        }
    }
}

/// Outbound notification collaborator (e-mail, in-app inbox, …)
#[async_trait]
pub trait NotificationPort: DomainPort {
    async fn notify(&self, event: NotificationEvent) -> Result<(), PortError>;
}

/// How long a single notification send may take before it is abandoned
pub const NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Dispatches a notification without waiting for it
///
/// The send runs on a spawned Tokio task; a failure is logged and dropped so
/// it can never undo the already-committed operation that triggered it.
/// Sends are bounded by [`NOTIFICATION_TIMEOUT`].
pub fn dispatch_notification(
    notifier: Arc<dyn NotificationPort>,
    event: NotificationEvent,
) -> Option<tokio::task::JoinHandle<()>> {
    dispatch_notification_within(notifier, event, NOTIFICATION_TIMEOUT)
}

/// [`dispatch_notification`] with an explicit send timeout
///
/// # Arguments
///
/// * `notifier` - Collaborator that delivers the event
/// * `event` - The notification to deliver
/// * `timeout` - Upper bound on the send; a slower notifier is abandoned
///
/// # Returns
///
/// The handle of the spawned send, or `None` when no Tokio runtime is
/// running on the calling thread and the event was dropped.
pub fn dispatch_notification_within(
    notifier: Arc<dyn NotificationPort>,
    event: NotificationEvent,
    timeout: Duration,
) -> Option<tokio::task::JoinHandle<()>> {
    let kind = event.kind;
    let subject = event.subject_id.clone();

    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        tracing::warn!(kind = %kind, subject = %subject, "No async runtime; notification dropped");
        return None;
    };

    Some(runtime.spawn(async move {
        match tokio::time::timeout(timeout, notifier.notify(event)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(
                kind = %kind,
                subject = %subject,
                error = %e,
                "Notification dispatch failed"
            ),
            Err(_) => tracing::warn!(
                kind = %kind,
                subject = %subject,
                timeout_ms = timeout.as_millis() as u64,
                "Notification dispatch timed out"
            ),
        }
    }))
}

// ============================================================================
// Audit
// ============================================================================

/// A generic audit record for long-term storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: AuditEventId,
    /// `status_change`, `create`, `document_upload`, `payment`, …
    pub action: String,
    /// `claim` or `invoice`
    pub entity_type: String,
    pub entity_id: String,
    pub user_id: Option<UserId>,
    pub description: String,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub ip_address: Option<IpAddr>,
    pub user_agent: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(
        action: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: impl fmt::Display,
        description: impl Into<String>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AuditEventId::new(),
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id: entity_id.to_string(),
            user_id: None,
            description: description.into(),
            old_values: None,
            new_values: None,
            ip_address: None,
            user_agent: None,
            recorded_at,
        }
    }

    pub fn by(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_values(mut self, old: Option<serde_json::Value>, new: Option<serde_json::Value>) -> Self {
        self.old_values = old;
        self.new_values = new;
        self
    }

    pub fn from_client(mut self, ip_address: Option<IpAddr>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }
}

/// Long-term audit storage collaborator
#[async_trait]
pub trait AuditSink: DomainPort {
    async fn record(&self, record: AuditRecord) -> Result<(), PortError>;
}

/// In-memory collaborators for tests
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::sync::Mutex;

    /// Records every notification it receives
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        events: Mutex<Vec<NotificationEvent>>,
        failing: AtomicBool,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        /// A notifier whose every call fails after recording the event
        pub fn failing() -> Self {
            let notifier = Self::default();
            notifier.failing.store(true, Ordering::SeqCst);
            notifier
        }

        pub async fn events(&self) -> Vec<NotificationEvent> {
            self.events.lock().await.clone()
        }

        /// Waits until at least `count` events arrived or one second passed
        pub async fn wait_for(&self, count: usize) -> Vec<NotificationEvent> {
            let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
            loop {
                let events = self.events().await;
                if events.len() >= count || tokio::time::Instant::now() >= deadline {
                    return events;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        }
    }

    impl DomainPort for RecordingNotifier {}

    #[async_trait]
    impl NotificationPort for RecordingNotifier {
        async fn notify(&self, event: NotificationEvent) -> Result<(), PortError> {
            self.events.lock().await.push(event);
            if self.failing.load(Ordering::SeqCst) {
                return Err(PortError::connection("mail relay unreachable"));
            }
            Ok(())
        }
    }

    /// Keeps audit records in memory
    #[derive(Debug, Default)]
    pub struct MemoryAuditSink {
        records: Mutex<Vec<AuditRecord>>,
    }

    impl MemoryAuditSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn records(&self) -> Vec<AuditRecord> {
            self.records.lock().await.clone()
        }
    }

    impl DomainPort for MemoryAuditSink {}

    #[async_trait]
    impl AuditSink for MemoryAuditSink {
        async fn record(&self, record: AuditRecord) -> Result<(), PortError> {
            self.records.lock().await.push(record);
            Ok(())
        }
    }
}

//! Core Kernel - Foundational types for the campus insurance system
//!
//! This crate provides the building blocks shared by the claims and billing
//! domains:
//! - Money and rate types with precise decimal arithmetic
//! - Strongly-typed identifiers
//! - Acting identity (role, user) and request context
//! - Collaborator ports: notification, audit, health checks

pub mod money;
pub mod identifiers;
pub mod identity;
pub mod ports;

pub use money::{Money, Currency, MoneyError, Rate};
pub use identifiers::{
    PolicyId, AssetId, ClaimId, TimelineEntryId, DocumentId,
    InvoiceId, UserId, AuditEventId,
};
pub use identity::{Role, Actor, RequestContext, UnknownRole};
pub use ports::{
    PortError, DomainPort, AdapterHealth, HealthCheckResult, HealthCheckable,
    NotificationKind, NotificationEvent, NotificationPort, dispatch_notification,
    dispatch_notification_within, NOTIFICATION_TIMEOUT,
    AuditRecord, AuditSink,
};

#[cfg(any(test, feature = "mock"))]
pub use ports::mock;

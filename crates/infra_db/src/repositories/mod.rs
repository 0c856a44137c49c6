//! Repository implementations for domain entities
//!
//! Each repository owns the SQL for one area and speaks in row types; the
//! adapters translate rows to and from domain values.

pub mod audit;
pub mod billing;
pub mod claims;

pub use audit::AuditRepository;
pub use billing::BillingRepository;
pub use claims::ClaimsRepository;

//! Billing Domain - Premium Invoicing
//!
//! This crate turns a policy premium into an invoice: taxes and
//! contributions, emission rights, early-payment discount and withholding,
//! each rounded to the currency before the next step.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{compute_invoice, InvoiceConfig};
//!
//! let config = InvoiceConfig::default()
//!     .with_emission_rights(Money::new(dec!(10), Currency::USD))
//!     .with_early_payment();
//!
//! let breakdown = compute_invoice(Money::new(dec!(1000), Currency::USD), &config)?;
//! assert_eq!(breakdown.total.amount(), dec!(1140.00));
//! ```

pub mod calculator;
pub mod emission;
pub mod invoice;
pub mod ports;
pub mod service;
pub mod error;

pub use calculator::{compute_invoice, InvoiceBreakdown, InvoiceConfig};
pub use emission::{EmissionRightsRule, EmissionRightsSchedule};
pub use invoice::{format_invoice_number, Invoice, PaymentStatus};
pub use ports::{BillablePolicy, BillingStore};
pub use service::{BillingSettings, InvoiceRequest, InvoiceService, DEFAULT_EARLY_PAYMENT_WINDOW_DAYS};
pub use error::BillingError;

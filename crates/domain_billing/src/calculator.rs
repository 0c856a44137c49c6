//! Invoice calculator
//!
//! Turns a policy premium into the full invoice breakdown. Every step is
//! rounded half-up to two decimals before the next step uses it:
//!
//! ```text
//! vat             = premium × vat_rate
//! superintendence = premium × superintendence_rate
//! rural           = premium × rural_insurance_rate
//! subtotal        = premium + vat + superintendence + rural + emission_rights
//! discount        = subtotal × early_payment_discount_rate        (early payment only)
//! withholding     = (subtotal − discount) × withholding_rate      (withholding only)
//! total           = subtotal − discount − withholding
//! ```
//!
//! The calculation is pure: the same premium and configuration always give
//! the same breakdown.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{Money, Rate};
use crate::error::BillingError;

/// Largest early-payment discount the calculator accepts
pub const MAX_EARLY_PAYMENT_DISCOUNT: Decimal = dec!(0.05);

/// Rates and flags for one invoice calculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceConfig {
    pub vat_rate: Rate,
    pub superintendence_rate: Rate,
    pub rural_insurance_rate: Rate,
    /// Flat emission right; `None` means zero
    pub emission_rights: Option<Money>,
    pub early_payment: bool,
    pub early_payment_discount_rate: Rate,
    pub withholding: bool,
    pub withholding_rate: Rate,
    pub withholding_cap: Rate,
}

impl Default for InvoiceConfig {
    fn default() -> Self {
        Self {
            vat_rate: Rate::new(dec!(0.15)),
            superintendence_rate: Rate::new(dec!(0.035)),
            rural_insurance_rate: Rate::new(dec!(0.005)),
            emission_rights: None,
            early_payment: false,
            early_payment_discount_rate: Rate::new(MAX_EARLY_PAYMENT_DISCOUNT),
            withholding: false,
            withholding_rate: Rate::zero(),
            withholding_cap: Rate::new(dec!(0.10)),
        }
    }
}

impl InvoiceConfig {
    pub fn with_emission_rights(mut self, amount: Money) -> Self {
        self.emission_rights = Some(amount);
        self
    }

    /// Enables the early-payment discount at the configured rate
    pub fn with_early_payment(mut self) -> Self {
        self.early_payment = true;
        self
    }

    /// Enables withholding at `rate`
    pub fn with_withholding(mut self, rate: Rate) -> Self {
        self.withholding = true;
        self.withholding_rate = rate;
        self
    }

    /// Checks every bound against a premium in `premium`'s currency
    pub fn validate(&self, premium: &Money) -> Result<(), BillingError> {
        let unit = [
            ("vat_rate", self.vat_rate),
            ("superintendence_rate", self.superintendence_rate),
            ("rural_insurance_rate", self.rural_insurance_rate),
            ("withholding_cap", self.withholding_cap),
        ];
        for (name, rate) in unit {
            if !rate.is_within(Decimal::ZERO, Decimal::ONE) {
                return Err(BillingError::configuration(format!(
                    "{} {} is outside [0, 1]",
                    name, rate
                )));
            }
        }

        if !self
            .early_payment_discount_rate
            .is_within(Decimal::ZERO, MAX_EARLY_PAYMENT_DISCOUNT)
        {
            return Err(BillingError::configuration(format!(
                "early payment discount {} is outside [0, 5%]",
                self.early_payment_discount_rate
            )));
        }

        if !self
            .withholding_rate
            .is_within(Decimal::ZERO, self.withholding_cap.as_decimal())
        {
            return Err(BillingError::configuration(format!(
                "withholding rate {} is outside [0, {}]",
                self.withholding_rate, self.withholding_cap
            )));
        }

        if let Some(emission) = &self.emission_rights {
            if emission.currency() != premium.currency() {
                return Err(BillingError::configuration(format!(
                    "emission rights in {} for a premium in {}",
                    emission.currency(),
                    premium.currency()
                )));
            }
            if emission.is_negative() {
                return Err(BillingError::configuration(format!(
                    "emission rights {} are negative",
                    emission
                )));
            }
        }

        Ok(())
    }
}

/// Every amount on an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceBreakdown {
    pub premium: Money,
    pub vat: Money,
    pub superintendence: Money,
    pub rural_insurance: Money,
    pub emission_rights: Money,
    pub subtotal: Money,
    pub early_payment_discount: Money,
    pub withholding: Money,
    pub total: Money,
}

/// `base × rate`, rounded half-up to two decimals
fn charge(base: &Money, rate: Rate) -> Money {
    let amount = (base.amount() * rate.as_decimal())
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    Money::new(amount, base.currency())
}

/// Computes the invoice amounts for `premium` under `config`
///
/// The premium is rounded to its currency first; a premium that rounds to
/// zero is rejected like any other non-positive premium.
///
/// # Errors
///
/// * [`BillingError::InvalidPremium`] when the rounded premium is not positive
/// * [`BillingError::InvalidConfiguration`] when a rate or the emission right
///   is out of bounds, or the total would be negative
pub fn compute_invoice(premium: Money, config: &InvoiceConfig) -> Result<InvoiceBreakdown, BillingError> {
    let rounded = premium.round_to_currency();
    if !rounded.is_positive() {
        return Err(BillingError::InvalidPremium(format!(
            "premium must be positive after rounding, got {}",
            premium.amount()
        )));
    }
    config.validate(&rounded)?;

    let currency = rounded.currency();
    let premium = rounded;
    let zero = Money::zero(currency);

    let vat = charge(&premium, config.vat_rate);
    let superintendence = charge(&premium, config.superintendence_rate);
    let rural_insurance = charge(&premium, config.rural_insurance_rate);
    let emission_rights = config
        .emission_rights
        .map(|e| e.round_to_currency())
        .unwrap_or(zero);

    let subtotal = premium
        .checked_add(&vat)?
        .checked_add(&superintendence)?
        .checked_add(&rural_insurance)?
        .checked_add(&emission_rights)?;

    let early_payment_discount = if config.early_payment {
        charge(&subtotal, config.early_payment_discount_rate)
    } else {
        zero
    };

    let withholding = if config.withholding {
        charge(&subtotal.checked_sub(&early_payment_discount)?, config.withholding_rate)
    } else {
        zero
    };

    let total = subtotal
        .checked_sub(&early_payment_discount)?
        .checked_sub(&withholding)?;
    if total.is_negative() {
        return Err(BillingError::configuration(format!("total {} is negative", total)));
    }

    Ok(InvoiceBreakdown {
        premium,
        vat,
        superintendence,
        rural_insurance,
        emission_rights,
        subtotal,
        early_payment_discount,
        withholding,
        total,
    })
}

//! Emission rights schedule
//!
//! Emission rights are a flat fee that depends on the premium band and,
//! optionally, on the policy type. Rules are ordered; a rule for the exact
//! policy type beats any generic rule, and within each group the first rule
//! whose inclusive band contains the premium wins.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::Money;
use crate::error::BillingError;

/// One premium band
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionRightsRule {
    /// Policy type code this rule is limited to; `None` applies to all
    pub policy_type: Option<String>,
    pub min_premium: Decimal,
    pub max_premium: Decimal,
    pub amount: Decimal,
}

impl EmissionRightsRule {
    pub fn generic(min_premium: Decimal, max_premium: Decimal, amount: Decimal) -> Self {
        Self {
            policy_type: None,
            min_premium,
            max_premium,
            amount,
        }
    }

    pub fn for_policy_type(
        policy_type: impl Into<String>,
        min_premium: Decimal,
        max_premium: Decimal,
        amount: Decimal,
    ) -> Self {
        Self {
            policy_type: Some(policy_type.into()),
            min_premium,
            max_premium,
            amount,
        }
    }

    fn contains(&self, premium: Decimal) -> bool {
        self.min_premium <= premium && premium <= self.max_premium
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionRightsSchedule {
    rules: Vec<EmissionRightsRule>,
}

impl EmissionRightsSchedule {
    pub fn new(rules: Vec<EmissionRightsRule>) -> Result<Self, BillingError> {
        for rule in &rules {
            if rule.min_premium > rule.max_premium {
                return Err(BillingError::configuration(format!(
                    "emission band {}-{} is inverted",
                    rule.min_premium, rule.max_premium
                )));
            }
            if rule.amount < Decimal::ZERO {
                return Err(BillingError::configuration(format!(
                    "emission right {} is negative",
                    rule.amount
                )));
            }
        }
        Ok(Self { rules })
    }

    /// Bands used when nothing else is configured
    pub fn standard() -> Self {
        Self {
            rules: vec![
                EmissionRightsRule::generic(dec!(0), dec!(1000), dec!(5)),
                EmissionRightsRule::generic(dec!(1000), dec!(5000), dec!(10)),
                EmissionRightsRule::generic(dec!(5000), dec!(10000), dec!(15)),
                EmissionRightsRule::generic(dec!(10000), dec!(50000), dec!(25)),
                EmissionRightsRule::generic(dec!(50000), dec!(100000), dec!(50)),
                EmissionRightsRule::generic(dec!(100000), dec!(999999999), dec!(75)),
            ],
        }
    }

    pub fn rules(&self) -> &[EmissionRightsRule] {
        &self.rules
    }

    /// Emission right for a premium; zero when no band matches
    pub fn resolve(&self, policy_type: &str, premium: &Money) -> Money {
        let amount = premium.amount();
        let specific = self
            .rules
            .iter()
            .filter(|r| r.policy_type.as_deref() == Some(policy_type))
            .find(|r| r.contains(amount));
        let generic = || {
            self.rules
                .iter()
                .filter(|r| r.policy_type.is_none())
                .find(|r| r.contains(amount))
        };

        specific
            .or_else(generic)
            .map(|r| Money::new(r.amount, premium.currency()))
            .unwrap_or_else(|| Money::zero(premium.currency()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;

    fn usd(amount: Decimal) -> Money {
        Money::new(amount, Currency::USD)
    }

    #[test]
    fn test_standard_bands_first_match_wins() {
        let schedule = EmissionRightsSchedule::standard();
        assert_eq!(schedule.resolve("equipment", &usd(dec!(999.99))).amount(), dec!(5));
        // shared boundary belongs to the earlier band
        assert_eq!(schedule.resolve("equipment", &usd(dec!(1000))).amount(), dec!(5));
        assert_eq!(schedule.resolve("equipment", &usd(dec!(1000.01))).amount(), dec!(10));
        assert_eq!(schedule.resolve("equipment", &usd(dec!(250000))).amount(), dec!(75));
    }

    #[test]
    fn test_policy_type_rule_beats_generic() {
        let schedule = EmissionRightsSchedule::new(vec![
            EmissionRightsRule::generic(dec!(0), dec!(5000), dec!(10)),
            EmissionRightsRule::for_policy_type("vehicles", dec!(0), dec!(5000), dec!(18)),
        ])
        .unwrap();

        assert_eq!(schedule.resolve("vehicles", &usd(dec!(800))).amount(), dec!(18));
        assert_eq!(schedule.resolve("buildings", &usd(dec!(800))).amount(), dec!(10));
    }

    #[test]
    fn test_no_match_is_zero() {
        let schedule = EmissionRightsSchedule::new(vec![
            EmissionRightsRule::generic(dec!(100), dec!(200), dec!(3)),
        ])
        .unwrap();
        let resolved = schedule.resolve("any", &Money::new(dec!(50), Currency::PEN));
        assert!(resolved.is_zero());
        assert_eq!(resolved.currency(), Currency::PEN);
    }

    #[test]
    fn test_inverted_band_is_rejected() {
        let result = EmissionRightsSchedule::new(vec![
            EmissionRightsRule::generic(dec!(200), dec!(100), dec!(3)),
        ]);
        assert!(matches!(result, Err(BillingError::InvalidConfiguration(_))));
    }
}

//! Property-Based Test Generators
//!
//! Proptest strategies for generating random test data that respects
//! domain invariants.

use core_kernel::{Actor, Currency, Money, UserId};
use domain_claims::ClaimStatus;
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for generating valid Currency values
fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::USD),
        Just(Currency::EUR),
        Just(Currency::COP),
        Just(Currency::PEN),
    ]
}

/// Strategy for premiums between 0.01 and 1,000,000.00 in minor units
fn premium_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..100_000_000i64
}

/// Strategy for positive USD premiums
pub fn usd_premium_strategy() -> impl Strategy<Value = Money> {
    premium_minor_strategy().prop_map(|minor| Money::from_minor(minor, Currency::USD))
}

/// Strategy for positive premiums in any supported currency
pub fn premium_strategy() -> impl Strategy<Value = Money> {
    (premium_minor_strategy(), currency_strategy())
        .prop_map(|(minor, currency)| Money::from_minor(minor, currency))
}

/// Strategy for rates between 0 and `max_basis_points / 10000`
pub fn rate_decimal_strategy(max_basis_points: u32) -> impl Strategy<Value = Decimal> {
    (0u32..=max_basis_points).prop_map(|bp| Decimal::new(bp as i64, 4))
}

/// Strategy for any claim status
pub fn claim_status_strategy() -> impl Strategy<Value = ClaimStatus> {
    proptest::sample::select(ClaimStatus::ALL.to_vec())
}

/// Strategy for a custodian or a manager with a fresh user id
pub fn actor_strategy() -> impl Strategy<Value = Actor> {
    any::<bool>().prop_map(|manager| {
        if manager {
            Actor::manager(UserId::new())
        } else {
            Actor::custodian(UserId::new())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_premiums_are_positive(premium in premium_strategy()) {
            prop_assert!(premium.is_positive());
        }

        #[test]
        fn test_rates_stay_in_bounds(rate in rate_decimal_strategy(500)) {
            prop_assert!(rate >= Decimal::ZERO);
            prop_assert!(rate <= Decimal::new(5, 2));
        }
    }
}

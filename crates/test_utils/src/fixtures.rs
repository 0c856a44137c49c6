//! Pre-built Test Fixtures
//!
//! Consistent, predictable values for unit and integration tests. Free text
//! comes from `fake` so tests never depend on a particular wording.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use core_kernel::{Actor, Currency, Money, RequestContext, UserId};
use fake::faker::address::en::CityName;
use fake::faker::lorem::en::Sentence;
use fake::Fake;
use rust_decimal_macros::dec;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Loss estimate used by most claim tests
    pub fn usd_estimate() -> Money {
        Money::new(dec!(1500.00), Currency::USD)
    }

    /// Premium whose invoice totals 1200.00 with 10.00 emission rights
    pub fn usd_premium() -> Money {
        Money::new(dec!(1000.00), Currency::USD)
    }

    pub fn usd_zero() -> Money {
        Money::zero(Currency::USD)
    }

    /// Amount in another currency, for mismatch tests
    pub fn cop_estimate() -> Money {
        Money::new(dec!(2500000), Currency::COP)
    }
}

/// Fixture for dates and instants
pub struct TemporalFixtures;

impl TemporalFixtures {
    pub fn incident_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    /// When the claim was reported
    pub fn reported_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap()
    }

    pub fn invoice_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()
    }

    /// Fifteen days after [`invoice_date`](Self::invoice_date), inside the early-payment window
    pub fn early_due_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 16).unwrap()
    }

    /// Sixty days after [`invoice_date`](Self::invoice_date)
    pub fn late_due_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 31).unwrap()
    }
}

/// Fixture for acting users
pub struct ActorFixtures;

impl ActorFixtures {
    pub fn custodian() -> Actor {
        Actor::custodian(UserId::new())
    }

    pub fn manager() -> Actor {
        Actor::manager(UserId::new())
    }

    /// Request context pinned to [`TemporalFixtures::reported_at`]
    pub fn context() -> RequestContext {
        RequestContext::at(TemporalFixtures::reported_at())
            .with_ip("192.0.2.10".parse().unwrap())
            .with_user_agent("test-suite/1.0")
    }
}

/// Fixture for free text
pub struct TextFixtures;

impl TextFixtures {
    /// A random incident description
    pub fn description() -> String {
        Sentence(4..10).fake()
    }

    pub fn location() -> String {
        format!("{} campus", CityName().fake::<String>())
    }
}

//! API configuration

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use core_kernel::{Currency, MoneyError, Rate};
use domain_billing::{
    BillingSettings, EmissionRightsSchedule, InvoiceConfig, DEFAULT_EARLY_PAYMENT_WINDOW_DAYS,
};

/// API configuration
///
/// Every field can be overridden with an `API_`-prefixed environment
/// variable, e.g. `API_PORT=9090` or `API_VAT_RATE=0.19`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Database URL
    pub database_url: String,
    /// Log level
    pub log_level: String,
    /// Currency code for amounts that arrive without one
    pub currency: String,
    pub vat_rate: Decimal,
    pub superintendence_rate: Decimal,
    pub rural_insurance_rate: Decimal,
    pub early_payment_discount_rate: Decimal,
    /// Upper bound for a policy's withholding rate
    pub withholding_cap: Decimal,
    /// Payment terms up to this many days earn the early-payment discount
    pub early_payment_window_days: i64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/campus_insurance".to_string(),
            log_level: "info".to_string(),
            currency: "USD".to_string(),
            vat_rate: dec!(0.15),
            superintendence_rate: dec!(0.035),
            rural_insurance_rate: dec!(0.005),
            early_payment_discount_rate: dec!(0.05),
            withholding_cap: dec!(0.10),
            early_payment_window_days: DEFAULT_EARLY_PAYMENT_WINDOW_DAYS,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn default_currency(&self) -> Result<Currency, MoneyError> {
        self.currency.parse()
    }

    /// Billing rates and schedules derived from this configuration
    pub fn billing_settings(&self) -> BillingSettings {
        let rates = InvoiceConfig {
            vat_rate: Rate::new(self.vat_rate),
            superintendence_rate: Rate::new(self.superintendence_rate),
            rural_insurance_rate: Rate::new(self.rural_insurance_rate),
            early_payment_discount_rate: Rate::new(self.early_payment_discount_rate),
            withholding_cap: Rate::new(self.withholding_cap),
            ..InvoiceConfig::default()
        };

        BillingSettings {
            rates,
            emission_rights: EmissionRightsSchedule::standard(),
            early_payment_window_days: self.early_payment_window_days,
        }
    }
}

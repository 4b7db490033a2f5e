//! Locale and document formatting configuration
//!
//! The source application hard-coded Turkish/Euro formatting and several
//! inconsistent VAT rates. Here everything locale-driven is explicit and
//! injectable, and there is exactly one configurable VAT rate.

use serde::{Deserialize, Serialize};

/// Formatting configuration for monetary, percentage and date output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatConfig {
    /// Currency symbol, e.g. "€" or "$"
    pub currency_symbol: String,
    /// Symbol before the amount ("$1.234,00") or after ("1.234,00 €")
    pub symbol_before_amount: bool,
    /// Decimal separator for money/percent output
    pub decimal_separator: char,
    /// Thousands grouping separator
    pub thousands_separator: char,
    /// Decimal places for percentages
    pub percent_decimals: usize,
    /// chrono format pattern for dates
    pub date_format: String,
    /// VAT rate applied over proposal totals, in percent
    pub vat_rate_percent: f64,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "€".to_string(),
            symbol_before_amount: false,
            decimal_separator: ',',
            thousands_separator: '.',
            percent_decimals: 1,
            date_format: "%d.%m.%Y".to_string(),
            vat_rate_percent: 18.0,
        }
    }
}

impl FormatConfig {
    /// US-style configuration, mainly used in tests
    pub fn us() -> Self {
        Self {
            currency_symbol: "$".to_string(),
            symbol_before_amount: true,
            decimal_separator: '.',
            thousands_separator: ',',
            percent_decimals: 1,
            date_format: "%m/%d/%Y".to_string(),
            vat_rate_percent: 18.0,
        }
    }
}

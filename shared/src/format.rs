//! Display formatting for monetary, percentage and date values
//!
//! All output goes through an injected [`FormatConfig`] so locale
//! behaviour is testable rather than baked in. Rounding is done with
//! `rust_decimal` (2 decimal places, half-up) to match the engine's
//! monetary arithmetic.

use chrono::NaiveDate;
use rust_decimal::prelude::*;

use crate::config::FormatConfig;

/// Decimal places used for monetary display
const MONEY_DECIMALS: u32 = 2;

/// Convert f64 to Decimal for monetary calculation.
///
/// Non-finite input collapses to zero; callers that care validate
/// finiteness before arithmetic.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

/// Convert Decimal back to f64, rounded to 2 decimal places half-up.
///
/// The single rounding rule for monetary figures: the engine and the
/// document renderer both go through here, so a table line can never
/// disagree with the snapshot it came from.
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(MONEY_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// Round and split a value into integer and fraction display parts.
///
/// Non-finite input renders as zero rather than "NaN" — display code
/// must never leak float artifacts into a customer document.
fn split_parts(value: f64, decimals: u32) -> (i128, String, bool) {
    let dec = Decimal::from_f64(value).unwrap_or(Decimal::ZERO);
    let rounded = dec.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let abs = rounded.abs();
    let int_part = abs.trunc().to_i128().unwrap_or(0);
    let frac = (abs - abs.trunc()) * Decimal::from(10i64.pow(decimals));
    let frac_part = format!(
        "{:0width$}",
        frac.round().to_i128().unwrap_or(0),
        width = decimals as usize
    );
    (int_part, frac_part, negative)
}

/// Group an integer part with the configured thousands separator.
fn group_thousands(int_part: i128, separator: char) -> String {
    let digits = int_part.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let offset = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - offset) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

/// Format a monetary value, e.g. `1.234,50 €` or `$1,234.50`.
pub fn format_money(value: f64, config: &FormatConfig) -> String {
    let (int_part, frac_part, negative) = split_parts(value, MONEY_DECIMALS);
    let grouped = group_thousands(int_part, config.thousands_separator);
    let sign = if negative { "-" } else { "" };
    let number = format!("{}{}{}{}", sign, grouped, config.decimal_separator, frac_part);
    if config.symbol_before_amount {
        format!("{}{}", config.currency_symbol, number)
    } else {
        format!("{} {}", number, config.currency_symbol)
    }
}

/// Format a percentage value, e.g. `40,0%`.
pub fn format_percent(value: f64, config: &FormatConfig) -> String {
    let decimals = config.percent_decimals as u32;
    let (int_part, frac_part, negative) = split_parts(value, decimals);
    let sign = if negative { "-" } else { "" };
    if decimals == 0 {
        format!("{}{}%", sign, int_part)
    } else {
        format!("{}{}{}{}%", sign, int_part, config.decimal_separator, frac_part)
    }
}

/// Format a date with the configured chrono pattern.
pub fn format_date(date: NaiveDate, config: &FormatConfig) -> String {
    date.format(&config.date_format).to_string()
}

/// Format a quantity (integral values without decimals, else 2 places).
pub fn format_quantity(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    if (value - value.trunc()).abs() < f64::EPSILON {
        format!("{}", value.trunc() as i64)
    } else {
        format!("{:.2}", value)
    }
}

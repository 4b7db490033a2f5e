//! Proposal financial engine
//!
//! Pure computation from a proposal's line collections to a
//! [`ProposalFinancials`] snapshot. No side effects, no I/O. All
//! arithmetic is done with `Decimal` internally and converted to `f64`
//! at the boundary, rounded to 2 decimal places half-up.
//!
//! Malformed input (negative quantity, unknown product reference,
//! non-finite numbers) is a caller contract violation: the engine fails
//! fast with a [`ValidationError`] instead of producing garbage totals.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::prelude::*;
use shared::ValidationError;
use shared::models::{
    CategoryBreakdown, CustomTaxLine, EngineeringLine, ExpenseLine, Product, ProposalFinancials,
    ProposalItem, VatBreakdown,
};

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Category name used for items whose product carries no category
const UNCATEGORIZED: &str = "Uncategorized";

/// Maximum allowed price/rate/amount per line (€1,000,000,000)
const MAX_PRICE: f64 = 1_000_000_000.0;
/// Maximum allowed quantity per item
const MAX_QUANTITY: i32 = 99_999;
/// Maximum allowed engineering days per line
const MAX_DAYS: f64 = 100_000.0;
/// Maximum allowed custom tax rate in percent
const MAX_TAX_RATE_PERCENT: f64 = 1_000.0;

pub use shared::format::{to_decimal, to_f64};

/// Guarded ratio: `numerator / denominator × 100`, 0 when denominator is 0.
#[inline]
fn guarded_pct(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator * Decimal::ONE_HUNDRED
    }
}

#[inline]
fn require_finite(value: f64, field: &'static str) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite { field, value });
    }
    Ok(())
}

#[inline]
fn require_non_negative(value: f64, field: &'static str) -> Result<(), ValidationError> {
    require_finite(value, field)?;
    if value < 0.0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(())
}

/// Upper bound check. Finite values past the cap would overflow the
/// Decimal arithmetic downstream, which panics instead of erroring.
#[inline]
fn require_max(value: f64, max: f64, field: &'static str) -> Result<(), ValidationError> {
    if value > max {
        return Err(ValidationError::ExceedsMax { field, value, max });
    }
    Ok(())
}

/// Validate a product line item before computation.
pub fn validate_item(item: &ProposalItem) -> Result<(), ValidationError> {
    if item.quantity <= 0 {
        return Err(ValidationError::InvalidQuantity(item.quantity));
    }
    if item.quantity > MAX_QUANTITY {
        return Err(ValidationError::ExceedsMax {
            field: "quantity",
            value: item.quantity as f64,
            max: MAX_QUANTITY as f64,
        });
    }
    require_non_negative(item.unit_price, "unit_price")?;
    require_max(item.unit_price, MAX_PRICE, "unit_price")?;
    require_finite(item.discount_percent, "discount_percent")?;
    if !(0.0..=100.0).contains(&item.discount_percent) {
        return Err(ValidationError::InvalidDiscount(item.discount_percent));
    }
    Ok(())
}

/// Validate an engineering line before computation.
pub fn validate_engineering(line: &EngineeringLine) -> Result<(), ValidationError> {
    require_non_negative(line.days, "days")?;
    require_max(line.days, MAX_DAYS, "days")?;
    require_non_negative(line.daily_rate, "daily_rate")?;
    require_max(line.daily_rate, MAX_PRICE, "daily_rate")?;
    Ok(())
}

/// Validate an expense line before computation.
pub fn validate_expense(line: &ExpenseLine) -> Result<(), ValidationError> {
    require_non_negative(line.amount, "expense amount")?;
    require_max(line.amount, MAX_PRICE, "expense amount")?;
    Ok(())
}

/// Validate a custom tax line before computation.
pub fn validate_tax(line: &CustomTaxLine) -> Result<(), ValidationError> {
    require_finite(line.rate_percent, "rate_percent")?;
    require_max(line.rate_percent, MAX_TAX_RATE_PERCENT, "rate_percent")?;
    require_finite(line.amount, "tax amount")?;
    require_max(line.amount, MAX_PRICE, "tax amount")?;
    Ok(())
}

fn validate_product(product: &Product) -> Result<(), ValidationError> {
    require_non_negative(product.list_price, "list_price")?;
    require_max(product.list_price, MAX_PRICE, "list_price")?;
    require_non_negative(product.partner_price, "partner_price")?;
    require_max(product.partner_price, MAX_PRICE, "partner_price")?;
    Ok(())
}

/// Index products by code for cost lookups.
fn index_products(products: &[Product]) -> Result<HashMap<&str, &Product>, ValidationError> {
    let mut index = HashMap::with_capacity(products.len());
    for product in products {
        validate_product(product)?;
        index.insert(product.code.as_str(), product);
    }
    Ok(index)
}

fn lookup<'a>(
    index: &HashMap<&str, &'a Product>,
    code: &str,
) -> Result<&'a Product, ValidationError> {
    index
        .get(code)
        .copied()
        .ok_or_else(|| ValidationError::UnknownProduct(code.to_string()))
}

/// Extended customer price of one item.
///
/// The stored `amount` field is never trusted; it is recomputed here
/// from quantity, unit price and discount whenever financials are read.
pub fn item_amount(item: &ProposalItem) -> Decimal {
    let unit = to_decimal(item.unit_price);
    let quantity = Decimal::from(item.quantity);
    let discount = to_decimal(item.discount_percent) / Decimal::ONE_HUNDRED;
    (unit * quantity * (Decimal::ONE - discount))
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Line cost: `partner_price × quantity`.
pub fn item_cost(item: &ProposalItem, product: &Product) -> Decimal {
    to_decimal(product.partner_price) * Decimal::from(item.quantity)
}

/// Line profit: `amount − partner_price × quantity`.
pub fn item_profit(item: &ProposalItem, product: &Product) -> Decimal {
    item_amount(item) - item_cost(item, product)
}

/// Line margin as a percentage, 0 when the amount is 0.
pub fn item_margin_percent(item: &ProposalItem, product: &Product) -> f64 {
    let amount = item_amount(item);
    to_f64(guarded_pct(item_profit(item, product), amount))
}

/// Engineering line amount: `days × daily_rate`.
pub fn engineering_amount(line: &EngineeringLine) -> Decimal {
    (to_decimal(line.days) * to_decimal(line.daily_rate))
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Taxable base for custom taxes: `Σ partner_price × quantity` over
/// items flagged `apply_custom_tax`.
pub fn custom_tax_base(
    items: &[ProposalItem],
    products: &[Product],
) -> Result<Decimal, ValidationError> {
    let index = index_products(products)?;
    let mut base = Decimal::ZERO;
    for item in items {
        validate_item(item)?;
        let product = lookup(&index, &item.product_code)?;
        if item.apply_custom_tax {
            base += item_cost(item, product);
        }
    }
    Ok(base)
}

/// Recompute every custom tax line from the current taxable base.
///
/// All-or-nothing: the complete replacement list is built before
/// anything is returned, so a caller either persists every line with
/// the new base or none of them. Existing lines are never mutated.
pub fn recalculate_custom_taxes(
    items: &[ProposalItem],
    products: &[Product],
    taxes: &[CustomTaxLine],
) -> Result<Vec<CustomTaxLine>, ValidationError> {
    let base = custom_tax_base(items, products)?;
    let mut updated = Vec::with_capacity(taxes.len());
    for tax in taxes {
        validate_tax(tax)?;
        let rate = to_decimal(tax.rate_percent) / Decimal::ONE_HUNDRED;
        updated.push(CustomTaxLine {
            name: tax.name.clone(),
            rate_percent: tax.rate_percent,
            amount: to_f64(base * rate),
        });
    }
    Ok(updated)
}

/// Per-category revenue/cost/profit breakdown.
///
/// Deterministic: grouped through a `BTreeMap` and explicitly sorted
/// descending by revenue, ties broken ascending by category name.
pub fn category_breakdown(
    items: &[ProposalItem],
    products: &[Product],
) -> Result<Vec<CategoryBreakdown>, ValidationError> {
    struct Acc {
        count: usize,
        revenue: Decimal,
        cost: Decimal,
    }

    let index = index_products(products)?;
    let mut groups: BTreeMap<String, Acc> = BTreeMap::new();

    for item in items {
        validate_item(item)?;
        let product = lookup(&index, &item.product_code)?;
        let category = if product.category.trim().is_empty() {
            UNCATEGORIZED.to_string()
        } else {
            product.category.clone()
        };
        let acc = groups.entry(category).or_insert(Acc {
            count: 0,
            revenue: Decimal::ZERO,
            cost: Decimal::ZERO,
        });
        acc.count += 1;
        acc.revenue += item_amount(item);
        acc.cost += item_cost(item, product);
    }

    let mut rows: Vec<CategoryBreakdown> = groups
        .into_iter()
        .map(|(category, acc)| {
            let profit = acc.revenue - acc.cost;
            CategoryBreakdown {
                category,
                item_count: acc.count,
                revenue: to_f64(acc.revenue),
                cost: to_f64(acc.cost),
                profit: to_f64(profit),
                margin_percent: to_f64(guarded_pct(profit, acc.revenue)),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.revenue
            .partial_cmp(&a.revenue)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });

    Ok(rows)
}

/// Compute the full financial snapshot for one proposal.
///
/// Sums are accumulated sequentially left-to-right over the input
/// collections so results are bit-stable for identical input. Empty
/// collections produce all-zero figures; every divide is guarded.
pub fn compute_financials(
    items: &[ProposalItem],
    engineering: &[EngineeringLine],
    expenses: &[ExpenseLine],
    taxes: &[CustomTaxLine],
    products: &[Product],
) -> Result<ProposalFinancials, ValidationError> {
    let index = index_products(products)?;

    let mut subtotal_products = Decimal::ZERO;
    let mut product_cost = Decimal::ZERO;
    let mut tax_base = Decimal::ZERO;

    for item in items {
        validate_item(item)?;
        let product = lookup(&index, &item.product_code)?;
        let amount = item_amount(item);
        let cost = item_cost(item, product);
        subtotal_products += amount;
        product_cost += cost;
        if item.apply_custom_tax {
            tax_base += cost;
        }
    }

    let mut subtotal_engineering = Decimal::ZERO;
    for line in engineering {
        validate_engineering(line)?;
        subtotal_engineering += engineering_amount(line);
    }

    let mut subtotal_expenses = Decimal::ZERO;
    for line in expenses {
        validate_expense(line)?;
        subtotal_expenses += to_decimal(line.amount);
    }

    let mut subtotal_taxes = Decimal::ZERO;
    for line in taxes {
        validate_tax(line)?;
        subtotal_taxes += to_decimal(line.amount);
    }

    let total_amount =
        subtotal_products + subtotal_engineering + subtotal_expenses + subtotal_taxes;
    let product_profit = subtotal_products - product_cost;
    // Engineering is carried at 100% margin (recorded business rule:
    // services have no cost basis in this model).
    let engineering_profit = subtotal_engineering;
    let total_cost = product_cost + subtotal_expenses;
    let gross_profit = total_amount - total_cost;

    Ok(ProposalFinancials {
        subtotal_products: to_f64(subtotal_products),
        subtotal_engineering: to_f64(subtotal_engineering),
        subtotal_expenses: to_f64(subtotal_expenses),
        subtotal_taxes: to_f64(subtotal_taxes),
        total_amount: to_f64(total_amount),
        product_cost: to_f64(product_cost),
        product_profit: to_f64(product_profit),
        engineering_profit: to_f64(engineering_profit),
        total_cost: to_f64(total_cost),
        gross_profit: to_f64(gross_profit),
        margin_percent: to_f64(guarded_pct(gross_profit, total_amount)),
        roi_percent: to_f64(guarded_pct(gross_profit, total_cost)),
        custom_tax_base: to_f64(tax_base),
        categories: category_breakdown(items, products)?,
    })
}

/// Apply the configured VAT rate over a net total.
pub fn apply_vat(net: f64, rate_percent: f64) -> VatBreakdown {
    let net_dec = to_decimal(net);
    let vat = net_dec * to_decimal(rate_percent) / Decimal::ONE_HUNDRED;
    VatBreakdown {
        net: to_f64(net_dec),
        rate_percent,
        vat: to_f64(vat),
        gross: to_f64(net_dec + vat),
    }
}

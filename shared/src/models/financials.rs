//! Computed financial snapshot of a proposal
//!
//! Value objects produced by the financial engine. Never stored; always
//! recomputed from the proposal's children.

use serde::{Deserialize, Serialize};

/// Per-category revenue/cost/profit breakdown row.
///
/// The engine returns these sorted descending by revenue, ties broken
/// ascending by category name, so document output is reproducible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: String,
    pub item_count: usize,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    pub margin_percent: f64,
}

/// VAT applied over a net total at a single configured rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VatBreakdown {
    pub net: f64,
    pub rate_percent: f64,
    pub vat: f64,
    pub gross: f64,
}

/// Complete financial snapshot of one proposal at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalFinancials {
    pub subtotal_products: f64,
    pub subtotal_engineering: f64,
    pub subtotal_expenses: f64,
    pub subtotal_taxes: f64,
    /// Sum of all four subtotals
    pub total_amount: f64,
    /// Σ partner_price × quantity over all items
    pub product_cost: f64,
    /// Σ (amount − partner_price × quantity) over all items
    pub product_profit: f64,
    /// Engineering is carried at 100% margin (no cost basis)
    pub engineering_profit: f64,
    /// product_cost + subtotal_expenses
    pub total_cost: f64,
    /// total_amount − total_cost
    pub gross_profit: f64,
    /// gross_profit / total_amount × 100, 0 when total is 0
    pub margin_percent: f64,
    /// gross_profit / total_cost × 100, 0 when cost is 0
    pub roi_percent: f64,
    /// Σ partner_price × quantity over items flagged apply_custom_tax
    pub custom_tax_base: f64,
    pub categories: Vec<CategoryBreakdown>,
}

impl ProposalFinancials {
    /// All-zero snapshot, what an empty proposal computes to.
    pub fn zero() -> Self {
        Self {
            subtotal_products: 0.0,
            subtotal_engineering: 0.0,
            subtotal_expenses: 0.0,
            subtotal_taxes: 0.0,
            total_amount: 0.0,
            product_cost: 0.0,
            product_profit: 0.0,
            engineering_profit: 0.0,
            total_cost: 0.0,
            gross_profit: 0.0,
            margin_percent: 0.0,
            roi_percent: 0.0,
            custom_tax_base: 0.0,
            categories: Vec::new(),
        }
    }
}

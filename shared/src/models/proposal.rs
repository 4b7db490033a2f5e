//! Proposal aggregate and its line types
//!
//! The proposal owns its four line collections by composition; the
//! aggregate totals are never stored here — they are derived by the
//! financial engine from the children on every read.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::customer::Customer;

/// Proposal lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Draft,
    Pending,
    Sent,
    Won,
    Lost,
    Expired,
}

impl ProposalStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Pending => "Pending",
            Self::Sent => "Sent",
            Self::Won => "Won",
            Self::Lost => "Lost",
            Self::Expired => "Expired",
        }
    }
}

/// Product line item
///
/// `amount` is carried for persistence round-trips but is never trusted:
/// the engine recomputes it from `unit_price`, `quantity` and
/// `discount_percent` on every financial computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalItem {
    /// Product reference (natural key)
    pub product_code: String,
    /// Must be strictly positive
    pub quantity: i32,
    /// Customer-facing unit price; may diverge from the product list price
    pub unit_price: f64,
    /// Percentage discount, 0..=100
    pub discount_percent: f64,
    /// Whether this line contributes to the custom-tax base
    pub apply_custom_tax: bool,
    /// Extended customer price; recomputed by the engine, input-only here
    #[serde(default)]
    pub amount: f64,
}

impl ProposalItem {
    pub fn new(product_code: impl Into<String>, quantity: i32, unit_price: f64) -> Self {
        Self {
            product_code: product_code.into(),
            quantity,
            unit_price,
            discount_percent: 0.0,
            apply_custom_tax: false,
            amount: 0.0,
        }
    }

    pub fn with_discount(mut self, discount_percent: f64) -> Self {
        self.discount_percent = discount_percent;
        self
    }

    pub fn with_custom_tax(mut self) -> Self {
        self.apply_custom_tax = true;
        self
    }
}

/// Engineering/services line: `amount = days * daily_rate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeringLine {
    pub description: String,
    pub days: f64,
    pub daily_rate: f64,
}

impl EngineeringLine {
    pub fn new(description: impl Into<String>, days: f64, daily_rate: f64) -> Self {
        Self {
            description: description.into(),
            days,
            daily_rate,
        }
    }
}

/// Expense line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseLine {
    pub description: String,
    pub amount: f64,
}

impl ExpenseLine {
    pub fn new(description: impl Into<String>, amount: f64) -> Self {
        Self {
            description: description.into(),
            amount,
        }
    }
}

/// Reporting category inferred from an expense description.
///
/// Not a stored field; used only for document breakdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Shipping,
    Insurance,
    Other,
}

impl ExpenseCategory {
    /// Infer the category from description keywords.
    pub fn infer(description: &str) -> Self {
        let lower = description.to_lowercase();
        if lower.contains("shipping") || lower.contains("freight") || lower.contains("transport") {
            Self::Shipping
        } else if lower.contains("insurance") {
            Self::Insurance
        } else {
            Self::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Shipping => "Shipping",
            Self::Insurance => "Insurance",
            Self::Other => "Other",
        }
    }
}

/// Custom tax line
///
/// `amount` is computed as `rate_percent% × taxable base`, where the
/// base sums `partner_price × quantity` over items flagged
/// `apply_custom_tax`. Recomputation replaces every line's amount as a
/// unit — never a subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomTaxLine {
    pub name: String,
    pub rate_percent: f64,
    pub amount: f64,
}

impl CustomTaxLine {
    pub fn new(name: impl Into<String>, rate_percent: f64) -> Self {
        Self {
            name: name.into(),
            rate_percent,
            amount: 0.0,
        }
    }
}

/// Proposal aggregate root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: Option<String>,
    /// Human-facing reference printed on documents
    pub reference: String,
    pub customer: Option<Customer>,
    pub notes: String,
    pub status: ProposalStatus,
    pub created_at: NaiveDate,
    pub items: Vec<ProposalItem>,
    pub engineering: Vec<EngineeringLine>,
    pub expenses: Vec<ExpenseLine>,
    pub taxes: Vec<CustomTaxLine>,
}

impl Proposal {
    /// Create an empty draft proposal.
    pub fn new(reference: impl Into<String>, created_at: NaiveDate) -> Self {
        Self {
            id: None,
            reference: reference.into(),
            customer: None,
            notes: String::new(),
            status: ProposalStatus::Draft,
            created_at,
            items: Vec::new(),
            engineering: Vec::new(),
            expenses: Vec::new(),
            taxes: Vec::new(),
        }
    }
}

//! Product Model

use serde::{Deserialize, Serialize};

/// Product entity
///
/// Identity for import/export matching is `code`, not the surrogate id:
/// CSV import upserts by code and never deletes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Surrogate id, assigned by the store on insert
    pub id: Option<String>,
    /// Unique natural key
    pub code: String,
    pub name: String,
    pub description: String,
    pub category: String,
    /// Customer-facing list price (>= 0)
    pub list_price: f64,
    /// Partner/cost price (>= 0; <= list_price is a UI convention, not enforced)
    pub partner_price: f64,
}

impl Product {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            code: code.into(),
            name: name.into(),
            description: String::new(),
            category: String::new(),
            list_price: 0.0,
            partner_price: 0.0,
        }
    }

    pub fn with_prices(mut self, list_price: f64, partner_price: f64) -> Self {
        self.list_price = list_price;
        self.partner_price = partner_price;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}

/// Flat product record as carried by the CSV exchange format.
///
/// Same fields as [`Product`] minus the surrogate id; the store assigns
/// one on insert during upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub code: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub list_price: f64,
    pub partner_price: f64,
}

impl From<Product> for ProductRecord {
    fn from(p: Product) -> Self {
        Self {
            code: p.code,
            name: p.name,
            description: p.description,
            category: p.category,
            list_price: p.list_price,
            partner_price: p.partner_price,
        }
    }
}

impl ProductRecord {
    /// Materialize as a new [`Product`] with the given surrogate id.
    pub fn into_product(self, id: String) -> Product {
        Product {
            id: Some(id),
            code: self.code,
            name: self.name,
            description: self.description,
            category: self.category,
            list_price: self.list_price,
            partner_price: self.partner_price,
        }
    }

    /// Overwrite all non-identity fields of an existing product.
    pub fn apply_to(&self, product: &mut Product) {
        product.name = self.name.clone();
        product.description = self.description.clone();
        product.category = self.category.clone();
        product.list_price = self.list_price;
        product.partner_price = self.partner_price;
    }
}

//! Customer Model

use serde::{Deserialize, Serialize};

/// Customer entity — referenced by proposals, not owned by them.
///
/// Only used by the document renderer for the customer block; every
/// display field except `name` is optional and degrades to a
/// placeholder when missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Option<String>,
    pub name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl Customer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            contact_name: None,
            email: None,
            phone: None,
            address: None,
        }
    }
}

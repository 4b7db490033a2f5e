//! Persistence collaborator traits
//!
//! The core never talks to a concrete database; these traits are the
//! whole surface it needs. Implementations live with the host
//! application (CoreData, SQL, in-memory for tests).

use async_trait::async_trait;
use shared::PersistenceError;
use shared::models::{
    CustomTaxLine, EngineeringLine, ExpenseLine, Product, ProductRecord, ProposalItem,
};

/// Counts from one atomic batch upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub created: usize,
    pub updated: usize,
}

/// The four line collections owned by one proposal.
#[derive(Debug, Clone, Default)]
pub struct ProposalChildren {
    pub items: Vec<ProposalItem>,
    pub engineering: Vec<EngineeringLine>,
    pub expenses: Vec<ExpenseLine>,
    pub taxes: Vec<CustomTaxLine>,
}

/// Product persistence, keyed by the natural `code`.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn fetch_by_code(&self, code: &str) -> Result<Option<Product>, PersistenceError>;

    async fn fetch_all(&self) -> Result<Vec<Product>, PersistenceError>;

    /// Upsert one batch atomically: match by `code`, overwrite all
    /// fields except identity on hit, insert with a fresh surrogate id
    /// on miss. Either the whole batch commits or the error describes a
    /// batch that changed nothing.
    async fn upsert_batch(
        &self,
        records: Vec<ProductRecord>,
    ) -> Result<UpsertOutcome, PersistenceError>;

    /// Delete one batch of products by code, atomically.
    async fn delete_batch(&self, codes: Vec<String>) -> Result<usize, PersistenceError>;

    async fn count(&self) -> Result<usize, PersistenceError>;
}

/// Proposal child-collection persistence.
#[async_trait]
pub trait ProposalStore: Send + Sync {
    async fn load_children(&self, proposal_id: &str)
    -> Result<ProposalChildren, PersistenceError>;

    /// Replace every custom tax line of the proposal in one atomic
    /// write; a failure must leave the previous lines untouched.
    async fn save_tax_lines(
        &self,
        proposal_id: &str,
        lines: Vec<CustomTaxLine>,
    ) -> Result<(), PersistenceError>;
}

/// Consolidated settings repository.
///
/// Replaces the source's triplicate key-value singletons (payment
/// terms, templates, per-proposal payment config) with one injected
/// component and one key scheme.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Payment terms text for one proposal, empty default when unset.
    async fn payment_terms(&self, proposal_id: &str) -> Result<String, PersistenceError>;

    async fn set_payment_terms(
        &self,
        proposal_id: &str,
        terms: String,
    ) -> Result<(), PersistenceError>;

    /// Templated boilerplate text by key (e.g. legal disclaimer).
    async fn boilerplate(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    async fn set_boilerplate(&self, key: &str, text: String) -> Result<(), PersistenceError>;
}

/// Service wrapper for the custom-tax recompute path: computes the new
/// lines and persists them through one atomic `save_tax_lines` call, so
/// either every line reflects the new base or none do.
pub async fn recalculate_and_save_taxes<S: ProposalStore>(
    store: &S,
    proposal_id: &str,
    items: &[ProposalItem],
    products: &[Product],
    taxes: &[CustomTaxLine],
) -> Result<Vec<CustomTaxLine>, TaxRecalcError> {
    let updated = crate::financials::recalculate_custom_taxes(items, products, taxes)?;
    store
        .save_tax_lines(proposal_id, updated.clone())
        .await?;
    Ok(updated)
}

/// Failure of the recompute-and-save path.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TaxRecalcError {
    #[error(transparent)]
    Validation(#[from] shared::ValidationError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::Product;
    use std::sync::Mutex;

    /// Proposal store holding one set of tax lines; optionally rejects
    /// every write.
    struct TaxStore {
        lines: Mutex<Vec<CustomTaxLine>>,
        fail_writes: bool,
    }

    impl TaxStore {
        fn with_lines(lines: Vec<CustomTaxLine>, fail_writes: bool) -> Self {
            Self {
                lines: Mutex::new(lines),
                fail_writes,
            }
        }
    }

    #[async_trait]
    impl ProposalStore for TaxStore {
        async fn load_children(
            &self,
            _proposal_id: &str,
        ) -> Result<ProposalChildren, PersistenceError> {
            Ok(ProposalChildren {
                taxes: self.lines.lock().unwrap().clone(),
                ..ProposalChildren::default()
            })
        }

        async fn save_tax_lines(
            &self,
            _proposal_id: &str,
            lines: Vec<CustomTaxLine>,
        ) -> Result<(), PersistenceError> {
            if self.fail_writes {
                // Atomic contract: a failed save changes nothing
                return Err(PersistenceError::Store("write failed".to_string()));
            }
            *self.lines.lock().unwrap() = lines;
            Ok(())
        }
    }

    fn fixture() -> (Vec<ProposalItem>, Vec<Product>, Vec<CustomTaxLine>) {
        let products = vec![Product::new("A1", "Widget").with_prices(100.0, 60.0)];
        let items = vec![ProposalItem::new("A1", 2, 100.0).with_custom_tax()];
        let taxes = vec![
            CustomTaxLine::new("Stamp duty", 10.0),
            CustomTaxLine::new("Levy", 2.5),
        ];
        (items, products, taxes)
    }

    #[tokio::test]
    async fn test_recalculate_and_save_replaces_all_lines() {
        let (items, products, taxes) = fixture();
        let store = TaxStore::with_lines(taxes.clone(), false);

        let updated = recalculate_and_save_taxes(&store, "p1", &items, &products, &taxes)
            .await
            .unwrap();
        // base 120: 10% -> 12, 2.5% -> 3
        assert_eq!(updated[0].amount, 12.0);
        assert_eq!(updated[1].amount, 3.0);
        assert_eq!(*store.lines.lock().unwrap(), updated);
    }

    #[tokio::test]
    async fn test_failed_save_leaves_no_partial_state() {
        let (items, products, taxes) = fixture();
        let store = TaxStore::with_lines(taxes.clone(), true);

        let err = recalculate_and_save_taxes(&store, "p1", &items, &products, &taxes)
            .await
            .unwrap_err();
        assert!(matches!(err, TaxRecalcError::Persistence(_)));
        // Every line still carries the old amount, none the new base
        assert_eq!(*store.lines.lock().unwrap(), taxes);
    }

    /// In-memory settings store over one key-value map per concern.
    #[derive(Default)]
    struct MemorySettings {
        terms: Mutex<std::collections::HashMap<String, String>>,
        boilerplate: Mutex<std::collections::HashMap<String, String>>,
    }

    #[async_trait]
    impl SettingsStore for MemorySettings {
        async fn payment_terms(&self, proposal_id: &str) -> Result<String, PersistenceError> {
            Ok(self
                .terms
                .lock()
                .unwrap()
                .get(proposal_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn set_payment_terms(
            &self,
            proposal_id: &str,
            terms: String,
        ) -> Result<(), PersistenceError> {
            self.terms
                .lock()
                .unwrap()
                .insert(proposal_id.to_string(), terms);
            Ok(())
        }

        async fn boilerplate(&self, key: &str) -> Result<Option<String>, PersistenceError> {
            Ok(self.boilerplate.lock().unwrap().get(key).cloned())
        }

        async fn set_boilerplate(&self, key: &str, text: String) -> Result<(), PersistenceError> {
            self.boilerplate.lock().unwrap().insert(key.to_string(), text);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_settings_default_empty_then_round_trip() {
        let store = MemorySettings::default();

        // Unset proposal reads as empty terms, unset boilerplate as None
        assert_eq!(store.payment_terms("p1").await.unwrap(), "");
        assert_eq!(store.boilerplate("legal").await.unwrap(), None);

        store
            .set_payment_terms("p1", "50% upfront, 50% on delivery".to_string())
            .await
            .unwrap();
        store
            .set_boilerplate("legal", "Prices valid for 30 days.".to_string())
            .await
            .unwrap();

        assert_eq!(
            store.payment_terms("p1").await.unwrap(),
            "50% upfront, 50% on delivery"
        );
        assert_eq!(
            store.boilerplate("legal").await.unwrap().as_deref(),
            Some("Prices valid for 30 days.")
        );
        // Keys are independent: another proposal still reads empty
        assert_eq!(store.payment_terms("p2").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_invalid_line_never_reaches_the_store() {
        let (items, products, mut taxes) = fixture();
        taxes[1].rate_percent = f64::NAN;
        let store = TaxStore::with_lines(taxes.clone(), false);

        let err = recalculate_and_save_taxes(&store, "p1", &items, &products, &taxes)
            .await
            .unwrap_err();
        assert!(matches!(err, TaxRecalcError::Validation(_)));
        // Amounts unchanged (NaN rate makes whole-vec equality useless)
        let stored = store.lines.lock().unwrap();
        assert_eq!(stored[0].amount, 0.0);
        assert_eq!(stored[1].amount, 0.0);
    }
}

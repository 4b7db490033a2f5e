//! # quote-engine
//!
//! Core computation and exchange logic for the proposal suite:
//!
//! - Proposal financial engine: pure derivation of subtotals, margins,
//!   tax bases and category breakdowns from a proposal's line items.
//! - CSV codec: tolerant decode and canonical encode of product records.
//! - Persistence collaborator traits: the only view the core has of a
//!   concrete store.
//! - Bulk import pipeline: batched, cancellable, atomic per batch.
//!
//! Everything here is UI-free. The financial engine and the codec are
//! pure synchronous functions, safe to call concurrently on independent
//! inputs; only the import pipeline is async.

pub mod csv;
pub mod financials;
pub mod import;
pub mod repository;

// Re-exports
pub use csv::{DecodeOutcome, ParseError, RowError};
pub use financials::{apply_vat, compute_financials, recalculate_custom_taxes};
pub use import::{DeleteReport, ImportError, ImportProgress, ImportReport, Importer};
pub use repository::{
    ProductStore, ProposalChildren, ProposalStore, SettingsStore, UpsertOutcome,
};

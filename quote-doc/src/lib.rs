//! # quote-doc
//!
//! Proposal document rendering - paginated PDF output only.
//!
//! ## Scope
//!
//! This crate handles HOW a proposal becomes bytes:
//! - Page geometry and pagination ([`layout`])
//! - A minimal PDF 1.4 serializer ([`pdf`])
//! - Section-by-section document layout ([`render`])
//!
//! What the numbers mean is not decided here: the caller computes a
//! `ProposalFinancials` snapshot with the engine and hands it over.
//!
//! ## Example
//!
//! ```ignore
//! use quote_doc::{DocSettings, DocumentRenderer};
//! use shared::FormatConfig;
//!
//! let renderer = DocumentRenderer::new(FormatConfig::default(), DocSettings::default());
//! let bytes = renderer.render(&proposal, &financials)?;
//! std::fs::write("proposal.pdf", bytes)?;
//! ```

mod error;
pub mod layout;
pub mod pdf;
mod render;

// Re-exports
pub use error::RenderError;
pub use layout::{Align, ColumnSpec, PageCursor};
pub use render::{DocSettings, DocumentRenderer};

//! CSV codec for product records
//!
//! Two independent transforms: a tolerant decoder (flexible column
//! naming and ordering, quoted fields, locale price formats, encoding
//! detection) and a canonical encoder (fixed column order, 2-decimal
//! prices, minimal quoting).
//!
//! Row-level problems are recoverable: the offending row is skipped or
//! defaulted and recorded as a [`RowError`], and decoding continues.
//! File-level problems ([`ParseError`]) abort the whole decode.

mod decode;
mod detect;
mod encode;
mod tokenizer;

pub use decode::{DEFAULT_BATCH_SIZE, DecodeOutcome, Decoder, RecordBatch, decode_bytes, decode_str};
pub use detect::detect_encoding;
pub use encode::encode;

use thiserror::Error;

/// Logical columns of the product exchange format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Code,
    Name,
    Description,
    Category,
    ListPrice,
    PartnerPrice,
}

impl Column {
    /// Canonical column name as written by the encoder.
    pub fn canonical(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Name => "name",
            Self::Description => "description",
            Self::Category => "category",
            Self::ListPrice => "listPrice",
            Self::PartnerPrice => "partnerPrice",
        }
    }

    /// Canonical column order for encode and positional decode.
    pub const ORDER: [Column; 6] = [
        Self::Code,
        Self::Name,
        Self::Description,
        Self::Category,
        Self::ListPrice,
        Self::PartnerPrice,
    ];

    /// `code`, `name` and `listPrice` must resolve for a parse to proceed.
    pub fn is_mandatory(&self) -> bool {
        matches!(self, Self::Code | Self::Name | Self::ListPrice)
    }

    /// Accepted header spellings, ordered specific to generic.
    ///
    /// Matching is case-insensitive, exact first and substring second,
    /// so `"Product Code"`, `"SKU"` and `"code"` all resolve to
    /// [`Column::Code`].
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Code => &["code", "product code", "item code", "sku", "part number", "id"],
            Self::Name => &["name", "product name", "title", "product"],
            Self::Description => &["description", "desc", "details"],
            Self::Category => &["category", "group", "family"],
            Self::ListPrice => &["listprice", "list price", "unit price", "msrp", "price"],
            Self::PartnerPrice => &[
                "partnerprice",
                "partner price",
                "dealer price",
                "buy price",
                "cost",
            ],
        }
    }
}

/// Whole-file parse failure; decoding aborts immediately.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// The input contains no rows at all
    #[error("empty file")]
    EmptyFile,

    /// A mandatory logical column could not be resolved in the header
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    /// The byte payload could not be decoded as text
    #[error("undecodable text payload: {0}")]
    Encoding(String),
}

/// Why a single row was skipped or defaulted; decoding continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowErrorKind {
    /// `code` empty after trimming — row skipped
    MissingCode,
    /// `name` empty after trimming — row skipped
    MissingName,
    /// Row shorter than a mandatory column — row skipped
    ShortRow,
    /// Price cell present but unparseable — defaulted to 0, row kept
    InvalidPrice,
}

/// A recoverable problem on one data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    /// 1-based physical row number (header included in the count)
    pub row: usize,
    pub kind: RowErrorKind,
}

impl RowError {
    /// Whether this error means the row was dropped entirely.
    pub fn is_skip(&self) -> bool {
        !matches!(self.kind, RowErrorKind::InvalidPrice)
    }
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let what = match self.kind {
            RowErrorKind::MissingCode => "missing code",
            RowErrorKind::MissingName => "missing name",
            RowErrorKind::ShortRow => "row too short",
            RowErrorKind::InvalidPrice => "invalid price (defaulted to 0)",
        };
        write!(f, "row {}: {}", self.row, what)
    }
}

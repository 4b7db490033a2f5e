//! Render error type
//!
//! Layout and section drawing are best-effort and never fail; the only
//! fatal path is serializing the final byte stream.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("document serialization failed: {0}")]
    Serialize(#[from] std::io::Error),
}

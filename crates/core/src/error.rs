//! Error types for annotation extraction.

use thiserror::Error;

/// Primary error type for annotation extraction.
///
/// Most variants describe a fault confined to a single annotation, outline
/// entry or page label; extraction logs those and skips the item. Only
/// [`AnnotError::Source`] failures while enumerating pages abort a document.
#[derive(Error, Debug)]
pub enum AnnotError {
    #[error("invalid box coordinates ({x0}, {y0}, {x1}, {y1})")]
    InvalidBox { x0: f64, y0: f64, x1: f64, y1: f64 },

    #[error("quad point list has {0} values, not a multiple of 8")]
    InvalidQuadPoints(usize),

    #[error("annotation has neither a rect nor quad points")]
    MissingGeometry,

    #[error("type error: expected {expected}, got {got}")]
    TypeError {
        expected: &'static str,
        got: &'static str,
    },

    #[error("key not found: {0}")]
    KeyError(String),

    #[error("PDF object not found: {0}")]
    ObjectNotFound(u32),

    #[error("named destination not found: {0}")]
    DestinationNotFound(String),

    #[error("unsupported outline destination: {0}")]
    UnsupportedDestination(String),

    #[error("page label fault: {0}")]
    PageLabel(String),

    #[error("outline invariant violated: {0}")]
    OutlineInvariant(String),

    #[error("invalid extraction parameter: {0}")]
    InvalidParams(String),

    #[error("document source error: {0}")]
    Source(String),
}

/// Convenience Result type alias for AnnotError.
pub type Result<T> = std::result::Result<T, AnnotError>;

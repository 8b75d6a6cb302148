//! Extraction parameters.
//!
//! Contains ExtractParams for controlling how annotations are ordered and
//! how much context they collect.

use crate::error::{AnnotError, Result};

/// Default number of characters of context kept around deletions/insertions.
pub const DEFAULT_CONTEXT_CHARS: usize = 256;

/// Parameters for annotation extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractParams {
    /// Fixed number of columns on every page. Overrides the reading order
    /// inferred from layout analysis with a simple column-by-column order.
    pub columns_per_page: Option<u32>,

    /// Number of characters captured before and after annotations that want
    /// context (strike-outs and carets).
    pub context_chars: usize,

    /// Derive human page labels from the document's page-label tree.
    pub use_page_labels: bool,
}

impl Default for ExtractParams {
    fn default() -> Self {
        Self {
            columns_per_page: None,
            context_chars: DEFAULT_CONTEXT_CHARS,
            use_page_labels: true,
        }
    }
}

impl ExtractParams {
    /// Creates parameters with the given column count and defaults otherwise.
    pub fn with_columns(columns_per_page: u32) -> Result<Self> {
        let params = Self {
            columns_per_page: Some(columns_per_page),
            ..Self::default()
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.columns_per_page == Some(0) {
            return Err(AnnotError::InvalidParams(
                "columns_per_page must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let p = ExtractParams::default();
        assert_eq!(p.columns_per_page, None);
        assert_eq!(p.context_chars, 256);
        assert!(p.use_page_labels);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn zero_columns_rejected() {
        assert!(matches!(
            ExtractParams::with_columns(0),
            Err(AnnotError::InvalidParams(_))
        ));
        assert_eq!(
            ExtractParams::with_columns(2).unwrap().columns_per_page,
            Some(2)
        );
    }
}

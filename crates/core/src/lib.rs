//! pdfannots - extract annotations from PDF documents in reading order.
//!
//! Consumes the positioned-character stream of a layout analyzer (see
//! [`source::PdfSource`]) and produces a [`Document`] whose annotations carry
//! the text they cover, surrounding context for deletions and insertions,
//! reply threads, and the nearest preceding outline entry.

pub mod annotation;
pub mod document;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod layout;
pub mod outline;
pub mod page_labels;
pub mod params;
pub mod pdftypes;
pub mod pos;
pub mod processor;
pub mod source;
pub mod utils;

pub use annotation::{Annotation, AnnotationType, Rgb};
pub use document::{Document, Page};
pub use error::{AnnotError, Result};
pub use extract::{process_document, process_document_with_progress};
pub use outline::Outline;
pub use params::ExtractParams;
pub use pos::Pos;
pub use source::{MemoryDocument, PdfSource};

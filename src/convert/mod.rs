//! Intake & Conversion Pipeline
//!
//! Owns the selected-document slot and drives the two-stage conversion:
//! DOCX bytes -> HTML body (extraction) -> EPUB container (packaging).
//!
//! Flow:
//! 1. A document is selected (upload); title/author are pre-filled if empty
//! 2. `convert()` checks preconditions, extracts HTML, packages the EPUB
//! 3. The packaged bytes land in a single token-addressed artifact slot;
//!    each success replaces the slot and retires the previous token

pub mod controller;
pub mod docx;
pub mod epub;
pub mod error;
pub mod traits;
pub mod types;

pub use controller::ConversionController;
pub use docx::DocxExtractor;
pub use epub::EpubPackager;
pub use error::{ConvertError, ExtractError, PackageError};
pub use traits::{Extractor, Packager};
pub use types::*;

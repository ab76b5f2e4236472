//! Batch annotation pipeline components.
//!
//! - **staging**: Uniquely named temporary copies of uploaded images
//! - **annotate**: The per-image loop (stage, upload, generate, extract)

pub mod annotate;
pub mod staging;

// Re-exports for convenient access
pub use annotate::{BatchAnnotator, GENERIC_FAILURE_MESSAGE};
pub use staging::StagedFile;

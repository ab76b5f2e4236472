//! Annotator Core - batch image description over a multimodal generation API.
//!
//! Takes a batch of uploaded images with optional per-image prompts and
//! returns one generated description (or error) per image, in input order.
//!
//! # Architecture
//!
//! ```text
//! Form fields → Validate → for each image: Stage → Upload → Generate → Extract → Results
//! ```
//!
//! A failing image never aborts the batch; only request validation does.
//!
//! # Usage
//!
//! ```rust,ignore
//! use annotator_core::{BatchAnnotator, BatchRequest, Config, GeminiClient, RequestDefaults};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let defaults = RequestDefaults::from_config(&config.annotation, &config.credentials.sources);
//!     let annotator = BatchAnnotator::new(
//!         Arc::new(GeminiClient::from_config(&config)),
//!         config.staging_dir(),
//!     );
//!
//!     let batch = BatchRequest::default().validate(&defaults)?;
//!     let result = annotator.annotate(&batch).await;
//!     println!("{}", serde_json::to_string(&result)?);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod pipeline;
pub mod request;
pub mod types;

// Re-exports for convenient access
pub use client::{extract_text, GeminiClient, GenerationClient, GenerationOutput};
pub use config::Config;
pub use credentials::CredentialPool;
pub use error::{ConfigError, ItemError, RequestError};
pub use pipeline::BatchAnnotator;
pub use request::{BatchRequest, RequestDefaults, UploadedImage, ValidatedBatch};
pub use types::{AssetReference, BatchResult, ImageItem, ResultEntry};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Batch annotation engine.
//!
//! Processes the items of a validated batch strictly one after another:
//! stage, pick a key, upload, generate, extract text. Every item yields
//! exactly one [`ResultEntry`]; a failure is recorded on that entry and the
//! loop moves on.

use super::staging::StagedFile;
use crate::client::{extract_text, GenerationClient, GenerationRequest};
use crate::error::{ItemError, ItemResult};
use crate::request::ValidatedBatch;
use crate::types::{BatchResult, ImageItem, ResultEntry};
use std::path::PathBuf;
use std::sync::Arc;

/// Used when a failure carries no description of its own.
pub const GENERIC_FAILURE_MESSAGE: &str = "failed to process image";

/// Sequential per-request annotation engine.
#[derive(Clone)]
pub struct BatchAnnotator {
    client: Arc<dyn GenerationClient>,
    staging_dir: PathBuf,
}

impl BatchAnnotator {
    pub fn new(client: Arc<dyn GenerationClient>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            staging_dir: staging_dir.into(),
        }
    }

    /// Annotate every item of the batch, preserving input order.
    pub async fn annotate(&self, batch: &ValidatedBatch) -> BatchResult {
        tracing::info!(
            "Annotating {} images with {} via {} ({} keys)",
            batch.items.len(),
            batch.model,
            self.client.name(),
            batch.credentials.len()
        );

        let mut results = Vec::with_capacity(batch.items.len());
        for (index, item) in batch.items.iter().enumerate() {
            let prompt = item.effective_prompt(&batch.default_prompt);
            let entry = match self.annotate_single(batch, item, prompt).await {
                Ok(text) => ResultEntry::success(&item.filename, prompt, text),
                Err(e) => {
                    match &e {
                        ItemError::UploadFailed { reason } => {
                            tracing::warn!("Upload failed for {} (#{index}): {reason}", item.filename);
                        }
                        ItemError::GenerationFailed {
                            status_code: Some(status),
                            ..
                        } => {
                            tracing::warn!(
                                "Generation failed for {} (#{index}, HTTP {status}): {e}",
                                item.filename
                            );
                        }
                        _ => {
                            tracing::warn!("Annotation failed for {} (#{index}): {e}", item.filename);
                        }
                    }
                    ResultEntry::failure(&item.filename, prompt, failure_message(&e))
                }
            };
            results.push(entry);
        }

        let result = BatchResult { results };
        let (succeeded, failed) = result.counts();
        log_batch_stats(succeeded, failed);
        result
    }

    /// Run one item through the pipeline. The staging file is released
    /// before returning, whatever the outcome.
    async fn annotate_single(
        &self,
        batch: &ValidatedBatch,
        item: &ImageItem,
        prompt: &str,
    ) -> ItemResult<String> {
        let staged = StagedFile::create(&self.staging_dir, item).await?;
        let outcome = self.upload_and_generate(batch, item, prompt, &staged).await;

        if let Err(e) = staged.release().await {
            tracing::warn!("{e} ({})", item.filename);
        }
        outcome
    }

    async fn upload_and_generate(
        &self,
        batch: &ValidatedBatch,
        item: &ImageItem,
        prompt: &str,
        staged: &StagedFile,
    ) -> ItemResult<String> {
        let credential = batch.credentials.pick(&mut rand::thread_rng()).to_string();

        let asset = self
            .client
            .upload(&credential, staged.path(), &item.filename, &item.media_type)
            .await?
            .into_reference()?;

        let request = GenerationRequest {
            model: batch.model.clone(),
            prompt: prompt.to_string(),
            asset,
        };
        let output = self.client.generate(&credential, &request).await?;
        Ok(extract_text(&output))
    }
}

/// The error string recorded on a failed entry.
fn failure_message(error: &ItemError) -> String {
    let message = error.to_string();
    if message.trim().is_empty() {
        GENERIC_FAILURE_MESSAGE.to_string()
    } else {
        message
    }
}

fn log_batch_stats(succeeded: usize, failed: usize) {
    if failed > 0 {
        tracing::warn!("Annotation: {} succeeded, {} failed", succeeded, failed);
    } else {
        tracing::info!("Annotation: {} succeeded", succeeded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{GenerationOutput, UploadedFile};
    use crate::credentials::CredentialPool;
    use crate::error::UPLOAD_FAILED_MESSAGE;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;

    /// How the mock answers for a given filename.
    #[derive(Clone)]
    enum Behavior {
        Describe(&'static str),
        UploadError,
        IncompleteUpload,
        GenerateError(&'static str),
        Shape(serde_json::Value),
    }

    /// A generation client whose answers are keyed by display name.
    ///
    /// Records every call and whether the staged file existed at upload time.
    struct MockClient {
        behaviors: HashMap<&'static str, Behavior>,
        uploads: Mutex<Vec<(String, String, PathBuf, bool)>>,
        prompts: Mutex<Vec<(String, String)>>,
    }

    impl MockClient {
        fn new(behaviors: &[(&'static str, Behavior)]) -> Arc<Self> {
            Arc::new(Self {
                behaviors: behaviors.iter().cloned().collect(),
                uploads: Mutex::new(Vec::new()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn behavior(&self, name: &str) -> Behavior {
            self.behaviors
                .get(name)
                .cloned()
                .unwrap_or(Behavior::Describe("described"))
        }

        fn uri_name(uri: &str) -> String {
            uri.trim_start_matches("mock://").to_string()
        }
    }

    #[async_trait]
    impl GenerationClient for MockClient {
        fn name(&self) -> &str {
            "mock"
        }

        async fn upload(
            &self,
            credential: &str,
            path: &Path,
            display_name: &str,
            media_type: &str,
        ) -> Result<UploadedFile, ItemError> {
            self.uploads.lock().unwrap().push((
                display_name.to_string(),
                credential.to_string(),
                path.to_path_buf(),
                path.exists(),
            ));
            match self.behavior(display_name) {
                Behavior::UploadError => Err(ItemError::upload("connection reset")),
                Behavior::IncompleteUpload => Ok(UploadedFile {
                    uri: Some(format!("mock://{display_name}")),
                    mime_type: None,
                }),
                _ => Ok(UploadedFile {
                    uri: Some(format!("mock://{display_name}")),
                    mime_type: Some(media_type.to_string()),
                }),
            }
        }

        async fn generate(
            &self,
            _credential: &str,
            request: &GenerationRequest,
        ) -> Result<GenerationOutput, ItemError> {
            let name = Self::uri_name(&request.asset.uri);
            self.prompts
                .lock()
                .unwrap()
                .push((name.clone(), request.prompt.clone()));
            match self.behavior(&name) {
                Behavior::Describe(text) => Ok(GenerationOutput::Text(text.to_string())),
                Behavior::GenerateError(message) => Err(ItemError::generation(message, Some(500))),
                Behavior::Shape(value) => Ok(GenerationOutput::from_json(value)),
                Behavior::UploadError | Behavior::IncompleteUpload => {
                    panic!("generate called after failed upload for {name}")
                }
            }
        }
    }

    fn batch(items: &[(&str, &str)], keys: &[&str]) -> ValidatedBatch {
        ValidatedBatch {
            items: items
                .iter()
                .map(|(name, prompt)| ImageItem {
                    filename: name.to_string(),
                    bytes: vec![0xFF, 0xD8, 0xFF],
                    media_type: "image/png".to_string(),
                    prompt: prompt.to_string(),
                })
                .collect(),
            model: "gemini-2.5-flash".to_string(),
            default_prompt: "Describe this image".to_string(),
            credentials: CredentialPool::new(keys.iter().map(|k| k.to_string())).unwrap(),
        }
    }

    async fn run(
        client: Arc<MockClient>,
        batch: &ValidatedBatch,
    ) -> (BatchResult, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let annotator = BatchAnnotator::new(client, dir.path());
        let result = annotator.annotate(batch).await;
        (result, dir)
    }

    #[tokio::test]
    async fn test_one_entry_per_image_in_order() {
        let client = MockClient::new(&[]);
        let batch = batch(&[("c.png", ""), ("a.png", ""), ("b.png", "")], &["k"]);
        let (result, _dir) = run(client, &batch).await;

        let names: Vec<_> = result.results.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["c.png", "a.png", "b.png"]);
        assert!(result.results.iter().all(|r| r.is_success()));
    }

    #[tokio::test]
    async fn test_upload_failure_is_isolated() {
        let client = MockClient::new(&[
            ("a.png", Behavior::Describe("A trumpet")),
            ("b.png", Behavior::UploadError),
        ]);
        let batch = batch(&[("a.png", ""), ("b.png", "")], &["k"]);
        let (result, _dir) = run(client, &batch).await;

        assert_eq!(
            result.results,
            vec![
                ResultEntry::success("a.png", "Describe this image", "A trumpet".to_string()),
                ResultEntry::failure(
                    "b.png",
                    "Describe this image",
                    UPLOAD_FAILED_MESSAGE.to_string()
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_in_middle_leaves_neighbors_intact() {
        let client = MockClient::new(&[
            ("a.png", Behavior::Describe("first")),
            ("b.png", Behavior::GenerateError("model overloaded")),
            ("c.png", Behavior::Describe("third")),
        ]);
        let batch = batch(&[("a.png", ""), ("b.png", ""), ("c.png", "")], &["k"]);
        let (result, _dir) = run(client, &batch).await;

        assert_eq!(result.results[0].text(), Some("first"));
        assert_eq!(result.results[1].error(), Some("model overloaded"));
        assert_eq!(result.results[2].text(), Some("third"));
        assert_eq!(result.counts(), (2, 1));
    }

    #[tokio::test]
    async fn test_incomplete_upload_skips_generation() {
        let client = MockClient::new(&[("a.png", Behavior::IncompleteUpload)]);
        let batch = batch(&[("a.png", "")], &["k"]);
        let (result, _dir) = run(client.clone(), &batch).await;

        assert_eq!(result.results[0].error(), Some(UPLOAD_FAILED_MESSAGE));
        assert!(client.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_all_failures_still_produce_full_batch() {
        let client = MockClient::new(&[
            ("a.png", Behavior::UploadError),
            ("b.png", Behavior::UploadError),
        ]);
        let batch = batch(&[("a.png", ""), ("b.png", "")], &["k"]);
        let (result, _dir) = run(client, &batch).await;

        assert_eq!(result.len(), 2);
        assert_eq!(result.counts(), (0, 2));
    }

    #[tokio::test]
    async fn test_effective_prompt_per_item() {
        let client = MockClient::new(&[]);
        let batch = batch(&[("a.png", ""), ("b.png", "What color is this?")], &["k"]);
        let (result, _dir) = run(client.clone(), &batch).await;

        let prompts = client.prompts.lock().unwrap().clone();
        assert_eq!(
            prompts,
            vec![
                ("a.png".to_string(), "Describe this image".to_string()),
                ("b.png".to_string(), "What color is this?".to_string()),
            ]
        );
        assert_eq!(result.results[0].prompt, "Describe this image");
        assert_eq!(result.results[1].prompt, "What color is this?");
    }

    #[tokio::test]
    async fn test_response_shapes_are_normalized() {
        let client = MockClient::new(&[
            (
                "a.png",
                Behavior::Shape(serde_json::json!({
                    "candidates": [{"content": {"parts": [{"text": "Hello"}, {"text": ""}, {"text": "World"}]}}]
                })),
            ),
            ("b.png", Behavior::Shape(serde_json::json!({"unexpected": true}))),
        ]);
        let batch = batch(&[("a.png", ""), ("b.png", "")], &["k"]);
        let (result, _dir) = run(client, &batch).await;

        assert_eq!(result.results[0].text(), Some("Hello\nWorld"));
        assert_eq!(result.results[1].text(), Some(""));
    }

    #[tokio::test]
    async fn test_credentials_come_from_pool() {
        let client = MockClient::new(&[]);
        let names: Vec<String> = (0..20).map(|i| format!("{i}.png")).collect();
        let items: Vec<(&str, &str)> = names.iter().map(|n| (n.as_str(), "")).collect();
        let batch = batch(&items, &["k1", "k2", "k3"]);
        let (_result, _dir) = run(client.clone(), &batch).await;

        let uploads = client.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 20);
        for (_, credential, _, _) in uploads.iter() {
            assert!(batch.credentials.contains(credential));
        }
    }

    #[tokio::test]
    async fn test_staging_files_exist_during_upload_and_are_removed() {
        let client = MockClient::new(&[
            ("a.png", Behavior::Describe("ok")),
            ("b.png", Behavior::GenerateError("boom")),
            ("c.png", Behavior::UploadError),
        ]);
        let batch = batch(&[("a.png", ""), ("b.png", ""), ("c.png", "")], &["k"]);
        let (_result, dir) = run(client.clone(), &batch).await;

        let uploads = client.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 3);
        for (name, _, path, existed) in uploads.iter() {
            assert!(existed, "staged file for {name} missing at upload time");
            assert!(!path.exists(), "staged file for {name} left behind");
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        let unique: std::collections::HashSet<_> = uploads.iter().map(|u| u.2.clone()).collect();
        assert_eq!(unique.len(), 3);
    }

    #[tokio::test]
    async fn test_staging_failure_becomes_item_error() {
        let client = MockClient::new(&[]);
        let batch = batch(&[("a.png", ""), ("b.png", "")], &["k"]);
        let dir = tempfile::tempdir().unwrap();
        let annotator = BatchAnnotator::new(client.clone(), dir.path().join("missing"));
        let result = annotator.annotate(&batch).await;

        assert_eq!(result.len(), 2);
        assert!(result.results[0]
            .error()
            .unwrap()
            .starts_with("Failed to stage image"));
        assert!(client.uploads.lock().unwrap().is_empty());
    }

    #[test]
    fn test_blank_failure_message_uses_fallback() {
        let err = ItemError::generation("  ", None);
        assert_eq!(failure_message(&err), GENERIC_FAILURE_MESSAGE);
        let err = ItemError::generation("real reason", None);
        assert_eq!(failure_message(&err), "real reason");
    }
}

//! Ingestion pipeline: upload → store original → extract text → extract profile → insert.
//!
//! Each document is an independent unit of work. A batch runs its documents
//! concurrently and reports every outcome separately; one failure never
//! aborts its siblings.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::candidates::store::{CandidateStore, StoreError};
use crate::ingest::extractor::{extract_text, DocumentKind, ExtractError};
use crate::ingest::profile::{extract_profile, ProfileError};
use crate::llm_client::{LlmError, TextModel};
use crate::models::candidate::{Candidate, NewCandidate};
use crate::storage::{FileStore, StorageError};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("document could not be decoded: {0}")]
    CorruptDocument(String),

    #[error("model response could not be parsed: {reason}")]
    ExtractionParse {
        reason: String,
        raw_response: String,
        resume_path: String,
    },

    #[error("model call failed: {0}")]
    ModelCall(#[from] LlmError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("file storage error: {0}")]
    Storage(#[from] StorageError),
}

impl IngestError {
    pub fn code(&self) -> &'static str {
        match self {
            IngestError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            IngestError::CorruptDocument(_) => "CORRUPT_DOCUMENT",
            IngestError::ExtractionParse { .. } => "EXTRACTION_PARSE_ERROR",
            IngestError::ModelCall(_) => "MODEL_CALL_ERROR",
            IngestError::Store(_) => "STORE_ERROR",
            IngestError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Whether resubmitting the same document could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            IngestError::ModelCall(_) | IngestError::Storage(_) | IngestError::Store(StoreError::Database(_))
        )
    }
}

impl From<ExtractError> for IngestError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::UnsupportedFormat(m) => IngestError::UnsupportedFormat(m),
            ExtractError::CorruptDocument(m) => IngestError::CorruptDocument(m),
        }
    }
}

/// A document as received from the request layer.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub media_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<FileOutcome>,
}

#[derive(Debug, Serialize)]
pub struct FileOutcome {
    pub file_name: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Created {
        candidate: Candidate,
    },
    Failed {
        code: &'static str,
        message: String,
        retryable: bool,
    },
}

impl Outcome {
    fn from_result(result: Result<Candidate, IngestError>) -> Self {
        match result {
            Ok(candidate) => Outcome::Created { candidate },
            Err(e) => Outcome::Failed {
                code: e.code(),
                message: e.to_string(),
                retryable: e.is_retryable(),
            },
        }
    }
}

#[derive(Clone)]
pub struct Ingestor {
    store: CandidateStore,
    model: Arc<dyn TextModel>,
    files: Arc<dyn FileStore>,
}

impl Ingestor {
    pub fn new(store: CandidateStore, model: Arc<dyn TextModel>, files: Arc<dyn FileStore>) -> Self {
        Self { store, model, files }
    }

    /// Runs one document through the whole pipeline.
    ///
    /// Unsupported formats are rejected before anything is stored. From then
    /// on the original stays in file storage whatever happens, and on a parse
    /// failure the raw model response is stored next to it.
    pub async fn submit_document(&self, upload: Upload) -> Result<Candidate, IngestError> {
        let Upload {
            file_name,
            media_type,
            bytes,
        } = upload;

        let kind = DocumentKind::resolve(media_type.as_deref(), &file_name).inspect_err(|e| {
            warn!(file = %file_name, "Rejected upload: {e}");
        })?;
        debug!(file = %file_name, media_type = kind.media_type(), "Accepted upload");

        let resume_path = self.files.put(bytes, &file_name).await?;
        let stored = self.files.get(&resume_path).await?;

        let resume_text = tokio::task::spawn_blocking(move || extract_text(&stored, kind))
            .await
            .unwrap_or_else(|_| Err(ExtractError::CorruptDocument("decoder task failed".to_string())))
            .inspect_err(|e| warn!(file = %file_name, path = %resume_path, "Extraction failed: {e}"))?;

        let profile = match extract_profile(self.model.as_ref(), &resume_text).await {
            Ok(profile) => profile,
            Err(ProfileError::ModelCall(e)) => {
                if e.is_auth_or_quota() {
                    error!("Model call refused, check ANTHROPIC_API_KEY and account quota: {e}");
                }
                return Err(IngestError::ModelCall(e));
            }
            Err(ProfileError::Parse {
                reason,
                raw_response,
            }) => {
                self.retain_response(&resume_path, &raw_response).await;
                return Err(IngestError::ExtractionParse {
                    reason,
                    raw_response,
                    resume_path,
                });
            }
        };

        let candidate = self
            .store
            .insert(&NewCandidate {
                profile,
                resume_text,
                resume_path,
            })
            .await?;

        info!(candidate_id = candidate.id, file = %file_name, "Ingested resume");
        Ok(candidate)
    }

    /// Processes every upload independently and reports each outcome in input order.
    pub async fn submit_batch(&self, uploads: Vec<Upload>) -> BatchReport {
        let names: Vec<String> = uploads.iter().map(|u| u.file_name.clone()).collect();
        let mut outcomes: Vec<Option<Outcome>> = names.iter().map(|_| None).collect();

        let mut tasks = JoinSet::new();
        for (index, upload) in uploads.into_iter().enumerate() {
            let ingestor = self.clone();
            tasks.spawn(async move { (index, ingestor.submit_document(upload).await) });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => outcomes[index] = Some(Outcome::from_result(result)),
                Err(e) => warn!("Batch item task failed: {e}"),
            }
        }

        let results: Vec<FileOutcome> = names
            .into_iter()
            .zip(outcomes)
            .map(|(file_name, outcome)| FileOutcome {
                file_name,
                outcome: outcome.unwrap_or(Outcome::Failed {
                    code: "INTERNAL_ERROR",
                    message: "processing task aborted".to_string(),
                    retryable: true,
                }),
            })
            .collect();

        let succeeded = results
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Created { .. }))
            .count();
        let failed = results.len() - succeeded;
        info!(succeeded, failed, "Batch upload finished");

        BatchReport {
            succeeded,
            failed,
            results,
        }
    }

    /// Keeps an unparseable model response for later inspection. Best effort.
    ///
    /// The response is named after the stored original (`<stored name>.model-response.txt`),
    /// so the two can be paired even when the same file name is uploaded twice.
    async fn retain_response(&self, resume_path: &str, raw_response: &str) {
        let stored_name = resume_path.rsplit(['/', '\\']).next().unwrap_or(resume_path);
        let name = format!("{stored_name}.model-response.txt");
        let bytes = Bytes::from(raw_response.to_string());
        match self.files.put(bytes, &name).await {
            Ok(path) => info!(
                resume_path = %resume_path,
                response_path = %path,
                "Retained unparseable model response"
            ),
            Err(e) => warn!(resume_path = %resume_path, "Could not retain model response: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use crate::ingest::extractor::tests::{docx_fixture, pdf_fixture};
    use crate::ingest::extractor::{DOCX_MEDIA_TYPE, PDF_MEDIA_TYPE};
    use crate::llm_client::testing::ScriptedModel;
    use crate::storage::LocalFileStore;

    const PROFILE_JSON: &str = r#"```json
{"name":"Asha Rao","email":"asha@example.com","skills":["Python","SQL"],"experience_years":5,"education":["B.E. Civil"]}
```"#;

    struct Harness {
        ingestor: Ingestor,
        store: CandidateStore,
        model: Arc<ScriptedModel>,
        dir: tempfile::TempDir,
    }

    async fn harness(model: ScriptedModel) -> Harness {
        let store = CandidateStore::new(memory_pool().await);
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(model);
        let ingestor = Ingestor::new(
            store.clone(),
            model.clone(),
            Arc::new(LocalFileStore::new(dir.path())),
        );
        Harness {
            ingestor,
            store,
            model,
            dir,
        }
    }

    fn docx_upload(name: &str) -> Upload {
        Upload {
            file_name: name.to_string(),
            media_type: Some(DOCX_MEDIA_TYPE.to_string()),
            bytes: Bytes::from(docx_fixture(&["Asha Rao", "Python, SQL", "Pune"])),
        }
    }

    fn corrupt_upload(name: &str) -> Upload {
        Upload {
            file_name: name.to_string(),
            media_type: Some(DOCX_MEDIA_TYPE.to_string()),
            bytes: Bytes::from_static(b"this is not a docx"),
        }
    }

    fn stored_files(dir: &tempfile::TempDir) -> Vec<String> {
        std::fs::read_dir(dir.path().join("resumes"))
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_submit_document_creates_candidate() {
        let h = harness(ScriptedModel::always(PROFILE_JSON)).await;

        let candidate = h.ingestor.submit_document(docx_upload("asha.docx")).await.unwrap();

        assert_eq!(candidate.name, "Asha Rao");
        assert_eq!(candidate.skills, vec!["Python", "SQL"]);
        assert!(candidate.resume_text.contains("Python, SQL"));
        assert!(candidate.resume_path.ends_with("-asha.docx"));
        assert_eq!(h.store.list_all().await.unwrap(), vec![candidate]);
        assert!(h.model.prompts()[0].contains("Asha Rao"));
    }

    #[tokio::test]
    async fn test_submit_pdf_creates_candidate() {
        let h = harness(ScriptedModel::always(PROFILE_JSON)).await;
        let upload = Upload {
            file_name: "asha.pdf".to_string(),
            media_type: Some(PDF_MEDIA_TYPE.to_string()),
            bytes: Bytes::from(pdf_fixture("Asha Rao Python")),
        };

        let candidate = h.ingestor.submit_document(upload).await.unwrap();

        assert_eq!(candidate.name, "Asha Rao");
        assert!(candidate.resume_text.contains("Asha Rao"));
        assert!(candidate.resume_path.ends_with("-asha.pdf"));
        assert!(h.model.prompts()[0].contains("Python"));
        assert_eq!(h.store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_format_never_reaches_model_or_storage() {
        let h = harness(ScriptedModel::always(PROFILE_JSON)).await;
        let upload = Upload {
            file_name: "notes.txt".to_string(),
            media_type: Some("text/plain".to_string()),
            bytes: Bytes::from_static(b"hello"),
        };

        let err = h.ingestor.submit_document(upload).await.unwrap_err();

        assert!(matches!(err, IngestError::UnsupportedFormat(_)));
        assert_eq!(h.model.calls(), 0);
        assert!(stored_files(&h.dir).is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_document_retains_original_and_skips_model() {
        let h = harness(ScriptedModel::always(PROFILE_JSON)).await;

        let err = h.ingestor.submit_document(corrupt_upload("broken.docx")).await.unwrap_err();

        assert!(matches!(err, IngestError::CorruptDocument(_)));
        assert!(!err.is_retryable());
        assert_eq!(h.model.calls(), 0);
        assert_eq!(h.store.count().await.unwrap(), 0);
        let files = stored_files(&h.dir);
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("-broken.docx"));
    }

    #[tokio::test]
    async fn test_malformed_response_leaves_store_unchanged_and_keeps_response() {
        let truncated = r#"{"name":"Asha","skills":["Pyth"#;
        let h = harness(ScriptedModel::always(truncated)).await;

        let err = h.ingestor.submit_document(docx_upload("asha.docx")).await.unwrap_err();

        match &err {
            IngestError::ExtractionParse {
                raw_response,
                resume_path,
                ..
            } => {
                assert_eq!(raw_response, truncated);
                assert!(resume_path.ends_with("-asha.docx"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
        assert_eq!(err.code(), "EXTRACTION_PARSE_ERROR");
        assert_eq!(h.store.count().await.unwrap(), 0);

        let stored_name = match &err {
            IngestError::ExtractionParse { resume_path, .. } => {
                resume_path.rsplit('/').next().unwrap().to_string()
            }
            _ => unreachable!(),
        };
        let files = stored_files(&h.dir);
        assert_eq!(files.len(), 2);
        let response_file = files
            .iter()
            .find(|f| f.ends_with(".model-response.txt"))
            .expect("retained response");
        assert!(response_file.ends_with(&format!("-{stored_name}.model-response.txt")));
        let retained = std::fs::read_to_string(h.dir.path().join("resumes").join(response_file)).unwrap();
        assert_eq!(retained, truncated);
    }

    #[tokio::test]
    async fn test_retained_responses_pair_with_their_originals() {
        let h = harness(ScriptedModel::always("not json")).await;

        let mut originals = Vec::new();
        for _ in 0..2 {
            match h.ingestor.submit_document(docx_upload("asha.docx")).await {
                Err(IngestError::ExtractionParse { resume_path, .. }) => {
                    originals.push(resume_path.rsplit('/').next().unwrap().to_string())
                }
                other => panic!("expected parse error, got {other:?}"),
            }
        }
        assert_ne!(originals[0], originals[1]);

        let files = stored_files(&h.dir);
        assert_eq!(files.len(), 4);
        for original in &originals {
            let suffix = format!("-{original}.model-response.txt");
            assert_eq!(files.iter().filter(|f| f.ends_with(&suffix)).count(), 1);
        }
    }

    #[tokio::test]
    async fn test_model_failure_is_retryable_and_not_a_parse_error() {
        let h = harness(ScriptedModel::failing(503)).await;

        let err = h.ingestor.submit_document(docx_upload("asha.docx")).await.unwrap_err();

        assert!(matches!(err, IngestError::ModelCall(_)));
        assert!(err.is_retryable());
        assert_eq!(h.store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_batch_reports_each_item_and_keeps_successes() {
        let h = harness(ScriptedModel::always(PROFILE_JSON)).await;
        let uploads = vec![
            docx_upload("one.docx"),
            corrupt_upload("two.docx"),
            docx_upload("three.docx"),
        ];

        let report = h.ingestor.submit_batch(uploads).await;

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        let names: Vec<_> = report.results.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["one.docx", "two.docx", "three.docx"]);
        assert!(matches!(report.results[0].outcome, Outcome::Created { .. }));
        assert!(matches!(
            report.results[1].outcome,
            Outcome::Failed { code: "CORRUPT_DOCUMENT", .. }
        ));
        assert!(matches!(report.results[2].outcome, Outcome::Created { .. }));

        let stored_ids: Vec<i64> = h.store.list_all().await.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(stored_ids.len(), 2);
        for result in &report.results {
            if let Outcome::Created { candidate } = &result.outcome {
                assert!(stored_ids.contains(&candidate.id));
            }
        }
    }

    #[tokio::test]
    async fn test_batch_report_serializes_per_file_status() {
        let h = harness(ScriptedModel::always(PROFILE_JSON)).await;
        let report = h.ingestor.submit_batch(vec![corrupt_upload("bad.docx")]).await;

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["succeeded"], 0);
        assert_eq!(json["failed"], 1);
        assert_eq!(json["results"][0]["file_name"], "bad.docx");
        assert_eq!(json["results"][0]["status"], "failed");
        assert_eq!(json["results"][0]["code"], "CORRUPT_DOCUMENT");
        assert_eq!(json["results"][0]["retryable"], false);
    }
}

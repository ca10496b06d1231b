use crate::candidates::store::CandidateStore;
use crate::ingest::pipeline::Ingestor;
use crate::search::executor::Searcher;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: CandidateStore,
    pub ingestor: Ingestor,
    pub searcher: Searcher,
    /// Request body ceiling for upload routes.
    pub max_upload_bytes: usize,
}

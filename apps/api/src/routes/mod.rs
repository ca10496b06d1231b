pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::candidates::handlers as candidates;
use crate::ingest::handlers as ingest;
use crate::search::handlers as search;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        // Ingestion
        .route("/api/v1/candidates/upload", post(ingest::handle_upload))
        .route("/api/v1/candidates/batch", post(ingest::handle_batch_upload))
        // Store
        .route("/api/v1/candidates", get(candidates::handle_list_candidates))
        .route(
            "/api/v1/candidates/:id",
            get(candidates::handle_get_candidate).delete(candidates::handle_delete_candidate),
        )
        // Search
        .route("/api/v1/search", post(search::handle_search))
        .layer(body_limit)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::candidates::store::{tests::new_candidate, CandidateStore};
    use crate::db::memory_pool;
    use crate::ingest::extractor::{tests::docx_fixture, DOCX_MEDIA_TYPE};
    use crate::ingest::pipeline::Ingestor;
    use crate::llm_client::testing::ScriptedModel;
    use crate::search::executor::Searcher;
    use crate::storage::local::LocalFileStore;

    const BOUNDARY: &str = "candidex-test-boundary";

    async fn app(reply: &str) -> (Router, CandidateStore, tempfile::TempDir) {
        let store = CandidateStore::new(memory_pool().await);
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(ScriptedModel::always(reply));
        let state = AppState {
            store: store.clone(),
            ingestor: Ingestor::new(
                store.clone(),
                model.clone(),
                Arc::new(LocalFileStore::new(dir.path())),
            ),
            searcher: Searcher::new(store.clone(), model),
            max_upload_bytes: 1024 * 1024,
        };
        (build_router(state), store, dir)
    }

    fn upload_request(uri: &str, files: &[(&str, &str, &str, &[u8])]) -> Request<Body> {
        Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(files)))
            .unwrap()
    }

    fn multipart_body(files: &[(&str, &str, &str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (field, file_name, media_type, bytes) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {media_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn test_health_reports_candidate_count() {
        let (app, store, _dir) = app("unused").await;
        store.insert(&new_candidate("Asha", &["SQL"])).await.unwrap();

        let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"]["candidates"], 1);
    }

    #[tokio::test]
    async fn test_upload_creates_candidate() {
        let reply = r#"{"name":"Asha Rao","skills":["Python"],"experience_years":5}"#;
        let (app, store, _dir) = app(reply).await;
        let document = docx_fixture(&["Asha Rao", "Python"]);

        let (status, body) = send(
            &app,
            upload_request(
                "/api/v1/candidates/upload",
                &[("resume", "asha.docx", DOCX_MEDIA_TYPE, document.as_slice())],
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Asha Rao");
        assert_eq!(body["skills"], json!(["Python"]));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upload_unsupported_format_is_415() {
        let (app, store, _dir) = app("unused").await;

        let (status, body) = send(
            &app,
            upload_request(
                "/api/v1/candidates/upload",
                &[("resume", "notes.txt", "text/plain", &b"plain text"[..])],
            ),
        )
        .await;

        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["error"]["code"], "UNSUPPORTED_FORMAT");
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_upload_without_resume_field_is_400() {
        let (app, _store, _dir) = app("unused").await;
        let document = docx_fixture(&["Asha Rao"]);

        let (status, body) = send(
            &app,
            upload_request(
                "/api/v1/candidates/upload",
                &[("attachment", "asha.docx", DOCX_MEDIA_TYPE, document.as_slice())],
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_batch_reports_each_file() {
        let reply = r#"{"name":"Asha Rao"}"#;
        let (app, store, _dir) = app(reply).await;
        let document = docx_fixture(&["Asha Rao"]);

        let (status, body) = send(
            &app,
            upload_request(
                "/api/v1/candidates/batch",
                &[
                    ("resumes", "one.docx", DOCX_MEDIA_TYPE, document.as_slice()),
                    ("resumes", "two.docx", DOCX_MEDIA_TYPE, &b"garbage"[..]),
                ],
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["succeeded"], 1);
        assert_eq!(body["failed"], 1);
        assert_eq!(body["results"][0]["status"], "created");
        assert_eq!(body["results"][1]["status"], "failed");
        assert_eq!(body["results"][1]["code"], "CORRUPT_DOCUMENT");
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_and_delete_twice() {
        let (app, store, _dir) = app("unused").await;
        let created = store.insert(&new_candidate("Asha", &["SQL"])).await.unwrap();
        let uri = format!("/api/v1/candidates/{}", created.id);

        let (status, listed) = send(&app, Request::get("/api/v1/candidates").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().map(Vec::len), Some(1));

        let (status, fetched) = send(&app, Request::get(uri.as_str()).body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["name"], "Asha");

        let (status, first) = send(&app, Request::delete(uri.as_str()).body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first, json!({ "deleted": true }));

        let (status, second) = send(&app, Request::delete(uri.as_str()).body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second, json!({ "deleted": false }));

        let (status, missing) = send(&app, Request::get(uri.as_str()).body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(missing["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_empty_search_is_400() {
        let (app, _store, _dir) = app("SELECT * FROM candidates").await;

        let (status, body) = send(&app, json_request("POST", "/api/v1/search", json!({ "query": "  " }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_search_returns_matches() {
        let (app, store, _dir) = app("SELECT * FROM candidates WHERE name LIKE '%Asha%'").await;
        store.insert(&new_candidate("Asha", &["SQL"])).await.unwrap();
        store.insert(&new_candidate("Ravi", &["Go"])).await.unwrap();

        let (status, body) = send(&app, json_request("POST", "/api/v1/search", json!({ "query": "Asha" }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["name"], "Asha");
    }

    #[tokio::test]
    async fn test_destructive_translation_is_422_and_changes_nothing() {
        let (app, store, _dir) = app("DROP TABLE candidates").await;
        store.insert(&new_candidate("Asha", &["SQL"])).await.unwrap();

        let (status, body) = send(&app, json_request("POST", "/api/v1/search", json!({ "query": "drop it" }))).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "EXECUTION_ERROR");
        assert_eq!(store.count().await.unwrap(), 1);
    }
}

//! File storage provider for original resume documents.
//!
//! `put` accepts bytes plus a suggested name and returns an opaque path that
//! `get` can later resolve. Local-directory and S3 backends are provided.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

pub mod local;
pub mod s3;

pub use local::LocalFileStore;
pub use s3::S3FileStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("S3 error: {0}")]
    S3(String),

    #[error("path `{0}` does not belong to this store")]
    ForeignPath(String),
}

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn put(&self, bytes: Bytes, suggested_name: &str) -> Result<String, StorageError>;

    async fn get(&self, path: &str) -> Result<Bytes, StorageError>;
}

/// Collision-free object key that keeps a sanitized copy of the suggested name.
pub(crate) fn object_key(suggested_name: &str) -> String {
    let sanitized: String = suggested_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(100)
        .collect();
    let sanitized = sanitized.trim_start_matches('.');
    let sanitized = if sanitized.is_empty() { "document" } else { sanitized };
    format!("resumes/{}-{}", Uuid::new_v4(), sanitized)
}

pub(crate) fn content_type_for(key: &str) -> &'static str {
    let lower = key.to_ascii_lowercase();
    if lower.ends_with(".pdf") {
        "application/pdf"
    } else if lower.ends_with(".docx") {
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    } else if lower.ends_with(".txt") {
        "text/plain; charset=utf-8"
    } else {
        "application/octet-stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_sanitizes_and_is_unique() {
        let a = object_key("../../etc/My Resume (final).pdf");
        let b = object_key("../../etc/My Resume (final).pdf");
        assert_ne!(a, b);
        assert!(a.starts_with("resumes/"));
        assert!(a.ends_with("-My_Resume__final_.pdf"));
        assert!(!a.contains(".."));
    }

    #[test]
    fn test_object_key_handles_empty_and_hidden_names() {
        assert!(object_key("").ends_with("-document"));
        assert!(object_key(".bashrc").ends_with("-bashrc"));
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a/b.PDF"), "application/pdf");
        assert_eq!(content_type_for("x.model-response.txt"), "text/plain; charset=utf-8");
        assert_eq!(content_type_for("x"), "application/octet-stream");
    }
}

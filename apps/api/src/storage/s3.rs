use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;

use super::{content_type_for, object_key, FileStore, StorageError};

/// Stores documents in an S3 (or MinIO) bucket. Paths are `s3://bucket/key`.
#[derive(Clone)]
pub struct S3FileStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3FileStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    fn prefix(&self) -> String {
        format!("s3://{}/", self.bucket)
    }

    fn key_of<'a>(&self, path: &'a str) -> Result<&'a str, StorageError> {
        path.strip_prefix(&self.prefix())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| StorageError::ForeignPath(path.to_string()))
    }
}

#[async_trait]
impl FileStore for S3FileStore {
    async fn put(&self, bytes: Bytes, suggested_name: &str) -> Result<String, StorageError> {
        let key = object_key(suggested_name);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(content_type_for(&key))
            .send()
            .await
            .map_err(|e| StorageError::S3(format!("upload failed: {e}")))?;

        info!("Uploaded document to s3://{}/{}", self.bucket, key);
        Ok(format!("{}{}", self.prefix(), key))
    }

    async fn get(&self, path: &str) -> Result<Bytes, StorageError> {
        let key = self.key_of(path)?;
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::S3(format!("download failed: {e}")))?;

        let data = object
            .body
            .collect()
            .await
            .map_err(|e| StorageError::S3(format!("download stream failed: {e}")))?;
        Ok(data.into_bytes())
    }
}

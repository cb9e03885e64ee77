//! S3-compatible object storage client, aimed at Cloudflare R2.
//!
//! R2 speaks the S3 API, so this wraps the AWS S3 SDK pointed at the
//! account's R2 endpoint with path-style addressing. Not a lifecycle
//! component: the client holds no connection state worth sequencing, so
//! it is constructed directly by the composition root.

use std::path::Path;
use std::time::Duration;

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;

use crate::config::schema::StorageSettings;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("missing object storage configuration: {0}")]
    MissingField(&'static str),

    #[error("object storage request failed: {0}")]
    Request(String),

    #[error("failed to read {path}: {source}")]
    File {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid presign expiry: {0}")]
    Presign(String),
}

/// Result of a completed upload.
#[derive(Debug, Clone)]
pub struct UploadResult {
    /// Public URL (custom domain when configured).
    pub url: String,
    pub key: String,
    pub size: u64,
    pub content_type: String,
}

/// Uploads, lists, and deletes objects in one bucket.
pub struct ObjectStorage {
    client: aws_sdk_s3::Client,
    bucket: String,
    endpoint: String,
    custom_domain: Option<String>,
}

impl ObjectStorage {
    /// Build a client from validated settings.
    pub fn new(settings: &StorageSettings) -> Result<Self, StorageError> {
        for (value, field) in [
            (&settings.account_id, "account_id"),
            (&settings.access_key_id, "access_key_id"),
            (&settings.access_key_secret, "access_key_secret"),
            (&settings.bucket, "bucket"),
        ] {
            if value.is_empty() {
                return Err(StorageError::MissingField(field));
            }
        }

        let endpoint = settings.endpoint.clone().unwrap_or_else(|| {
            format!("https://{}.r2.cloudflarestorage.com", settings.account_id)
        });
        let region = if settings.region.is_empty() {
            "auto".to_string()
        } else {
            settings.region.clone()
        };

        let credentials = Credentials::new(
            settings.access_key_id.clone(),
            settings.access_key_secret.clone(),
            None,
            None,
            "chassis-static",
        );
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region))
            .endpoint_url(&endpoint)
            .credentials_provider(credentials)
            // R2 buckets are addressed by path, not virtual host.
            .force_path_style(true)
            .build();

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(config),
            bucket: settings.bucket.clone(),
            endpoint,
            custom_domain: settings.custom_domain.clone(),
        })
    }

    /// Upload a byte buffer. A missing key becomes a fresh UUID; a
    /// missing content type is inferred from the key's extension.
    pub async fn upload_bytes(
        &self,
        data: Vec<u8>,
        key: Option<String>,
        content_type: Option<&str>,
    ) -> Result<UploadResult, StorageError> {
        let key = key.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let content_type = content_type
            .map(str::to_owned)
            .unwrap_or_else(|| content_type_for(&key).to_string());
        let size = data.len() as u64;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .content_length(size as i64)
            .content_type(&content_type)
            .send()
            .await
            .map_err(|error| StorageError::Request(error.to_string()))?;

        Ok(UploadResult {
            url: self.public_url(&key),
            key,
            size,
            content_type,
        })
    }

    /// Upload a local file under a dated, collision-free key.
    pub async fn upload_file(&self, path: &Path) -> Result<UploadResult, StorageError> {
        let data = tokio::fs::read(path).await.map_err(|source| StorageError::File {
            path: path.display().to_string(),
            source,
        })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let key = dated_key(&file_name);
        let content_type = content_type_for(&file_name).to_string();

        self.upload_bytes(data, Some(key), Some(&content_type)).await
    }

    /// Presigned GET URL valid for `expires`.
    pub async fn presigned_url(
        &self,
        key: &str,
        expires: Duration,
    ) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(expires)
            .map_err(|error| StorageError::Presign(error.to_string()))?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|error| StorageError::Request(error.to_string()))?;
        Ok(request.uri().to_string())
    }

    /// Delete one object.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|error| StorageError::Request(error.to_string()))?;
        Ok(())
    }

    /// Keys under `prefix`, up to `max_keys`.
    pub async fn list(&self, prefix: &str, max_keys: i32) -> Result<Vec<String>, StorageError> {
        let mut request = self.client.list_objects_v2().bucket(&self.bucket);
        if !prefix.is_empty() {
            request = request.prefix(prefix);
        }
        if max_keys > 0 {
            request = request.max_keys(max_keys);
        }

        let output = request
            .send()
            .await
            .map_err(|error| StorageError::Request(error.to_string()))?;
        Ok(output
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_owned))
            .collect())
    }

    fn public_url(&self, key: &str) -> String {
        match &self.custom_domain {
            Some(domain) => format!("{}/{key}", domain.trim_end_matches('/')),
            None => format!("{}/{}/{key}", self.endpoint, self.bucket),
        }
    }
}

/// Dated key for uploaded files: `uploads/YYYYMMDD-xxxxxxxx-name`.
fn dated_key(file_name: &str) -> String {
    let date = chrono::Utc::now().format("%Y%m%d");
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    format!("uploads/{date}-{}-{file_name}", &nonce[..8])
}

/// Content type by file extension, octet-stream otherwise.
fn content_type_for(name: &str) -> &'static str {
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "html" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

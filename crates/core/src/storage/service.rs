//! Signed upload and destroy calls against the Cloudinary REST API.

use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::config::CloudinaryConfig;
use super::error::StorageError;

/// Parameters Cloudinary leaves out of the signature.
const UNSIGNED_PARAMS: [&str; 5] = [
    "file",
    "api_key",
    "cloud_name",
    "resource_type",
    "signature_algorithm",
];

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A file to upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// File content.
    pub data: Bytes,
    /// Original filename.
    pub filename: String,
    /// Content type (MIME type).
    pub content_type: String,
    /// Sub-folder below the configured root, e.g. `products`.
    pub folder: Option<String>,
}

/// A stored file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedMedia {
    /// Public HTTPS URL.
    #[serde(rename = "secure_url")]
    pub url: String,
    /// Identifier used to destroy the file later.
    pub public_id: String,
    /// Stored size in bytes.
    pub bytes: u64,
    /// File format as detected by the host.
    #[serde(default)]
    pub format: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

/// Client for the media host.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

impl MediaStorage {
    /// Create a media storage client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: CloudinaryConfig) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, config })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &CloudinaryConfig {
        &self.config
    }

    /// Validate an upload against the size and type limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is empty, too large, or of a type that
    /// is not allowed.
    pub fn validate_upload(&self, content_type: &str, size: u64) -> Result<(), StorageError> {
        if size == 0 {
            return Err(StorageError::EmptyFile);
        }

        if size > self.config.max_file_size {
            return Err(StorageError::file_too_large(
                size,
                self.config.max_file_size,
            ));
        }

        if !self.config.is_mime_type_allowed(content_type) {
            return Err(StorageError::invalid_mime_type(content_type));
        }

        Ok(())
    }

    /// Signs request parameters.
    ///
    /// Parameters are sorted by name and joined as `a=1&b=2`, the API secret
    /// is appended, and the result is hashed with SHA-256 (lowercase hex).
    #[must_use]
    pub fn sign(&self, params: &[(&str, String)]) -> String {
        let mut signed: Vec<&(&str, String)> = params
            .iter()
            .filter(|(name, value)| !UNSIGNED_PARAMS.contains(name) && !value.is_empty())
            .collect();
        signed.sort_by(|a, b| a.0.cmp(b.0));

        let joined = signed
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("&");

        format!(
            "{:x}",
            Sha256::digest(format!("{joined}{}", self.config.api_secret).as_bytes())
        )
    }

    fn folder_for(&self, sub_folder: Option<&str>) -> String {
        match sub_folder.map(|s| s.trim_matches('/')).filter(|s| !s.is_empty()) {
            Some(sub) => format!("{}/{sub}", self.config.folder),
            None => self.config.folder.clone(),
        }
    }

    /// Uploads a file.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any network call, or an error if
    /// the host rejects the upload.
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadedMedia, StorageError> {
        self.validate_upload(&request.content_type, request.data.len() as u64)?;

        let timestamp = Utc::now().timestamp().to_string();
        let folder = self.folder_for(request.folder.as_deref());
        let signature = self.sign(&[
            ("folder", folder.clone()),
            ("timestamp", timestamp.clone()),
        ]);

        let part = Part::bytes(request.data.to_vec())
            .file_name(sanitize_filename(&request.filename))
            .mime_str(&request.content_type)?;
        let form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let response = self
            .client
            .post(self.config.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(status.as_u16(), &body));
        }

        let media: UploadedMedia = response.json().await?;
        tracing::info!(
            public_id = %media.public_id,
            bytes = media.bytes,
            "Uploaded media"
        );
        Ok(media)
    }

    /// Deletes a file. Deleting a file that is already gone succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the host rejects the request.
    pub async fn destroy(&self, public_id: &str) -> Result<(), StorageError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.sign(&[
            ("public_id", public_id.to_string()),
            ("timestamp", timestamp.clone()),
        ]);

        let form = Form::new()
            .text("public_id", public_id.to_string())
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let response = self
            .client
            .post(self.config.endpoint("destroy"))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(status.as_u16(), &body));
        }

        let outcome: DestroyResponse = response.json().await?;
        match outcome.result.as_str() {
            "ok" => tracing::info!(public_id, "Destroyed media"),
            "not found" => tracing::debug!(public_id, "Media already gone"),
            other => {
                return Err(StorageError::Upstream {
                    status: status.as_u16(),
                    message: other.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn upstream_error(status: u16, body: &str) -> StorageError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());
    StorageError::Upstream { status, message }
}

/// Only allows ASCII alphanumeric characters, dots, hyphens, and underscores.
fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> MediaStorage {
        MediaStorage::new(CloudinaryConfig::new("demo", "key", "abcd")).unwrap()
    }

    #[test]
    fn test_sign_upload_params() {
        let signature = storage().sign(&[
            ("timestamp", "1700000000".to_string()),
            ("folder", "local-fishing/products".to_string()),
        ]);
        assert_eq!(
            signature,
            "2e7e19ac4d321fbbfc9465ee36e6399f2270d8f44288c898bfce990f21252cb0"
        );
    }

    #[test]
    fn test_sign_destroy_params() {
        let signature = storage().sign(&[
            ("public_id", "local-fishing/products/abc123".to_string()),
            ("timestamp", "1700000000".to_string()),
        ]);
        assert_eq!(
            signature,
            "fb63b567b44dddf2780d87cf29a374aa44cc04544c675a7cd042af49ab1be4da"
        );
    }

    #[test]
    fn test_sign_skips_unsigned_params() {
        let service = storage();
        let base = service.sign(&[("timestamp", "1700000000".to_string())]);
        let with_unsigned = service.sign(&[
            ("timestamp", "1700000000".to_string()),
            ("api_key", "key".to_string()),
            ("file", "data".to_string()),
            ("signature_algorithm", "sha256".to_string()),
        ]);
        assert_eq!(base, with_unsigned);
    }

    #[test]
    fn test_validate_upload() {
        let service = storage();
        assert!(service.validate_upload("image/jpeg", 1024).is_ok());
        assert!(matches!(
            service.validate_upload("image/jpeg", 0),
            Err(StorageError::EmptyFile)
        ));
        assert!(matches!(
            service.validate_upload("image/jpeg", CloudinaryConfig::DEFAULT_MAX_FILE_SIZE + 1),
            Err(StorageError::FileTooLarge { .. })
        ));
        assert!(matches!(
            service.validate_upload("application/x-executable", 1024),
            Err(StorageError::InvalidMimeType { .. })
        ));
    }

    #[test]
    fn test_folder_for() {
        let service = storage();
        assert_eq!(service.folder_for(None), "local-fishing");
        assert_eq!(service.folder_for(Some("/products/")), "local-fishing/products");
        assert_eq!(service.folder_for(Some("")), "local-fishing");
    }

    #[test]
    fn test_upstream_error_reads_message() {
        let err = upstream_error(400, r#"{"error":{"message":"Invalid Signature"}}"#);
        assert!(matches!(
            err,
            StorageError::Upstream { status: 400, ref message } if message == "Invalid Signature"
        ));

        let err = upstream_error(502, "Bad Gateway");
        assert!(matches!(
            err,
            StorageError::Upstream { status: 502, ref message } if message == "Bad Gateway"
        ));
    }

    #[test]
    fn test_uploaded_media_from_response() {
        let body = r#"{
            "public_id": "local-fishing/products/abc123",
            "secure_url": "https://res.cloudinary.com/demo/image/upload/v1/abc123.jpg",
            "bytes": 2048,
            "format": "jpg",
            "width": 640
        }"#;
        let media: UploadedMedia = serde_json::from_str(body).unwrap();
        assert_eq!(media.public_id, "local-fishing/products/abc123");
        assert_eq!(media.bytes, 2048);
        assert!(media.url.starts_with("https://"));
    }

    #[tokio::test]
    async fn test_upload_validates_before_sending() {
        let service = MediaStorage::new(
            CloudinaryConfig::new("demo", "key", "abcd").with_api_base_url("http://127.0.0.1:9"),
        )
        .unwrap();
        let result = service
            .upload(UploadRequest {
                data: Bytes::from_static(b"<html></html>"),
                filename: "page.html".to_string(),
                content_type: "text/html".to_string(),
                folder: Some("products".to_string()),
            })
            .await;

        assert!(matches!(result, Err(StorageError::InvalidMimeType { .. })));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("fresh tilapia (1).jpg"), "fresh_tilapia__1_.jpg");
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_mime_type_validation(mime_type in "[a-z]+/[a-z0-9-]+") {
            let service = MediaStorage::new(CloudinaryConfig::new("demo", "key", "abcd"))
                .expect("should create service");

            let result = service.validate_upload(&mime_type, 1024);

            if service.config().is_mime_type_allowed(&mime_type) {
                prop_assert!(result.is_ok(), "Expected Ok for allowed MIME type");
            } else {
                let is_invalid_mime = matches!(result, Err(StorageError::InvalidMimeType { .. }));
                prop_assert!(is_invalid_mime, "Expected InvalidMimeType error");
            }
        }
    }

    proptest! {
        #[test]
        fn prop_file_size_validation(
            max_size in 1024u64..10_000_000,
            file_size in 1u64..20_000_000,
        ) {
            let config = CloudinaryConfig::new("demo", "key", "abcd").with_max_file_size(max_size);
            let service = MediaStorage::new(config).expect("should create service");

            let result = service.validate_upload("image/png", file_size);

            if file_size <= max_size {
                prop_assert!(result.is_ok(), "Expected Ok for valid file size");
            } else {
                let is_too_large = matches!(result, Err(StorageError::FileTooLarge { .. }));
                prop_assert!(is_too_large, "Expected FileTooLarge error");
            }
        }
    }

    // Signature does not depend on parameter order
    proptest! {
        #[test]
        fn prop_signature_order_independent(
            folder in "[a-z/]{1,20}",
            timestamp in 1_600_000_000i64..1_900_000_000,
        ) {
            let service = MediaStorage::new(CloudinaryConfig::new("demo", "key", "abcd"))
                .expect("should create service");

            let forward = service.sign(&[
                ("folder", folder.clone()),
                ("timestamp", timestamp.to_string()),
            ]);
            let reverse = service.sign(&[
                ("timestamp", timestamp.to_string()),
                ("folder", folder),
            ]);

            prop_assert_eq!(forward.len(), 64);
            prop_assert_eq!(forward, reverse);
        }
    }

    proptest! {
        #[test]
        fn prop_sanitized_filename_safe_chars(filename in ".*") {
            let sanitized = sanitize_filename(&filename);

            for c in sanitized.chars() {
                let is_safe = c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_';
                prop_assert!(is_safe, "Unexpected character in sanitized filename: {}", c);
            }
        }
    }
}

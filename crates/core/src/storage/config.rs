//! Media storage configuration.

use localfish_shared::config::CloudinarySettings;

/// Cloudinary account and upload limits.
#[derive(Clone)]
pub struct CloudinaryConfig {
    /// Cloud name (first path segment of the API).
    pub cloud_name: String,
    /// API key.
    pub api_key: String,
    /// API secret used to sign requests.
    pub api_secret: String,
    /// Root folder for uploads.
    pub folder: String,
    /// Maximum file size in bytes.
    pub max_file_size: u64,
    /// Allowed MIME types for upload.
    pub allowed_mime_types: Vec<String>,
    /// API base URL, without the cloud name.
    pub api_base_url: String,
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[hidden]")
            .field("folder", &self.folder)
            .field("max_file_size", &self.max_file_size)
            .finish_non_exhaustive()
    }
}

impl CloudinaryConfig {
    /// Default max file size: 10MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
    /// Public Cloudinary API.
    pub const DEFAULT_API_BASE_URL: &'static str = "https://api.cloudinary.com/v1_1";
    /// Default upload folder.
    pub const DEFAULT_FOLDER: &'static str = "local-fishing";

    /// Create a config with default limits.
    #[must_use]
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            folder: Self::DEFAULT_FOLDER.to_string(),
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            allowed_mime_types: Self::default_mime_types(),
            api_base_url: Self::DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Set the root upload folder.
    #[must_use]
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Point the client at another API host.
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Images and PDF receipts.
    #[must_use]
    pub fn default_mime_types() -> Vec<String> {
        vec![
            "image/jpeg".to_string(),
            "image/png".to_string(),
            "image/webp".to_string(),
            "image/gif".to_string(),
            "application/pdf".to_string(),
        ]
    }

    /// Check if a MIME type is allowed.
    #[must_use]
    pub fn is_mime_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_mime_types.iter().any(|t| t == mime_type)
    }

    /// Endpoint for `action` (`upload` or `destroy`).
    #[must_use]
    pub fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/{}/image/{action}",
            self.api_base_url.trim_end_matches('/'),
            self.cloud_name
        )
    }
}

impl From<&CloudinarySettings> for CloudinaryConfig {
    fn from(settings: &CloudinarySettings) -> Self {
        Self::new(
            settings.cloud_name.clone(),
            settings.api_key.clone(),
            settings.api_secret.clone(),
        )
        .with_folder(settings.folder.clone())
        .with_max_file_size(settings.max_file_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = CloudinaryConfig::new("demo", "key", "secret");
        assert_eq!(config.folder, "local-fishing");
        assert_eq!(config.max_file_size, CloudinaryConfig::DEFAULT_MAX_FILE_SIZE);
        assert!(config.is_mime_type_allowed("image/png"));
        assert!(config.is_mime_type_allowed("application/pdf"));
        assert!(!config.is_mime_type_allowed("text/html"));
    }

    #[test]
    fn test_endpoint() {
        let config = CloudinaryConfig::new("demo", "key", "secret");
        assert_eq!(
            config.endpoint("upload"),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );

        let local = config.with_api_base_url("http://localhost:9000/");
        assert_eq!(local.endpoint("destroy"), "http://localhost:9000/demo/image/destroy");
    }

    #[test]
    fn test_from_settings() {
        let settings = CloudinarySettings {
            cloud_name: "lake".to_string(),
            api_key: "123".to_string(),
            api_secret: "shh".to_string(),
            folder: "shop-7".to_string(),
            max_file_size: 2048,
        };
        let config = CloudinaryConfig::from(&settings);

        assert_eq!(config.cloud_name, "lake");
        assert_eq!(config.folder, "shop-7");
        assert_eq!(config.max_file_size, 2048);
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = CloudinaryConfig::new("demo", "key", "very-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("very-secret"));
    }
}

//! Blocking client for the preprocessing backend.
//!
//! One request per call, no retries. A failed call returns an error and never
//! touches editor state, so the caller can simply submit again.

use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::catalog::OptionsCatalog;
use crate::editor::PreprocessingConfig;
use crate::error::{ConfigError, Result, ResultExt};
use crate::types::ColumnDescriptor;

/// Default backend endpoint.
const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Default timeout for API requests in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable holding the backend URL.
pub const API_URL_ENV: &str = "LEX_API_URL";

/// Environment variable holding the bearer token.
pub const API_TOKEN_ENV: &str = "LEX_API_TOKEN";

/// Configuration for the backend client.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL all endpoint paths are relative to.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Bearer token sent with every request.
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            token: None,
        }
    }
}

impl ApiConfig {
    pub fn builder() -> ApiConfigBuilder {
        ApiConfigBuilder::default()
    }

    /// Read `LEX_API_URL` and `LEX_API_TOKEN`, falling back to defaults.
    pub fn from_env() -> Self {
        let mut builder = Self::builder();
        if let Ok(url) = std::env::var(API_URL_ENV) {
            builder = builder.base_url(url);
        }
        if let Ok(token) = std::env::var(API_TOKEN_ENV) {
            builder = builder.token(token);
        }
        builder.build()
    }

    /// Endpoint URL below the base URL. Each segment is percent-encoded, so a
    /// `/`, `?` or `#` inside an id stays part of that segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            ConfigError::InvalidSettings(format!("Invalid API base URL '{}': {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                ConfigError::InvalidSettings(format!(
                    "API base URL '{}' cannot have a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn file_endpoint(&self, file_id: &str, action: &str) -> Result<Url> {
        if matches!(file_id.trim(), "" | "." | "..") {
            return Err(ConfigError::InvalidSettings(format!(
                "Invalid file id '{file_id}'"
            )));
        }
        self.endpoint(&["files", file_id, action])
    }
}

/// Builder for [`ApiConfig`].
#[derive(Default)]
pub struct ApiConfigBuilder {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    token: Option<String>,
}

impl ApiConfigBuilder {
    /// Set the backend base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the request timeout in seconds.
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn build(self) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            token: self.token.filter(|t| !t.trim().is_empty()),
        }
    }
}

/// Backend answer to a preprocessing job submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitResponse {
    pub job_id: Option<String>,
    pub output_filename: Option<String>,
    pub download_url: Option<String>,
}

/// The columns endpoint answers with a bare list or `{"columns": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ColumnsResponse {
    Bare(Vec<ColumnDescriptor>),
    Wrapped { columns: Vec<ColumnDescriptor> },
}

/// Client for the preprocessing backend.
///
/// # Example
///
/// ```rust,ignore
/// use lex_prepconfig::client::{ApiClient, ApiConfig};
///
/// let client = ApiClient::new(ApiConfig::from_env())?;
/// let columns = client.fetch_columns("file-42")?;
/// ```
pub struct ApiClient {
    config: ApiConfig,
    client: Client,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::Api {
                status: None,
                message: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.authorized(request).send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(api_error(status.as_u16(), &body))
    }

    /// Column descriptors of an uploaded file.
    pub fn fetch_columns(&self, file_id: &str) -> Result<Vec<ColumnDescriptor>> {
        let url = self.config.file_endpoint(file_id, "columns")?;
        debug!(url = %url, "Fetching column info");
        let response = self
            .send(self.client.get(url))
            .context(format!("Fetching columns of file '{file_id}'"))?;
        let columns = match response.json::<ColumnsResponse>()? {
            ColumnsResponse::Bare(columns) | ColumnsResponse::Wrapped { columns } => columns,
        };
        info!(file_id, columns = columns.len(), "Column info loaded");
        Ok(columns)
    }

    /// The backend's option catalog.
    pub fn fetch_options(&self) -> Result<OptionsCatalog> {
        let url = self.config.endpoint(&["preprocessing", "options"])?;
        debug!(url = %url, "Fetching preprocessing options");
        let response = self
            .send(self.client.get(url))
            .context("Fetching preprocessing options")?;
        Ok(response.json()?)
    }

    /// Start a preprocessing job.
    pub fn submit(&self, file_id: &str, config: &PreprocessingConfig) -> Result<SubmitResponse> {
        let url = self.config.file_endpoint(file_id, "preprocess")?;
        debug!(url = %url, mode = %config.mode, "Submitting preprocessing job");
        let response: SubmitResponse = self.send(self.client.post(url).json(config))?.json()?;
        info!(
            file_id,
            job_id = response.job_id.as_deref().unwrap_or("-"),
            "Preprocessing job submitted"
        );
        Ok(response)
    }

    /// Bytes of a produced file.
    pub fn download(&self, file_id: &str, filename: &str) -> Result<Vec<u8>> {
        let url = self.config.file_endpoint(file_id, "download")?;
        debug!(url = %url, filename, "Downloading result");
        let request = self.client.get(url).query(&[("filename", filename)]);
        Ok(self.send(request)?.bytes()?.to_vec())
    }
}

/// Error for a non-2xx answer, using the server's message when it sent one.
fn api_error(status: u16, body: &str) -> ConfigError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error", "detail"]
                .iter()
                .find_map(|key| value.get(key)?.as_str().map(str::to_string))
        })
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Request failed with status {status}"));

    ConfigError::Api {
        status: Some(status),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(error: ConfigError) -> String {
        match error {
            ConfigError::Api { message, .. } => message,
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_api_error_uses_server_message() {
        assert_eq!(message(api_error(400, r#"{"message": "Column missing"}"#)), "Column missing");
        assert_eq!(message(api_error(401, r#"{"error": "Token expired"}"#)), "Token expired");
        assert_eq!(message(api_error(422, r#"{"detail": "Bad mode"}"#)), "Bad mode");
    }

    #[test]
    fn test_api_error_fallback() {
        assert_eq!(
            message(api_error(502, "<html>Bad Gateway</html>")),
            "Request failed with status 502"
        );
        assert_eq!(
            message(api_error(500, r#"{"detail": [{"loc": ["body"]}]}"#)),
            "Request failed with status 500"
        );
        assert_eq!(message(api_error(500, r#"{"message": ""}"#)), "Request failed with status 500");
    }

    #[test]
    fn test_url_joining() {
        let config = ApiConfig::builder().base_url("https://example.com/api/").build();
        assert_eq!(
            config.file_endpoint("7", "columns").unwrap().as_str(),
            "https://example.com/api/files/7/columns"
        );
        let config = ApiConfig::default();
        assert_eq!(
            config.endpoint(&["preprocessing", "options"]).unwrap().as_str(),
            "http://localhost:8000/api/preprocessing/options"
        );
    }

    #[test]
    fn test_file_id_stays_one_path_segment() {
        let config = ApiConfig::builder().base_url("https://example.com/api").build();
        let url = config.file_endpoint("a/../b?x=1#frag", "download").unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/api/files/a%2F..%2Fb%3Fx=1%23frag/download"
        );
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_file_id_rejected_when_not_a_segment() {
        let config = ApiConfig::default();
        for file_id in ["", "  ", ".", ".."] {
            let err = config.file_endpoint(file_id, "columns").unwrap_err();
            assert_eq!(err.error_code(), "INVALID_SETTINGS", "{file_id:?}");
        }
    }

    #[test]
    fn test_invalid_base_url() {
        let config = ApiConfig::builder().base_url("not a url").build();
        assert!(config.endpoint(&["preprocessing", "options"]).is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = ApiConfig::builder().timeout_secs(5).token("  ").build();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.token, None);
    }

    #[test]
    fn test_columns_response_shapes() {
        let bare: ColumnsResponse =
            serde_json::from_str(r#"[{"name": "a", "preprocessing_data_type": "Numeric"}]"#).unwrap();
        let wrapped: ColumnsResponse = serde_json::from_str(
            r#"{"columns": [{"name": "a", "preprocessing_data_type": "Numeric"}]}"#,
        )
        .unwrap();
        for response in [bare, wrapped] {
            let columns = match response {
                ColumnsResponse::Bare(c) | ColumnsResponse::Wrapped { columns: c } => c,
            };
            assert_eq!(columns.len(), 1);
        }
    }

    #[test]
    fn test_submit_response_partial() {
        let response: SubmitResponse = serde_json::from_str(r#"{"job_id": "j1"}"#).unwrap();
        assert_eq!(response.job_id.as_deref(), Some("j1"));
        assert_eq!(response.download_url, None);
    }
}

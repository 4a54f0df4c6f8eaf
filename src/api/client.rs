use std::time::Duration;

use async_trait::async_trait;

use super::{
    parse_envelope, ApiEnvelope, ApiError, ExportService, LoginData, LoginRequest, ProjectVersion,
    SqlExport,
};
use crate::config::ProbeConfig;
use crate::db::schema::CompleteStructure;

/// Pull the SQL text out of an export response body.
///
/// An enveloped body yields its `sql` field; anything else is taken as the
/// SQL text itself.
pub fn extract_sql(endpoint: &str, body: &str) -> Result<String, ApiError> {
    match serde_json::from_str::<ApiEnvelope<SqlExport>>(body) {
        Ok(envelope) => Ok(envelope.into_data(endpoint)?.sql),
        Err(_) => Ok(body.to_string()),
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// reqwest-backed client for the export service
pub struct HttpExportClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpExportClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn from_config(config: &ProbeConfig) -> Result<Self, ApiError> {
        Self::new(config.base_url.clone(), config.request_timeout())
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> Result<&str, ApiError> {
        self.token.as_deref().ok_or(ApiError::NotAuthenticated)
    }

    /// Authenticated GET returning the body of a successful response.
    async fn get_text(&self, path: &str) -> Result<String, ApiError> {
        let token = self.bearer()?;
        log::debug!("GET {}", path);
        let resp = self
            .http
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl ExportService for HttpExportClient {
    async fn login(&mut self, username: &str, password: &str) -> Result<String, ApiError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let resp = self
            .http
            .post(self.url("/login"))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint: "/login".to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        let data: LoginData = parse_envelope("/login", &text)?;
        self.token = Some(data.token.clone());
        Ok(data.token)
    }

    async fn list_versions(&self, project_id: i64) -> Result<Vec<ProjectVersion>, ApiError> {
        let path = format!("/api/project-version/list/{}", project_id);
        let body = self.get_text(&path).await?;
        parse_envelope(&path, &body)
    }

    async fn export_sql(&self, version_id: i64) -> Result<String, ApiError> {
        let path = format!("/api/project-version/export-sql/{}", version_id);
        let body = self.get_text(&path).await?;
        extract_sql(&path, &body)
    }

    async fn fetch_structure(&self, version_id: i64) -> Result<CompleteStructure, ApiError> {
        let path = format!("/api/project-version/structure/{}", version_id);
        let body = self.get_text(&path).await?;
        parse_envelope(&path, &body)
    }
}

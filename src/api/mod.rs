pub mod client;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::schema::CompleteStructure;

pub use client::{extract_sql, HttpExportClient};

/// Envelope code the service uses for success.
pub const SUCCESS_CODE: i64 = 200;

// ── Errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("Service rejected request (code {code}): {message}")]
    Rejected { code: i64, message: String },
    #[error("Response from {0} carries no data")]
    MissingData(String),
    #[error("Not logged in")]
    NotAuthenticated,
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

// ── Wire types ───────────────────────────────────────────────────────

/// `{status, code, msg, data}` wrapper around every service response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub status: Option<bool>,
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// Unwrap the payload, turning a non-success code into an error.
    pub fn into_data(self, endpoint: &str) -> Result<T, ApiError> {
        if !self.is_success() {
            return Err(ApiError::Rejected {
                code: self.code,
                message: self.msg.unwrap_or_default(),
            });
        }
        self.data
            .ok_or_else(|| ApiError::MissingData(endpoint.to_string()))
    }
}

/// Decode an enveloped response body and unwrap its payload.
pub fn parse_envelope<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T, ApiError> {
    let envelope: ApiEnvelope<T> = serde_json::from_str(body)?;
    envelope.into_data(endpoint)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    pub token: String,
}

/// A stored version of a project's database structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectVersion {
    pub id: i64,
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub version_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<i32>,
    #[serde(default)]
    pub create_time: Option<String>,
}

/// Payload of the SQL export endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlExport {
    #[serde(default)]
    pub version: Option<String>,
    pub sql: String,
}

// ── Service trait ────────────────────────────────────────────────────

/// The schema-export service as seen by the probe
#[async_trait]
pub trait ExportService: Send + Sync {
    /// Authenticate and keep the bearer token for later calls.
    async fn login(&mut self, username: &str, password: &str) -> Result<String, ApiError>;

    /// Versions of a project, newest first.
    async fn list_versions(&self, project_id: i64) -> Result<Vec<ProjectVersion>, ApiError>;

    /// The exported SQL text of one version.
    async fn export_sql(&self, version_id: i64) -> Result<String, ApiError>;

    /// The captured structure document of one version.
    async fn fetch_structure(&self, version_id: i64) -> Result<CompleteStructure, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success() {
        let body = r#"{"status":true,"code":200,"msg":"ok","data":{"token":"abc"}}"#;
        let data: LoginData = parse_envelope("/login", body).unwrap();
        assert_eq!(data.token, "abc");
    }

    #[test]
    fn test_envelope_rejected() {
        let body = r#"{"status":false,"code":401,"msg":"bad credentials","data":null}"#;
        let err = parse_envelope::<LoginData>("/login", body).unwrap_err();
        assert!(matches!(err, ApiError::Rejected { code: 401, .. }));
        assert_eq!(
            err.to_string(),
            "Service rejected request (code 401): bad credentials"
        );
    }

    #[test]
    fn test_envelope_missing_data() {
        let body = r#"{"code":200,"msg":"ok"}"#;
        let err = parse_envelope::<LoginData>("/login", body).unwrap_err();
        assert!(matches!(err, ApiError::MissingData(ref e) if e == "/login"));
    }

    #[test]
    fn test_project_version_decoding() {
        let body = r#"{"code":200,"data":[
            {"id":12,"projectId":2,"versionName":"v1.2","status":1,"createTime":"2025-07-17T23:00:00","schemaSnapshot":"{}"}
        ]}"#;
        let versions: Vec<ProjectVersion> = parse_envelope("/list", body).unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].id, 12);
        assert_eq!(versions[0].project_id, Some(2));
        assert_eq!(versions[0].version_name, "v1.2");
    }
}

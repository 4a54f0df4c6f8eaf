use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8081";
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "123456";
pub const DEFAULT_PROJECT_ID: i64 = 2;
pub const DEFAULT_OUTPUT_FILE: &str = "mysql_export.sql";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Settings for one probe run
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub project_id: i64,
    /// Where the exported SQL text is written; overwritten on each run.
    pub output_path: PathBuf,
    pub request_timeout_secs: u64,
    /// When set, also fetch and check this stored version's structure.
    pub structure_version_id: Option<i64>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            project_id: DEFAULT_PROJECT_ID,
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            structure_version_id: None,
        }
    }
}

impl ProbeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProbeConfig::default();
        assert_eq!(config.base_url, "http://localhost:8081");
        assert_eq!(config.username, "admin");
        assert_eq!(config.project_id, 2);
        assert_eq!(config.output_path, PathBuf::from("mysql_export.sql"));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.structure_version_id.is_none());
    }
}

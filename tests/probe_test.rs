//! Integration tests for the probe runner against an in-memory export service.
//!
//! These tests exercise:
//!   - probe::run() login, export and plan-check steps
//!   - Writing the exported SQL to the configured output file
//!   - Degrading to warnings when listing or exporting fails
//!   - The optional stored-structure check

use std::collections::HashMap;

use async_trait::async_trait;
use schema_export_lib::api::{ApiError, ExportService, ProjectVersion};
use schema_export_lib::config::ProbeConfig;
use schema_export_lib::db::{CompleteStructure, DatabaseEngine, TableInfo};
use schema_export_lib::probe::{self, mock_postgresql_structure};
use tempfile::TempDir;

// ─── helpers ───────────────────────────────────────────────────────────────

const TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiJhZG1pbiJ9.sig";

#[derive(Default)]
struct FakeService {
    password: String,
    token: Option<String>,
    versions: HashMap<i64, Vec<ProjectVersion>>,
    exports: HashMap<i64, String>,
    structures: HashMap<i64, CompleteStructure>,
}

impl FakeService {
    fn new() -> Self {
        Self {
            password: "123456".to_string(),
            ..Default::default()
        }
    }

    fn with_version(mut self, project_id: i64, id: i64, name: &str, sql: &str) -> Self {
        self.versions
            .entry(project_id)
            .or_default()
            .push(ProjectVersion {
                id,
                project_id: Some(project_id),
                version_name: name.to_string(),
                description: None,
                status: Some(1),
                create_time: None,
            });
        self.exports.insert(id, sql.to_string());
        self
    }

    fn check_token(&self) -> Result<(), ApiError> {
        match self.token.as_deref() {
            Some(TOKEN) => Ok(()),
            _ => Err(ApiError::NotAuthenticated),
        }
    }
}

#[async_trait]
impl ExportService for FakeService {
    async fn login(&mut self, _username: &str, password: &str) -> Result<String, ApiError> {
        if password != self.password {
            return Err(ApiError::Rejected {
                code: 401,
                message: "bad credentials".to_string(),
            });
        }
        self.token = Some(TOKEN.to_string());
        Ok(TOKEN.to_string())
    }

    async fn list_versions(&self, project_id: i64) -> Result<Vec<ProjectVersion>, ApiError> {
        self.check_token()?;
        Ok(self.versions.get(&project_id).cloned().unwrap_or_default())
    }

    async fn export_sql(&self, version_id: i64) -> Result<String, ApiError> {
        self.check_token()?;
        self.exports.get(&version_id).cloned().ok_or(ApiError::Status {
            endpoint: format!("/api/project-version/export-sql/{}", version_id),
            status: 500,
            body: "export failed".to_string(),
        })
    }

    async fn fetch_structure(&self, version_id: i64) -> Result<CompleteStructure, ApiError> {
        self.check_token()?;
        self.structures
            .get(&version_id)
            .cloned()
            .ok_or_else(|| ApiError::MissingData(format!("structure {}", version_id)))
    }
}

fn config_in(dir: &TempDir) -> ProbeConfig {
    ProbeConfig {
        output_path: dir.path().join("mysql_export.sql"),
        ..Default::default()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  1. FULL RUN
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn run_exports_newest_version_and_checks_mock() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_in(&dir);
    let sql = "-- Database structure export\nCREATE TABLE `users` (\n  `id` BIGINT NOT NULL\n);\n";
    let mut service = FakeService::new()
        .with_version(2, 9, "v2", sql)
        .with_version(2, 3, "v1", "-- old");

    let outcome = probe::run(&mut service, &config).await.expect("probe run");

    assert_eq!(outcome.token_prefix, "eyJhbGciOiJIUzI1NiJ9");
    let saved = outcome.export.as_ref().expect("export saved");
    assert_eq!(saved.version_id, 9);
    assert_eq!(saved.version_name, "v2");
    assert_eq!(saved.bytes, sql.len());
    assert_eq!(saved.preview, sql);
    assert_eq!(std::fs::read_to_string(&config.output_path).unwrap(), sql);

    assert!(outcome.mock_check.passed());
    assert!(outcome.remote_check.is_none());
    assert!(outcome.all_checks_passed());
}

#[tokio::test]
async fn run_overwrites_previous_output() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_in(&dir);
    std::fs::write(&config.output_path, "stale content that is longer than the export").unwrap();

    let mut service = FakeService::new().with_version(2, 1, "v1", "fresh");
    probe::run(&mut service, &config).await.expect("probe run");

    assert_eq!(std::fs::read_to_string(&config.output_path).unwrap(), "fresh");
}

#[tokio::test]
async fn long_exports_are_previewed() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_in(&dir);
    let sql = "x".repeat(1500);
    let mut service = FakeService::new().with_version(2, 1, "v1", &sql);

    let outcome = probe::run(&mut service, &config).await.expect("probe run");
    let saved = outcome.export.expect("export saved");
    assert_eq!(saved.preview.len(), 1003);
    assert!(saved.preview.ends_with("..."));
    assert_eq!(saved.bytes, 1500);
}

// ═══════════════════════════════════════════════════════════════════════════
//  2. FAILURES
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn login_failure_aborts() {
    let dir = TempDir::new().expect("temp dir");
    let config = ProbeConfig {
        password: "wrong".to_string(),
        ..config_in(&dir)
    };
    let mut service = FakeService::new().with_version(2, 1, "v1", "sql");

    let err = probe::run(&mut service, &config).await.unwrap_err();
    assert!(format!("{:#}", err).contains("bad credentials"));
    assert!(!config.output_path.exists());
}

#[tokio::test]
async fn missing_versions_skip_export() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_in(&dir);
    let mut service = FakeService::new().with_version(7, 1, "other project", "sql");

    let outcome = probe::run(&mut service, &config).await.expect("probe run");
    assert!(outcome.export.is_none());
    assert!(!config.output_path.exists());
    assert!(outcome.mock_check.passed());
}

#[tokio::test]
async fn failed_export_is_skipped() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_in(&dir);
    let mut service = FakeService::new().with_version(2, 5, "v5", "sql");
    service.exports.clear();

    let outcome = probe::run(&mut service, &config).await.expect("probe run");
    assert!(outcome.export.is_none());
    assert!(!config.output_path.exists());
}

#[tokio::test]
async fn unwritable_output_is_skipped() {
    let dir = TempDir::new().expect("temp dir");
    let config = ProbeConfig {
        output_path: dir.path().join("missing-dir").join("out.sql"),
        ..Default::default()
    };
    let mut service = FakeService::new().with_version(2, 1, "v1", "sql");

    let outcome = probe::run(&mut service, &config).await.expect("probe run");
    assert!(outcome.export.is_none());
}

// ═══════════════════════════════════════════════════════════════════════════
//  3. STORED STRUCTURE CHECK
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn stored_structure_is_checked() {
    let dir = TempDir::new().expect("temp dir");
    let config = ProbeConfig {
        structure_version_id: Some(11),
        ..config_in(&dir)
    };
    let mut service = FakeService::new().with_version(2, 11, "v11", "sql");
    service.structures.insert(11, mock_postgresql_structure());

    let outcome = probe::run(&mut service, &config).await.expect("probe run");
    let remote = outcome.remote_check.as_ref().expect("remote check");
    assert_eq!(remote.engine, DatabaseEngine::PostgreSql);
    assert_eq!(remote.label, "version 11");
    assert!(remote.passed());
    assert!(remote.script.contains("-- Version ID: 11"));
    assert_eq!(outcome.checks().count(), 2);
}

#[tokio::test]
async fn stored_structure_with_undeclared_schema_fails_validation() {
    let dir = TempDir::new().expect("temp dir");
    let config = ProbeConfig {
        structure_version_id: Some(4),
        ..config_in(&dir)
    };
    let mut structure = mock_postgresql_structure();
    structure
        .tables
        .push(TableInfo::new("audit_log").in_schema("audit"));
    let mut service = FakeService::new();
    service.structures.insert(4, structure);

    let outcome = probe::run(&mut service, &config).await.expect("probe run");
    let remote = outcome.remote_check.as_ref().expect("remote check");
    assert!(remote.problems.is_empty());
    assert_eq!(remote.validation.len(), 1);
    assert!(!outcome.all_checks_passed());
}

#[tokio::test]
async fn unknown_datasource_type_skips_structure_check() {
    let dir = TempDir::new().expect("temp dir");
    let config = ProbeConfig {
        structure_version_id: Some(4),
        ..config_in(&dir)
    };
    let structure = CompleteStructure {
        datasource_type: Some("oracle".to_string()),
        ..mock_postgresql_structure()
    };
    let mut service = FakeService::new();
    service.structures.insert(4, structure);

    let outcome = probe::run(&mut service, &config).await.expect("probe run");
    assert!(outcome.remote_check.is_none());
    assert!(outcome.mock_check.passed());
}

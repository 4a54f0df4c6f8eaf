pub mod mock;
pub mod report;
pub mod verify;

use std::path::PathBuf;

use anyhow::Context;

use crate::api::ExportService;
use crate::config::ProbeConfig;
use crate::db::dialect::DatabaseEngine;
use crate::db::grouping::SchemaPlan;
use crate::db::schema::CompleteStructure;
use crate::db::sql_generator::{ExportMetadata, SqlGenerator};
use crate::db::validation::{validate_structure, ValidationError};

pub use mock::mock_postgresql_structure;
pub use report::{preview, render_plan_report};
pub use verify::{verify_script, VerificationProblem};

/// Characters of exported SQL shown in the run summary.
pub const PREVIEW_CHARS: usize = 1000;
const TOKEN_PREFIX_CHARS: usize = 20;

// ── Outcome types ────────────────────────────────────────────────────

/// An export written to disk
#[derive(Debug, Clone)]
pub struct SavedExport {
    pub version_id: i64,
    pub version_name: String,
    pub path: PathBuf,
    pub bytes: usize,
    pub preview: String,
}

/// Plan, rendering and verification of one structure document
#[derive(Debug, Clone)]
pub struct PlanCheck {
    pub label: String,
    pub engine: DatabaseEngine,
    pub report: String,
    pub script: String,
    pub problems: Vec<VerificationProblem>,
    pub validation: Vec<ValidationError>,
}

impl PlanCheck {
    pub fn passed(&self) -> bool {
        self.problems.is_empty() && self.validation.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub token_prefix: String,
    pub export: Option<SavedExport>,
    pub mock_check: PlanCheck,
    pub remote_check: Option<PlanCheck>,
}

impl ProbeOutcome {
    pub fn checks(&self) -> impl Iterator<Item = &PlanCheck> {
        std::iter::once(&self.mock_check).chain(self.remote_check.iter())
    }

    pub fn all_checks_passed(&self) -> bool {
        self.checks().all(PlanCheck::passed)
    }
}

fn token_prefix(token: &str) -> String {
    token.chars().take(TOKEN_PREFIX_CHARS).collect()
}

// ── Steps ────────────────────────────────────────────────────────────

/// Derive the schema plan of `structure`, render it for `engine` and check
/// the rendered script against the plan.
pub fn check_structure(
    label: &str,
    structure: &CompleteStructure,
    engine: DatabaseEngine,
    metadata: &ExportMetadata,
) -> PlanCheck {
    let source_engine = structure
        .datasource_type
        .as_deref()
        .and_then(|t| t.parse::<DatabaseEngine>().ok())
        .unwrap_or(engine);

    let plan = SchemaPlan::build(&structure.tables);
    let script = SqlGenerator::new(engine)
        .with_source_engine(source_engine)
        .generate_complete_script(structure, metadata);
    let problems = verify_script(&plan, &script, &engine);
    let validation = validate_structure(structure, &engine);

    for problem in &problems {
        log::warn!("[{}] {}", label, problem);
    }
    for problem in &validation {
        log::warn!("[{}] {}", label, problem);
    }

    PlanCheck {
        label: label.to_string(),
        engine,
        report: render_plan_report(&plan),
        script,
        problems,
        validation,
    }
}

/// Export the newest version of the configured project and save it.
///
/// `Ok(None)` when the project has no versions.
pub async fn export_latest<S>(service: &S, config: &ProbeConfig) -> anyhow::Result<Option<SavedExport>>
where
    S: ExportService + ?Sized,
{
    let versions = service
        .list_versions(config.project_id)
        .await
        .with_context(|| format!("Failed to list versions of project {}", config.project_id))?;

    let Some(version) = versions.first() else {
        log::warn!("No versions found for project {}", config.project_id);
        return Ok(None);
    };
    log::info!("Using version ID: {}", version.id);

    let sql = service
        .export_sql(version.id)
        .await
        .with_context(|| format!("SQL export of version {} failed", version.id))?;

    tokio::fs::write(&config.output_path, &sql)
        .await
        .with_context(|| format!("Failed to write {:?}", config.output_path))?;
    log::info!("SQL saved to {:?}", config.output_path);

    Ok(Some(SavedExport {
        version_id: version.id,
        version_name: version.version_name.clone(),
        path: config.output_path.clone(),
        bytes: sql.len(),
        preview: preview(&sql, PREVIEW_CHARS),
    }))
}

/// Fetch a stored version's structure and check it like the mock one.
pub async fn check_remote_structure<S>(service: &S, version_id: i64) -> anyhow::Result<PlanCheck>
where
    S: ExportService + ?Sized,
{
    let structure = service
        .fetch_structure(version_id)
        .await
        .with_context(|| format!("Failed to fetch structure of version {}", version_id))?;

    let engine = match structure.datasource_type.as_deref() {
        Some(kind) => kind.parse::<DatabaseEngine>()?,
        None => DatabaseEngine::MySql,
    };
    log::info!(
        "Version {}: {} tables, rendering as {}",
        version_id,
        structure.tables.len(),
        engine
    );

    let metadata = ExportMetadata::new(format!("version {}", version_id), version_id);
    Ok(check_structure(
        &format!("version {}", version_id),
        &structure,
        engine,
        &metadata,
    ))
}

/// Run the probe: log in, export the newest version to a file, then check
/// the schema plan of the mock PostgreSQL structure (and of a stored
/// version when one is configured).
///
/// Only a failed login is fatal; the other steps log and carry on.
pub async fn run<S>(service: &mut S, config: &ProbeConfig) -> anyhow::Result<ProbeOutcome>
where
    S: ExportService + ?Sized,
{
    let token = service
        .login(&config.username, &config.password)
        .await
        .context("Login failed")?;
    let token_prefix = token_prefix(&token);
    log::info!("Logged in, token: {}...", token_prefix);

    let export = match export_latest(&*service, config).await {
        Ok(saved) => saved,
        Err(e) => {
            log::warn!("{:#}", e);
            None
        }
    };

    let mock = mock_postgresql_structure();
    let mock_check = check_structure(
        "mock PostgreSQL",
        &mock,
        DatabaseEngine::PostgreSql,
        &ExportMetadata::new("mock", 0),
    );

    let remote_check = match config.structure_version_id {
        Some(version_id) => match check_remote_structure(&*service, version_id).await {
            Ok(check) => Some(check),
            Err(e) => {
                log::warn!("{:#}", e);
                None
            }
        },
        None => None,
    };

    Ok(ProbeOutcome {
        token_prefix,
        export,
        mock_check,
        remote_check,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::{SchemaInfo, TableInfo};

    #[test]
    fn test_token_prefix() {
        assert_eq!(token_prefix("short"), "short");
        assert_eq!(
            token_prefix("eyJhbGciOiJIUzI1NiJ9.payload.signature"),
            "eyJhbGciOiJIUzI1NiJ9"
        );
    }

    #[test]
    fn test_mock_check_passes() {
        let check = check_structure(
            "mock",
            &mock_postgresql_structure(),
            DatabaseEngine::PostgreSql,
            &ExportMetadata::new("mock", 0),
        );
        assert!(check.passed(), "{:?} {:?}", check.problems, check.validation);
        assert!(check.report.contains("   CREATE SCHEMA IF NOT EXISTS \"sales\";"));
    }

    #[test]
    fn test_mock_rendered_for_mysql_flattens_schemas() {
        let check = check_structure(
            "mock as mysql",
            &mock_postgresql_structure(),
            DatabaseEngine::MySql,
            &ExportMetadata::new("mock", 0),
        );
        assert!(check.passed(), "{:?} {:?}", check.problems, check.validation);
        assert!(!check.script.contains("CREATE SCHEMA"));
        assert!(check.script.contains("`id` BIGINT NOT NULL AUTO_INCREMENT"));
    }

    #[test]
    fn test_table_comment_mentioning_create_schema() {
        let mut structure = mock_postgresql_structure();
        structure.tables[0].table_comment = Some("Filled after CREATE SCHEMA bootstrap".to_string());

        for engine in [DatabaseEngine::PostgreSql, DatabaseEngine::MySql] {
            let check = check_structure("commented", &structure, engine, &ExportMetadata::new("v", 1));
            assert!(check.passed(), "{} {:?}", engine, check.problems);
        }
    }

    #[test]
    fn test_upper_case_public_schema_is_created() {
        let mut structure = mock_postgresql_structure();
        structure.tables.push(TableInfo::new("accounts").in_schema("PUBLIC"));
        if let Some(db) = structure.database.as_mut() {
            db.schemas_info.push(SchemaInfo {
                schema_name: "PUBLIC".to_string(),
                schema_comment: None,
            });
        }

        let check = check_structure(
            "upper public",
            &structure,
            DatabaseEngine::PostgreSql,
            &ExportMetadata::new("v", 1),
        );
        assert!(check.passed(), "{:?} {:?}", check.problems, check.validation);
        assert!(check.script.contains("CREATE SCHEMA IF NOT EXISTS \"PUBLIC\";"));
        assert!(check.script.contains("CREATE TABLE \"PUBLIC\".\"accounts\" ("));
    }
}

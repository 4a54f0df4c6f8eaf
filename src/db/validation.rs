use std::collections::HashSet;
use std::fmt;

use super::dialect::DatabaseEngine;
use super::grouping::{effective_schema, qualified_name};
use super::schema::{CompleteStructure, DEFAULT_SCHEMA};

/// Problems found in a captured structure document.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyInput,
    NullBytes,
    ControlCharacters,
    TooLong { max: usize, actual: usize },
    MissingTableName { position: usize },
    UndeclaredSchema { schema: String, table: String },
    DuplicateTable { qualified: String },
    DuplicateColumn { table: String, column: String },
    UnknownIndexColumn { table: String, index: String, column: String },
    InvalidIdentifier { name: String, reason: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyInput => write!(f, "Identifier must not be empty"),
            ValidationError::NullBytes => write!(f, "Identifier contains null bytes"),
            ValidationError::ControlCharacters => {
                write!(f, "Identifier contains control characters")
            }
            ValidationError::TooLong { max, actual } => {
                write!(f, "Identifier length {} exceeds maximum of {}", actual, max)
            }
            ValidationError::MissingTableName { position } => {
                write!(f, "Table #{} has no table name", position + 1)
            }
            ValidationError::UndeclaredSchema { schema, table } => write!(
                f,
                "Schema '{}' of table '{}' is not declared in schemasInfo",
                schema, table
            ),
            ValidationError::DuplicateTable { qualified } => {
                write!(f, "Table '{}' appears more than once", qualified)
            }
            ValidationError::DuplicateColumn { table, column } => {
                write!(f, "Column '{}' appears more than once in '{}'", column, table)
            }
            ValidationError::UnknownIndexColumn {
                table,
                index,
                column,
            } => write!(
                f,
                "Index '{}' on '{}' references unknown column '{}'",
                index, table, column
            ),
            ValidationError::InvalidIdentifier { name, reason } => {
                write!(f, "Invalid identifier '{}': {}", name, reason)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check that a name can be used as an identifier in `engine`.
///
/// Identifiers are always quoted when rendered, so any printable text is
/// accepted as long as it fits the engine's length limit.
pub fn validate_identifier(name: &str, engine: &DatabaseEngine) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyInput);
    }

    if name.contains('\0') {
        return Err(ValidationError::NullBytes);
    }

    if name.chars().any(char::is_control) {
        return Err(ValidationError::ControlCharacters);
    }

    let max = engine.max_identifier_len();
    if name.len() > max {
        return Err(ValidationError::TooLong {
            max,
            actual: name.len(),
        });
    }

    Ok(())
}

fn check_identifier(name: &str, engine: &DatabaseEngine, problems: &mut Vec<ValidationError>) {
    if let Err(e) = validate_identifier(name, engine) {
        problems.push(ValidationError::InvalidIdentifier {
            name: name.to_string(),
            reason: e.to_string(),
        });
    }
}

/// Collect every structural problem in `structure` for rendering as `engine`.
///
/// Non-public schemas must be declared in `schemasInfo`; engines without
/// schemas skip that check.
pub fn validate_structure(
    structure: &CompleteStructure,
    engine: &DatabaseEngine,
) -> Vec<ValidationError> {
    let mut problems = Vec::new();
    let declared: HashSet<&str> = structure
        .database
        .as_ref()
        .map(|db| db.schemas_info.iter().map(|s| s.schema_name.trim()).collect())
        .unwrap_or_default();

    let mut seen_tables = HashSet::new();
    let mut reported_schemas = HashSet::new();

    for (position, table) in structure.tables.iter().enumerate() {
        if table.table_name.trim().is_empty() {
            problems.push(ValidationError::MissingTableName { position });
            continue;
        }
        check_identifier(&table.table_name, engine, &mut problems);

        let schema = effective_schema(table);
        let qualified = qualified_name(schema, &table.table_name);

        if engine.supports_schemas() && schema != DEFAULT_SCHEMA {
            if reported_schemas.insert(schema) {
                check_identifier(schema, engine, &mut problems);
            }
            if !declared.contains(schema) {
                problems.push(ValidationError::UndeclaredSchema {
                    schema: schema.to_string(),
                    table: table.table_name.clone(),
                });
            }
        }

        // MySQL flattens schemas, so the bare name is what has to be unique there
        let key = if engine.supports_schemas() {
            qualified.clone()
        } else {
            table.table_name.clone()
        };
        if !seen_tables.insert(key) {
            problems.push(ValidationError::DuplicateTable { qualified });
        }

        let mut columns = HashSet::new();
        for column in &table.columns {
            check_identifier(&column.column_name, engine, &mut problems);
            if !columns.insert(column.column_name.as_str()) {
                problems.push(ValidationError::DuplicateColumn {
                    table: table.table_name.clone(),
                    column: column.column_name.clone(),
                });
            }
        }

        for index in table.index_definitions() {
            check_identifier(&index.name, engine, &mut problems);
            for column in &index.columns {
                if !columns.contains(column.as_str()) {
                    problems.push(ValidationError::UnknownIndexColumn {
                        table: table.table_name.clone(),
                        index: index.name.clone(),
                        column: column.clone(),
                    });
                }
            }
        }
    }

    problems
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target dialects the exporter knows how to render
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DatabaseEngine {
    MySql,
    PostgreSql,
    Kingbase,
}

impl fmt::Display for DatabaseEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseEngine::MySql => write!(f, "MySQL"),
            DatabaseEngine::PostgreSql => write!(f, "PostgreSQL"),
            DatabaseEngine::Kingbase => write!(f, "Kingbase"),
        }
    }
}

/// A datasource type string that names no supported engine.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownEngine(pub String);

impl fmt::Display for UnknownEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unsupported database type: {}. Supported types: mysql, postgresql, kingbase",
            self.0
        )
    }
}

impl std::error::Error for UnknownEngine {}

impl FromStr for DatabaseEngine {
    type Err = UnknownEngine;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mysql" => Ok(DatabaseEngine::MySql),
            "postgresql" | "postgres" | "pg" => Ok(DatabaseEngine::PostgreSql),
            "kingbase" | "kingbasees" => Ok(DatabaseEngine::Kingbase),
            _ => Err(UnknownEngine(s.to_string())),
        }
    }
}

impl DatabaseEngine {
    pub fn is_postgres_family(&self) -> bool {
        matches!(self, DatabaseEngine::PostgreSql | DatabaseEngine::Kingbase)
    }

    /// Whether tables live in named schemas inside one database.
    pub fn supports_schemas(&self) -> bool {
        self.is_postgres_family()
    }

    pub fn same_family(&self, other: &DatabaseEngine) -> bool {
        self.is_postgres_family() == other.is_postgres_family()
    }

    pub fn max_identifier_len(&self) -> usize {
        match self {
            DatabaseEngine::MySql => 64,
            DatabaseEngine::PostgreSql | DatabaseEngine::Kingbase => 63,
        }
    }

    /// Quote an identifier, doubling any embedded quote character.
    pub fn quote_ident(&self, name: &str) -> String {
        match self {
            DatabaseEngine::MySql => format!("`{}`", name.replace('`', "``")),
            _ => format!("\"{}\"", name.replace('"', "\"\"")),
        }
    }
}

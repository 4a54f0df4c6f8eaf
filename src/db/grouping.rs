//! Schema grouping and DDL emission order.
//!
//! Tables are partitioned by schema, keeping schemas in the order they are
//! first seen and tables in input order within each schema. An exporter
//! emits one `CREATE SCHEMA IF NOT EXISTS` per non-default schema, then the
//! tables group by group.

use std::collections::HashMap;
use std::fmt;

use super::dialect::DatabaseEngine;
use super::schema::{TableInfo, DEFAULT_SCHEMA};

/// Resolve an optional schema name; missing or blank means `public`.
pub fn normalize_schema(schema_name: Option<&str>) -> &str {
    match schema_name.map(str::trim) {
        Some(name) if !name.is_empty() => name,
        _ => DEFAULT_SCHEMA,
    }
}

/// The schema a table belongs to.
pub fn effective_schema(table: &TableInfo) -> &str {
    normalize_schema(table.schema_name.as_deref())
}

/// `schema.table` outside the default schema, bare `table` inside it.
pub fn qualified_name(schema: &str, table: &str) -> String {
    if schema == DEFAULT_SCHEMA {
        table.to_string()
    } else {
        format!("{}.{}", schema, table)
    }
}

/// Tables of one schema, in input order
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaGroup<'a> {
    pub schema_name: String,
    pub tables: Vec<&'a TableInfo>,
}

impl SchemaGroup<'_> {
    pub fn is_default(&self) -> bool {
        self.schema_name == DEFAULT_SCHEMA
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.table_name.as_str()).collect()
    }
}

/// One statement an exporter is expected to emit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedStatement {
    CreateSchema { schema: String },
    CreateTable { schema: String, table: String },
}

impl PlannedStatement {
    pub fn qualified_name(&self) -> String {
        match self {
            PlannedStatement::CreateSchema { schema } => schema.clone(),
            PlannedStatement::CreateTable { schema, table } => qualified_name(schema, table),
        }
    }
}

impl fmt::Display for PlannedStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannedStatement::CreateSchema { schema } => write!(
                f,
                "CREATE SCHEMA IF NOT EXISTS {}",
                DatabaseEngine::PostgreSql.quote_ident(schema)
            ),
            PlannedStatement::CreateTable { .. } => {
                write!(f, "CREATE TABLE {}", self.qualified_name())
            }
        }
    }
}

/// Grouping of a table sequence by schema
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaPlan<'a> {
    groups: Vec<SchemaGroup<'a>>,
}

impl<'a> SchemaPlan<'a> {
    pub fn build(tables: &'a [TableInfo]) -> Self {
        let mut groups: Vec<SchemaGroup<'a>> = Vec::new();
        let mut positions: HashMap<&'a str, usize> = HashMap::new();

        for table in tables {
            let schema = effective_schema(table);
            let pos = *positions.entry(schema).or_insert_with(|| {
                groups.push(SchemaGroup {
                    schema_name: schema.to_string(),
                    tables: Vec::new(),
                });
                groups.len() - 1
            });
            groups[pos].tables.push(table);
        }

        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn table_count(&self) -> usize {
        self.groups.iter().map(|g| g.tables.len()).sum()
    }

    /// Distinct schemas, first-seen order.
    pub fn schemas(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.schema_name.as_str()).collect()
    }

    pub fn groups(&self) -> &[SchemaGroup<'a>] {
        &self.groups
    }

    pub fn group(&self, schema: &str) -> Option<&SchemaGroup<'a>> {
        self.groups.iter().find(|g| g.schema_name == schema)
    }

    /// Schemas that need a `CREATE SCHEMA`: everything except `public`.
    pub fn schemas_to_create(&self) -> Vec<&str> {
        self.groups
            .iter()
            .filter(|g| !g.is_default())
            .map(|g| g.schema_name.as_str())
            .collect()
    }

    pub fn create_schema_statements(&self) -> Vec<String> {
        self.schemas_to_create()
            .into_iter()
            .map(|schema| {
                format!(
                    "CREATE SCHEMA IF NOT EXISTS {};",
                    DatabaseEngine::PostgreSql.quote_ident(schema)
                )
            })
            .collect()
    }

    /// Fully-qualified table names in emission order.
    pub fn qualified_names(&self) -> Vec<String> {
        self.groups
            .iter()
            .flat_map(|g| {
                g.tables
                    .iter()
                    .map(move |t| qualified_name(&g.schema_name, &t.table_name))
            })
            .collect()
    }

    /// Every CREATE SCHEMA first, then the tables group by group.
    pub fn emission_order(&self) -> Vec<PlannedStatement> {
        let schemas = self
            .schemas_to_create()
            .into_iter()
            .map(|schema| PlannedStatement::CreateSchema {
                schema: schema.to_string(),
            });
        let tables = self.groups.iter().flat_map(|g| {
            g.tables.iter().map(move |t| PlannedStatement::CreateTable {
                schema: g.schema_name.clone(),
                table: t.table_name.clone(),
            })
        });
        schemas.chain(tables).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables(specs: &[(&str, Option<&str>)]) -> Vec<TableInfo> {
        specs
            .iter()
            .map(|(name, schema)| TableInfo {
                table_name: name.to_string(),
                schema_name: schema.map(str::to_string),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_sample_grouping() {
        let input = tables(&[
            ("users", Some("public")),
            ("orders", Some("sales")),
            ("products", Some("inventory")),
        ]);
        let plan = SchemaPlan::build(&input);
        assert_eq!(plan.schemas(), vec!["public", "sales", "inventory"]);
        assert_eq!(plan.schemas_to_create(), vec!["sales", "inventory"]);
        assert_eq!(
            plan.create_schema_statements(),
            vec![
                "CREATE SCHEMA IF NOT EXISTS \"sales\";",
                "CREATE SCHEMA IF NOT EXISTS \"inventory\";"
            ]
        );
        assert_eq!(
            plan.qualified_names(),
            vec!["users", "sales.orders", "inventory.products"]
        );
    }

    #[test]
    fn test_missing_schema_is_public() {
        let with_none = tables(&[("a", None), ("b", Some("public")), ("c", Some("  "))]);
        let plan = SchemaPlan::build(&with_none);
        assert_eq!(plan.schemas(), vec!["public"]);
        assert_eq!(plan.group("public").unwrap().table_names(), vec!["a", "b", "c"]);
        assert!(plan.create_schema_statements().is_empty());
    }

    #[test]
    fn test_interleaved_schemas_keep_first_seen_order() {
        let input = tables(&[
            ("t1", Some("sales")),
            ("t2", None),
            ("t3", Some("sales")),
            ("t4", Some("hr")),
            ("t5", None),
        ]);
        let plan = SchemaPlan::build(&input);
        assert_eq!(plan.schemas(), vec!["sales", "public", "hr"]);
        assert_eq!(plan.group("sales").unwrap().table_names(), vec!["t1", "t3"]);
        assert_eq!(plan.group("public").unwrap().table_names(), vec!["t2", "t5"]);
        assert_eq!(
            plan.qualified_names(),
            vec!["sales.t1", "sales.t3", "t2", "t5", "hr.t4"]
        );
        assert_eq!(plan.table_count(), 5);
    }

    #[test]
    fn test_emission_order_schemas_first() {
        let input = tables(&[("t1", None), ("t2", Some("sales"))]);
        let order = SchemaPlan::build(&input).emission_order();
        assert_eq!(
            order,
            vec![
                PlannedStatement::CreateSchema { schema: "sales".to_string() },
                PlannedStatement::CreateTable {
                    schema: "public".to_string(),
                    table: "t1".to_string()
                },
                PlannedStatement::CreateTable {
                    schema: "sales".to_string(),
                    table: "t2".to_string()
                },
            ]
        );
        assert_eq!(order[0].to_string(), "CREATE SCHEMA IF NOT EXISTS \"sales\"");
        assert_eq!(order[2].to_string(), "CREATE TABLE sales.t2");
    }

    #[test]
    fn test_build_is_idempotent() {
        let input = tables(&[("x", Some("b")), ("y", Some("a")), ("z", Some("b"))]);
        assert_eq!(SchemaPlan::build(&input), SchemaPlan::build(&input));
    }
}

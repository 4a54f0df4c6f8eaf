use super::dialect::DatabaseEngine;
use super::grouping::{qualified_name, SchemaPlan};
use super::schema::{ColumnInfo, CompleteStructure, IndexDefinition, TableInfo, DEFAULT_SCHEMA};
use super::type_mapper::map_column_type;

/// Knobs for DDL rendering
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Emit `DROP TABLE IF EXISTS` before every `CREATE TABLE`.
    pub include_drop: bool,
    /// Emit table, column, index and schema comments.
    pub include_comments: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_drop: true,
            include_comments: true,
        }
    }
}

/// Header information for an exported script
#[derive(Debug, Clone, PartialEq)]
pub struct ExportMetadata {
    pub version_name: String,
    pub version_id: i64,
    pub exported_at: String,
}

impl ExportMetadata {
    pub fn new(version_name: impl Into<String>, version_id: i64) -> Self {
        Self {
            version_name: version_name.into(),
            version_id,
            exported_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Quote a string as an SQL literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

const RAW_DEFAULT_KEYWORDS: &[&str] = &[
    "TRUE",
    "FALSE",
    "CURRENT_TIMESTAMP",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "LOCALTIMESTAMP",
    "LOCALTIME",
    "CURRENT_USER",
];

fn looks_numeric(value: &str) -> bool {
    let starts_like_number = value
        .chars()
        .next()
        .map(|c| c.is_ascii_digit() || c == '-' || c == '+' || c == '.')
        .unwrap_or(false);
    starts_like_number && value.parse::<f64>().is_ok()
}

/// Render a column default; `None` when the column has no usable default.
///
/// Quoted literals, numbers, keywords, function calls and casts are emitted
/// as-is; any other text becomes a string literal.
pub fn render_default(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("null") {
        return None;
    }
    let already_quoted = value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'');
    let keyword = RAW_DEFAULT_KEYWORDS
        .iter()
        .any(|k| value.eq_ignore_ascii_case(k));
    if already_quoted || keyword || looks_numeric(value) || value.contains('(') || value.contains("::") {
        Some(value.to_string())
    } else {
        Some(quote_literal(value))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Text for a `--` comment line; line breaks would end the comment.
fn comment_text(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

/// Dialect-aware DDL generator.
///
/// `engine` is the dialect being written; `source_engine` is the dialect the
/// column types were captured from.
pub struct SqlGenerator {
    engine: DatabaseEngine,
    source_engine: DatabaseEngine,
    options: ExportOptions,
}

impl SqlGenerator {
    pub fn new(engine: DatabaseEngine) -> Self {
        Self {
            engine,
            source_engine: engine,
            options: ExportOptions::default(),
        }
    }

    pub fn with_source_engine(mut self, source_engine: DatabaseEngine) -> Self {
        self.source_engine = source_engine;
        self
    }

    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn engine(&self) -> DatabaseEngine {
        self.engine
    }

    fn quote_ident(&self, name: &str) -> String {
        self.engine.quote_ident(name)
    }

    fn quote_columns(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn schema_of<'t>(&self, table: &'t TableInfo) -> &'t str {
        super::grouping::effective_schema(table)
    }

    /// Schema-qualified, quoted object name. Objects in `public`, and all
    /// objects in dialects without schemas, stay unqualified.
    pub fn qualified_table(&self, schema: &str, table: &str) -> String {
        if self.engine.supports_schemas() && schema != DEFAULT_SCHEMA {
            format!("{}.{}", self.quote_ident(schema), self.quote_ident(table))
        } else {
            self.quote_ident(table)
        }
    }

    /// `CREATE SCHEMA IF NOT EXISTS "<schema>";`
    pub fn generate_create_schema(&self, schema: &str) -> String {
        format!("CREATE SCHEMA IF NOT EXISTS {};", self.quote_ident(schema))
    }

    pub fn generate_schema_comment(&self, schema: &str, comment: &str) -> String {
        format!(
            "COMMENT ON SCHEMA {} IS {};",
            self.quote_ident(schema),
            quote_literal(comment)
        )
    }

    pub fn generate_drop_table(&self, table: &TableInfo) -> String {
        let name = self.qualified_table(self.schema_of(table), &table.table_name);
        if self.engine.is_postgres_family() {
            format!("DROP TABLE IF EXISTS {} CASCADE;", name)
        } else {
            format!("DROP TABLE IF EXISTS {};", name)
        }
    }

    /// Render one column definition line (without indentation or comma).
    pub fn column_definition(&self, column: &ColumnInfo) -> String {
        let auto_increment = column.is_auto_increment();
        let mut def = format!(
            "{} {}",
            self.quote_ident(&column.column_name),
            map_column_type(
                &self.source_engine,
                &self.engine,
                &column.column_type,
                auto_increment
            )
        );

        if !column.is_nullable {
            def.push_str(" NOT NULL");
        }

        if !auto_increment {
            if let Some(default) = column.column_default.as_deref().and_then(render_default) {
                def.push_str(" DEFAULT ");
                def.push_str(&default);
            }
        }

        if self.engine == DatabaseEngine::MySql {
            if auto_increment {
                def.push_str(" AUTO_INCREMENT");
            }
            if let Some(on_update) = column.extra.as_deref().and_then(mysql_on_update) {
                def.push(' ');
                def.push_str(&on_update);
            }
            if self.options.include_comments {
                if let Some(comment) = non_empty(&column.column_comment) {
                    def.push_str(" COMMENT ");
                    def.push_str(&quote_literal(comment));
                }
            }
        }

        def
    }

    /// The primary key of a table: its primary index, or else the columns
    /// flagged `PRI`.
    fn primary_key(&self, table: &TableInfo, indexes: &[IndexDefinition]) -> Option<IndexDefinition> {
        if let Some(pk) = indexes.iter().find(|i| i.is_primary) {
            return Some(pk.clone());
        }
        let columns: Vec<String> = table
            .columns
            .iter()
            .filter(|c| c.is_primary_key())
            .map(|c| c.column_name.clone())
            .collect();
        if columns.is_empty() {
            return None;
        }
        Some(IndexDefinition {
            name: "PRIMARY".to_string(),
            index_type: None,
            is_unique: true,
            is_primary: true,
            columns,
            comment: None,
        })
    }

    /// Render `CREATE TABLE` plus its dependent statements.
    pub fn generate_create_table(&self, table: &TableInfo) -> String {
        if self.engine.is_postgres_family() {
            self.create_table_postgres(table)
        } else {
            self.create_table_mysql(table)
        }
    }

    fn create_table_postgres(&self, table: &TableInfo) -> String {
        let schema = self.schema_of(table);
        let name = self.qualified_table(schema, &table.table_name);
        let indexes = table.index_definitions();

        let mut lines: Vec<String> = table
            .columns
            .iter()
            .map(|c| format!("  {}", self.column_definition(c)))
            .collect();

        if let Some(pk) = self.primary_key(table, &indexes) {
            lines.push(format!(
                "  {}PRIMARY KEY ({})",
                self.constraint_prefix(&pk),
                self.quote_columns(&pk.columns)
            ));
        }
        for unique in indexes.iter().filter(|i| i.is_unique && !i.is_primary) {
            lines.push(format!(
                "  {}UNIQUE ({})",
                self.constraint_prefix(unique),
                self.quote_columns(&unique.columns)
            ));
        }

        let mut sql = format!("CREATE TABLE {} (\n{}\n);", name, lines.join(",\n"));

        if self.options.include_comments {
            if let Some(comment) = non_empty(&table.table_comment) {
                sql.push_str(&format!(
                    "\nCOMMENT ON TABLE {} IS {};",
                    name,
                    quote_literal(comment)
                ));
            }
            for column in &table.columns {
                if let Some(comment) = non_empty(&column.column_comment) {
                    sql.push_str(&format!(
                        "\nCOMMENT ON COLUMN {}.{} IS {};",
                        name,
                        self.quote_ident(&column.column_name),
                        quote_literal(comment)
                    ));
                }
            }
        }

        for index in indexes.iter().filter(|i| !i.is_unique && !i.is_primary) {
            let using = index
                .index_type
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("btree"))
                .map(|t| format!(" USING {}", t.to_lowercase()))
                .unwrap_or_default();
            sql.push_str(&format!(
                "\nCREATE INDEX {} ON {}{} ({});",
                self.quote_ident(&index.name),
                name,
                using,
                self.quote_columns(&index.columns)
            ));
        }

        if self.options.include_comments {
            for index in indexes.iter().filter(|i| i.name != "PRIMARY") {
                if let Some(comment) = non_empty(&index.comment) {
                    sql.push_str(&format!(
                        "\nCOMMENT ON INDEX {} IS {};",
                        self.qualified_table(schema, &index.name),
                        quote_literal(comment)
                    ));
                }
            }
        }

        sql
    }

    fn constraint_prefix(&self, index: &IndexDefinition) -> String {
        if index.name.is_empty() || index.name == "PRIMARY" {
            String::new()
        } else {
            format!("CONSTRAINT {} ", self.quote_ident(&index.name))
        }
    }

    fn create_table_mysql(&self, table: &TableInfo) -> String {
        let name = self.qualified_table(self.schema_of(table), &table.table_name);
        let indexes = table.index_definitions();

        let mut lines: Vec<String> = table
            .columns
            .iter()
            .map(|c| format!("  {}", self.column_definition(c)))
            .collect();

        if let Some(pk) = self.primary_key(table, &indexes) {
            lines.push(format!("  PRIMARY KEY ({})", self.quote_columns(&pk.columns)));
        }
        for index in indexes.iter().filter(|i| !i.is_primary) {
            let index_type = index.index_type.as_deref().map(str::trim).unwrap_or("");
            let kind = if index_type.eq_ignore_ascii_case("fulltext") {
                "FULLTEXT KEY"
            } else if index_type.eq_ignore_ascii_case("spatial") {
                "SPATIAL KEY"
            } else if index.is_unique {
                "UNIQUE KEY"
            } else {
                "KEY"
            };
            let mut line = format!(
                "  {} {} ({})",
                kind,
                self.quote_ident(&index.name),
                self.quote_columns(&index.columns)
            );
            if index_type.eq_ignore_ascii_case("hash") {
                line.push_str(" USING HASH");
            }
            if self.options.include_comments {
                if let Some(comment) = non_empty(&index.comment) {
                    line.push_str(&format!(" COMMENT {}", quote_literal(comment)));
                }
            }
            lines.push(line);
        }

        let mut sql = format!("CREATE TABLE {} (\n{}\n)", name, lines.join(",\n"));
        sql.push_str(&format!(
            " ENGINE={}",
            non_empty(&table.engine).unwrap_or("InnoDB")
        ));
        if let Some(charset) = non_empty(&table.charset) {
            sql.push_str(&format!(" DEFAULT CHARSET={}", charset));
        }
        if let Some(collation) = non_empty(&table.collation) {
            sql.push_str(&format!(" COLLATE={}", collation));
        }
        if self.options.include_comments {
            if let Some(comment) = non_empty(&table.table_comment) {
                sql.push_str(&format!(" COMMENT={}", quote_literal(comment)));
            }
        }
        sql.push(';');
        sql
    }

    /// Render a whole captured structure as one script.
    ///
    /// Schemas are created first (PostgreSQL family only), then each schema
    /// group's tables in input order.
    pub fn generate_complete_script(
        &self,
        structure: &CompleteStructure,
        metadata: &ExportMetadata,
    ) -> String {
        let mut sql = String::new();
        sql.push_str("-- Database structure export\n");
        sql.push_str(&format!("-- Version: {}\n", comment_text(&metadata.version_name)));
        sql.push_str(&format!("-- Version ID: {}\n", metadata.version_id));
        sql.push_str(&format!("-- Exported at: {}\n", comment_text(&metadata.exported_at)));
        sql.push_str(&format!("-- Dialect: {}\n\n", self.engine));

        if let Some(db) = &structure.database {
            sql.push_str(&format!("-- Database: {}\n", comment_text(&db.database_name)));
            sql.push_str(&format!(
                "-- Charset: {}\n",
                comment_text(db.charset.as_deref().unwrap_or("-"))
            ));
            sql.push_str(&format!(
                "-- Collation: {}\n\n",
                comment_text(db.collation.as_deref().unwrap_or("-"))
            ));
        }

        if structure.tables.is_empty() {
            sql.push_str("-- No table structures in this version\n");
            return sql;
        }

        let plan = SchemaPlan::build(&structure.tables);

        if self.engine.supports_schemas() {
            let schemas = plan.schemas_to_create();
            for schema in &schemas {
                sql.push_str(&self.generate_create_schema(schema));
                sql.push('\n');
                if self.options.include_comments {
                    let comment = structure
                        .database
                        .as_ref()
                        .and_then(|db| db.schema(schema))
                        .and_then(|s| non_empty(&s.schema_comment));
                    if let Some(comment) = comment {
                        sql.push_str(&self.generate_schema_comment(schema, comment));
                        sql.push('\n');
                    }
                }
            }
            if !schemas.is_empty() {
                sql.push('\n');
            }
        }

        for group in plan.groups() {
            if self.engine.supports_schemas() {
                sql.push_str(&format!(
                    "-- Schema: {} ({} tables)\n",
                    comment_text(&group.schema_name),
                    group.tables.len()
                ));
            }
            for table in &group.tables {
                sql.push_str(&format!(
                    "-- Table: {}",
                    comment_text(&qualified_name(&group.schema_name, &table.table_name))
                ));
                if let Some(comment) = non_empty(&table.table_comment) {
                    sql.push_str(&format!(" ({})", comment_text(comment)));
                }
                sql.push('\n');
                if self.options.include_drop {
                    sql.push_str(&self.generate_drop_table(table));
                    sql.push('\n');
                }
                sql.push_str(&self.generate_create_table(table));
                sql.push_str("\n\n");
            }
        }

        sql
    }
}

/// `ON UPDATE ...` clause carried in MySQL's `extra` column.
fn mysql_on_update(extra: &str) -> Option<String> {
    let lower = extra.to_ascii_lowercase();
    lower
        .find("on update")
        .map(|pos| extra[pos..].trim().to_uppercase())
}

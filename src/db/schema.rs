use serde::{Deserialize, Deserializer, Serialize};

/// Schema every PostgreSQL-family database starts with.
pub const DEFAULT_SCHEMA: &str = "public";

/// Complete structure of one captured database version
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteStructure {
    #[serde(default)]
    pub database: Option<DatabaseInfo>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tables: Vec<TableInfo>,
    #[serde(default)]
    pub datasource_type: Option<String>,
}

/// Database-level information captured with a version
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseInfo {
    pub database_name: String,
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub collation: Option<String>,
    #[serde(default)]
    pub snapshot_time: Option<String>,
    #[serde(default, deserialize_with = "deserialize_schemas_info")]
    pub schemas_info: Vec<SchemaInfo>,
}

impl DatabaseInfo {
    /// Look up the declared entry for a schema, ignoring surrounding whitespace.
    pub fn schema(&self, name: &str) -> Option<&SchemaInfo> {
        let name = name.trim();
        self.schemas_info.iter().find(|s| s.schema_name.trim() == name)
    }
}

/// A schema declared in `schemasInfo`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaInfo {
    pub schema_name: String,
    #[serde(default)]
    pub schema_comment: Option<String>,
}

/// Represents a single table in a captured structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    #[serde(default)]
    pub table_name: String,
    #[serde(default)]
    pub schema_name: Option<String>,
    #[serde(default)]
    pub table_comment: Option<String>,
    #[serde(default)]
    pub table_type: Option<String>,
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub collation: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: Vec<ColumnInfo>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub indexes: Vec<IndexInfo>,
}

impl TableInfo {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Default::default()
        }
    }

    pub fn in_schema(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = Some(schema_name.into());
        self
    }

    /// Indexes merged by name, in first-seen order.
    ///
    /// MySQL reports one index row per indexed column; rows sharing an
    /// `indexName` are folded into a single definition.
    pub fn index_definitions(&self) -> Vec<IndexDefinition> {
        let mut merged: Vec<IndexDefinition> = Vec::new();
        for index in &self.indexes {
            let columns = index.columns();
            match merged.iter().position(|d| d.name == index.index_name) {
                Some(pos) => {
                    let existing = &mut merged[pos];
                    for col in columns {
                        if !existing.columns.iter().any(|c| c == col) {
                            existing.columns.push(col.to_string());
                        }
                    }
                }
                None => merged.push(IndexDefinition {
                    name: index.index_name.clone(),
                    index_type: index.index_type.clone(),
                    is_unique: index.is_unique || index.is_primary_key(),
                    is_primary: index.is_primary_key(),
                    columns: columns.into_iter().map(str::to_string).collect(),
                    comment: index.index_comment.clone(),
                }),
            }
        }
        merged
    }
}

/// Represents a column in a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub column_name: String,
    #[serde(default, alias = "dataType")]
    pub column_type: String,
    #[serde(default = "nullable_by_default", with = "yes_no")]
    pub is_nullable: bool,
    #[serde(default)]
    pub column_key: Option<String>,
    #[serde(default)]
    pub column_default: Option<String>,
    #[serde(default)]
    pub extra: Option<String>,
    #[serde(default)]
    pub column_comment: Option<String>,
}

impl Default for ColumnInfo {
    fn default() -> Self {
        Self {
            column_name: String::new(),
            column_type: String::new(),
            is_nullable: true,
            column_key: None,
            column_default: None,
            extra: None,
            column_comment: None,
        }
    }
}

impl ColumnInfo {
    pub fn new(column_name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            column_type: column_type.into(),
            ..Default::default()
        }
    }

    /// True when the database generates values for this column.
    pub fn is_auto_increment(&self) -> bool {
        let extra_says_so = self
            .extra
            .as_deref()
            .map(|e| e.to_lowercase().contains("auto_increment"))
            .unwrap_or(false);
        let serial_type = matches!(
            self.column_type.trim().to_lowercase().as_str(),
            "serial" | "bigserial" | "smallserial" | "serial4" | "serial8" | "serial2"
        );
        let sequence_default = self
            .column_default
            .as_deref()
            .map(|d| d.trim_start().to_lowercase().starts_with("nextval("))
            .unwrap_or(false);
        extra_says_so || serial_type || sequence_default
    }

    pub fn is_primary_key(&self) -> bool {
        self.column_key.as_deref() == Some("PRI")
    }
}

/// One index row as reported by the service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexInfo {
    pub index_name: String,
    #[serde(default)]
    pub index_type: Option<String>,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub column_names: String,
    #[serde(default)]
    pub index_comment: Option<String>,
}

impl IndexInfo {
    pub fn is_primary_key(&self) -> bool {
        self.is_primary || self.index_name == "PRIMARY"
    }

    /// The comma-separated `columnNames` split into column names.
    pub fn columns(&self) -> Vec<&str> {
        self.column_names
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect()
    }
}

/// An index after merging its per-column rows
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDefinition {
    pub name: String,
    pub index_type: Option<String>,
    pub is_unique: bool,
    pub is_primary: bool,
    pub columns: Vec<String>,
    pub comment: Option<String>,
}

fn nullable_by_default() -> bool {
    true
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `schemasInfo` is stored by the service as a JSON string, but a plain
/// array is accepted as well.
fn deserialize_schemas_info<'de, D>(deserializer: D) -> Result<Vec<SchemaInfo>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        List(Vec<SchemaInfo>),
        Encoded(String),
    }

    match Option::<Repr>::deserialize(deserializer)? {
        None => Ok(Vec::new()),
        Some(Repr::List(list)) => Ok(list),
        Some(Repr::Encoded(text)) if text.trim().is_empty() => Ok(Vec::new()),
        Some(Repr::Encoded(text)) => serde_json::from_str(&text).map_err(serde::de::Error::custom),
    }
}

/// `isNullable` travels as the information_schema strings "YES" / "NO".
mod yes_no {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "YES" } else { "NO" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Flag(bool),
            Text(String),
        }

        match Option::<Repr>::deserialize(deserializer)? {
            None => Ok(true),
            Some(Repr::Flag(b)) => Ok(b),
            Some(Repr::Text(s)) => Ok(!s.trim().eq_ignore_ascii_case("NO")),
        }
    }
}

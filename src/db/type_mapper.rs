use super::dialect::DatabaseEngine;
use serde::{Deserialize, Serialize};

/// Canonical type system for cross-dialect column type mapping
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CanonicalType {
    Boolean,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Decimal { precision: Option<u32>, scale: Option<u32> },
    Char(Option<u32>),
    Varchar(Option<u32>),
    Text,
    Blob,
    Date,
    Time,
    DateTime,
    Timestamp,
    Year,
    Uuid,
    Json,
    Enum,
    Set,
    Unknown(String),
}

/// A native type split into its base name and numeric arguments.
///
/// `numeric(10,2)` parses to base `numeric` with args `[10, 2]`;
/// `int(11) unsigned` parses to base `int` with args `[11]`;
/// `timestamp(3) with time zone` keeps the zone suffix in the base.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeType {
    pub raw: String,
    pub base: String,
    pub args: Vec<u32>,
}

impl NativeType {
    pub fn parse(native: &str) -> Self {
        let lower = native.trim().to_lowercase();
        let (mut base, args, suffix) = match lower.find('(') {
            Some(open) => {
                let close = lower[open..].find(')').map(|c| open + c).unwrap_or(lower.len());
                let inner = &lower[open + 1..close];
                let args = inner
                    .split(',')
                    .filter_map(|a| a.trim().parse::<u32>().ok())
                    .collect();
                let suffix = lower.get(close + 1..).unwrap_or("").trim().to_string();
                (lower[..open].trim().to_string(), args, suffix)
            }
            None => (lower.clone(), Vec::new(), String::new()),
        };

        if suffix.starts_with("with") || suffix.starts_with("without") {
            base = format!("{} {}", base, suffix);
        }

        let words: Vec<&str> = base
            .split_whitespace()
            .filter(|w| !matches!(*w, "unsigned" | "signed" | "zerofill"))
            .collect();

        Self {
            raw: native.trim().to_string(),
            base: words.join(" "),
            args,
        }
    }

    fn arg(&self, i: usize) -> Option<u32> {
        self.args.get(i).copied()
    }
}

/// Map a native type string of one engine to the canonical type
pub fn to_canonical(engine: &DatabaseEngine, native_type: &str) -> CanonicalType {
    let parsed = NativeType::parse(native_type);
    match engine {
        DatabaseEngine::MySql => mysql_to_canonical(&parsed),
        DatabaseEngine::PostgreSql | DatabaseEngine::Kingbase => postgres_to_canonical(&parsed),
    }
}

/// Map a canonical type to the native type string of a specific engine
pub fn from_canonical(
    engine: &DatabaseEngine,
    canonical: &CanonicalType,
    auto_increment: bool,
) -> String {
    match engine {
        DatabaseEngine::MySql => canonical_to_mysql(canonical),
        DatabaseEngine::PostgreSql | DatabaseEngine::Kingbase => {
            if auto_increment {
                if let Some(serial) = serial_for(canonical) {
                    return serial.to_string();
                }
            }
            canonical_to_postgres(canonical)
        }
    }
}

/// Map a column's native type from the source engine to the target engine.
///
/// Within one engine family the native spelling is kept (upper-cased), except
/// that auto-generated integer columns become SERIAL types in the PostgreSQL
/// family.
pub fn map_column_type(
    source_engine: &DatabaseEngine,
    target_engine: &DatabaseEngine,
    native_type: &str,
    auto_increment: bool,
) -> String {
    let native = native_type.trim();
    if native.is_empty() {
        return from_canonical(target_engine, &CanonicalType::Text, false);
    }
    if source_engine.same_family(target_engine) {
        if target_engine.is_postgres_family() && auto_increment {
            if let Some(serial) = serial_for(&to_canonical(source_engine, native)) {
                return serial.to_string();
            }
        }
        return native.to_uppercase();
    }
    from_canonical(
        target_engine,
        &to_canonical(source_engine, native),
        auto_increment,
    )
}

fn serial_for(canonical: &CanonicalType) -> Option<&'static str> {
    match canonical {
        CanonicalType::TinyInt | CanonicalType::SmallInt | CanonicalType::Int => Some("SERIAL"),
        CanonicalType::BigInt => Some("BIGSERIAL"),
        _ => None,
    }
}

fn mysql_to_canonical(native: &NativeType) -> CanonicalType {
    match native.base.as_str() {
        "tinyint" if native.args == [1] => CanonicalType::Boolean,
        "boolean" | "bool" | "bit" if native.arg(0).unwrap_or(1) == 1 => CanonicalType::Boolean,
        "tinyint" => CanonicalType::TinyInt,
        "smallint" => CanonicalType::SmallInt,
        "mediumint" | "int" | "integer" => CanonicalType::Int,
        "bigint" => CanonicalType::BigInt,
        "year" => CanonicalType::Year,
        "float" => CanonicalType::Float,
        "double" | "double precision" | "real" => CanonicalType::Double,
        "decimal" | "numeric" | "dec" | "fixed" => CanonicalType::Decimal {
            precision: native.arg(0),
            scale: native.arg(1),
        },
        "char" => CanonicalType::Char(native.arg(0)),
        "varchar" => CanonicalType::Varchar(native.arg(0)),
        "tinytext" | "text" | "mediumtext" | "longtext" => CanonicalType::Text,
        "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" | "bit" => {
            CanonicalType::Blob
        }
        "date" => CanonicalType::Date,
        "time" => CanonicalType::Time,
        "datetime" | "timestamp" => CanonicalType::DateTime,
        "json" => CanonicalType::Json,
        "enum" => CanonicalType::Enum,
        "set" => CanonicalType::Set,
        _ => CanonicalType::Unknown(native.raw.clone()),
    }
}

fn postgres_to_canonical(native: &NativeType) -> CanonicalType {
    match native.base.as_str() {
        "boolean" | "bool" => CanonicalType::Boolean,
        "smallint" | "int2" | "smallserial" | "serial2" => CanonicalType::SmallInt,
        "integer" | "int4" | "int" | "serial" | "serial4" => CanonicalType::Int,
        "bigint" | "int8" | "bigserial" | "serial8" => CanonicalType::BigInt,
        "real" | "float4" => CanonicalType::Float,
        "double precision" | "float8" | "float" => CanonicalType::Double,
        "numeric" | "decimal" => CanonicalType::Decimal {
            precision: native.arg(0),
            scale: native.arg(1),
        },
        "character" | "char" | "bpchar" => CanonicalType::Char(native.arg(0)),
        "character varying" | "varchar" => CanonicalType::Varchar(native.arg(0)),
        "text" => CanonicalType::Text,
        "bytea" => CanonicalType::Blob,
        "date" => CanonicalType::Date,
        "time" | "time without time zone" => CanonicalType::Time,
        "timestamp" | "timestamp without time zone" => CanonicalType::DateTime,
        "timestamptz" | "timestamp with time zone" => CanonicalType::Timestamp,
        "uuid" => CanonicalType::Uuid,
        "json" | "jsonb" => CanonicalType::Json,
        _ => CanonicalType::Unknown(native.raw.clone()),
    }
}

fn with_length(name: &str, length: &Option<u32>) -> String {
    match length {
        Some(n) => format!("{}({})", name, n),
        None => name.to_string(),
    }
}

fn with_precision(name: &str, precision: &Option<u32>, scale: &Option<u32>) -> String {
    match (precision, scale) {
        (Some(p), Some(s)) => format!("{}({},{})", name, p, s),
        (Some(p), None) => format!("{}({})", name, p),
        _ => name.to_string(),
    }
}

fn canonical_to_postgres(canonical: &CanonicalType) -> String {
    match canonical {
        CanonicalType::Boolean => "BOOLEAN".to_string(),
        CanonicalType::TinyInt | CanonicalType::SmallInt => "SMALLINT".to_string(),
        CanonicalType::Int | CanonicalType::Year => "INTEGER".to_string(),
        CanonicalType::BigInt => "BIGINT".to_string(),
        CanonicalType::Float => "REAL".to_string(),
        CanonicalType::Double => "DOUBLE PRECISION".to_string(),
        CanonicalType::Decimal { precision, scale } => with_precision("NUMERIC", precision, scale),
        CanonicalType::Char(n) => with_length("CHAR", n),
        CanonicalType::Varchar(n) => with_length("VARCHAR", n),
        CanonicalType::Text | CanonicalType::Set => "TEXT".to_string(),
        CanonicalType::Blob => "BYTEA".to_string(),
        CanonicalType::Date => "DATE".to_string(),
        CanonicalType::Time => "TIME".to_string(),
        CanonicalType::DateTime => "TIMESTAMP".to_string(),
        CanonicalType::Timestamp => "TIMESTAMPTZ".to_string(),
        CanonicalType::Uuid => "UUID".to_string(),
        CanonicalType::Json => "JSON".to_string(),
        CanonicalType::Enum => "VARCHAR(255)".to_string(),
        CanonicalType::Unknown(s) => s.to_uppercase(),
    }
}

fn canonical_to_mysql(canonical: &CanonicalType) -> String {
    match canonical {
        CanonicalType::Boolean => "TINYINT(1)".to_string(),
        CanonicalType::TinyInt => "TINYINT".to_string(),
        CanonicalType::SmallInt => "SMALLINT".to_string(),
        CanonicalType::Int => "INT".to_string(),
        CanonicalType::BigInt => "BIGINT".to_string(),
        CanonicalType::Year => "YEAR".to_string(),
        CanonicalType::Float => "FLOAT".to_string(),
        CanonicalType::Double => "DOUBLE".to_string(),
        CanonicalType::Decimal { precision, scale } => with_precision("DECIMAL", precision, scale),
        CanonicalType::Char(n) => with_length("CHAR", n),
        CanonicalType::Varchar(n) => format!("VARCHAR({})", n.unwrap_or(255)),
        CanonicalType::Text | CanonicalType::Set => "TEXT".to_string(),
        CanonicalType::Blob => "LONGBLOB".to_string(),
        CanonicalType::Date => "DATE".to_string(),
        CanonicalType::Time => "TIME".to_string(),
        CanonicalType::DateTime => "DATETIME".to_string(),
        CanonicalType::Timestamp => "TIMESTAMP".to_string(),
        CanonicalType::Uuid => "CHAR(36)".to_string(),
        CanonicalType::Json => "JSON".to_string(),
        CanonicalType::Enum => "VARCHAR(255)".to_string(),
        CanonicalType::Unknown(s) => s.to_uppercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MYSQL: DatabaseEngine = DatabaseEngine::MySql;
    const PG: DatabaseEngine = DatabaseEngine::PostgreSql;

    #[test]
    fn test_parse_native_type() {
        let t = NativeType::parse("numeric(10,2)");
        assert_eq!(t.base, "numeric");
        assert_eq!(t.args, vec![10, 2]);

        let t = NativeType::parse("INT(11) UNSIGNED");
        assert_eq!(t.base, "int");
        assert_eq!(t.args, vec![11]);

        let t = NativeType::parse("timestamp(3) with time zone");
        assert_eq!(t.base, "timestamp with time zone");

        let t = NativeType::parse("character varying(50)");
        assert_eq!(t.base, "character varying");
        assert_eq!(t.args, vec![50]);
    }

    #[test]
    fn test_mysql_to_postgres() {
        assert_eq!(map_column_type(&MYSQL, &PG, "tinyint(1)", false), "BOOLEAN");
        assert_eq!(map_column_type(&MYSQL, &PG, "tinyint(4)", false), "SMALLINT");
        assert_eq!(map_column_type(&MYSQL, &PG, "int(11)", false), "INTEGER");
        assert_eq!(map_column_type(&MYSQL, &PG, "varchar(50)", false), "VARCHAR(50)");
        assert_eq!(map_column_type(&MYSQL, &PG, "decimal(10,2)", false), "NUMERIC(10,2)");
        assert_eq!(map_column_type(&MYSQL, &PG, "datetime", false), "TIMESTAMP");
        assert_eq!(map_column_type(&MYSQL, &PG, "longblob", false), "BYTEA");
        assert_eq!(map_column_type(&MYSQL, &PG, "enum('a','b')", false), "VARCHAR(255)");
        assert_eq!(map_column_type(&MYSQL, &PG, "year", false), "INTEGER");
        assert_eq!(map_column_type(&MYSQL, &PG, "geometry", false), "GEOMETRY");
    }

    #[test]
    fn test_auto_increment_becomes_serial() {
        assert_eq!(map_column_type(&MYSQL, &PG, "bigint(20)", true), "BIGSERIAL");
        assert_eq!(map_column_type(&MYSQL, &PG, "int(11)", true), "SERIAL");
        assert_eq!(map_column_type(&PG, &PG, "bigint", true), "BIGSERIAL");
        assert_eq!(map_column_type(&PG, &PG, "bigserial", true), "BIGSERIAL");
    }

    #[test]
    fn test_same_family_keeps_native_spelling() {
        assert_eq!(
            map_column_type(&PG, &PG, "character varying(50)", false),
            "CHARACTER VARYING(50)"
        );
        assert_eq!(
            map_column_type(&PG, &DatabaseEngine::Kingbase, "timestamp without time zone", false),
            "TIMESTAMP WITHOUT TIME ZONE"
        );
        assert_eq!(map_column_type(&MYSQL, &MYSQL, "int(11) unsigned", true), "INT(11) UNSIGNED");
    }

    #[test]
    fn test_postgres_to_mysql() {
        assert_eq!(map_column_type(&PG, &MYSQL, "bigserial", true), "BIGINT");
        assert_eq!(map_column_type(&PG, &MYSQL, "character varying(100)", false), "VARCHAR(100)");
        assert_eq!(map_column_type(&PG, &MYSQL, "boolean", false), "TINYINT(1)");
        assert_eq!(map_column_type(&PG, &MYSQL, "uuid", false), "CHAR(36)");
        assert_eq!(map_column_type(&PG, &MYSQL, "numeric(8,2)", false), "DECIMAL(8,2)");
    }

    #[test]
    fn test_empty_type_falls_back_to_text() {
        assert_eq!(map_column_type(&MYSQL, &PG, "  ", false), "TEXT");
    }
}

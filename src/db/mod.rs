pub mod dialect;
pub mod grouping;
pub mod schema;
pub mod sql_generator;
pub mod type_mapper;
pub mod validation;

// Re-export key types and functions for convenient access
pub use dialect::{DatabaseEngine, UnknownEngine};
pub use grouping::{
    effective_schema, normalize_schema, qualified_name, PlannedStatement, SchemaGroup, SchemaPlan,
};
pub use schema::{
    ColumnInfo, CompleteStructure, DatabaseInfo, IndexDefinition, IndexInfo, SchemaInfo,
    TableInfo, DEFAULT_SCHEMA,
};
pub use sql_generator::{ExportMetadata, ExportOptions, SqlGenerator};
pub use type_mapper::{map_column_type, CanonicalType};
pub use validation::{validate_identifier, validate_structure, ValidationError};

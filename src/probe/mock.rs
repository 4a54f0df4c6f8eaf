use crate::db::schema::{ColumnInfo, CompleteStructure, DatabaseInfo, IndexInfo, SchemaInfo, TableInfo};

fn column(
    name: &str,
    column_type: &str,
    nullable: bool,
    key: &str,
    default: Option<&str>,
    extra: &str,
    comment: &str,
) -> ColumnInfo {
    ColumnInfo {
        column_name: name.to_string(),
        column_type: column_type.to_string(),
        is_nullable: nullable,
        column_key: Some(key.to_string()),
        column_default: default.map(str::to_string),
        extra: Some(extra.to_string()),
        column_comment: Some(comment.to_string()),
    }
}

fn id_column(comment: &str) -> ColumnInfo {
    column("id", "bigserial", false, "PRI", None, "auto_increment", comment)
}

fn index(name: &str, unique: bool, primary: bool, columns: &str, comment: &str) -> IndexInfo {
    IndexInfo {
        index_name: name.to_string(),
        index_type: Some("BTREE".to_string()),
        is_unique: unique,
        is_primary: primary,
        column_names: columns.to_string(),
        index_comment: Some(comment.to_string()),
    }
}

fn table(name: &str, schema: &str, comment: &str) -> TableInfo {
    TableInfo {
        table_name: name.to_string(),
        schema_name: Some(schema.to_string()),
        table_comment: Some(comment.to_string()),
        table_type: Some("BASE TABLE".to_string()),
        ..Default::default()
    }
}

/// Synthetic PostgreSQL structure spread over three schemas:
/// `public.users`, `sales.orders` and `inventory.products`.
pub fn mock_postgresql_structure() -> CompleteStructure {
    let users = TableInfo {
        columns: vec![
            id_column("Primary key"),
            column("username", "character varying(50)", false, "UNI", None, "", "User name"),
            column("email", "character varying(100)", true, "", None, "", "Email"),
            column(
                "created_at",
                "timestamp without time zone",
                false,
                "",
                Some("CURRENT_TIMESTAMP"),
                "",
                "Created at",
            ),
        ],
        indexes: vec![
            index("users_pkey", true, true, "id", "Primary key index"),
            index("users_username_key", true, false, "username", "Unique user name"),
        ],
        ..table("users", "public", "Users")
    };

    let orders = TableInfo {
        columns: vec![
            id_column("Order ID"),
            column("user_id", "bigint", false, "MUL", None, "", "User ID"),
            column("total_amount", "numeric(10,2)", false, "", Some("0.00"), "", "Total amount"),
            column(
                "status",
                "character varying(20)",
                false,
                "",
                Some("'pending'"),
                "",
                "Order status",
            ),
        ],
        indexes: vec![
            index("orders_pkey", true, true, "id", "Primary key index"),
            index("idx_orders_user_id", false, false, "user_id", "User ID index"),
        ],
        ..table("orders", "sales", "Orders")
    };

    let products = TableInfo {
        columns: vec![
            id_column("Product ID"),
            column("name", "character varying(100)", false, "", None, "", "Product name"),
            column("price", "numeric(8,2)", false, "", None, "", "Price"),
        ],
        indexes: vec![index("products_pkey", true, true, "id", "Primary key index")],
        ..table("products", "inventory", "Products")
    };

    let schema = |name: &str, comment: &str| SchemaInfo {
        schema_name: name.to_string(),
        schema_comment: Some(comment.to_string()),
    };

    CompleteStructure {
        database: Some(DatabaseInfo {
            database_name: "test_postgresql".to_string(),
            charset: Some("UTF8".to_string()),
            collation: Some("en_US.UTF-8".to_string()),
            snapshot_time: Some("2025-07-17T23:00:00".to_string()),
            schemas_info: vec![
                schema("public", "Default schema"),
                schema("sales", "Sales schema"),
                schema("inventory", "Inventory schema"),
            ],
        }),
        tables: vec![users, orders, products],
        datasource_type: Some("postgresql".to_string()),
    }
}

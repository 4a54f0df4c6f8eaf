use crate::db::grouping::{qualified_name, SchemaPlan};

/// Human-readable listing of a schema plan: the schemas found, the
/// CREATE SCHEMA statements, then the tables of each schema.
pub fn render_plan_report(plan: &SchemaPlan<'_>) -> String {
    let mut out = String::new();

    out.push_str("Schemas found:\n");
    for group in plan.groups() {
        out.push_str(&format!(
            "  - {}: {} table(s)\n",
            group.schema_name,
            group.tables.len()
        ));
    }

    out.push_str("\nExpected SQL structure:\n");
    out.push_str("1. CREATE SCHEMA statements\n");
    let statements = plan.create_schema_statements();
    if statements.is_empty() {
        out.push_str("   (none)\n");
    }
    for statement in statements {
        out.push_str(&format!("   {}\n", statement));
    }

    out.push_str("\n2. Tables grouped by schema:\n");
    for group in plan.groups() {
        out.push_str(&format!(
            "   Schema: {} ({} tables)\n",
            group.schema_name,
            group.tables.len()
        ));
        for table in &group.tables {
            out.push_str(&format!(
                "     - {}\n",
                qualified_name(&group.schema_name, &table.table_name)
            ));
        }
    }

    out
}

/// First `limit` characters of `text`, with `...` appended when cut.
pub fn preview(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

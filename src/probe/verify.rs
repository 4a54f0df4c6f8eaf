use std::fmt;

use crate::db::dialect::DatabaseEngine;
use crate::db::grouping::{PlannedStatement, SchemaPlan};
use crate::db::schema::DEFAULT_SCHEMA;

/// A way a rendered script departs from the derived plan.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationProblem {
    /// A planned statement does not appear in the script.
    Missing { statement: String },
    /// `statement` appears before `after`, which the plan puts first.
    OutOfOrder { statement: String, after: String },
    /// `public` got its own CREATE SCHEMA.
    PublicSchemaCreated,
    SchemaCountMismatch { expected: usize, actual: usize },
}

impl fmt::Display for VerificationProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationProblem::Missing { statement } => {
                write!(f, "Missing statement: {}", statement)
            }
            VerificationProblem::OutOfOrder { statement, after } => {
                write!(f, "'{}' should come after '{}'", statement, after)
            }
            VerificationProblem::PublicSchemaCreated => {
                write!(f, "Script creates the default schema \"public\"")
            }
            VerificationProblem::SchemaCountMismatch { expected, actual } => write!(
                f,
                "Expected {} CREATE SCHEMA statements, found {}",
                expected, actual
            ),
        }
    }
}

/// Split a script into statements, dropping `--` and `/* */` comments.
///
/// Quoted text (`'..'`, `".."`, `` `..` ``) is kept as-is and never splits a
/// statement. Statements are trimmed and carry no trailing `;`.
fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = script.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            current.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                current.push(c);
            }
            '-' if chars.peek() == Some(&'-') => {
                while chars.peek().is_some_and(|&n| n != '\n') {
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for n in chars.by_ref() {
                    if prev == '*' && n == '/' {
                        break;
                    }
                    prev = n;
                }
            }
            ';' => {
                push_statement(&mut statements, &current);
                current.clear();
            }
            _ => current.push(c),
        }
    }
    push_statement(&mut statements, &current);
    statements
}

fn push_statement(statements: &mut Vec<String>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        statements.push(text.to_string());
    }
}

/// Strip a leading keyword (any case) followed by a word boundary.
fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let text = text.trim_start();
    let head = text.get(..keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    let rest = &text[keyword.len()..];
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() || c == '"' || c == '`' => Some(rest),
        _ => None,
    }
}

/// The schema a `CREATE SCHEMA` statement creates, resolved the way the
/// database does: quoted names are exact, unquoted names fold to lowercase.
fn created_schema(statement: &str) -> Option<String> {
    let rest = strip_keyword(statement, "CREATE")?;
    let rest = strip_keyword(rest, "SCHEMA")?;
    let rest = strip_keyword(rest, "IF")
        .and_then(|r| strip_keyword(r, "NOT"))
        .and_then(|r| strip_keyword(r, "EXISTS"))
        .unwrap_or(rest)
        .trim();

    for q in ['"', '`'] {
        if rest.len() >= 2 && rest.starts_with(q) && rest.ends_with(q) {
            let doubled = format!("{}{}", q, q);
            return Some(rest[1..rest.len() - 1].replace(&doubled, &q.to_string()));
        }
    }
    rest.split_whitespace().next().map(str::to_lowercase)
}

/// Index of the first statement that carries out `planned`.
fn statement_position(
    planned: &PlannedStatement,
    statements: &[String],
    schemas: &[Option<String>],
    engine: &DatabaseEngine,
) -> Option<usize> {
    match planned {
        PlannedStatement::CreateSchema { schema } => schemas
            .iter()
            .position(|created| created.as_deref() == Some(schema.as_str())),
        PlannedStatement::CreateTable { schema, table } => {
            let name = if engine.supports_schemas() && schema != DEFAULT_SCHEMA {
                format!("{}.{}", engine.quote_ident(schema), engine.quote_ident(table))
            } else {
                engine.quote_ident(table)
            };
            let marker = format!("CREATE TABLE {} (", name);
            statements.iter().position(|s| s.starts_with(&marker))
        }
    }
}

/// Check a rendered script against the plan it should follow.
///
/// Every planned statement must be present and in plan order. Engines
/// without schemas are expected to create none. Comments and quoted text
/// are not statements and never count.
pub fn verify_script(
    plan: &SchemaPlan<'_>,
    script: &str,
    engine: &DatabaseEngine,
) -> Vec<VerificationProblem> {
    let mut problems = Vec::new();
    let statements = split_statements(script);
    let schemas: Vec<Option<String>> = statements.iter().map(|s| created_schema(s)).collect();

    let planned: Vec<PlannedStatement> = plan
        .emission_order()
        .into_iter()
        .filter(|s| engine.supports_schemas() || matches!(s, PlannedStatement::CreateTable { .. }))
        .collect();

    let mut previous: Option<(usize, String)> = None;
    for statement in &planned {
        let Some(pos) = statement_position(statement, &statements, &schemas, engine) else {
            problems.push(VerificationProblem::Missing {
                statement: statement.to_string(),
            });
            continue;
        };
        if let Some((prev_pos, prev_label)) = &previous {
            if pos < *prev_pos {
                problems.push(VerificationProblem::OutOfOrder {
                    statement: statement.to_string(),
                    after: prev_label.clone(),
                });
            }
        }
        previous = Some((pos, statement.to_string()));
    }

    if schemas.iter().flatten().any(|s| s == DEFAULT_SCHEMA) {
        problems.push(VerificationProblem::PublicSchemaCreated);
    }

    let expected = if engine.supports_schemas() {
        plan.schemas_to_create().len()
    } else {
        0
    };
    let actual = schemas.iter().flatten().count();
    if expected != actual {
        problems.push(VerificationProblem::SchemaCountMismatch { expected, actual });
    }

    problems
}

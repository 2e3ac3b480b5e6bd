//! Per-project schema definitions and provisioning
//!
//! Each project lives in its own schema namespace with three tables:
//! - functions(id, name, description, visual_output, relationships,
//!   x_position, y_position, created_at, updated_at)
//! - function_inputs(id, function_id -> functions CASCADE, name, position)
//! - function_outputs(id, function_id -> functions CASCADE, name, position)
//!
//! Everything here is `CREATE ... IF NOT EXISTS`, safe to run on every
//! save and never destructive to existing rows.

use crate::db::Session;
use crate::ident::SchemaId;
use crate::{Error, Result};

/// SQL for the global project catalog, shared by every project
pub const CATALOG_STATEMENTS: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS projects (
    id SERIAL PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#,
    // Unique index on name makes upsert-by-name race free.
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_projects_name_unique ON projects(name)",
];

fn create_functions_table(schema: &SchemaId) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {schema}.functions (
    id SERIAL PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    description TEXT,
    visual_output TEXT,
    relationships TEXT,
    x_position INTEGER,
    y_position INTEGER,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#
    )
}

fn create_inputs_table(schema: &SchemaId) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {schema}.function_inputs (
    id SERIAL PRIMARY KEY,
    function_id INTEGER NOT NULL REFERENCES {schema}.functions(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    position INTEGER NOT NULL
)
"#
    )
}

fn create_outputs_table(schema: &SchemaId) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {schema}.function_outputs (
    id SERIAL PRIMARY KEY,
    function_id INTEGER NOT NULL REFERENCES {schema}.functions(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    position INTEGER NOT NULL
)
"#
    )
}

/// All statements needed to provision one project's namespace, in order
pub fn schema_statements(schema: &SchemaId) -> Vec<String> {
    vec![
        format!("CREATE SCHEMA IF NOT EXISTS {schema}"),
        create_functions_table(schema),
        // One function name per project; also the constraint a failing
        // mid-save insert trips over, exercising rollback.
        format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS functions_name_unique ON {schema}.functions(name)"
        ),
        create_inputs_table(schema),
        create_outputs_table(schema),
    ]
}

/// Ensure the project's schema namespace and tables exist.
///
/// Idempotent; any DDL failure is fatal for the current operation and
/// carries the schema identifier plus the underlying store error.
pub fn ensure_schema(session: &mut Session, schema: &SchemaId) -> Result<()> {
    for stmt in schema_statements(schema) {
        session
            .client()
            .batch_execute(&stmt)
            .map_err(|e| Error::SchemaProvision {
                schema: schema.to_string(),
                source: e,
            })?;
    }
    tracing::debug!(schema = %schema, "schema provisioned");
    Ok(())
}

/// Whether the project's schema namespace exists at all
pub fn schema_exists(session: &mut Session, schema: &SchemaId) -> Result<bool> {
    let row = session
        .client()
        .query_one(
            "SELECT EXISTS (SELECT 1 FROM information_schema.schemata WHERE schema_name = $1)",
            &[&schema.as_str()],
        )
        .map_err(|e| Error::Persistence {
            context: format!("check schema '{schema}'"),
            source: e,
        })?;
    Ok(row.get(0))
}

/// Whether a named table exists inside the project's schema
pub fn table_exists(session: &mut Session, schema: &SchemaId, table: &str) -> Result<bool> {
    let row = session
        .client()
        .query_one(
            "SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = $1 AND table_name = $2
            )",
            &[&schema.as_str(), &table],
        )
        .map_err(|e| Error::Persistence {
            context: format!("check table '{schema}.{table}'"),
            source: e,
        })?;
    Ok(row.get(0))
}

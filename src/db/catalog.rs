//! Project catalog - the single global registry of known projects
//!
//! One row per project name, case sensitive, unique. Upsert semantics are
//! enforced by the store's unique index rather than read-then-write, so
//! repeated registration of the same name can never race into duplicates.

use chrono::{DateTime, Utc};
use postgres::Row;

use crate::db::{schema, Session};
use crate::{Error, Result};

/// One catalog row, typed at the boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn row_to_project(row: &Row) -> Project {
    Project {
        id: row.get("id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Per-operation handle on the catalog table.
///
/// Borrows the session for the duration of one logical operation; opening
/// the handle ensures the catalog table exists.
pub struct Catalog<'a> {
    session: &'a mut Session,
}

impl<'a> Catalog<'a> {
    /// Open the catalog, creating its table on first use
    pub fn open(session: &'a mut Session) -> Result<Self> {
        for stmt in schema::CATALOG_STATEMENTS {
            session
                .client()
                .batch_execute(stmt)
                .map_err(|e| Error::Persistence {
                    context: "provision project catalog".to_string(),
                    source: e,
                })?;
        }
        Ok(Self { session })
    }

    /// Insert the project if absent, else touch `updated_at`.
    ///
    /// Idempotent under repeated calls; returns the resulting row either way.
    pub fn upsert_project(&mut self, name: &str) -> Result<Project> {
        let name = validate_project_name(name)?;
        let row = self
            .session
            .client()
            .query_one(
                r#"
                INSERT INTO projects (name) VALUES ($1)
                ON CONFLICT (name) DO UPDATE SET updated_at = now()
                RETURNING id, name, created_at, updated_at
                "#,
                &[&name],
            )
            .map_err(|e| Error::Persistence {
                context: format!("register project '{name}'"),
                source: e,
            })?;
        Ok(row_to_project(&row))
    }

    /// Fetch one project by name
    pub fn get_project(&mut self, name: &str) -> Result<Option<Project>> {
        let name = validate_project_name(name)?;
        let row = self
            .session
            .client()
            .query_opt(
                "SELECT id, name, created_at, updated_at FROM projects WHERE name = $1",
                &[&name],
            )
            .map_err(|e| Error::Persistence {
                context: format!("look up project '{name}'"),
                source: e,
            })?;
        Ok(row.as_ref().map(row_to_project))
    }

    /// All known projects, most recently updated first
    pub fn list_projects(&mut self) -> Result<Vec<Project>> {
        let rows = self
            .session
            .client()
            .query(
                "SELECT id, name, created_at, updated_at FROM projects ORDER BY updated_at DESC",
                &[],
            )
            .map_err(|e| Error::Persistence {
                context: "list projects".to_string(),
                source: e,
            })?;
        Ok(rows.iter().map(row_to_project).collect())
    }

    /// Remove the catalog row only.
    ///
    /// Does not touch the project's schema; dropping data is the Project
    /// Store's explicitly confirmed operation. Returns whether a row was
    /// actually removed.
    pub fn delete_project(&mut self, name: &str) -> Result<bool> {
        let name = validate_project_name(name)?;
        let deleted = self
            .session
            .client()
            .execute("DELETE FROM projects WHERE name = $1", &[&name])
            .map_err(|e| Error::Persistence {
                context: format!("unregister project '{name}'"),
                source: e,
            })?;
        Ok(deleted > 0)
    }
}

/// Reject empty or whitespace-only project names before any store
/// interaction; returns the trimmed name used as the catalog key.
pub fn validate_project_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(
            "project name must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

//! # Archmap - Architecture Mapper Persistence Core
//!
//! Per-project relational persistence for visually composed function diagrams.
//!
//! Archmap provides:
//! - An in-memory function node model shared with the drawing surface
//! - Deterministic project-name to schema-identifier derivation
//! - A PostgreSQL session manager with create-database-if-missing fallback
//! - A global project catalog with upsert-by-name semantics
//! - Idempotent per-project schema provisioning
//! - Transactional replace-all save and ordered load of node collections
//! - JSON document round trips and prompt compilation from node snapshots

pub mod node;
pub mod ident;
pub mod db;
pub mod document;
pub mod compile;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use node::FunctionNode;
pub use ident::{derive_schema_id, SchemaId};
pub use db::{Catalog, ConnectParams, Project, ProjectStore, Session};
pub use document::Document;

/// Result type alias for Archmap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Archmap operations.
///
/// Connection failures are split by cause so callers can render an
/// appropriate message: a bad password is recoverable by re-prompting,
/// a missing database by creating it, an unreachable host by neither.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("authentication failed for user '{user}': {source}")]
    AuthFailed {
        user: String,
        source: postgres::Error,
    },

    #[error("store unreachable at {host}:{port}: {source}")]
    Unreachable {
        host: String,
        port: u16,
        source: postgres::Error,
    },

    #[error("database '{database}' does not exist")]
    DatabaseMissing {
        database: String,
        source: postgres::Error,
    },

    #[error("insufficient privilege to create database '{database}': {source}")]
    CreateDenied {
        database: String,
        source: postgres::Error,
    },

    #[error("schema provisioning failed for '{schema}': {source}")]
    SchemaProvision {
        schema: String,
        source: postgres::Error,
    },

    #[error("persistence failure ({context}): {source}")]
    Persistence {
        context: String,
        source: postgres::Error,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl Error {
    /// Whether the caller can recover by supplying different credentials
    /// or creating the target database, rather than treating the failure
    /// as fatal for the current operation.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::AuthFailed { .. }
                | Error::Unreachable { .. }
                | Error::DatabaseMissing { .. }
                | Error::NotFound(_)
                | Error::Validation(_)
        )
    }
}

//! Persistence layer - PostgreSQL-backed project storage
//!
//! System of record is one PostgreSQL database holding:
//! - projects(name UNIQUE, created_at, updated_at) - the global catalog
//! - one schema per project (`proj_<sanitized_name>`) with
//!   functions / function_inputs / function_outputs tables
//!
//! A single blocking [`Session`] is owned by the caller; [`Catalog`],
//! the provisioner in [`schema`], and [`ProjectStore`] borrow it per
//! operation. Transactions are the only mutual-exclusion mechanism:
//! one logical user, sequential saves and loads.

pub mod catalog;
pub mod connection;
pub mod schema;
pub mod store;

pub use catalog::{Catalog, Project};
pub use connection::{ConnectParams, Session, ADMIN_DATABASE};
pub use schema::{ensure_schema, schema_exists};
pub use store::ProjectStore;

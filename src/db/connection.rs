//! Connection manager - single live session against the relational store
//!
//! Holds exactly one blocking PostgreSQL session per process. Every other
//! persistence component borrows the session per operation; nothing caches
//! a connection across calls.

use postgres::error::SqlState;
use postgres::{Client, NoTls};

use crate::{Error, Result};

/// Administrative database used to issue `CREATE DATABASE` when the
/// configured target does not exist yet
pub const ADMIN_DATABASE: &str = "postgres";

/// Credentials and endpoint for one store session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl Default for ConnectParams {
    /// The documented auto-connect tuple: local server, default port, the
    /// `archmap` database, the stock administrative user, empty password.
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "archmap".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
        }
    }
}

impl ConnectParams {
    fn pg_config(&self, dbname: &str) -> postgres::Config {
        let mut config = postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(dbname)
            .user(&self.user)
            .password(&self.password);
        config
    }
}

/// The single live store session.
///
/// Owned exclusively by whoever constructed it; dropped or replaced
/// explicitly. All operations through it are blocking, per the
/// single-writer cooperative model of this core.
pub struct Session {
    client: Client,
    params: ConnectParams,
}

impl Session {
    /// Connect with explicit credentials. One attempt, no retry; failures
    /// are classified so the caller can decide whether re-prompting,
    /// database creation, or giving up is appropriate.
    pub fn connect(params: &ConnectParams) -> Result<Self> {
        tracing::debug!(
            host = %params.host,
            port = params.port,
            database = %params.database,
            user = %params.user,
            "connecting to store"
        );
        let client = params
            .pg_config(&params.database)
            .connect(NoTls)
            .map_err(|e| classify_connect_error(e, params, &params.database))?;
        Ok(Self {
            client,
            params: params.clone(),
        })
    }

    /// Connect with the fixed default credential tuple, creating the default
    /// database on the fly if it is missing. A failure here is recoverable:
    /// the caller is expected to fall back to prompting for credentials.
    pub fn auto_connect() -> Result<Self> {
        Self::ensure_database_exists(&ConnectParams::default())
    }

    /// Connect to the configured database, creating it first if the store
    /// reports it missing.
    ///
    /// Only the specific "database does not exist" condition triggers the
    /// create path: reconnect to the administrative database, issue
    /// `CREATE DATABASE`, then reconnect to the target. Any other failure
    /// (bad password, unreachable host) propagates unchanged.
    pub fn ensure_database_exists(params: &ConnectParams) -> Result<Self> {
        match Self::connect(params) {
            Ok(session) => Ok(session),
            Err(Error::DatabaseMissing { .. }) => {
                tracing::info!(database = %params.database, "database missing, creating it");
                create_database(params)?;
                Self::connect(params)
            }
            Err(e) => Err(e),
        }
    }

    /// Borrow the underlying client for one operation
    pub fn client(&mut self) -> &mut Client {
        &mut self.client
    }

    /// The parameters this session was opened with
    pub fn params(&self) -> &ConnectParams {
        &self.params
    }

    /// Close the session, surfacing any teardown error
    pub fn close(self) -> Result<()> {
        self.client.close().map_err(|e| Error::Unreachable {
            host: self.params.host.clone(),
            port: self.params.port,
            source: e,
        })
    }
}

/// Issue `CREATE DATABASE` for the configured target via the administrative
/// database, using the same credentials.
fn create_database(params: &ConnectParams) -> Result<()> {
    let mut admin = params
        .pg_config(ADMIN_DATABASE)
        .connect(NoTls)
        .map_err(|e| classify_connect_error(e, params, ADMIN_DATABASE))?;

    // The database name comes from user configuration, not from the
    // sanitizer, so it must be quoted as an identifier.
    let stmt = format!(
        "CREATE DATABASE \"{}\"",
        params.database.replace('"', "\"\"")
    );
    admin.batch_execute(&stmt).map_err(|e| {
        if e.code() == Some(&SqlState::INSUFFICIENT_PRIVILEGE) {
            Error::CreateDenied {
                database: params.database.clone(),
                source: e,
            }
        } else {
            Error::Persistence {
                context: format!("create database '{}'", params.database),
                source: e,
            }
        }
    })?;

    let _ = admin.close();
    Ok(())
}

fn classify_connect_error(e: postgres::Error, params: &ConnectParams, dbname: &str) -> Error {
    let missing = e.code() == Some(&SqlState::INVALID_CATALOG_NAME);
    let auth = e.code() == Some(&SqlState::INVALID_PASSWORD)
        || e.code() == Some(&SqlState::INVALID_AUTHORIZATION_SPECIFICATION);

    if missing {
        Error::DatabaseMissing {
            database: dbname.to_string(),
            source: e,
        }
    } else if auth {
        Error::AuthFailed {
            user: params.user.clone(),
            source: e,
        }
    } else {
        Error::Unreachable {
            host: params.host.clone(),
            port: params.port,
            source: e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_the_documented_tuple() {
        let params = ConnectParams::default();
        assert_eq!(params.host, "localhost");
        assert_eq!(params.port, 5432);
        assert_eq!(params.database, "archmap");
        assert_eq!(params.user, "postgres");
        assert!(params.password.is_empty());
    }

    #[test]
    fn test_unreachable_host_classified() {
        // Port 1 on localhost is never a PostgreSQL server.
        let params = ConnectParams {
            port: 1,
            ..ConnectParams::default()
        };
        match Session::connect(&params) {
            Err(Error::Unreachable { host, port, .. }) => {
                assert_eq!(host, "localhost");
                assert_eq!(port, 1);
            }
            other => panic!("expected Unreachable, got {:?}", other.map(|_| ())),
        }
    }
}

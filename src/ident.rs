//! Schema identifier derivation - project name to namespace mapping
//!
//! Every project gets its own schema in the store, named by a pure function
//! of the project name: lowercase, collapse anything outside `[a-z0-9_]`
//! into a single underscore, trim stray underscores, prefix `proj_`.
//!
//! Examples:
//! - `"My App"` -> `proj_my_app`
//! - `"Billing (v2)"` -> `proj_billing_v2`

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// Prefix applied to every derived schema identifier
pub const SCHEMA_PREFIX: &str = "proj_";

/// Backend identifier length limit (PostgreSQL truncates at 63 bytes)
const MAX_IDENT_LEN: usize = 63;

fn non_ident_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("[^a-z0-9_]+").expect("static pattern"))
}

/// A derived, store-safe schema identifier.
///
/// Construction goes through [`derive_schema_id`] only, so a `SchemaId` is
/// guaranteed to match `[a-z0-9_]+` and can be interpolated into DDL and
/// query text without quoting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SchemaId(String);

impl SchemaId {
    /// The identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derive the schema identifier for a project name.
///
/// Deterministic and total: the same name always yields the same identifier,
/// and every input (including names that strip to nothing) yields a valid
/// one. Distinct names that differ only in case or punctuation collapse to
/// the same identifier; no collision handling is attempted.
pub fn derive_schema_id(project_name: &str) -> SchemaId {
    let lowered = project_name.to_lowercase();
    let slug = non_ident_runs().replace_all(&lowered, "_");
    let slug = slug.trim_matches('_');

    let mut ident = if slug.is_empty() {
        format!("{SCHEMA_PREFIX}project")
    } else {
        format!("{SCHEMA_PREFIX}{slug}")
    };
    // Sanitized text is pure ASCII, so byte truncation is char-safe.
    ident.truncate(MAX_IDENT_LEN);

    SchemaId(ident)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_derivation() {
        assert_eq!(derive_schema_id("My App").as_str(), "proj_my_app");
        assert_eq!(derive_schema_id("Demo").as_str(), "proj_demo");
    }

    #[test]
    fn test_deterministic_and_idempotent() {
        let a = derive_schema_id("Order Pipeline 2");
        let b = derive_schema_id("Order Pipeline 2");
        assert_eq!(a, b);
    }

    #[test]
    fn test_punctuation_runs_collapse() {
        assert_eq!(
            derive_schema_id("Billing (v2) -- draft").as_str(),
            "proj_billing_v2_draft"
        );
    }

    #[test]
    fn test_stray_underscores_trimmed() {
        assert_eq!(derive_schema_id("__edge__").as_str(), "proj_edge");
        assert_eq!(derive_schema_id("!leading").as_str(), "proj_leading");
    }

    #[test]
    fn test_empty_after_strip_falls_back() {
        assert_eq!(derive_schema_id("").as_str(), "proj_project");
        assert_eq!(derive_schema_id("!!! ???").as_str(), "proj_project");
        assert_eq!(derive_schema_id("___").as_str(), "proj_project");
    }

    #[test]
    fn test_unicode_is_stripped() {
        assert_eq!(derive_schema_id("café Ünit").as_str(), "proj_caf_nit");
    }

    #[test]
    fn test_length_capped_at_backend_limit() {
        let long = "x".repeat(200);
        let id = derive_schema_id(&long);
        assert_eq!(id.as_str().len(), 63);
        assert!(id.as_str().starts_with("proj_x"));
    }
}

//! JSON document round trip - the file-based sibling of the project store
//!
//! A document is a project name plus its node collection, serialized as
//! pretty JSON with the same field names the store uses, so files written
//! here can seed a relational save and vice versa.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::node::FunctionNode;
use crate::Result;

fn untitled() -> String {
    "Untitled".to_string()
}

/// One diagram as a portable file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Project name, defaults to "Untitled" for files written without one
    #[serde(default = "untitled")]
    pub project: String,
    /// The node collection, in canvas order
    #[serde(default)]
    pub functions: Vec<FunctionNode>,
}

impl Document {
    pub fn new(project: impl Into<String>, functions: Vec<FunctionNode>) -> Self {
        Self {
            project: project.into(),
            functions,
        }
    }

    /// Write the document as pretty JSON
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Read a document back from disk
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let document = serde_json::from_str(&contents)?;
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> Document {
        Document::new(
            "Demo",
            vec![
                FunctionNode::new("Parse", 40, 60)
                    .with_inputs(["raw"])
                    .with_outputs(["tokens"]),
                FunctionNode::new("Render", 200, 60)
                    .with_description("Draws the final image")
                    .with_inputs(["tokens"]),
            ],
        )
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.json");

        let doc = sample_document();
        doc.save_to_path(&path).unwrap();

        let back = Document::load_from_path(&path).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_missing_project_name_defaults_to_untitled() {
        let doc: Document = serde_json::from_str(r#"{"functions": []}"#).unwrap();
        assert_eq!(doc.project, "Untitled");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Document::load_from_path(Path::new("/nonexistent/diagram.json")).unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }

    #[test]
    fn test_malformed_json_is_serde_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Document::load_from_path(&path).unwrap_err();
        assert!(matches!(err, crate::Error::Serde(_)));
    }
}

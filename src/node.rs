//! Function node model - the in-memory shape of one visual function pill
//!
//! The drawing surface owns these values and mutates them freely; nothing
//! is persisted until the caller hands a collection to
//! [`crate::db::ProjectStore::save`]. The same shape backs the JSON
//! document round trip, so the two persistence paths always agree.

use serde::{Deserialize, Serialize};

/// One named function on the canvas.
///
/// `inputs` and `outputs` are ordered sequences; duplicates are allowed and
/// order is preserved across every save/load round trip. `remote_id` is
/// absent until the node has been persisted, then carries the store-assigned
/// row id for the project it was saved into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionNode {
    /// Display name of the function
    pub name: String,
    /// Canvas x coordinate
    pub x: i32,
    /// Canvas y coordinate
    pub y: i32,
    /// Ordered input names
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Ordered output names
    #[serde(default)]
    pub outputs: Vec<String>,
    /// Free-form description of what the function does
    #[serde(default)]
    pub description: String,
    /// Intended UI/graphical output, free text
    #[serde(default)]
    pub visual_output: String,
    /// Free-text relationship notes ("Related to: ..." lines and prose)
    #[serde(default)]
    pub relationships: String,
    /// Store-assigned row id, set on successful save
    #[serde(rename = "function_id", default)]
    pub remote_id: Option<i32>,
}

impl FunctionNode {
    /// Create a new unpersisted node at the given canvas position
    pub fn new(name: impl Into<String>, x: i32, y: i32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            inputs: Vec::new(),
            outputs: Vec::new(),
            description: String::new(),
            visual_output: String::new(),
            relationships: String::new(),
            remote_id: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the ordered input names
    pub fn with_inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs = inputs.into_iter().map(Into::into).collect();
        self
    }

    /// Set the ordered output names
    pub fn with_outputs<I, S>(mut self, outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs = outputs.into_iter().map(Into::into).collect();
        self
    }

    /// Whether this node has been persisted at least once
    pub fn is_persisted(&self) -> bool {
        self.remote_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let node = FunctionNode::new("Parse", 100, 200)
            .with_description("Tokenizes raw input")
            .with_inputs(["raw"])
            .with_outputs(["tokens"]);

        assert_eq!(node.name, "Parse");
        assert_eq!(node.inputs, vec!["raw"]);
        assert_eq!(node.outputs, vec!["tokens"]);
        assert!(!node.is_persisted());
    }

    #[test]
    fn test_duplicate_io_names_preserved() {
        let node = FunctionNode::new("Merge", 0, 0).with_inputs(["left", "left", "right"]);
        assert_eq!(node.inputs.len(), 3);
        assert_eq!(node.inputs[0], node.inputs[1]);
    }

    #[test]
    fn test_serde_uses_original_field_names() {
        let mut node = FunctionNode::new("Render", 10, 20);
        node.remote_id = Some(7);

        let json = serde_json::to_string(&node).unwrap();
        assert!(json.contains("\"function_id\":7"));
        assert!(json.contains("\"x\":10"));

        let back: FunctionNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let node: FunctionNode =
            serde_json::from_str(r#"{"name":"Plot","x":1,"y":2}"#).unwrap();
        assert!(node.inputs.is_empty());
        assert!(node.description.is_empty());
        assert_eq!(node.remote_id, None);
    }
}

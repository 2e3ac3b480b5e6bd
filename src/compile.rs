//! Prompt compilation - render a node snapshot into GenAI-ready prompts
//!
//! Pure functions over a snapshot of the canvas; nothing here touches the
//! store. Data-flow relationships are inferred wherever one function's
//! output name matches another function's input name.

use crate::node::FunctionNode;
use std::collections::HashSet;

/// Which sections to include in the compiled prompt pack.
#[derive(Debug, Clone, Copy)]
pub struct CompileOptions {
    pub descriptions: bool,
    pub io_details: bool,
    pub relationships: bool,
    pub implementation: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            descriptions: true,
            io_details: true,
            relationships: true,
            implementation: true,
        }
    }
}

/// One inferred data-flow edge between two functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFlow {
    pub from: String,
    pub to: String,
    pub connection: String,
}

/// Infer data-flow edges: an output of one node feeding an identically
/// named input of another.
pub fn analyze_relationships(nodes: &[FunctionNode]) -> Vec<DataFlow> {
    let mut flows = Vec::new();
    for (i, source) in nodes.iter().enumerate() {
        for (j, target) in nodes.iter().enumerate() {
            if i == j {
                continue;
            }
            for output in &source.outputs {
                if target.inputs.contains(output) {
                    flows.push(DataFlow {
                        from: source.name.clone(),
                        to: target.name.clone(),
                        connection: output.clone(),
                    });
                }
            }
        }
    }
    flows
}

/// Compile the snapshot into a Markdown prompt pack: project overview,
/// per-function sections, inferred data flows, and implementation /
/// integration / testing prompt blocks.
pub fn compile_prompts(project_name: &str, nodes: &[FunctionNode], options: &CompileOptions) -> String {
    // Collapse duplicate names (case-insensitive) so a node never gets two
    // sections; fall back to the raw list when every name is empty.
    let mut unique: Vec<&FunctionNode> = Vec::new();
    let mut seen = HashSet::new();
    for node in nodes {
        let key = node.name.trim().to_lowercase();
        if !key.is_empty() && seen.insert(key) {
            unique.push(node);
        }
    }
    if unique.is_empty() {
        unique = nodes.iter().collect();
    }

    let mut lines: Vec<String> = Vec::new();

    lines.push(format!("# {project_name} - Application Architecture\n"));
    lines.push(format!(
        "This application consists of {} main functions/components.\n",
        unique.len()
    ));

    lines.push("\n## Functions Overview:\n".to_string());
    for (i, node) in unique.iter().enumerate() {
        lines.push(format!("{}. **{}**", i + 1, node.name));
        if options.descriptions && !node.description.is_empty() {
            lines.push(format!("   - Description: {}", node.description));
        }
        if options.io_details {
            if !node.inputs.is_empty() {
                lines.push(format!("   - Inputs: {}", node.inputs.join(", ")));
            }
            if !node.outputs.is_empty() {
                lines.push(format!("   - Outputs: {}", node.outputs.join(", ")));
            }
        }
        lines.push(String::new());
    }

    let flows = analyze_relationships(nodes);
    if options.relationships && !flows.is_empty() {
        lines.push("\n## Function Relationships:\n".to_string());
        lines.push("The following data flow relationships exist between functions:\n".to_string());
        for flow in &flows {
            lines.push(format!("- {} -> {} (via: {})", flow.from, flow.to, flow.connection));
        }
        lines.push(String::new());
    }

    lines.push("\n## GenAI Implementation Prompts:\n".to_string());

    lines.push("### 1. Overall Architecture Implementation:\n".to_string());
    lines.push("```".to_string());
    lines.push(format!(
        "Create a {project_name} application with the following architecture:"
    ));
    lines.push(format!("- Total functions: {}", nodes.len()));
    let function_list: Vec<String> = unique
        .iter()
        .map(|node| {
            let mut desc = node.name.clone();
            if !node.inputs.is_empty() {
                desc.push_str(&format!(" (inputs: {})", node.inputs.join(", ")));
            }
            if !node.outputs.is_empty() {
                desc.push_str(&format!(" (outputs: {})", node.outputs.join(", ")));
            }
            desc
        })
        .collect();
    lines.push(format!("- Functions: {}", function_list.join(", ")));
    lines.push("\nEnsure proper data flow between functions and implement error handling.".to_string());
    lines.push("```\n".to_string());

    if options.implementation {
        lines.push("### 2. Individual Function Implementation Prompts:\n".to_string());
        for node in &unique {
            lines.push(format!("#### Function: {}\n", node.name));
            lines.push("```".to_string());
            lines.push(format!("Implement a function called '{}' that:", node.name));
            if !node.description.is_empty() {
                lines.push(format!("- Purpose: {}", node.description));
            }
            if !node.inputs.is_empty() {
                lines.push(format!(
                    "- Accepts the following inputs: {}",
                    node.inputs.join(", ")
                ));
                lines.push("- Validates all inputs appropriately".to_string());
            }
            if !node.outputs.is_empty() {
                lines.push(format!(
                    "- Produces the following outputs: {}",
                    node.outputs.join(", ")
                ));
                lines.push("- Ensures outputs are properly formatted and validated".to_string());
            }
            lines.push("\nInclude appropriate error handling and logging.".to_string());
            lines.push("```\n".to_string());
        }
    }

    lines.push("### 3. Integration Prompt:\n".to_string());
    lines.push("```".to_string());
    lines.push("Integrate all the above functions into a cohesive application where:".to_string());
    if !flows.is_empty() {
        lines.push("\nData flows:".to_string());
        for flow in &flows {
            lines.push(format!(
                "- {} sends '{}' to {}",
                flow.from, flow.connection, flow.to
            ));
        }
    }
    lines.push("\nEnsure:".to_string());
    lines.push("- All functions can communicate as needed".to_string());
    lines.push("- Error handling is consistent across the application".to_string());
    lines.push("- The application follows best practices for the chosen technology stack".to_string());
    lines.push("```\n".to_string());

    lines.push("### 4. Testing Prompt:\n".to_string());
    lines.push("```".to_string());
    lines.push("Create comprehensive tests for the application including:".to_string());
    lines.push("- Unit tests for each function".to_string());
    lines.push("- Integration tests for data flow between functions".to_string());
    lines.push("- Edge case handling".to_string());
    lines.push("- Input validation tests".to_string());
    lines.push("```\n".to_string());

    dedupe_paragraphs(&lines.join("\n"))
}

/// Drop repeated paragraphs while preserving order, comparing on
/// whitespace-normalized text.
fn dedupe_paragraphs(text: &str) -> String {
    let mut seen = HashSet::new();
    let mut kept = Vec::new();
    for paragraph in text.split("\n\n") {
        if paragraph.trim().is_empty() {
            continue;
        }
        let key: String = paragraph.split_whitespace().collect::<Vec<_>>().join(" ");
        if seen.insert(key) {
            kept.push(paragraph);
        }
    }
    kept.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> Vec<FunctionNode> {
        vec![
            FunctionNode::new("Parse", 0, 0)
                .with_description("Tokenizes raw input")
                .with_inputs(["raw"])
                .with_outputs(["tokens"]),
            FunctionNode::new("Render", 100, 0)
                .with_inputs(["tokens"])
                .with_outputs(["svg"]),
        ]
    }

    #[test]
    fn test_output_to_input_flow_detected() {
        let flows = analyze_relationships(&pipeline());
        assert_eq!(
            flows,
            vec![DataFlow {
                from: "Parse".to_string(),
                to: "Render".to_string(),
                connection: "tokens".to_string(),
            }]
        );
    }

    #[test]
    fn test_no_self_flow() {
        let node = FunctionNode::new("Echo", 0, 0)
            .with_inputs(["signal"])
            .with_outputs(["signal"]);
        assert!(analyze_relationships(&[node]).is_empty());
    }

    #[test]
    fn test_compiled_prompts_cover_functions_and_flows() {
        let text = compile_prompts("Demo", &pipeline(), &CompileOptions::default());
        assert!(text.contains("# Demo - Application Architecture"));
        assert!(text.contains("**Parse**"));
        assert!(text.contains("**Render**"));
        assert!(text.contains("Parse -> Render (via: tokens)"));
        assert!(text.contains("Implement a function called 'Parse'"));
        assert!(text.contains("### 4. Testing Prompt:"));
    }

    #[test]
    fn test_options_suppress_sections() {
        let options = CompileOptions {
            descriptions: false,
            io_details: false,
            relationships: false,
            implementation: false,
        };
        let text = compile_prompts("Demo", &pipeline(), &options);
        assert!(!text.contains("Description: Tokenizes raw input"));
        assert!(!text.contains("## Function Relationships:"));
        assert!(!text.contains("Individual Function Implementation"));
    }

    #[test]
    fn test_duplicate_names_get_one_section() {
        let nodes = vec![
            FunctionNode::new("Parse", 0, 0),
            FunctionNode::new("parse", 50, 50),
        ];
        let text = compile_prompts("Demo", &nodes, &CompileOptions::default());
        assert_eq!(text.matches("Implement a function called 'Parse'").count(), 1);
        assert!(!text.contains("Implement a function called 'parse'"));
    }
}

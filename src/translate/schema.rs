//! Tool definition reshaping between the two protocols.

use super::anthropic_types::ToolDefinition;
use super::openai_types::{ChatFunction, SecondaryToolDefinition};

/// Re-nest a tool definition as a function tool. The input schema is moved
/// across untouched and never validated.
pub fn translate_tool(tool: &ToolDefinition) -> SecondaryToolDefinition {
    SecondaryToolDefinition {
        tool_type: "function".to_string(),
        function: ChatFunction {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.input_schema.clone(),
        },
    }
}

pub fn translate_tools(tools: &[ToolDefinition]) -> Vec<SecondaryToolDefinition> {
    tools.iter().map(translate_tool).collect()
}

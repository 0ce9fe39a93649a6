//! Type definitions for the OpenAI-compatible chat completions API.
//!
//! Request types are what the bridge sends to a secondary backend; response
//! types are deliberately lenient so that sparse or partial backend replies
//! still deserialize.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::anthropic_types::MessageContent;

// ---------------------------------------------------------------------------
// Request types (what we send TO the backend)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryRequest {
    pub model: String,
    pub max_tokens: u64,
    pub temperature: f64,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<SecondaryToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ChatToolChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String, // always "function"
    pub function: ChatFunction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatFunction {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatToolChoice {
    Mode(String), // "auto", "required", "none"
    Specific(ChatToolChoiceSpecific),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatToolChoiceSpecific {
    #[serde(rename = "type")]
    pub choice_type: String, // "function"
    pub function: ChatToolChoiceFunction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatToolChoiceFunction {
    pub name: String,
}

// ---------------------------------------------------------------------------
// Response types (what we receive FROM the backend)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecondaryResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub choices: Vec<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoiceMessage {
    /// Plain string, or the text parts of a content-part array joined together.
    #[serde(default, deserialize_with = "content_text")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRaw>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRaw {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    pub function: ToolCallFunction,
}

/// `arguments` is a JSON-encoded string per the API, but some backends send
/// the object directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallFunction {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatUsage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub prompt_tokens: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completion_tokens: u64,
}

/// Treat an explicit `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn content_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(text) => Some(text),
        Value::Array(parts) => Some(
            parts
                .iter()
                .filter_map(|part| match part {
                    Value::String(text) => Some(text.as_str()),
                    _ => part.get("text").and_then(Value::as_str),
                })
                .collect(),
        ),
        _ => None,
    }))
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatErrorResponse {
    pub error: ChatError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatError {
    pub message: String,
    #[serde(rename = "type")]
    #[serde(default)]
    pub error_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sparse_response_deserializes() {
        let resp: SecondaryResponse = serde_json::from_value(json!({})).unwrap();
        assert!(resp.choices.is_empty());

        let resp: SecondaryResponse =
            serde_json::from_value(json!({"choices": [{}]})).unwrap();
        assert_eq!(resp.choices[0].message, None);
        assert_eq!(resp.choices[0].finish_reason, None);
    }

    #[test]
    fn test_tool_call_arguments_keep_their_wire_form() {
        let resp: SecondaryResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [
                        {"id": "a", "type": "function", "function": {"name": "f", "arguments": "{\"x\":1}"}},
                        {"id": "b", "type": "function", "function": {"name": "g", "arguments": {"y": 2}}}
                    ]
                },
                "finish_reason": "tool_calls"
            }]
        }))
        .unwrap();

        let calls = resp.choices[0]
            .message
            .as_ref()
            .and_then(|m| m.tool_calls.as_ref())
            .unwrap();
        assert_eq!(calls[0].function.arguments, json!("{\"x\":1}"));
        assert_eq!(calls[1].function.arguments, json!({"y": 2}));
    }

    #[test]
    fn test_null_fields_read_as_absent() {
        let resp: SecondaryResponse =
            serde_json::from_str(r#"{"id":"x","choices":null,"usage":{"prompt_tokens":null}}"#)
                .unwrap();
        assert!(resp.choices.is_empty());
        assert_eq!(resp.usage.unwrap().prompt_tokens, 0);

        let call: ToolCallRaw =
            serde_json::from_str(r#"{"id":null,"function":{"name":null,"arguments":null}}"#)
                .unwrap();
        assert_eq!(call.id, "");
        assert_eq!(call.function.name, "");
        assert_eq!(call.function.arguments, Value::Null);
    }

    #[test]
    fn test_content_parts_are_joined() {
        let message: ChoiceMessage = serde_json::from_value(json!({
            "content": [
                {"type": "text", "text": "Hello, "},
                {"type": "image_url", "image_url": {"url": "data:"}},
                {"type": "text", "text": "world"}
            ]
        }))
        .unwrap();
        assert_eq!(message.content.as_deref(), Some("Hello, world"));

        let message: ChoiceMessage = serde_json::from_value(json!({"content": 42})).unwrap();
        assert_eq!(message.content, None);
    }
}

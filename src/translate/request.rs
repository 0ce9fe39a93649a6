//! Translate Anthropic Messages requests into OpenAI chat completions requests.
//!
//! Messages are forwarded one-to-one in their original order; the only
//! structural change is the system prompt, which becomes a leading
//! `system`-role message.

use super::anthropic_types::{ToolChoice, UnifiedRequest};
use super::openai_types::{
    ChatMessage, ChatToolChoice, ChatToolChoiceFunction, ChatToolChoiceSpecific, SecondaryRequest,
};
use super::schema::translate_tools;

/// Values applied when the incoming request leaves them unset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestDefaults {
    pub temperature: f64,
}

impl RequestDefaults {
    pub const EXECUTOR: Self = Self { temperature: 0.0 };
    pub const CHAT: Self = Self { temperature: 0.1 };

    pub fn with_temperature(temperature: f64) -> Self {
        Self { temperature }
    }
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self::EXECUTOR
    }
}

/// Translate a Primary request into a Secondary request.
/// Pure function; `model` and `max_tokens` are copied without validation.
pub fn translate_request(req: &UnifiedRequest, defaults: &RequestDefaults) -> SecondaryRequest {
    let mut messages = Vec::with_capacity(req.messages.len() + 1);

    if let Some(ref system) = req.system {
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: system.clone(),
        });
    }

    messages.extend(req.messages.iter().map(|m| ChatMessage {
        role: m.role.clone(),
        content: m.content.clone(),
    }));

    // An empty tool list must not reach the backend as `"tools": []`.
    let tools = req
        .tools
        .as_deref()
        .filter(|tools| !tools.is_empty())
        .map(translate_tools);

    SecondaryRequest {
        model: req.model.clone(),
        max_tokens: req.max_tokens,
        temperature: req.temperature.unwrap_or(defaults.temperature),
        messages,
        tools,
        tool_choice: req.tool_choice.as_ref().map(translate_tool_choice),
        top_p: req.top_p,
        stop: req.stop_sequences.clone(),
    }
}

fn translate_tool_choice(tc: &ToolChoice) -> ChatToolChoice {
    match tc {
        ToolChoice::Auto => ChatToolChoice::Mode("auto".to_string()),
        ToolChoice::Any => ChatToolChoice::Mode("required".to_string()),
        ToolChoice::None => ChatToolChoice::Mode("none".to_string()),
        ToolChoice::Tool { name } => ChatToolChoice::Specific(ChatToolChoiceSpecific {
            choice_type: "function".to_string(),
            function: ChatToolChoiceFunction { name: name.clone() },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::anthropic_types::*;
    use serde_json::json;

    fn conversation() -> Vec<Message> {
        vec![
            Message::user("What is 2+2?"),
            Message::assistant("4"),
            Message {
                role: "user".to_string(),
                content: MessageContent::Blocks(vec![json!({"type": "text", "text": "and 3+3?"})]),
            },
        ]
    }

    fn evaluate_tool() -> ToolDefinition {
        ToolDefinition {
            name: "evaluate".to_string(),
            description: "Evaluate an expression".to_string(),
            input_schema: json!({"type": "object"}),
        }
    }

    #[test]
    fn test_system_prompt_becomes_first_message() {
        let mut req = UnifiedRequest::new("claude-sonnet-4-20250514", 1024, conversation());
        req.system = Some(MessageContent::Text("You are helpful".to_string()));

        let result = translate_request(&req, &RequestDefaults::EXECUTOR);

        assert_eq!(result.messages.len(), 4);
        assert_eq!(
            result.messages[0],
            ChatMessage {
                role: "system".to_string(),
                content: MessageContent::Text("You are helpful".to_string()),
            }
        );
        for (translated, original) in result.messages[1..].iter().zip(&req.messages) {
            assert_eq!(translated.role, original.role);
            assert_eq!(translated.content, original.content);
        }
    }

    #[test]
    fn test_structured_system_prompt_is_kept_verbatim() {
        let blocks = vec![json!({"type": "text", "text": "rule one"})];
        let mut req = UnifiedRequest::new("m", 10, vec![Message::user("hi")]);
        req.system = Some(MessageContent::Blocks(blocks.clone()));

        let result = translate_request(&req, &RequestDefaults::EXECUTOR);
        assert_eq!(result.messages[0].content, MessageContent::Blocks(blocks));
    }

    #[test]
    fn test_without_system_messages_pass_through() {
        let req = UnifiedRequest::new("m", 10, conversation());
        let result = translate_request(&req, &RequestDefaults::EXECUTOR);

        let roles: Vec<_> = result.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["user", "assistant", "user"]);
    }

    #[test]
    fn test_tools_key_absent_without_tools() {
        let mut req = UnifiedRequest::new("m", 10, conversation());
        let body = serde_json::to_value(translate_request(&req, &RequestDefaults::EXECUTOR)).unwrap();
        assert!(body.get("tools").is_none());

        req.tools = Some(Vec::new());
        let body = serde_json::to_value(translate_request(&req, &RequestDefaults::EXECUTOR)).unwrap();
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_tools_are_attached() {
        let mut req = UnifiedRequest::new("m", 10, conversation());
        req.tools = Some(vec![evaluate_tool()]);

        let body = serde_json::to_value(translate_request(&req, &RequestDefaults::EXECUTOR)).unwrap();
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "evaluate");
        assert_eq!(body["tools"][0]["function"]["parameters"], json!({"type": "object"}));
    }

    #[test]
    fn test_temperature_defaults_per_call_site() {
        let mut req = UnifiedRequest::new("m", 10, conversation());
        assert_eq!(translate_request(&req, &RequestDefaults::EXECUTOR).temperature, 0.0);
        assert_eq!(translate_request(&req, &RequestDefaults::CHAT).temperature, 0.1);

        req.temperature = Some(0.7);
        assert_eq!(translate_request(&req, &RequestDefaults::CHAT).temperature, 0.7);
    }

    #[test]
    fn test_model_and_max_tokens_copied_verbatim() {
        let req = UnifiedRequest::new("", 0, Vec::new());
        let result = translate_request(&req, &RequestDefaults::EXECUTOR);
        assert_eq!(result.model, "");
        assert_eq!(result.max_tokens, 0);
        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_tool_choice_mapping() {
        let mut req = UnifiedRequest::new("m", 10, conversation());
        req.tool_choice = Some(ToolChoice::Any);
        let body = serde_json::to_value(translate_request(&req, &RequestDefaults::EXECUTOR)).unwrap();
        assert_eq!(body["tool_choice"], "required");

        req.tool_choice = Some(ToolChoice::Tool {
            name: "evaluate".to_string(),
        });
        let body = serde_json::to_value(translate_request(&req, &RequestDefaults::EXECUTOR)).unwrap();
        assert_eq!(
            body["tool_choice"],
            json!({"type": "function", "function": {"name": "evaluate"}})
        );
    }

    #[test]
    fn test_optional_keys_omitted_when_unset() {
        let req = UnifiedRequest::new("m", 10, conversation());
        let body = serde_json::to_value(translate_request(&req, &RequestDefaults::EXECUTOR)).unwrap();
        for key in ["tool_choice", "top_p", "stop", "stream"] {
            assert!(body.get(key).is_none(), "unexpected key {key}");
        }
    }
}

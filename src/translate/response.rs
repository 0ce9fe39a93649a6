use serde_json::Value;

use super::anthropic_types::{ContentItem, ErrorResponse, UnifiedResponse, Usage};
use super::openai_types::{ChatErrorResponse, SecondaryResponse, ToolCallRaw};

/// Translate an OpenAI chat completion into an Anthropic Messages response.
///
/// `None` in gives `None` out so callers handle a missing response
/// explicitly. Missing choices, message or content still produce a valid
/// response with empty content.
pub fn translate_response(resp: Option<&SecondaryResponse>) -> Option<UnifiedResponse> {
    let resp = resp?;
    let choice = resp.choices.first();
    let message = choice.and_then(|c| c.message.as_ref());

    let mut content = Vec::new();

    if let Some(text) = message.and_then(|m| m.content.as_deref()) {
        if !text.is_empty() {
            content.push(ContentItem::Text {
                text: text.to_string(),
            });
        }
    }

    if let Some(tool_calls) = message.and_then(|m| m.tool_calls.as_ref()) {
        content.extend(tool_calls.iter().map(translate_tool_call));
    }

    let stop_reason = choice
        .and_then(|c| c.finish_reason.as_deref())
        .map(map_finish_reason);

    let id = match resp.id.as_deref() {
        Some(id) => format!("msg_{}", id.trim_start_matches("chatcmpl-")),
        None => format!("msg_{}", uuid::Uuid::new_v4().simple()),
    };

    Some(UnifiedResponse {
        id,
        response_type: "message".to_string(),
        role: "assistant".to_string(),
        model: resp.model.clone(),
        content,
        stop_reason,
        usage: resp.usage.as_ref().map(|u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        }),
    })
}

fn translate_tool_call(tc: &ToolCallRaw) -> ContentItem {
    ContentItem::ToolUse {
        id: tc.id.clone(),
        name: tc.function.name.clone(),
        input: decode_arguments(&tc.function.arguments),
    }
}

/// Decode tool-call arguments. A string is parsed as JSON and kept as the raw
/// string when it is not valid JSON; anything already structured is used as-is.
pub fn decode_arguments(arguments: &Value) -> Value {
    match arguments {
        Value::String(raw) => {
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()))
        }
        other => other.clone(),
    }
}

/// Map OpenAI finish_reason to Anthropic stop_reason.
/// Unrecognised reasons are forwarded unchanged.
pub fn map_finish_reason(reason: &str) -> String {
    match reason {
        "tool_calls" => "tool_use".to_string(),
        "stop" => "end_turn".to_string(),
        other => other.to_string(),
    }
}

/// Translate an OpenAI error into an Anthropic error response
pub fn secondary_error_to_primary(err: &ChatErrorResponse) -> ErrorResponse {
    let error_type = match err.error.error_type.as_str() {
        "invalid_request_error" => "invalid_request_error",
        "rate_limit_error" | "rate_limit_exceeded" => "rate_limit_error",
        _ => "api_error",
    };

    ErrorResponse::new(error_type, &err.error.message)
}

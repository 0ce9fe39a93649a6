//! Chat-path interception.
//!
//! Unlike the executor path, the chat call site builds its own request body,
//! performs the network call and consumes the reply locally. [`DirectChat`]
//! is that original behaviour against a Primary endpoint; [`TranslatingChat`]
//! decorates any [`ChatSend`] and reroutes through the Secondary protocol
//! when that backend is selected.

mod direct;
mod tool_loop;
mod transcript;
mod translating;

pub use direct::DirectChat;
pub use tool_loop::{DisabledEvaluator, Evaluator, ShellEvaluator, ToolLoop};
pub use transcript::{SharedTranscript, Transcript, TranscriptEntry};
pub use translating::TranslatingChat;

use crate::config::{ChatConfig, DefaultsConfig};
use crate::error::Result;
use crate::logging::SharedLogger;
use crate::translate::anthropic_types::{Message, MessageContent, ToolDefinition, UnifiedRequest};
use crate::translate::RequestDefaults;

use futures::future::BoxFuture;
use std::sync::Arc;

/// The chat call site: send a conversation and render whatever comes back.
pub trait ChatSend: Send + Sync {
    fn send(&self, messages: Vec<Message>) -> BoxFuture<'_, Result<()>>;
}

/// How the chat path builds its requests.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub model: String,
    pub max_tokens: u64,
    pub system_prompt: Option<String>,
    pub tools: Vec<ToolDefinition>,
    pub defaults: RequestDefaults,
}

impl ChatSettings {
    pub fn from_config(chat: &ChatConfig, defaults: &DefaultsConfig) -> Self {
        Self {
            model: chat.model.clone(),
            max_tokens: chat.max_tokens,
            system_prompt: chat.system_prompt.clone(),
            tools: Vec::new(),
            defaults: RequestDefaults::with_temperature(defaults.chat_temperature),
        }
    }

    pub fn with_tool(mut self, tool: ToolDefinition) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn build_request(&self, messages: Vec<Message>) -> UnifiedRequest {
        let mut req = UnifiedRequest::new(self.model.clone(), self.max_tokens, messages);
        req.temperature = Some(self.defaults.temperature);
        req.system = self.system_prompt.clone().map(MessageContent::Text);
        req.tools = Some(self.tools.clone()).filter(|t| !t.is_empty());
        req
    }
}

/// State shared by the direct and translating senders of one session.
#[derive(Clone)]
pub struct ChatContext {
    pub settings: ChatSettings,
    pub tool_loop: Arc<ToolLoop>,
    pub transcript: SharedTranscript,
    pub logger: SharedLogger,
}

impl ChatContext {
    /// Settings advertise the tool loop's capability to the model.
    pub fn new(settings: ChatSettings, tool_loop: ToolLoop, logger: SharedLogger) -> Self {
        let settings = settings.with_tool(tool_loop.tool_definition());
        Self {
            settings,
            tool_loop: Arc::new(tool_loop),
            transcript: SharedTranscript::default(),
            logger,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_config_use_chat_temperature() {
        let settings = ChatSettings::from_config(&ChatConfig::default(), &DefaultsConfig::default());
        let req = settings.build_request(vec![Message::user("hi")]);
        assert_eq!(req.temperature, Some(0.1));
        assert_eq!(req.tools, None);
        assert_eq!(req.system, None);
    }

    #[test]
    fn test_context_advertises_capability() {
        let settings = ChatSettings::from_config(&ChatConfig::default(), &DefaultsConfig::default());
        let ctx = ChatContext::new(
            settings,
            ToolLoop::new("evaluate", Arc::new(DisabledEvaluator)),
            SharedLogger::in_memory(),
        );
        let req = ctx.settings.build_request(vec![Message::user("hi")]);
        let tools = req.tools.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "evaluate");
    }
}

use super::{ChatContext, ChatSend};
use crate::dispatch::SelectorHandle;
use crate::error::{BridgeError, Result};
use crate::logging::LogLevel;
use crate::transport::JsonEndpoint;
use crate::translate::anthropic_types::Message;
use crate::translate::openai_types::SecondaryResponse;
use crate::translate::{translate_request, translate_response};

use futures::future::BoxFuture;
use serde_json::json;
use std::sync::Arc;

/// Chat sender that reroutes through the Secondary protocol when selected
/// and otherwise defers to the sender it wraps.
pub struct TranslatingChat {
    original: Arc<dyn ChatSend>,
    endpoint: Arc<dyn JsonEndpoint>,
    selector: SelectorHandle,
    ctx: ChatContext,
}

impl TranslatingChat {
    pub fn new(
        original: Arc<dyn ChatSend>,
        endpoint: Arc<dyn JsonEndpoint>,
        selector: SelectorHandle,
        ctx: ChatContext,
    ) -> Self {
        Self {
            original,
            endpoint,
            selector,
            ctx,
        }
    }

    async fn send_translated(&self, messages: Vec<Message>) -> Result<()> {
        let req = self.ctx.settings.build_request(messages);
        let body = serde_json::to_value(translate_request(&req, &self.ctx.settings.defaults))?;

        let payload = self
            .endpoint
            .post(body)
            .await
            .map_err(|e| self.report(e))?;

        let parsed: Option<SecondaryResponse> = serde_json::from_slice(&payload)
            .map_err(|e| self.report(BridgeError::transport(format!("Unparsable backend response: {e}"))))?;

        let Some(resp) = translate_response(parsed.as_ref()) else {
            return Err(self.report(BridgeError::transport("Backend returned no response")));
        };

        self.ctx.logger.debug(
            "chat",
            format!(
                "Translated response items={} stop_reason={:?}",
                resp.content.len(),
                resp.stop_reason
            ),
        );

        self.ctx.tool_loop.run(&resp.content, &self.ctx.transcript).await;
        Ok(())
    }

    /// Record a failed exchange; the tool loop never sees it.
    fn report(&self, err: BridgeError) -> BridgeError {
        let context = match &err {
            BridgeError::Status { status, .. } => json!({ "status": status }),
            _ => json!({ "transport": err.is_transport() }),
        };
        self.ctx.logger.log_with_context(
            LogLevel::Error,
            "chat",
            format!("Secondary request failed: {err}"),
            context,
        );
        err
    }
}

impl ChatSend for TranslatingChat {
    fn send(&self, messages: Vec<Message>) -> BoxFuture<'_, Result<()>> {
        if !self.selector.snapshot().translates() {
            return self.original.send(messages);
        }
        Box::pin(self.send_translated(messages))
    }
}

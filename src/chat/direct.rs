use super::{ChatContext, ChatSend};
use crate::error::{BridgeError, Result};
use crate::transport::JsonEndpoint;
use crate::translate::anthropic_types::{Message, UnifiedResponse};

use futures::future::BoxFuture;
use std::sync::Arc;

/// Chat sender speaking the Primary protocol end to end.
pub struct DirectChat {
    endpoint: Arc<dyn JsonEndpoint>,
    ctx: ChatContext,
}

impl DirectChat {
    pub fn new(endpoint: Arc<dyn JsonEndpoint>, ctx: ChatContext) -> Self {
        Self { endpoint, ctx }
    }

    async fn send_inner(&self, messages: Vec<Message>) -> Result<()> {
        let req = self.ctx.settings.build_request(messages);
        let body = serde_json::to_value(&req)?;

        let payload = match self.endpoint.post(body).await {
            Ok(p) => p,
            Err(e) => {
                self.ctx.logger.error("chat", format!("Primary request failed: {e}"));
                return Err(e);
            }
        };

        let resp: UnifiedResponse = serde_json::from_slice(&payload).map_err(|e| {
            let err = BridgeError::transport(format!("Unparsable primary response: {e}"));
            self.ctx.logger.error("chat", err.to_string());
            err
        })?;

        self.ctx.tool_loop.run(&resp.content, &self.ctx.transcript).await;
        Ok(())
    }
}

impl ChatSend for DirectChat {
    fn send(&self, messages: Vec<Message>) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.send_inner(messages))
    }
}

//! Executor-path interception.
//!
//! [`ExecutorDispatch`] is a [`RequestTransport`] decorator: it has the same
//! signature as the transport it wraps and, when the secondary backend is
//! selected, translates the request on the way out and the response on the
//! way back before the caller's completion runs.

mod selector;

pub use selector::{BackendSelector, SelectorHandle};

use crate::error::{BridgeError, Result};
use crate::logging::SharedLogger;
use crate::transport::{parse_payload, Completion, Payload, RequestTransport};
use crate::translate::anthropic_types::UnifiedRequest;
use crate::translate::openai_types::SecondaryResponse;
use crate::translate::{translate_request, translate_response, RequestDefaults};

use futures::future::BoxFuture;
use std::sync::Arc;
use uuid::Uuid;

pub struct ExecutorDispatch {
    inner: Arc<dyn RequestTransport>,
    secondary: Option<Arc<dyn RequestTransport>>,
    selector: SelectorHandle,
    defaults: RequestDefaults,
    logger: SharedLogger,
}

impl ExecutorDispatch {
    pub fn new(inner: Arc<dyn RequestTransport>, selector: SelectorHandle) -> Self {
        Self {
            inner,
            secondary: None,
            selector,
            defaults: RequestDefaults::EXECUTOR,
            logger: SharedLogger::in_memory(),
        }
    }

    /// Send translated requests here instead of to the wrapped transport.
    pub fn with_secondary_transport(mut self, transport: Arc<dyn RequestTransport>) -> Self {
        self.secondary = Some(transport);
        self
    }

    pub fn with_defaults(mut self, defaults: RequestDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    async fn translate_and_send(&self, request: Payload, completion: Completion) {
        let request_id = Uuid::new_v4();

        let req: UnifiedRequest = match serde_json::from_slice(&request.body) {
            Ok(r) => r,
            Err(e) => {
                self.logger.warn(
                    "dispatch",
                    format!("[{request_id}] Rejecting untranslatable request: {e}"),
                );
                completion(Err(BridgeError::translation(format!(
                    "Invalid request body: {e}"
                ))));
                return;
            }
        };

        let outbound = match Payload::json(&translate_request(&req, &self.defaults)) {
            Ok(p) => p,
            Err(e) => {
                completion(Err(e));
                return;
            }
        };

        self.logger.info(
            "dispatch",
            format!(
                "[{request_id}] Translated request model={} messages={} tools={}",
                req.model,
                req.messages.len(),
                req.tools.as_ref().map_or(0, Vec::len)
            ),
        );

        let logger = self.logger.clone();
        let wrapped: Completion = Box::new(move |result| {
            let translated = translate_completion(result);
            if let Err(ref e) = translated {
                logger.warn("dispatch", format!("[{request_id}] Request failed: {e}"));
            }
            completion(translated);
        });

        let transport = self.secondary.as_ref().unwrap_or(&self.inner);
        transport.request(outbound, wrapped).await;
    }
}

impl RequestTransport for ExecutorDispatch {
    fn request(&self, request: Payload, completion: Completion) -> BoxFuture<'_, ()> {
        // Read once: the same value governs both directions of this request.
        if !self.selector.snapshot().translates() {
            return self.inner.request(request, completion);
        }
        Box::pin(self.translate_and_send(request, completion))
    }
}

/// Apply response translation to a transport outcome. Errors pass through
/// untouched; an empty or `null` reply becomes an empty payload.
fn translate_completion(result: Result<Payload>) -> Result<Payload> {
    let reply = result?;
    let parsed: Option<SecondaryResponse> = serde_json::from_value(parse_payload(&reply.body)?)
        .map_err(|e| BridgeError::transport(format!("Unparsable backend response: {e}")))?;

    match translate_response(parsed.as_ref()) {
        Some(resp) => Payload::json(&resp),
        None => Ok(Payload::default()),
    }
}

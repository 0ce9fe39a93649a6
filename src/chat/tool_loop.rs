//! Local execution of tool calls for the chat path.
//!
//! The chat call site has no downstream executor, so the translated response
//! is walked here: text goes to the transcript and the one recognised local
//! capability (expression evaluation) is run in-process. Any other tool call
//! is skipped.

use super::transcript::{SharedTranscript, TranscriptEntry};
use crate::error::{BridgeError, Result};
use crate::translate::anthropic_types::{ContentItem, ToolDefinition};

use futures::future::BoxFuture;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Evaluates an expression in the host environment.
pub trait Evaluator: Send + Sync {
    fn evaluate<'a>(&'a self, expression: &'a str) -> BoxFuture<'a, Result<String>>;
}

/// Runs expressions through a shell (`sh -c` by default).
#[derive(Debug, Clone)]
pub struct ShellEvaluator {
    shell: String,
    timeout: Duration,
}

impl ShellEvaluator {
    pub fn new(shell: impl Into<String>, timeout: Duration) -> Self {
        Self {
            shell: shell.into(),
            timeout,
        }
    }
}

impl Default for ShellEvaluator {
    fn default() -> Self {
        Self::new("sh", Duration::from_secs(30))
    }
}

impl Evaluator for ShellEvaluator {
    fn evaluate<'a>(&'a self, expression: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let child = tokio::process::Command::new(&self.shell)
                .arg("-c")
                .arg(expression)
                .kill_on_drop(true)
                .output();

            let output = tokio::time::timeout(self.timeout, child)
                .await
                .map_err(|_| {
                    BridgeError::evaluation(format!("timed out after {:?}", self.timeout))
                })??;

            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                Err(BridgeError::evaluation(if stderr.is_empty() {
                    output.status.to_string()
                } else {
                    stderr
                }))
            }
        })
    }
}

/// Refuses every expression.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledEvaluator;

impl Evaluator for DisabledEvaluator {
    fn evaluate<'a>(&'a self, _expression: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(async { Err::<String, _>(BridgeError::evaluation("local evaluation is disabled")) })
    }
}

pub struct ToolLoop {
    capability: String,
    evaluator: Arc<dyn Evaluator>,
}

impl ToolLoop {
    pub fn new(capability: impl Into<String>, evaluator: Arc<dyn Evaluator>) -> Self {
        Self {
            capability: capability.into(),
            evaluator,
        }
    }

    /// Tool definition advertising the local capability to the model.
    pub fn tool_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.capability.clone(),
            description: "Evaluate an expression in the host environment and return its output"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "expression": {
                        "type": "string",
                        "description": "The expression to evaluate"
                    }
                },
                "required": ["expression"]
            }),
        }
    }

    /// Walk `content` in order, appending to `transcript`. Never fails.
    pub async fn run(&self, content: &[ContentItem], transcript: &SharedTranscript) {
        for item in content {
            match item {
                ContentItem::Text { text } => {
                    transcript.push(TranscriptEntry::Assistant(text.clone()));
                }
                ContentItem::ToolUse { name, input, .. } if *name == self.capability => {
                    transcript.push(self.execute(input).await);
                }
                ContentItem::ToolUse { id, name, .. } => {
                    tracing::debug!(tool = %name, id = %id, "Skipping unrecognised tool call");
                }
            }
        }
    }

    async fn execute(&self, input: &Value) -> TranscriptEntry {
        let Some(expression) = extract_expression(input) else {
            return TranscriptEntry::ToolError {
                expression: input.to_string(),
                message: "missing `expression` argument".to_string(),
            };
        };

        match self.evaluator.evaluate(expression).await {
            Ok(output) => TranscriptEntry::ToolResult {
                expression: expression.to_string(),
                output,
            },
            Err(e) => TranscriptEntry::ToolError {
                expression: expression.to_string(),
                message: e.to_string(),
            },
        }
    }
}

/// `{"expression": "..."}`, or a bare string when the arguments were not JSON.
fn extract_expression(input: &Value) -> Option<&str> {
    match input {
        Value::String(raw) => Some(raw.as_str()),
        Value::Object(map) => map.get("expression").and_then(Value::as_str),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Evaluator that records expressions and answers from a closure.
    pub(crate) struct ScriptedEvaluator {
        pub seen: Mutex<Vec<String>>,
        answer: fn(&str) -> Result<String>,
    }

    impl ScriptedEvaluator {
        pub(crate) fn new(answer: fn(&str) -> Result<String>) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                answer,
            }
        }
    }

    impl Evaluator for ScriptedEvaluator {
        fn evaluate<'a>(&'a self, expression: &'a str) -> BoxFuture<'a, Result<String>> {
            self.seen.lock().unwrap().push(expression.to_string());
            let result = (self.answer)(expression);
            Box::pin(async move { result })
        }
    }

    fn tool_use(id: &str, name: &str, input: Value) -> ContentItem {
        ContentItem::ToolUse {
            id: id.to_string(),
            name: name.to_string(),
            input,
        }
    }

    #[tokio::test]
    async fn test_text_and_recognised_tool() {
        let evaluator = Arc::new(ScriptedEvaluator::new(|_| Ok("4".to_string())));
        let tool_loop = ToolLoop::new("evaluate", evaluator.clone());
        let transcript = SharedTranscript::default();

        tool_loop
            .run(
                &[
                    ContentItem::Text {
                        text: "Let me compute.".to_string(),
                    },
                    tool_use("a", "evaluate", json!({"expression": "2+2"})),
                ],
                &transcript,
            )
            .await;

        assert_eq!(
            transcript.entries(),
            vec![
                TranscriptEntry::Assistant("Let me compute.".to_string()),
                TranscriptEntry::ToolResult {
                    expression: "2+2".to_string(),
                    output: "4".to_string(),
                },
            ]
        );
        assert_eq!(*evaluator.seen.lock().unwrap(), vec!["2+2".to_string()]);
    }

    #[tokio::test]
    async fn test_unrecognised_tool_leaves_transcript_untouched() {
        let evaluator = Arc::new(ScriptedEvaluator::new(|_| Ok(String::new())));
        let tool_loop = ToolLoop::new("evaluate", evaluator.clone());
        let transcript = SharedTranscript::default();

        tool_loop
            .run(&[tool_use("a", "get_weather", json!({"city": "Oslo"}))], &transcript)
            .await;

        assert!(transcript.is_empty());
        assert!(evaluator.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_rendered_and_loop_continues() {
        let evaluator = Arc::new(ScriptedEvaluator::new(|expr| {
            if expr == "boom" {
                Err(BridgeError::evaluation("void-function boom"))
            } else {
                Ok("ok".to_string())
            }
        }));
        let tool_loop = ToolLoop::new("evaluate", evaluator);
        let transcript = SharedTranscript::default();

        tool_loop
            .run(
                &[
                    tool_use("a", "evaluate", json!({"expression": "boom"})),
                    tool_use("b", "evaluate", json!("fine")),
                    tool_use("c", "evaluate", json!({"other": 1})),
                ],
                &transcript,
            )
            .await;

        let entries = transcript.entries();
        assert_eq!(entries.len(), 3);
        assert!(matches!(
            &entries[0],
            TranscriptEntry::ToolError { message, .. } if message.contains("void-function boom")
        ));
        assert_eq!(
            entries[1],
            TranscriptEntry::ToolResult {
                expression: "fine".to_string(),
                output: "ok".to_string(),
            }
        );
        assert!(matches!(&entries[2], TranscriptEntry::ToolError { .. }));
    }

    #[tokio::test]
    async fn test_disabled_evaluator_renders_error() {
        let tool_loop = ToolLoop::new("evaluate", Arc::new(DisabledEvaluator));
        let transcript = SharedTranscript::default();

        tool_loop
            .run(&[tool_use("a", "evaluate", json!({"expression": "ls"}))], &transcript)
            .await;

        assert!(matches!(
            &transcript.entries()[0],
            TranscriptEntry::ToolError { message, .. } if message.contains("disabled")
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_evaluator() {
        let shell = ShellEvaluator::default();
        assert_eq!(shell.evaluate("echo $((2 + 2))").await.unwrap(), "4");
        assert!(matches!(
            shell.evaluate("echo nope >&2; exit 3").await,
            Err(BridgeError::Evaluation { message }) if message == "nope"
        ));
    }

    #[test]
    fn test_tool_definition_names_capability() {
        let tool_loop = ToolLoop::new("run_expression", Arc::new(DisabledEvaluator));
        let def = tool_loop.tool_definition();
        assert_eq!(def.name, "run_expression");
        assert_eq!(def.input_schema["required"], json!(["expression"]));
    }
}

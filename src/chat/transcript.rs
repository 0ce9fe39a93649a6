use std::fmt;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEntry {
    User(String),
    Assistant(String),
    ToolResult { expression: String, output: String },
    ToolError { expression: String, message: String },
}

impl fmt::Display for TranscriptEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(text) => write!(f, "user> {text}"),
            Self::Assistant(text) => write!(f, "assistant> {text}"),
            Self::ToolResult { expression, output } => {
                write!(f, "eval> {expression}\n{output}")
            }
            Self::ToolError {
                expression,
                message,
            } => write!(f, "eval> {expression}\nerror: {message}"),
        }
    }
}

/// Append-only record of a chat session.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Default)]
pub struct SharedTranscript(Arc<Mutex<Transcript>>);

impl SharedTranscript {
    pub fn push(&self, entry: TranscriptEntry) {
        if let Ok(mut transcript) = self.0.lock() {
            transcript.push(entry);
        }
    }

    pub fn entries(&self) -> Vec<TranscriptEntry> {
        self.0
            .lock()
            .map(|t| t.entries().to_vec())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.0.lock().map(|t| t.entries().len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn render(&self) -> String {
        self.0.lock().map(|t| t.render()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_prefixes_each_entry() {
        let transcript = SharedTranscript::default();
        transcript.push(TranscriptEntry::User("2+2?".to_string()));
        transcript.push(TranscriptEntry::Assistant("Computing.".to_string()));
        transcript.push(TranscriptEntry::ToolResult {
            expression: "echo 4".to_string(),
            output: "4".to_string(),
        });
        transcript.push(TranscriptEntry::ToolError {
            expression: "false".to_string(),
            message: "exit status 1".to_string(),
        });

        assert_eq!(
            transcript.render(),
            "user> 2+2?\nassistant> Computing.\neval> echo 4\n4\neval> false\nerror: exit status 1"
        );
        assert_eq!(transcript.len(), 4);
    }
}

//! Translation between the Anthropic Messages and OpenAI chat completions
//! formats.
//!
//! Everything in here is pure (no I/O): the dispatch layer and the chat path
//! decide when to translate, these modules decide how.

pub mod anthropic_types;
pub mod openai_types;
pub mod request;
pub mod response;
pub mod schema;

pub use request::{translate_request, RequestDefaults};
pub use response::translate_response;
pub use schema::{translate_tool, translate_tools};

//! Message handling for the tutor bot.
//!
//! - `Tutor`: the orchestrator that turns one inbound message into a reply
//! - `prompt`: persona prompts and input preprocessing
//! - `ContextSummarizer`: rolling summaries of older turns
//! - `split_reply`: outbound chunking that keeps code fences balanced

pub mod orchestrator;
pub mod prompt;
pub mod reply;
pub mod summarizer;

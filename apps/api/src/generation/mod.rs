// Generation: case summaries, prompt rendering, backend request/result types
// and the response parsers that turn raw model text into structured content.
// All backend traffic goes through a `TextGenerator`; nothing here owns a network client.

pub mod builder;
pub mod category;
pub mod parser;
pub mod prompts;
pub mod request;
pub mod rubric;
pub mod summarizer;

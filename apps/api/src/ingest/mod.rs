pub mod extractor;
pub mod handlers;
pub mod pipeline;
pub mod profile;
pub mod prompts;

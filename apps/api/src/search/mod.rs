pub mod executor;
pub mod guard;
pub mod handlers;
pub mod prompts;
pub mod translator;

pub mod handlers;
pub mod problems;
pub mod prompts;

pub mod driver;
pub mod handlers;
pub mod prompts;
pub mod topics;

pub mod analysis;
pub mod handlers;
pub mod prompts;
pub mod resources;
pub mod roadmap;
pub mod setup;

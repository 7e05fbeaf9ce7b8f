pub mod conversation;
pub mod profile;
pub mod progress;
pub mod qa_item;
pub mod roadmap;
pub mod session;

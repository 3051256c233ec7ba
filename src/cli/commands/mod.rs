//! CLI command implementations.

mod chat;
mod config;
mod quiz;
mod serve;
mod summary;
mod threads;
mod topics;
mod transcript;

pub use chat::run_chat;
pub use config::run_config;
pub use quiz::run_quiz;
pub use serve::run_serve;
pub use summary::run_summary;
pub use threads::run_threads;
pub use topics::run_topics;
pub use transcript::run_transcript;

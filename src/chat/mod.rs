//! Conversational question answering over one video per thread.

mod session;

pub use session::{ChatSession, SessionState};

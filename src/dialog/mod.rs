//! Multi-turn conversations: per-(tenant, owner) state, date and time
//! parsing, and rendering of replies.

pub mod dates;
pub mod engine;
pub mod state;
mod views;

pub use engine::DialogEngine;
pub use state::{is_cancel_word, DialogState};
pub use views::Outbound;

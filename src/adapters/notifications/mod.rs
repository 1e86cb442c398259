//! Introduction notifier adapters.

pub mod log;
pub mod recording;

pub use log::LogNotifier;
pub use recording::{RecordingNotifier, SentIntro};

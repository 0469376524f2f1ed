pub mod ai;
pub mod chat;
pub mod config;
pub mod error;
pub mod export;
pub mod provider;
pub mod reply;
pub mod speech;
pub mod state;
pub mod tabs;

#[cfg(test)]
mod testutil;

// Re-export main types for convenience
pub use ai::{ChatBackend, GeminiClient, ProxyClient, Reply};
pub use chat::ChatSession;
pub use config::Config;
pub use error::Alert;
pub use export::AudioExporter;
pub use provider::Provider;
pub use speech::{CommandSpeech, Control, PlaybackController, SpeechEngine};
pub use state::{ChatMessage, ChatRole, Transcript};
pub use tabs::{ActivePane, Tab, TabSet};

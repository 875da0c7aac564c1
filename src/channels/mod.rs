//! Text sources
//!
//! Each source implements the `Channel` trait: it yields text to speak and
//! is told how speaking it went.

mod console;
pub mod mention;
mod slack;

use async_trait::async_trait;

pub use console::ConsoleChannel;
pub use mention::UserDirectory;
pub use slack::{SlackApi, SlackChannel};

use crate::Result;

/// Reply posted after a message was spoken
pub const SUCCESS_REPLY: &str = "Message was successfully sent.";

/// Text received from a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingText {
    /// Text to speak, already cleaned of markup
    pub text: String,

    /// Conversation to reply in (platform-specific)
    pub channel_id: Option<String>,

    /// Sender identifier (platform-specific)
    pub sender_id: Option<String>,
}

impl IncomingText {
    /// Text with no reply target
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            channel_id: None,
            sender_id: None,
        }
    }
}

/// A source of text to speak
#[async_trait]
pub trait Channel: Send {
    /// Get the channel name
    fn name(&self) -> &'static str;

    /// Connect to the channel
    async fn connect(&mut self) -> Result<()>;

    /// Wait for the next text; `None` once the source is exhausted
    async fn next_text(&mut self) -> Result<Option<IncomingText>>;

    /// Report how speaking `incoming` went
    async fn acknowledge(&mut self, incoming: &IncomingText, outcome: &Result<()>) -> Result<()>;

    /// Disconnect from the channel
    async fn disconnect(&mut self) -> Result<()> {
        Ok(())
    }
}

//! The presentation seam.
//!
//! The session core never prints anything itself — it hands finished
//! text to a `RenderSink`. The CLI implements this with a terminal
//! renderer (plain output for user echoes, a character-by-character
//! reveal for assistant replies); tests use a recording stub.
//!
//! The reveal is purely cosmetic: it always receives an already
//! complete reply string. There is no token streaming anywhere.

use async_trait::async_trait;

use crate::message::Role;

/// Where finished messages go.
#[async_trait]
pub trait RenderSink: Send {
    /// Render a message immediately.
    fn render(&mut self, role: Role, text: &str);

    /// Render a message with the typing/reveal effect.
    ///
    /// Implementations that have no reveal (tests, piped output)
    /// can fall back to `render`.
    async fn reveal(&mut self, role: Role, text: &str);

    /// Show the in-flight indicator while a completion is pending.
    fn show_waiting(&mut self) {}

    /// Remove the in-flight indicator. Called on success and failure.
    fn clear_waiting(&mut self) {}
}

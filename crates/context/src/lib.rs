//! Bounded conversation context for Lustre Concierge.
//!
//! A session keeps the most recent turns in a FIFO window so each
//! completion request carries some conversational continuity without
//! growing without bound. The window is:
//!
//! - **Session-scoped**: owned by one session, gone on restart
//! - **Bounded**: never more than `cap` entries after any append
//! - **System-free**: the system prompt is injected fresh per request
//!   by the completion client and is never stored here

use std::collections::VecDeque;

use lustre_core::message::{Message, Role};

/// Default number of messages retained.
pub const DEFAULT_WINDOW: usize = 10;

/// A FIFO-bounded window of recent conversation turns.
#[derive(Debug, Clone)]
pub struct ContextWindow {
    entries: VecDeque<Message>,
    cap: usize,
}

impl ContextWindow {
    /// Create a window holding at most `cap` messages.
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Append a message, evicting from the front once over capacity.
    ///
    /// System messages are ignored: the stored window only ever
    /// contains user and assistant turns.
    pub fn append(&mut self, message: Message) {
        if message.role == Role::System {
            return;
        }

        self.entries.push_back(message);
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
    }

    /// The current window, oldest first.
    pub fn snapshot(&self) -> Vec<Message> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all retained turns (session reset).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn cap(&self) -> usize {
        self.cap
    }
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

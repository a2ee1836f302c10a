//! Terminal renderer — the CLI's `RenderSink`.
//!
//! Plain output for user echoes and notices; assistant replies get a
//! character-by-character reveal when the typing effect is enabled.
//! The reveal is cosmetic only: it always receives a complete reply.

use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use lustre_core::message::Role;
use lustre_core::render::RenderSink;

pub struct TerminalRenderer {
    assistant_label: String,
    typing_effect: bool,
    reveal_delay: Duration,
}

impl TerminalRenderer {
    pub fn new(brand: &str, typing_effect: bool, reveal_delay_ms: u64) -> Self {
        Self {
            assistant_label: brand.to_string(),
            typing_effect,
            reveal_delay: Duration::from_millis(reveal_delay_ms),
        }
    }

    fn prefix(&self, role: Role) -> String {
        match role {
            Role::Assistant => format!("  {} > ", self.assistant_label),
            Role::User => "  You > ".into(),
            Role::System => "  # ".into(),
        }
    }
}

#[async_trait]
impl RenderSink for TerminalRenderer {
    fn render(&mut self, role: Role, text: &str) {
        let prefix = self.prefix(role);
        for line in text.lines() {
            println!("{prefix}{line}");
        }
    }

    async fn reveal(&mut self, role: Role, text: &str) {
        if !self.typing_effect {
            self.render(role, text);
            return;
        }

        let prefix = self.prefix(role);
        for line in text.lines() {
            print!("{prefix}");
            let _ = std::io::stdout().flush();
            for ch in line.chars() {
                print!("{ch}");
                let _ = std::io::stdout().flush();
                tokio::time::sleep(self.reveal_delay).await;
            }
            println!();
        }
    }

    fn show_waiting(&mut self) {
        eprint!("  ...");
        let _ = std::io::stderr().flush();
    }

    fn clear_waiting(&mut self) {
        eprint!("\r     \r");
        let _ = std::io::stderr().flush();
    }
}

//! `lustre chat` — Interactive or single-message chat mode.

use lustre_client::build_transport;
use lustre_config::{AppConfig, TransportMode};
use lustre_core::message::Role;
use lustre_core::render::RenderSink;
use lustre_session::{Session, TurnOutcome};
use tokio::io::{self, AsyncBufReadExt, BufReader};

use crate::render::TerminalRenderer;

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Direct mode needs a local credential — fail early with a clear
    // message. Relay mode needs none; the relay holds the key.
    if config.transport.mode == TransportMode::Direct && !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: Direct mode needs an API key!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    LUSTRE_API_KEY = 'sk-...'");
        eprintln!("    OPENAI_API_KEY = 'sk-...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        eprintln!("  Or switch to relay mode (the default) and run `lustre relay`.");
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let transport = build_transport(&config);
    let mut session = Session::from_config(&config, transport);
    let mut renderer = TerminalRenderer::new(
        &config.guard.brand,
        config.chat.typing_effect,
        config.chat.reveal_delay_ms,
    );

    if let Some(msg) = message {
        // Single message mode
        renderer.show_waiting();
        let outcome = session.handle_turn(&msg).await;
        renderer.clear_waiting();
        present(&mut renderer, outcome).await;
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║       Lustre Concierge — Interactive Chat    ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Transport: {}", transport_summary(&config));
    println!("  Model:     {}", config.model);
    println!(
        "  Guard:     {}",
        if config.guard.enabled { "on" } else { "off" }
    );
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    renderer.render(
        Role::Assistant,
        &format!(
            "👋 Hello! I'm the {} beauty assistant. How can I help you today?",
            config.guard.brand
        ),
    );
    println!();

    let stdin = io::stdin();
    let reader = BufReader::new(stdin);
    let mut lines = reader.lines();

    prompt()?;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();

        if line.is_empty() {
            prompt()?;
            continue;
        }

        if matches!(line.as_str(), "exit" | "quit" | "/exit" | "/quit" | ":q") {
            break;
        }

        renderer.show_waiting();
        let outcome = session.handle_turn(&line).await;
        renderer.clear_waiting();

        println!();
        present(&mut renderer, outcome).await;
        println!();

        prompt()?;
    }

    println!();
    println!("  Goodbye! 👋");
    println!();

    Ok(())
}

/// Render one turn outcome. The in-flight indicator is already
/// cleared by the caller on every path.
async fn present(renderer: &mut TerminalRenderer, outcome: TurnOutcome) {
    match outcome {
        TurnOutcome::Canned { reply, .. } => {
            // Canned replies appear instantly — they never went anywhere
            renderer.render(Role::Assistant, &reply);
        }
        TurnOutcome::Completed { reply } => {
            renderer.reveal(Role::Assistant, &reply).await;
        }
        TurnOutcome::Rejected { reason } => {
            eprintln!("  [Notice] {reason}");
        }
        TurnOutcome::Failed { message, .. } => {
            eprintln!("  [Error] {message}");
        }
    }
}

fn transport_summary(config: &AppConfig) -> String {
    match config.transport.mode {
        TransportMode::Relay => format!("relay ({})", config.transport.relay_url),
        TransportMode::Direct => format!("direct ({})", config.transport.api_url),
    }
}

fn prompt() -> Result<(), Box<dyn std::error::Error>> {
    use std::io::Write;
    print!("  You > ");
    std::io::stdout().flush()?;
    Ok(())
}

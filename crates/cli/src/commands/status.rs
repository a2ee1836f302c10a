//! `lustre status` — Show resolved configuration.

use lustre_config::{AppConfig, TransportMode};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("✨ Lustre Concierge Status");
    println!("========================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Brand:        {}", config.guard.brand);
    println!("  Model:        {}", config.model);
    println!(
        "  Transport:    {}",
        match config.transport.mode {
            TransportMode::Relay => format!("relay ({})", config.transport.relay_url),
            TransportMode::Direct => format!("direct ({})", config.transport.api_url),
        }
    );
    println!(
        "  API key:      {}",
        if config.has_api_key() {
            "configured"
        } else {
            "not set"
        }
    );
    println!(
        "  Guard:        {}",
        if config.guard.enabled { "enabled" } else { "disabled" }
    );
    println!("  Window:       {} messages", config.limits.context_window);
    println!(
        "  Typing:       {}",
        if config.chat.typing_effect { "on" } else { "off" }
    );
    println!("  Relay server: {}:{}", config.relay.host, config.relay.port);

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `lustre onboard` first");
    }

    Ok(())
}

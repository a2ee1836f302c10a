//! `lustre relay` — Start the credential-holding relay server.

use lustre_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.relay.port = port;
    }

    println!("✨ Lustre Relay");
    println!("   Listening: {}:{}", config.relay.host, config.relay.port);
    println!("   Upstream:  {}", config.transport.api_url);
    println!(
        "   API key:   {}",
        if config.has_api_key() {
            "configured"
        } else {
            "MISSING — /chat will fail"
        }
    );

    lustre_relay::serve(config).await?;

    Ok(())
}

//! Show configuration, ledger state and remote reachability.

use clap::Args;

use crate::config::Config;
use crate::ledger::Ledger;
use crate::remote::{ConfluenceClient, GatewayError};

/// Show sync configuration and server status
#[derive(Debug, Args)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn run(&self, config: &Config) {
        println!("Sync Configuration");
        println!("==================");
        println!();

        if config.base_url.is_empty() {
            println!("Status: Not configured");
            println!();
            println!("To enable sync, add to your config file:");
            println!();
            println!("  base_url: \"https://your-domain.atlassian.net/wiki\"");
            println!("  user_email: \"you@example.com\"");
            println!("  api_token: \"your-api-token\"");
            println!();
            println!("Or set environment variables:");
            println!("  DOCSYNC_BASE_URL");
            println!("  DOCSYNC_USER_EMAIL");
            println!("  DOCSYNC_API_TOKEN");
            return;
        }

        println!("Base URL:  {}", config.base_url);
        println!("Email:     {}", config.user_email);
        println!("API token: {}", mask(&config.api_token));
        println!(
            "Space:     {}",
            config.space.as_deref().unwrap_or("(none configured)")
        );
        println!();

        match Ledger::load(&config.state_file) {
            Ok(ledger) => {
                println!("Ledger:    {}", config.state_file.display());
                println!("  tracked documents: {}", ledger.len());
                match ledger.last_sync() {
                    Some(at) => println!("  last sync: {}", at.to_rfc3339()),
                    None => println!("  last sync: never"),
                }
            }
            Err(e) => {
                println!("Ledger:    {} (unreadable: {})", config.state_file.display(), e);
            }
        }
        println!();

        // Try to reach the server to verify connectivity
        print!("Server status: ");
        match ConfluenceClient::from_config(config) {
            Err(GatewayError::NotConfigured) => println!("not configured"),
            Err(e) => println!("✗ error: {}", e),
            Ok(client) => match client.probe().await {
                Ok(()) => println!("✓ connected"),
                Err(GatewayError::HttpError(_)) | Err(GatewayError::Timeout(_)) => {
                    println!("✗ unreachable")
                }
                Err(e) => println!("✗ error: {}", e),
            },
        }
    }
}

fn mask(token: &str) -> String {
    if token.is_empty() {
        "(not set)".to_string()
    } else {
        let prefix: String = token.chars().take(8).collect();
        format!("{}...", prefix)
    }
}

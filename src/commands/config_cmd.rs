use clap::{Args, Subcommand, ValueEnum};

use crate::config::Config;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        println!("base_url: {}", config.base_url);
                        println!("user_email: {}", config.user_email);
                        println!(
                            "api_token: {}",
                            if config.api_token.is_empty() {
                                "(not set)"
                            } else {
                                "(set)"
                            }
                        );
                        println!(
                            "space: {}",
                            config.space.as_deref().unwrap_or("(none)")
                        );
                        println!("state_file: {}", config.state_file.display());
                        println!("request_timeout_secs: {}", config.request_timeout_secs);
                    }
                }
                Ok(())
            }
        }
    }
}

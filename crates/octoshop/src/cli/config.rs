//! The `octoshop config` command.

use clap::{Args, Subcommand};
use octoshop_core::Config;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display current configuration (literal tokens are redacted)
    Show,

    /// Show config file path
    Path,

    /// Initialize a new config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

const INIT_HEADER: &str = "\
# OctoShop configuration.
# Endpoint and token default to the OCTOSHOP_ENDPOINT_URL and OCTOAI_TOKEN
# environment variables; literal values work too.

";

/// Execute the config command.
pub async fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let config = redacted(Config::load()?);
            println!("{}", config.to_toml()?);
        }

        ConfigCommand::Path => {
            let path = Config::default_path();
            println!("{}", path.display());
            if !path.exists() {
                tracing::info!("No config file yet; run `octoshop config init` to create one");
            }
        }

        ConfigCommand::Init { force } => {
            let path = Config::default_path();

            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let toml = Config::default().to_toml()?;
            std::fs::write(&path, format!("{INIT_HEADER}{toml}"))?;

            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

/// Hide a token written literally into the file; `${VAR}` references stay.
fn redacted(mut config: Config) -> Config {
    let token = &config.gateway.token;
    if !token.is_empty() && !(token.starts_with("${") && token.ends_with('}')) {
        config.gateway.token = "<redacted>".to_string();
    }
    config
}

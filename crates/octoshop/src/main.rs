//! OctoShop CLI - restyle a photo with a remote generative-image service.
//!
//! OctoShop uploads a photo and a prompt to the configured endpoint, waits for
//! the generated images and writes them next to the normalized input.
//!
//! # Usage
//!
//! ```bash
//! # Restyle a photo with the default prompt
//! octoshop run portrait.jpg
//!
//! # Custom prompt, two jobs, results in ./out
//! octoshop run portrait.jpg --prompt "Set the scene in 80s Tokyo" --jobs 2 -o out
//!
//! # View configuration
//! octoshop config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// OctoShop - restyle a photo with a remote generative-image service.
#[derive(Parser, Debug)]
#[command(name = "octoshop")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Transform a photo and write the generated images
    Run(cli::run::RunArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't up yet, so config warnings go through eprintln.
    let config = match octoshop_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `octoshop config path`."
            );
            octoshop_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("OctoShop v{}", octoshop_core::VERSION);

    match cli.command {
        Commands::Run(args) => cli::run::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_parses_photo_and_flags() {
        let cli = Cli::try_parse_from([
            "octoshop",
            "run",
            "me.jpg",
            "--prompt",
            "Set the scene in 80s Tokyo",
            "--jobs",
            "2",
            "--no-faceswap",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.photo.to_str(), Some("me.jpg"));
                assert_eq!(args.jobs, Some(2));
                assert!(args.no_faceswap);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn run_requires_photo() {
        assert!(Cli::try_parse_from(["octoshop", "run"]).is_err());
    }
}

// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! EZShop - a conversational shopping assistant.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod ask;
mod serve;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use ezshop_config::{ConfigError, EzshopConfig};

/// EZShop - a conversational shopping assistant.
#[derive(Parser, Debug)]
#[command(name = "ezshop", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP API.
    Serve,
    /// Run a single turn and print the reply as JSON.
    Ask {
        /// User the turn belongs to.
        #[arg(long)]
        user: String,
        #[arg(long)]
        conversation: Option<String>,
        /// Image file for an image turn.
        #[arg(long)]
        image: Option<PathBuf>,
        /// Message text. Optional for image turns.
        text: Option<String>,
    },
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Load and validate configuration, printing any diagnostics.
    Check,
}

fn load(path: Option<&PathBuf>) -> Result<EzshopConfig, Vec<ConfigError>> {
    match path {
        Some(path) => ezshop_config::load_and_validate_path(path),
        None => ezshop_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            ezshop_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Ask {
            user,
            conversation,
            image,
            text,
        }) => {
            let args = ask::AskArgs {
                user,
                conversation,
                image,
                text,
            };
            ask::run_ask(config, args).await
        }
        Some(Commands::Config {
            action: ConfigAction::Check,
        }) => {
            println!(
                "ezshop: config OK (agent.name={}, openai.model={}, storage.database_path={})",
                config.agent.name, config.openai.model, config.storage.database_path
            );
            Ok(())
        }
        None => {
            println!("ezshop: use --help for available commands");
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn ask_parses_image_without_text() {
        let cli = Cli::try_parse_from(["ezshop", "ask", "--user", "u1", "--image", "shelf.png"])
            .unwrap();
        match cli.command {
            Some(Commands::Ask { user, image, text, .. }) => {
                assert_eq!(user, "u1");
                assert_eq!(image, Some(PathBuf::from("shelf.png")));
                assert!(text.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli =
            Cli::try_parse_from(["ezshop", "config", "check", "--config", "/tmp/ezshop.toml"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/ezshop.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Check
            })
        ));
    }

    #[test]
    fn ask_requires_a_user() {
        assert!(Cli::try_parse_from(["ezshop", "ask", "hello"]).is_err());
    }
}

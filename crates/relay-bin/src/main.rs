//! customs-relay - Headless agent relaying customs documents between the
//! single-window client's exchange directory and the remote API.

mod app;
mod config_cmd;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use config_cmd::ConfigUpdate;
use relay_config_and_utils::{init_logging, parse_level, Config, Paths};

/// customs-relay command-line interface.
#[derive(Parser)]
#[command(name = "customs-relay")]
#[command(about = "Relay customs receipts and documents between the exchange directory and the remote API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for runtime files (config, logs). Defaults to ~/.customs-relay
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay until Ctrl-C
    Run {
        /// Login password (never saved)
        #[arg(long, env = "CUSTOMS_RELAY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Log in and save the session identifiers
    Auth {
        /// Login password (never saved)
        #[arg(long, env = "CUSTOMS_RELAY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Show or change the configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the configuration (without password)
    Show,
    /// Change configuration values, logging in again when credentials change
    Set(ConfigUpdate),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    paths.ensure_dirs()?;
    let mut config = Config::load(&paths)?;

    let level = cli.log_level.unwrap_or_else(|| config.log_level.clone());
    init_logging(&parse_level(&level).as_str().to_ascii_lowercase(), Some(&paths));

    match cli.command {
        Some(Commands::Run { password }) => {
            apply_password(&mut config, password);
            app::run_relay(config, &paths).await?;
        }
        None => {
            app::run_relay(config, &paths).await?;
        }
        Some(Commands::Auth { password }) => {
            apply_password(&mut config, password);
            app::login_and_save(&mut config, &paths).await?;
        }
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show => config_cmd::show(&config)?,
            ConfigCommands::Set(update) => config_cmd::set(config, update, &paths).await?,
        },
    }

    Ok(())
}

fn apply_password(config: &mut Config, password: Option<String>) {
    if let Some(password) = password.filter(|p| !p.is_empty()) {
        config.pwd = password;
    }
}

//! `config show` and `config set`.

use crate::app;
use clap::Args;
use relay_config_and_utils::{Config, Paths, Validation};
use std::path::PathBuf;

/// Values accepted by `config set`; unset flags keep their current value.
#[derive(Args, Debug, Default)]
pub struct ConfigUpdate {
    /// Base URL of the remote API
    #[arg(long)]
    pub url: Option<String>,
    /// Exchange directory of the single-window client
    #[arg(long)]
    pub data_path: Option<PathBuf>,
    /// Seconds between two polls of the command list
    #[arg(long)]
    pub interval: Option<u64>,
    /// HTTP request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
    /// Notification verbosity, 0 (silent) to 4 (debug with HTTP dumps)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=4))]
    pub debug: Option<u8>,
    /// Login user name
    #[arg(long)]
    pub username: Option<String>,
    /// Login password, checked against the server and never saved
    #[arg(long, env = "CUSTOMS_RELAY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl ConfigUpdate {
    fn apply(self, config: &mut Config) {
        if let Some(url) = self.url {
            config.url = url.trim().to_string();
        }
        if let Some(data_path) = self.data_path {
            config.data_path = data_path;
        }
        if let Some(interval) = self.interval {
            config.interval = interval;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(debug) = self.debug {
            config.debug = debug;
        }
        if let Some(username) = self.username {
            config.uname = username.trim().to_string();
        }
        if let Some(password) = self.password.filter(|p| !p.is_empty()) {
            config.pwd = password;
        }
    }
}

/// Print the saved configuration as JSON.
pub fn show(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

/// Apply `update`, validate, log in if credentials were given, and save.
pub async fn set(
    mut config: Config,
    update: ConfigUpdate,
    paths: &Paths,
) -> Result<(), Box<dyn std::error::Error>> {
    update.apply(&mut config);

    match config.validate()? {
        Validation::NeedsAuth => app::login_and_save(&mut config, paths).await?,
        Validation::Ready => config.save(paths)?,
    }

    println!("Configuration saved to {}", paths.config_file().display());
    Ok(())
}

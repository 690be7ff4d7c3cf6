//! Relay run loop and login.

use relay_config_and_utils::{Config, Paths, Validation};
use relay_sync_engine::{EngineSettings, SyncEngine, TracingPresenter};
use relay_transport::HttpClient;
use std::sync::Arc;
use tracing::info;

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Build an engine over the production HTTP client.
pub fn build_engine(config: &Config) -> AppResult<SyncEngine<HttpClient>> {
    let client = HttpClient::new(config.request_timeout(), config.debug)?;
    let presenter = Arc::new(TracingPresenter::new(config.debug));
    Ok(SyncEngine::new(
        EngineSettings::from_config(config),
        client,
        presenter,
    ))
}

/// Log in with the configured credentials, then save the identifiers.
pub async fn login_and_save(config: &mut Config, paths: &Paths) -> AppResult<()> {
    config.validate()?;
    let engine = build_engine(config)?;
    login(&engine, config, paths).await
}

async fn login(engine: &SyncEngine<HttpClient>, config: &mut Config, paths: &Paths) -> AppResult<()> {
    if config.pwd.is_empty() {
        return Err("a password is required to log in (--password or CUSTOMS_RELAY_PASSWORD)".into());
    }

    let session = engine.auth().await?;
    config.set_session(session.enterprise_id, session.user_id);
    config.save(paths)?;
    info!(config = %paths.config_file().display(), "session identifiers saved");
    Ok(())
}

/// Run the relay until Ctrl-C.
pub async fn run_relay(mut config: Config, paths: &Paths) -> AppResult<()> {
    let validation = config.validate()?;
    let engine = build_engine(&config)?;

    if validation == Validation::NeedsAuth || !config.has_session() {
        login(&engine, &mut config, paths).await?;
    }

    info!(
        url = %config.url,
        data_path = %config.data_path.display(),
        interval_secs = config.interval,
        "Starting customs relay"
    );
    engine.start().await;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    engine.stop().await;
    let counters = engine.counters();
    info!(
        errors = counters.errors,
        uploads = counters.uploads,
        downloads = counters.downloads,
        "Customs relay stopped"
    );
    Ok(())
}

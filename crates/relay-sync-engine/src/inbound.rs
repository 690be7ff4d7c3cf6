//! Inbound side: poll the command list and download requested documents.

use crate::engine::EngineContext;
use crate::error::{SyncError, SyncResult};
use crate::ledger::{FailureLedger, MAX_ATTEMPTS};
use crate::presenter::{TipCategory, TipLevel};
use crate::receipt::ReceiptParams;
use crate::state::SessionIdentifiers;
use relay_config_and_utils::fs;
use relay_transport::{coerce_id, Transport};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Category prefix of download commands.
pub const XML_COMMAND: &str = "xml";

/// Spawn the polling loop. The ledger is handed back when the loop ends.
pub(crate) fn spawn_poller<T: Transport>(
    context: Arc<EngineContext<T>>,
    mut ledger: FailureLedger,
    mut shutdown: oneshot::Receiver<()>,
) -> JoinHandle<FailureLedger> {
    tokio::spawn(async move {
        let period = context.poll_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = period.as_secs_f64(), "command poller started");

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => poll_once(&context, &mut ledger).await,
            }
        }

        debug!(pending_failures = ledger.len(), "command poller stopped");
        ledger
    })
}

/// One tick: fetch the command list and run every command in server order.
pub(crate) async fn poll_once<T: Transport>(context: &EngineContext<T>, ledger: &mut FailureLedger) {
    let Some(session) = context.shared.session() else {
        warn!("no session identifiers, skipping poll");
        context.tip(
            TipCategory::Warning,
            TipLevel::Error,
            &SyncError::NotAuthenticated.to_string(),
        );
        return;
    };

    let envelope = match context.remote.commands(&session).await {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(error = %err, "failed to fetch commands");
            context.tip(
                TipCategory::Warning,
                TipLevel::Error,
                &format!("failed to fetch commands: {err}"),
            );
            return;
        }
    };

    if !envelope.is_success() {
        if !envelope.msg.is_empty() {
            warn!(message = %envelope.msg, "command list refused");
            context.tip(
                TipCategory::Warning,
                TipLevel::Error,
                &format!("failed to fetch commands: {}", envelope.msg),
            );
        }
        return;
    }

    let rows = match envelope.data.as_array() {
        Some(rows) if !rows.is_empty() => rows,
        _ => {
            debug!("command list is empty");
            context.tip(TipCategory::Info, TipLevel::Debug, "remote command list is empty");
            return;
        }
    };

    debug!(commands = rows.len(), "processing commands");
    for row in rows {
        run_command(context, ledger, &session, row).await;
    }

    context
        .presenter
        .set_counters(context.shared.counters().snapshot());
}

async fn run_command<T: Transport>(
    context: &EngineContext<T>,
    ledger: &mut FailureLedger,
    session: &SessionIdentifiers,
    row: &Value,
) {
    let counters = context.shared.counters();

    let Some(id) = row.get("id").and_then(coerce_id) else {
        counters.record_error();
        let err = SyncError::MalformedPayload(format!("command without usable id: {row}"));
        warn!(error = %err, "skipping command");
        context.tip(TipCategory::Notify, TipLevel::Error, &err.to_string());
        return;
    };

    if ledger.is_exhausted(&id) {
        report_terminal_failure(context, ledger, session, &id).await;
        return;
    }

    let category = row.get("category").and_then(Value::as_str).unwrap_or_default();
    let kind = category.split_once('|').map_or(category, |(kind, _)| kind);
    let result = if kind == XML_COMMAND {
        download(context, session, &id).await
    } else {
        Err(SyncError::UnrecognizedCommand(category.to_string()))
    };

    match result {
        Ok(path) => {
            counters.record_download();
            info!(id = %id, path = %path.display(), "document downloaded");
        }
        Err(err) => {
            counters.record_error();
            let attempts = ledger.record_failure(&id);
            warn!(id = %id, attempts, error = %err, "command failed");
            let (level, message) = match &err {
                SyncError::UnrecognizedCommand(_) => {
                    (TipLevel::Error, format!("command {id} skipped: {err}"))
                }
                _ => (TipLevel::Info, format!("download of command {id} failed: {err}")),
            };
            context.tip(TipCategory::Notify, level, &message);
            if attempts >= MAX_ATTEMPTS {
                report_terminal_failure(context, ledger, session, &id).await;
            }
        }
    }
}

async fn report_terminal_failure<T: Transport>(
    context: &EngineContext<T>,
    ledger: &mut FailureLedger,
    session: &SessionIdentifiers,
    id: &str,
) {
    match context
        .remote
        .receipt(&ReceiptParams::download_failed(session, id))
        .await
    {
        Ok(()) => {
            ledger.clear(id);
            warn!(id = %id, attempts = MAX_ATTEMPTS, "command reported as permanently failed");
        }
        Err(err) => {
            warn!(id = %id, error = %err, "failure report rejected, will retry");
            context.tip(
                TipCategory::Warning,
                TipLevel::Error,
                &format!("could not report command {id} as failed: {err}"),
            );
        }
    }
}

/// Download the document of command `id`, store it below the data path and
/// confirm it. Returns the written path.
pub(crate) async fn download<T: Transport>(
    context: &EngineContext<T>,
    session: &SessionIdentifiers,
    id: &str,
) -> SyncResult<PathBuf> {
    let envelope = context.remote.download(id, session).await?;
    if !envelope.is_success() {
        return Err(SyncError::Remote(envelope.failure_message().to_string()));
    }

    let data = envelope
        .data
        .as_object()
        .ok_or_else(|| SyncError::MalformedPayload("download data is not an object".to_string()))?;
    let relative = data
        .get("path")
        .and_then(Value::as_str)
        .ok_or_else(|| SyncError::MalformedPayload("download data has no path".to_string()))?;
    let xml = data
        .get("xml")
        .and_then(Value::as_str)
        .ok_or_else(|| SyncError::MalformedPayload("download data has no xml".to_string()))?;

    let target = fs::resolve_within(&context.data_path, relative)?;
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&target, xml.as_bytes()).await?;

    context
        .remote
        .receipt(&ReceiptParams::download_ok(session, id))
        .await?;
    Ok(target)
}

//! Outbound side: watch every company's `InBox` and upload new receipts.

use crate::engine::EngineContext;
use crate::error::{SyncError, SyncResult};
use crate::filename::{has_xml_suffix, parse_receipt_filename};
use crate::presenter::{TipCategory, TipLevel};
use crate::receipt::ReceiptParams;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use relay_config_and_utils::{fs, xml_to_json};
use relay_transport::Transport;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Directory below each company folder that receives outbound receipts.
pub const INBOX_DIR: &str = "InBox";

/// Result of handling one file event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded,
    Skipped,
}

/// `<data_path>/<company>/InBox` for every non-hidden company directory.
pub fn discover_targets(data_path: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(data_path) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(path = %data_path.display(), error = %err, "cannot list data directory");
            return Vec::new();
        }
    };

    let mut targets: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .map(|entry| entry.path())
        .filter(|path| fs::is_dir(path))
        .map(|path| path.join(INBOX_DIR))
        .filter(|inbox| fs::is_dir(inbox))
        .collect();
    targets.sort();
    targets
}

/// Spawn the watcher loop. It ends on `shutdown`, or right away when there
/// is nothing to watch.
pub(crate) fn spawn_watcher<T: Transport>(
    context: Arc<EngineContext<T>>,
    shutdown: oneshot::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match watch(&context, shutdown).await {
            Ok(()) | Err(SyncError::WatcherStopped) => {}
            Err(err) => {
                warn!(error = %err, "receipt watcher failed");
                context.tip(
                    TipCategory::Error,
                    TipLevel::Critical,
                    &format!("receipt watcher failed: {err}"),
                );
            }
        }
        debug!("receipt watcher stopped");
    })
}

async fn watch<T: Transport>(
    context: &EngineContext<T>,
    shutdown: oneshot::Receiver<()>,
) -> SyncResult<()> {
    let (tx, rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
    let mut watcher = RecommendedWatcher::new(
        move |event: notify::Result<Event>| {
            let _ = tx.send(event);
        },
        notify::Config::default(),
    )?;

    let mut watched = 0usize;
    for target in discover_targets(&context.data_path) {
        match watcher.watch(&target, RecursiveMode::NonRecursive) {
            Ok(()) => {
                debug!(path = %target.display(), "watching receipt directory");
                watched += 1;
            }
            Err(err) => warn!(path = %target.display(), error = %err, "cannot watch directory"),
        }
    }

    if watched == 0 {
        context.tip(
            TipCategory::Error,
            TipLevel::Critical,
            &format!(
                "no {INBOX_DIR} directories found under {}, check the data path",
                context.data_path.display()
            ),
        );
        return Ok(());
    }
    info!(directories = watched, "receipt watcher started");

    run_event_loop(context, rx, shutdown).await
}

/// Upload files named by watcher events until `shutdown` fires or the event
/// channel closes.
///
/// Events already queued when one arrives are handled together, and a path
/// seen several times in that batch is uploaded once.
pub(crate) async fn run_event_loop<T: Transport>(
    context: &EngineContext<T>,
    mut events: mpsc::UnboundedReceiver<notify::Result<Event>>,
    mut shutdown: oneshot::Receiver<()>,
) -> SyncResult<()> {
    loop {
        tokio::select! {
            _ = &mut shutdown => return Err(SyncError::WatcherStopped),
            received = events.recv() => {
                let Some(first) = received else { return Ok(()) };
                let mut batch = vec![first];
                while let Ok(next) = events.try_recv() {
                    batch.push(next);
                }

                let mut paths: Vec<PathBuf> = Vec::new();
                for received in batch {
                    match received {
                        Ok(event) if triggers_upload(&event.kind) => {
                            for path in event.paths {
                                if !paths.contains(&path) {
                                    paths.push(path);
                                }
                            }
                        }
                        Ok(_) => {}
                        Err(err) => {
                            warn!(error = %err, "watcher error");
                            context.tip(
                                TipCategory::Warning,
                                TipLevel::Error,
                                &format!("watcher error: {err}"),
                            );
                        }
                    }
                }

                for path in paths.iter().filter(|p| fs::is_file(p)) {
                    handle_file(context, path).await;
                }
            }
        }
    }
}

/// A file written in place reports a create and then one or more modifies.
/// Modifies that land in a later batch upload the file again.
fn triggers_upload(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}

async fn handle_file<T: Transport>(context: &EngineContext<T>, path: &Path) {
    match upload(context, path).await {
        Ok(UploadOutcome::Uploaded) => {
            context.shared.counters().record_upload();
            info!(path = %path.display(), "receipt uploaded");
        }
        Ok(UploadOutcome::Skipped) => debug!(path = %path.display(), "not a receipt, skipped"),
        Err(err) => {
            context.shared.counters().record_error();
            warn!(path = %path.display(), error = %err, "receipt upload failed");
            context.tip(
                TipCategory::Notify,
                TipLevel::Error,
                &format!("failed to process {}: {err}", path.display()),
            );
        }
    }
}

/// Convert one receipt file to JSON and report it to the server.
///
/// Files not ending in `.xml` are skipped.
pub(crate) async fn upload<T: Transport>(
    context: &EngineContext<T>,
    path: &Path,
) -> SyncResult<UploadOutcome> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    if !has_xml_suffix(&file_name) {
        return Ok(UploadOutcome::Skipped);
    }

    let session = context.shared.session().ok_or(SyncError::NotAuthenticated)?;
    let name = parse_receipt_filename(&file_name)?;
    let document = tokio::fs::read(path).await?;
    let content = xml_to_json(&document)?;

    let params = ReceiptParams::upload(&session, &file_name, content, &name);
    context.remote.receipt(&params).await?;
    Ok(UploadOutcome::Uploaded)
}

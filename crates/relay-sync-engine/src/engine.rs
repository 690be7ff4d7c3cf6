//! Start/stop lifecycle wiring the login, the watcher and the poller.

use crate::auth::AuthSession;
use crate::error::SyncResult;
use crate::inbound::spawn_poller;
use crate::ledger::FailureLedger;
use crate::outbound::spawn_watcher;
use crate::presenter::{Presenter, TipCategory, TipLevel};
use crate::remote::RemoteApi;
use crate::state::{CounterSnapshot, SessionIdentifiers, SharedState};
use relay_config_and_utils::Config;
use relay_transport::Transport;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Everything the engine needs from the configuration.
#[derive(Clone)]
pub struct EngineSettings {
    pub base_url: String,
    pub data_path: PathBuf,
    pub poll_interval: Duration,
    pub username: String,
    pub password: String,
    /// Identifiers saved by an earlier login, used until the next one.
    pub session: Option<SessionIdentifiers>,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.url.clone(),
            data_path: config.data_path.clone(),
            poll_interval: config.poll_interval(),
            username: config.uname.clone(),
            password: config.pwd.clone(),
            session: config
                .has_session()
                .then(|| SessionIdentifiers::new(config.ecid.clone(), config.uid.clone())),
        }
    }
}

/// Read-only context shared by both loops.
pub(crate) struct EngineContext<T: Transport> {
    pub(crate) remote: RemoteApi<T>,
    pub(crate) shared: Arc<SharedState>,
    pub(crate) presenter: Arc<dyn Presenter>,
    pub(crate) data_path: PathBuf,
    pub(crate) poll_interval: Duration,
}

impl<T: Transport> EngineContext<T> {
    pub(crate) fn tip(&self, category: TipCategory, level: TipLevel, message: &str) {
        self.presenter.tip(category, level, message);
    }
}

struct LoopHandle<R> {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<R>,
}

struct RunningLoops {
    watcher: LoopHandle<()>,
    poller: LoopHandle<FailureLedger>,
}

impl RunningLoops {
    /// Signal both loops and wait for them to exit.
    async fn shutdown(self) -> FailureLedger {
        // The watcher may already be gone when it had nothing to watch.
        let _ = self.watcher.shutdown.send(());
        let _ = self.poller.shutdown.send(());

        if let Err(err) = self.watcher.task.await {
            warn!(error = %err, "receipt watcher task ended abnormally");
        }
        match self.poller.task.await {
            Ok(ledger) => ledger,
            Err(err) => {
                warn!(error = %err, "command poller task ended abnormally, failure ledger lost");
                FailureLedger::new()
            }
        }
    }
}

enum RunState {
    Stopped { ledger: FailureLedger },
    Running(RunningLoops),
}

/// Owns the two background loops and the state they share.
pub struct SyncEngine<T: Transport> {
    context: Arc<EngineContext<T>>,
    auth: AuthSession,
    run_state: Mutex<RunState>,
}

impl<T: Transport> SyncEngine<T> {
    pub fn new(settings: EngineSettings, transport: T, presenter: Arc<dyn Presenter>) -> Self {
        let context = EngineContext {
            remote: RemoteApi::new(transport, settings.base_url),
            shared: Arc::new(SharedState::new(settings.session)),
            presenter,
            data_path: settings.data_path,
            poll_interval: settings.poll_interval,
        };

        Self {
            context: Arc::new(context),
            auth: AuthSession::new(settings.username, settings.password),
            run_state: Mutex::new(RunState::Stopped {
                ledger: FailureLedger::new(),
            }),
        }
    }

    /// Log in and store the returned identifiers for both loops.
    ///
    /// Not meant to be called while the engine is running.
    pub async fn auth(&self) -> SyncResult<SessionIdentifiers> {
        let session = self.auth.login(&self.context.remote).await?;
        self.context.shared.set_session(session.clone());
        Ok(session)
    }

    /// Launch the watcher and the poller. Returns false if already running.
    pub async fn start(&self) -> bool {
        let mut state = self.run_state.lock().await;
        let ledger = match &mut *state {
            RunState::Running(_) => return false,
            RunState::Stopped { ledger } => std::mem::take(ledger),
        };

        let (watcher_tx, watcher_rx) = oneshot::channel();
        let (poller_tx, poller_rx) = oneshot::channel();
        let loops = RunningLoops {
            watcher: LoopHandle {
                shutdown: watcher_tx,
                task: spawn_watcher(self.context.clone(), watcher_rx),
            },
            poller: LoopHandle {
                shutdown: poller_tx,
                task: spawn_poller(self.context.clone(), ledger, poller_rx),
            },
        };
        *state = RunState::Running(loops);

        info!(data_path = %self.context.data_path.display(), "sync engine started");
        true
    }

    /// Stop both loops and wait until they have exited. Returns false if
    /// already stopped.
    pub async fn stop(&self) -> bool {
        let mut state = self.run_state.lock().await;
        let loops = match std::mem::replace(
            &mut *state,
            RunState::Stopped {
                ledger: FailureLedger::new(),
            },
        ) {
            RunState::Running(loops) => loops,
            stopped @ RunState::Stopped { .. } => {
                *state = stopped;
                return false;
            }
        };

        let ledger = loops.shutdown().await;
        *state = RunState::Stopped { ledger };

        info!("sync engine stopped");
        true
    }

    pub async fn is_running(&self) -> bool {
        matches!(*self.run_state.lock().await, RunState::Running(_))
    }

    pub fn counters(&self) -> CounterSnapshot {
        self.context.shared.counters().snapshot()
    }

    pub fn session(&self) -> Option<SessionIdentifiers> {
        self.context.shared.session()
    }

    pub fn shared(&self) -> Arc<SharedState> {
        self.context.shared.clone()
    }

    #[cfg(test)]
    pub(crate) fn context(&self) -> Arc<EngineContext<T>> {
        self.context.clone()
    }

    #[cfg(test)]
    pub(crate) async fn pending_failures(&self, id: &str) -> Option<u32> {
        match &*self.run_state.lock().await {
            RunState::Stopped { ledger } => Some(ledger.attempts(id)),
            RunState::Running(_) => None,
        }
    }
}

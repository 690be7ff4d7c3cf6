//! Test harness for engine tests.
//!
//! Provides:
//! - MockTransport: replies scripted per endpoint path, records every request
//! - RecordingPresenter: keeps every tip and counter update
//! - TestHarness: temporary data directory plus engine construction

use crate::engine::EngineSettings;
use crate::presenter::{Presenter, TipCategory, TipLevel};
use crate::state::{CounterSnapshot, SessionIdentifiers};
use crate::SyncEngine;
use async_trait::async_trait;
use relay_transport::{RawResponse, RequestPayload, Transport, TransportResult};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub const BASE_URL: &str = "https://relay.example.com/";

/// Canned reply of the mock transport.
#[derive(Debug, Clone)]
pub enum MockReply {
    Json(Value),
    Body(u16, String),
}

impl MockReply {
    fn into_response(self) -> RawResponse {
        match self {
            MockReply::Json(value) => RawResponse::new(200, value.to_string()),
            MockReply::Body(status, body) => RawResponse::new(status, body),
        }
    }
}

/// Success envelope carrying `data`.
pub fn ok(data: Value) -> MockReply {
    MockReply::Json(json!({"code": 1, "msg": "", "time": "1700000000", "data": data}))
}

/// Failure envelope carrying `msg`.
pub fn refused(msg: &str) -> MockReply {
    MockReply::Json(json!({"code": 0, "msg": msg, "time": "1700000000", "data": null}))
}

/// A request seen by the mock transport.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub payload: RequestPayload,
}

impl RecordedRequest {
    pub fn form(&self, name: &str) -> Option<&str> {
        self.payload.form_value(name)
    }
}

#[derive(Default)]
struct MockState {
    queued: HashMap<String, VecDeque<MockReply>>,
    fallback: HashMap<String, MockReply>,
    requests: Vec<RecordedRequest>,
}

/// Transport answering by endpoint path.
///
/// Queued replies are used first, in order; then the path's standing reply;
/// unknown paths answer 404.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply once with `reply` on the next request to `path`.
    pub fn queue(&self, path: &str, reply: MockReply) {
        self.state
            .lock()
            .unwrap()
            .queued
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Reply with `reply` whenever nothing is queued for `path`.
    pub fn always(&self, path: &str, reply: MockReply) {
        self.state
            .lock()
            .unwrap()
            .fallback
            .insert(path.to_string(), reply);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.ends_with(path))
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, url: &str, payload: &RequestPayload) -> TransportResult<RawResponse> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(RecordedRequest {
            url: url.to_string(),
            payload: payload.clone(),
        });

        let path = state
            .queued
            .keys()
            .chain(state.fallback.keys())
            .find(|path| url.ends_with(path.as_str()))
            .cloned();
        let Some(path) = path else {
            return Ok(RawResponse::new(404, "not found"));
        };

        let queued = state.queued.get_mut(&path).and_then(VecDeque::pop_front);
        let reply = queued.or_else(|| state.fallback.get(&path).cloned());
        Ok(reply
            .map(MockReply::into_response)
            .unwrap_or_else(|| RawResponse::new(404, "not found")))
    }
}

/// Presenter that records everything it is given.
#[derive(Default)]
pub struct RecordingPresenter {
    tips: Mutex<Vec<(TipCategory, TipLevel, String)>>,
    counters: Mutex<Vec<CounterSnapshot>>,
}

impl RecordingPresenter {
    pub fn tips(&self) -> Vec<(TipCategory, TipLevel, String)> {
        self.tips.lock().unwrap().clone()
    }

    pub fn has_tip(&self, category: TipCategory, needle: &str) -> bool {
        self.tips()
            .iter()
            .any(|(c, _, message)| *c == category && message.contains(needle))
    }

    pub fn counter_updates(&self) -> Vec<CounterSnapshot> {
        self.counters.lock().unwrap().clone()
    }
}

impl Presenter for RecordingPresenter {
    fn tip(&self, category: TipCategory, level: TipLevel, message: &str) {
        self.tips
            .lock()
            .unwrap()
            .push((category, level, message.to_string()));
    }

    fn set_counters(&self, snapshot: CounterSnapshot) {
        self.counters.lock().unwrap().push(snapshot);
    }
}

/// Temporary data directory, mock transport and recording presenter.
pub struct TestHarness {
    pub transport: MockTransport,
    pub presenter: Arc<RecordingPresenter>,
    data_dir: TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            transport: MockTransport::new(),
            presenter: Arc::new(RecordingPresenter::default()),
            data_dir: TempDir::new().unwrap(),
        }
    }

    pub fn data_path(&self) -> &Path {
        self.data_dir.path()
    }

    /// Create `<data>/<company>/InBox` and return it.
    pub fn make_inbox(&self, company: &str) -> PathBuf {
        let inbox = self.data_path().join(company).join("InBox");
        std::fs::create_dir_all(&inbox).unwrap();
        inbox
    }

    pub fn settings(&self, poll_interval: Duration) -> EngineSettings {
        EngineSettings {
            base_url: BASE_URL.to_string(),
            data_path: self.data_path().to_path_buf(),
            poll_interval,
            username: "operator".to_string(),
            password: "secret".to_string(),
            session: Some(SessionIdentifiers::new("E1", "100")),
        }
    }

    pub fn engine(&self, poll_interval: Duration) -> SyncEngine<MockTransport> {
        self.engine_with(self.settings(poll_interval))
    }

    pub fn engine_with(&self, settings: EngineSettings) -> SyncEngine<MockTransport> {
        SyncEngine::new(settings, self.transport.clone(), self.presenter.clone())
    }
}

/// Poll `condition` every 10ms until it holds or `limit` elapses.
pub async fn wait_until(limit: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

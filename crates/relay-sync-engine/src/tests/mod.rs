//! Engine tests against a scripted transport.
//!
//! - `harness.rs`  - MockTransport, RecordingPresenter and TestHarness
//! - `auth.rs`     - login handshake
//! - `inbound.rs`  - command polling, downloads, failure ledger
//! - `outbound.rs` - receipt upload and the directory watcher
//! - `lifecycle.rs` - start/stop barrier and idempotence

pub(crate) mod harness;
mod outbound;

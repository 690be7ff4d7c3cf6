//! Synchronization engine of the customs relay agent.
//!
//! Bridges the single-window client's exchange directory with the remote
//! command/data API through two loops:
//!
//! - the **watcher** uploads every receipt that appears in a company's
//!   `InBox` directory
//! - the **poller** fetches pending commands on a fixed interval, downloads
//!   the requested documents and reports each outcome
//!
//! ```text
//! <data_path>/<company>/InBox/*.xml --watcher--> api/Chinaport/Receipt
//! api/Chinaport/Commands --poller--> api/Chinaport/Download --> <data_path>/<path>
//! ```
//!
//! A command that fails three times is reported once as permanently failed.

pub mod auth;
pub mod engine;
pub mod error;
pub mod filename;
pub mod inbound;
pub mod ledger;
pub mod outbound;
pub mod presenter;
pub mod receipt;
pub mod remote;
pub mod state;

#[cfg(test)]
mod tests;

pub use auth::{extract_login_token, AuthSession};
pub use engine::{EngineSettings, SyncEngine};
pub use error::{SyncError, SyncResult};
pub use filename::{parse_receipt_filename, ReceiptName};
pub use ledger::{FailureLedger, MAX_ATTEMPTS};
pub use presenter::{Presenter, TipCategory, TipLevel, TracingPresenter};
pub use receipt::ReceiptParams;
pub use remote::RemoteApi;
pub use state::{CounterSnapshot, Counters, SessionIdentifiers, SharedState};

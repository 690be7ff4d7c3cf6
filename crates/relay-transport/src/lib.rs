//! HTTP transport for the customs relay agent.
//!
//! [`Transport`] is the seam the sync engine talks through; [`HttpClient`] is
//! the production implementation backed by reqwest with a cookie store.
//! Every remote call answers with an [`Envelope`].

mod client;
mod envelope;
mod error;
mod payload;
mod transport;

pub use client::{HttpClient, DEFAULT_USER_AGENT, DUMP_DEBUG_LEVEL};
pub use envelope::{coerce_id, Envelope, DEFAULT_FAILURE_MESSAGE};
pub use error::{TransportError, TransportResult};
pub use payload::{Codec, Method, RawResponse, RequestPayload};
pub use transport::{join_url, Transport};

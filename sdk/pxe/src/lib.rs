//! Shieldmint PXE Client
//!
//! Typed access to a private-execution-environment node.
//!
//! ```text
//! ┌────────────────┐   typed ops    ┌──────────────┐  JSON-RPC   ┌──────────┐
//! │ TokenContract  │ ─────────────▶ │  impl Pxe    │ ──────────▶ │ PXE node │
//! │ mint/redeem/   │                │ HttpPxeClient│             └──────────┘
//! │ balance_of_*   │ ◀── SentTx ─── │ MemoryPxe    │
//! └────────────────┘                └──────────────┘
//! ```
//!
//! Every send returns a [`SentTx`]: the hash is known at once, inclusion is
//! a separate, explicitly awaited step.

pub mod http;
pub mod memory;
pub mod rpc;
pub mod sent_tx;
pub mod token;

pub use http::HttpPxeClient;
pub use memory::{MemoryPxe, RecordedCall};
pub use rpc::{FunctionCall, Pxe};
pub use sent_tx::{SentTx, WaitOpts};
pub use token::{PENDING_SHIELDS_SLOT, TOKEN_FUNCTIONS, TRANSPARENT_NOTE, TokenContract};

use std::time::Duration;

use shieldmint_artifact::ArtifactError;
use shieldmint_primitives::TxHash;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PxeError {
    #[error("cannot reach PXE at {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("PXE answered HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("PXE error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed {method} response: {source}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected result from {method}: {reason}")]
    UnexpectedResult { method: String, reason: String },

    #[error("transaction {tx_hash} reverted: {reason}")]
    TxReverted { tx_hash: TxHash, reason: String },

    #[error("transaction {tx_hash} was dropped: {reason}")]
    TxDropped { tx_hash: TxHash, reason: String },

    #[error("gave up on transaction {tx_hash} after {elapsed:?}")]
    WaitTimeout { tx_hash: TxHash, elapsed: Duration },

    #[error("no wallet selected to send {function}")]
    MissingWallet { function: String },

    #[error("PXE unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

impl PxeError {
    /// Failures that may clear up on their own (network, HTTP 5xx)
    pub fn is_transient(&self) -> bool {
        match self {
            PxeError::Transport { .. } | PxeError::Unavailable(_) => true,
            PxeError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

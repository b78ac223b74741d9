//! Submitted transactions
//!
//! Submission and inclusion are two separate steps:
//!
//! ```text
//! send_call() ──▶ SentTx { tx_hash }      (accepted by the node)
//!                   │ wait()
//!                   ▼
//!                 TxReceipt { block_number } (included and executed)
//! ```
//!
//! `wait` polls until the node reports a final status. Without a timeout it
//! blocks for as long as the network takes.

use std::time::{Duration, Instant};

use log::{debug, warn};
use shieldmint_primitives::{TxHash, TxReceipt, TxStatus};

use crate::rpc::Pxe;
use crate::PxeError;

/// How to wait for inclusion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOpts {
    /// Delay between receipt polls
    pub interval: Duration,
    /// Upper bound on the whole wait; `None` waits forever
    pub timeout: Option<Duration>,
}

impl Default for WaitOpts {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: None,
        }
    }
}

/// Pending handle for a transaction the node has accepted
#[derive(Debug)]
pub struct SentTx<'a, P: Pxe> {
    pxe: &'a P,
    tx_hash: TxHash,
}

impl<'a, P: Pxe> SentTx<'a, P> {
    pub fn new(pxe: &'a P, tx_hash: TxHash) -> Self {
        Self { pxe, tx_hash }
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    /// Block until the transaction is mined, or fails
    pub async fn wait(&self, opts: &WaitOpts) -> Result<TxReceipt, PxeError> {
        let start = Instant::now();
        match opts.timeout {
            Some(limit) => tokio::time::timeout(limit, self.poll(opts.interval))
                .await
                .map_err(|_| PxeError::WaitTimeout {
                    tx_hash: self.tx_hash,
                    elapsed: start.elapsed(),
                })?,
            None => self.poll(opts.interval).await,
        }
    }

    async fn poll(&self, interval: Duration) -> Result<TxReceipt, PxeError> {
        loop {
            match self.pxe.get_tx_receipt(self.tx_hash).await {
                Ok(receipt) if receipt.status.is_final() => return self.settle(receipt),
                Ok(_) => {
                    debug!("Transaction {} still pending", self.tx_hash);
                }
                // Keep polling through network hiccups
                Err(e) if e.is_transient() => {
                    warn!("Failed to get receipt for {}: {}", self.tx_hash, e);
                }
                Err(e) => return Err(e),
            }

            tokio::time::sleep(interval).await;
        }
    }

    /// Turn a final receipt into the caller's result
    fn settle(&self, receipt: TxReceipt) -> Result<TxReceipt, PxeError> {
        let reason = |error: Option<String>| error.unwrap_or_else(|| "no reason given".into());
        match receipt.status {
            TxStatus::Reverted => Err(PxeError::TxReverted {
                tx_hash: self.tx_hash,
                reason: reason(receipt.error),
            }),
            TxStatus::Dropped => Err(PxeError::TxDropped {
                tx_hash: self.tx_hash,
                reason: reason(receipt.error),
            }),
            TxStatus::Success | TxStatus::Pending => Ok(receipt),
        }
    }
}

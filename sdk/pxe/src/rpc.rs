//! The PXE RPC surface

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shieldmint_note::ExtendedNote;
use shieldmint_primitives::{AztecAddress, CompleteAddress, Fr, NodeInfo, TxHash, TxReceipt};

use crate::PxeError;

/// A call to one function of a deployed contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCall {
    pub contract_address: AztecAddress,
    pub function_name: String,
    pub args: Vec<Fr>,
}

impl FunctionCall {
    pub fn new(contract_address: AztecAddress, function_name: impl Into<String>, args: Vec<Fr>) -> Self {
        Self {
            contract_address,
            function_name: function_name.into(),
            args,
        }
    }
}

/// Operations a PXE exposes to its clients.
///
/// Implemented over HTTP by [`crate::HttpPxeClient`] and in memory by
/// [`crate::MemoryPxe`].
pub trait Pxe: Send + Sync {
    fn get_node_info(&self) -> impl Future<Output = Result<NodeInfo, PxeError>> + Send;

    /// Accounts registered with this PXE, in registration order
    fn get_registered_accounts(
        &self,
    ) -> impl Future<Output = Result<Vec<CompleteAddress>, PxeError>> + Send;

    /// Read-only execution; nothing is submitted
    fn simulate_call(
        &self,
        call: &FunctionCall,
        from: Option<AztecAddress>,
    ) -> impl Future<Output = Result<Value, PxeError>> + Send;

    /// Prove and submit. Resolves once the node has accepted the tx, not
    /// once it is included.
    fn send_call(
        &self,
        call: &FunctionCall,
        from: AztecAddress,
    ) -> impl Future<Output = Result<TxHash, PxeError>> + Send;

    fn get_tx_receipt(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = Result<TxReceipt, PxeError>> + Send;

    /// Hand a note to the PXE's note store so it can later be spent
    fn add_note(&self, note: &ExtendedNote) -> impl Future<Output = Result<(), PxeError>> + Send;
}

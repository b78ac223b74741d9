//! In-memory PXE
//!
//! A single-process stand-in for a PXE and the token contract behind it.
//! Transactions sit in a mempool until the next receipt poll, which mines
//! them all into one block:
//!
//! ```text
//! send_call ─▶ mempool ─(get_tx_receipt)─▶ block N ─▶ balances updated
//! ```
//!
//! Token rules modelled here:
//! - `mint_public(to, amount)`: public[to] += amount
//! - `mint_private(amount, hash)`: records a pending shield
//! - `add_note`: only for a mined tx, only for an existing pending shield
//! - `redeem_shield(to, amount, secret)`: rejected up front unless the PXE
//!   holds a matching note; reverts at mining unless `H(secret)` matches a
//!   pending shield, which is then consumed and private[to] += amount

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;
use shieldmint_artifact::{ContractArtifact, FunctionArtifact, NoteTypeInfo, Parameter, StorageSlot};
use shieldmint_note::{ExtendedNote, compute_secret_hash};
use shieldmint_primitives::{
    AztecAddress, CompleteAddress, Fr, NodeInfo, TxHash, TxReceipt, TxStatus,
};

use crate::rpc::{FunctionCall, Pxe};
use crate::token::{PENDING_SHIELDS_SLOT, TOKEN_FUNCTIONS, TRANSPARENT_NOTE};
use crate::PxeError;

const ERR_INVALID: i64 = -32602;
const ERR_EXECUTION: i64 = -32000;

/// One call received by a [`MemoryPxe`], in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    GetNodeInfo,
    GetRegisteredAccounts,
    Simulate { function: String, args: Vec<Fr> },
    Send { function: String, from: AztecAddress },
    GetTxReceipt(TxHash),
    AddNote(TxHash),
}

#[derive(Debug, Clone)]
enum Effect {
    MintPublic { to: AztecAddress, amount: u128 },
    MintPrivate { amount: u128, secret_hash: Fr },
    RedeemShield { to: AztecAddress, amount: u128, secret: Fr },
}

#[derive(Debug, Default)]
struct State {
    chain_id: u64,
    offline: bool,
    accounts: Vec<CompleteAddress>,
    token: Option<AztecAddress>,
    public_balances: HashMap<AztecAddress, u128>,
    private_balances: HashMap<AztecAddress, u128>,
    pending_shields: Vec<(u128, Fr)>,
    notes: Vec<ExtendedNote>,
    receipts: HashMap<TxHash, TxReceipt>,
    mempool: Vec<(TxHash, Effect)>,
    block_number: u64,
    tx_count: u64,
    calls: Vec<RecordedCall>,
}

#[derive(Debug, Default)]
pub struct MemoryPxe {
    state: Mutex<State>,
}

impl MemoryPxe {
    pub fn new(chain_id: u64) -> Self {
        Self {
            state: Mutex::new(State {
                chain_id,
                ..State::default()
            }),
        }
    }

    /// Artifact matching the token modelled here
    pub fn token_artifact() -> ContractArtifact {
        let functions = TOKEN_FUNCTIONS
            .iter()
            .map(|name| FunctionArtifact {
                name: name.to_string(),
                function_type: Some(function_type(name).to_string()),
                is_internal: false,
                parameters: Vec::<Parameter>::new(),
            })
            .collect();

        let mut storage_layout = BTreeMap::new();
        storage_layout.insert(
            PENDING_SHIELDS_SLOT.to_string(),
            StorageSlot { slot: Fr::from_u64(5) },
        );

        let mut notes = BTreeMap::new();
        notes.insert(
            TRANSPARENT_NOTE.to_string(),
            NoteTypeInfo {
                id: Fr::from_u64(0x7472_616e_73),
                typ: TRANSPARENT_NOTE.to_string(),
            },
        );

        ContractArtifact {
            name: "Token".to_string(),
            functions,
            storage_layout,
            notes,
        }
    }

    pub fn register_account(&self, address: AztecAddress) {
        self.lock().accounts.push(CompleteAddress::new(address));
    }

    pub fn deploy_token(&self, address: AztecAddress) -> AztecAddress {
        self.lock().token = Some(address);
        address
    }

    /// While offline every call fails as if the node were unreachable
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn public_balance(&self, account: AztecAddress) -> u128 {
        self.lock().public_balances.get(&account).copied().unwrap_or(0)
    }

    pub fn private_balance(&self, account: AztecAddress) -> u128 {
        self.lock().private_balances.get(&account).copied().unwrap_or(0)
    }

    pub fn pending_shields(&self) -> usize {
        self.lock().pending_shields.len()
    }

    pub fn notes(&self) -> Vec<ExtendedNote> {
        self.lock().notes.clone()
    }

    pub fn block_number(&self) -> u64 {
        self.lock().block_number
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record the call and fail if offline
    fn enter(&self, call: RecordedCall) -> Result<MutexGuard<'_, State>, PxeError> {
        let mut state = self.lock();
        state.calls.push(call);
        if state.offline {
            return Err(PxeError::Unavailable("node is offline".into()));
        }
        Ok(state)
    }
}

impl State {
    fn check_token(&self, contract: AztecAddress) -> Result<(), PxeError> {
        match self.token {
            Some(token) if token == contract => Ok(()),
            _ => Err(rpc_error(
                ERR_EXECUTION,
                format!("no contract deployed at {contract}"),
            )),
        }
    }

    fn is_registered(&self, account: AztecAddress) -> bool {
        self.accounts.iter().any(|a| a.address == account)
    }

    fn has_note(&self, owner: AztecAddress, amount: u128) -> bool {
        self.notes.iter().any(|n| {
            n.owner == owner && matches!(n.note.amount(), Some(Ok(a)) if a == amount)
        })
    }

    fn next_tx_hash(&mut self) -> TxHash {
        self.tx_count += 1;
        let mut bytes = [0u8; 32];
        bytes[0] = 0x01;
        bytes[24..].copy_from_slice(&self.tx_count.to_be_bytes());
        TxHash(bytes)
    }

    /// Mine everything in the mempool into a single block
    fn mine(&mut self) {
        if self.mempool.is_empty() {
            return;
        }
        self.block_number += 1;
        let block = self.block_number;

        for (tx_hash, effect) in std::mem::take(&mut self.mempool) {
            let outcome = self.apply(effect);
            let receipt = TxReceipt {
                tx_hash,
                status: if outcome.is_ok() { TxStatus::Success } else { TxStatus::Reverted },
                error: outcome.err(),
                block_number: Some(block),
            };
            self.receipts.insert(tx_hash, receipt);
        }
    }

    fn apply(&mut self, effect: Effect) -> Result<(), String> {
        match effect {
            Effect::MintPublic { to, amount } => {
                let balance = self.public_balances.entry(to).or_insert(0);
                *balance = balance
                    .checked_add(amount)
                    .ok_or_else(|| "public balance overflow".to_string())?;
            }
            Effect::MintPrivate {
                amount,
                secret_hash,
            } => {
                self.pending_shields.push((amount, secret_hash));
            }
            Effect::RedeemShield { to, amount, secret } => {
                let secret_hash = compute_secret_hash(&secret);
                let index = self
                    .pending_shields
                    .iter()
                    .position(|shield| *shield == (amount, secret_hash))
                    .ok_or_else(|| "secret does not open any pending shield".to_string())?;

                let balance = self.private_balances.get(&to).copied().unwrap_or(0);
                let updated = balance
                    .checked_add(amount)
                    .ok_or_else(|| "private balance overflow".to_string())?;

                self.pending_shields.remove(index);
                self.notes
                    .retain(|n| n.note.secret_hash() != Some(secret_hash));
                self.private_balances.insert(to, updated);
            }
        }
        Ok(())
    }
}

fn function_type(name: &str) -> &'static str {
    if name.starts_with("balance_of") {
        "unconstrained"
    } else {
        "open"
    }
}

fn rpc_error(code: i64, message: impl Into<String>) -> PxeError {
    PxeError::Rpc {
        code,
        message: message.into(),
    }
}

fn address_arg(call: &FunctionCall, index: usize) -> Result<AztecAddress, PxeError> {
    field_arg(call, index).map(AztecAddress)
}

fn amount_arg(call: &FunctionCall, index: usize) -> Result<u128, PxeError> {
    field_arg(call, index)?
        .to_u128()
        .map_err(|e| rpc_error(ERR_INVALID, e.to_string()))
}

fn field_arg(call: &FunctionCall, index: usize) -> Result<Fr, PxeError> {
    call.args.get(index).copied().ok_or_else(|| {
        rpc_error(
            ERR_INVALID,
            format!("{} is missing argument {}", call.function_name, index),
        )
    })
}

impl Pxe for MemoryPxe {
    async fn get_node_info(&self) -> Result<NodeInfo, PxeError> {
        let state = self.enter(RecordedCall::GetNodeInfo)?;
        Ok(NodeInfo {
            node_version: "memory".to_string(),
            chain_id: state.chain_id,
            protocol_version: 1,
        })
    }

    async fn get_registered_accounts(&self) -> Result<Vec<CompleteAddress>, PxeError> {
        let state = self.enter(RecordedCall::GetRegisteredAccounts)?;
        Ok(state.accounts.clone())
    }

    async fn simulate_call(
        &self,
        call: &FunctionCall,
        _from: Option<AztecAddress>,
    ) -> Result<Value, PxeError> {
        let state = self.enter(RecordedCall::Simulate {
            function: call.function_name.clone(),
            args: call.args.clone(),
        })?;
        state.check_token(call.contract_address)?;

        let owner = address_arg(call, 0)?;
        let balances = match call.function_name.as_str() {
            "balance_of_public" => &state.public_balances,
            "balance_of_private" => &state.private_balances,
            other => {
                return Err(rpc_error(
                    ERR_INVALID,
                    format!("{other} cannot be simulated"),
                ));
            }
        };
        let balance = balances.get(&owner).copied().unwrap_or(0);
        Ok(Value::String(balance.to_string()))
    }

    async fn send_call(&self, call: &FunctionCall, from: AztecAddress) -> Result<TxHash, PxeError> {
        let mut state = self.enter(RecordedCall::Send {
            function: call.function_name.clone(),
            from,
        })?;
        state.check_token(call.contract_address)?;
        if !state.is_registered(from) {
            return Err(rpc_error(ERR_INVALID, format!("unknown sender {from}")));
        }

        let effect = match call.function_name.as_str() {
            "mint_public" => Effect::MintPublic {
                to: address_arg(call, 0)?,
                amount: amount_arg(call, 1)?,
            },
            "mint_private" => Effect::MintPrivate {
                amount: amount_arg(call, 0)?,
                secret_hash: field_arg(call, 1)?,
            },
            "redeem_shield" => {
                let to = address_arg(call, 0)?;
                let amount = amount_arg(call, 1)?;
                if !state.has_note(to, amount) {
                    return Err(rpc_error(
                        ERR_EXECUTION,
                        format!("no pending shield note of {amount} for {to}"),
                    ));
                }
                Effect::RedeemShield {
                    to,
                    amount,
                    secret: field_arg(call, 2)?,
                }
            }
            other => {
                return Err(rpc_error(ERR_INVALID, format!("{other} cannot be sent")));
            }
        };

        let tx_hash = state.next_tx_hash();
        state.receipts.insert(tx_hash, TxReceipt::pending(tx_hash));
        state.mempool.push((tx_hash, effect));
        Ok(tx_hash)
    }

    async fn get_tx_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, PxeError> {
        let mut state = self.enter(RecordedCall::GetTxReceipt(tx_hash))?;
        state.mine();
        state
            .receipts
            .get(&tx_hash)
            .cloned()
            .ok_or_else(|| rpc_error(ERR_INVALID, format!("unknown transaction {tx_hash}")))
    }

    async fn add_note(&self, note: &ExtendedNote) -> Result<(), PxeError> {
        let mut state = self.enter(RecordedCall::AddNote(note.tx_hash))?;
        state.check_token(note.contract_address)?;

        let mined = state
            .receipts
            .get(&note.tx_hash)
            .is_some_and(|r| r.is_mined());
        if !mined {
            return Err(rpc_error(
                ERR_EXECUTION,
                format!("transaction {} is not mined", note.tx_hash),
            ));
        }

        let shield = match (note.note.amount(), note.note.secret_hash()) {
            (Some(Ok(amount)), Some(secret_hash)) => (amount, secret_hash),
            _ => return Err(rpc_error(ERR_INVALID, "not a transparent note")),
        };
        if !state.pending_shields.contains(&shield) {
            return Err(rpc_error(
                ERR_EXECUTION,
                "note does not match any pending shield",
            ));
        }

        state.notes.push(note.clone());
        Ok(())
    }
}

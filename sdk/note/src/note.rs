//! Notes and their PXE-side envelope

use serde::{Deserialize, Serialize};
use shieldmint_primitives::{AztecAddress, Fr, PrimitiveError, TxHash};

/// Packed note fields as the contract stores them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub items: Vec<Fr>,
}

impl Note {
    pub fn new(items: Vec<Fr>) -> Self {
        Self { items }
    }

    /// A transparent note: `[amount, secret_hash]`
    pub fn transparent(amount: u128, secret_hash: Fr) -> Self {
        Self::new(vec![Fr::from_u128(amount), secret_hash])
    }

    /// Amount of a transparent note
    pub fn amount(&self) -> Option<Result<u128, PrimitiveError>> {
        self.items.first().map(Fr::to_u128)
    }

    /// Secret hash of a transparent note
    pub fn secret_hash(&self) -> Option<Fr> {
        self.items.get(1).copied()
    }
}

/// A note plus everything the PXE needs to file it in its note store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedNote {
    pub note: Note,
    pub owner: AztecAddress,
    pub contract_address: AztecAddress,
    pub storage_slot: Fr,
    pub note_type_id: Fr,
    pub tx_hash: TxHash,
}

impl ExtendedNote {
    pub fn new(
        note: Note,
        owner: AztecAddress,
        contract_address: AztecAddress,
        storage_slot: Fr,
        note_type_id: Fr,
        tx_hash: TxHash,
    ) -> Self {
        Self {
            note,
            owner,
            contract_address,
            storage_slot,
            note_type_id,
            tx_hash,
        }
    }
}

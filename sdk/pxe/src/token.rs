//! Token Contract
//!
//! A fixed set of typed operations on a deployed token. The artifact is
//! checked once, at construction, for every function, storage slot and note
//! type used here, so a bad artifact fails before anything is sent.

use log::debug;
use serde_json::Value;
use shieldmint_artifact::{ArtifactError, ContractArtifact};
use shieldmint_note::{ExtendedNote, Note, Secret};
use shieldmint_primitives::{AztecAddress, Fr, TxHash};

use crate::rpc::{FunctionCall, Pxe};
use crate::sent_tx::SentTx;
use crate::PxeError;

pub const TOKEN_FUNCTIONS: [&str; 5] = [
    "mint_public",
    "mint_private",
    "redeem_shield",
    "balance_of_public",
    "balance_of_private",
];

/// Storage slot holding shields minted but not yet redeemed
pub const PENDING_SHIELDS_SLOT: &str = "pending_shields";

/// Note type of a pending shield
pub const TRANSPARENT_NOTE: &str = "TransparentNote";

#[derive(Debug)]
pub struct TokenContract<'a, P: Pxe> {
    pxe: &'a P,
    address: AztecAddress,
    artifact: ContractArtifact,
    wallet: Option<AztecAddress>,
    pending_shields_slot: Fr,
    transparent_note_id: Fr,
}

impl<'a, P: Pxe> TokenContract<'a, P> {
    pub fn at(
        address: AztecAddress,
        artifact: ContractArtifact,
        pxe: &'a P,
    ) -> Result<Self, ArtifactError> {
        artifact.require_functions(&TOKEN_FUNCTIONS)?;
        let pending_shields_slot = artifact.storage_slot(PENDING_SHIELDS_SLOT)?;
        let transparent_note_id = artifact.note_type_id(TRANSPARENT_NOTE)?;

        Ok(Self {
            pxe,
            address,
            artifact,
            wallet: None,
            pending_shields_slot,
            transparent_note_id,
        })
    }

    /// Account that signs and pays for sends
    pub fn with_wallet(mut self, wallet: AztecAddress) -> Self {
        self.wallet = Some(wallet);
        self
    }

    pub fn address(&self) -> AztecAddress {
        self.address
    }

    pub fn artifact(&self) -> &ContractArtifact {
        &self.artifact
    }

    pub fn wallet(&self) -> Option<AztecAddress> {
        self.wallet
    }

    pub async fn mint_public(&self, to: AztecAddress, amount: u128) -> Result<SentTx<'a, P>, PxeError> {
        self.send("mint_public", vec![to.to_fr(), Fr::from_u128(amount)])
            .await
    }

    /// Lock `amount` behind `secret_hash` until redeemed
    pub async fn mint_private(&self, amount: u128, secret_hash: Fr) -> Result<SentTx<'a, P>, PxeError> {
        self.send("mint_private", vec![Fr::from_u128(amount), secret_hash])
            .await
    }

    pub async fn redeem_shield(
        &self,
        to: AztecAddress,
        amount: u128,
        secret: &Secret,
    ) -> Result<SentTx<'a, P>, PxeError> {
        self.send(
            "redeem_shield",
            vec![to.to_fr(), Fr::from_u128(amount), secret.value()],
        )
        .await
    }

    pub async fn balance_of_public(&self, owner: AztecAddress) -> Result<u128, PxeError> {
        self.balance("balance_of_public", owner).await
    }

    pub async fn balance_of_private(&self, owner: AztecAddress) -> Result<u128, PxeError> {
        self.balance("balance_of_private", owner).await
    }

    /// Describe the pending shield created by a mined `mint_private` so the
    /// PXE can pick it up.
    pub fn pending_shield_note(
        &self,
        owner: AztecAddress,
        amount: u128,
        secret_hash: Fr,
        tx_hash: TxHash,
    ) -> ExtendedNote {
        ExtendedNote::new(
            Note::transparent(amount, secret_hash),
            owner,
            self.address,
            self.pending_shields_slot,
            self.transparent_note_id,
            tx_hash,
        )
    }

    async fn send(&self, function: &str, args: Vec<Fr>) -> Result<SentTx<'a, P>, PxeError> {
        let wallet = self.wallet.ok_or_else(|| PxeError::MissingWallet {
            function: function.to_string(),
        })?;
        let call = FunctionCall::new(self.address, function, args);
        let tx_hash = self.pxe.send_call(&call, wallet).await?;
        debug!("{} accepted as {}", function, tx_hash);
        Ok(SentTx::new(self.pxe, tx_hash))
    }

    async fn balance(&self, function: &str, owner: AztecAddress) -> Result<u128, PxeError> {
        let call = FunctionCall::new(self.address, function, vec![owner.to_fr()]);
        let value = self.pxe.simulate_call(&call, self.wallet).await?;
        decode_amount(function, &value)
    }
}

/// Amounts come back as a JSON number, a decimal string, or a hex field.
///
/// JSON numbers are only exact up to `u64::MAX`; larger amounts must arrive
/// as a string and are rejected otherwise rather than silently rounded.
pub fn decode_amount(function: &str, value: &Value) -> Result<u128, PxeError> {
    let unexpected = |reason: String| PxeError::UnexpectedResult {
        method: function.to_string(),
        reason,
    };

    match value {
        Value::Number(n) => match n.as_u64() {
            Some(amount) => Ok(u128::from(amount)),
            None if n.is_f64() && n.as_f64().is_some_and(|f| f >= u64::MAX as f64) => Err(
                unexpected(format!("{n} exceeds the exact range of a JSON number; send it as a string")),
            ),
            None => Err(unexpected(format!("{n} is not an unsigned integer"))),
        },
        Value::String(s) if s.starts_with("0x") => Fr::from_hex(s)
            .and_then(|f| f.to_u128())
            .map_err(|e| unexpected(e.to_string())),
        Value::String(s) => s
            .parse::<u128>()
            .map_err(|e| unexpected(format!("'{s}': {e}"))),
        other => Err(unexpected(format!("expected an amount, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryPxe;
    use serde_json::json;

    #[test]
    fn test_decode_amount_forms() {
        assert_eq!(decode_amount("f", &json!(100)).unwrap(), 100);
        assert_eq!(decode_amount("f", &json!("100")).unwrap(), 100);
        assert_eq!(decode_amount("f", &json!("0x64")).unwrap(), 100);
        assert_eq!(
            decode_amount("f", &json!("340282366920938463463374607431768211455")).unwrap(),
            u128::MAX
        );

        assert!(decode_amount("f", &json!(-1)).is_err());
        // beyond u64 a JSON number has already lost precision
        let err = decode_amount("f", &json!(1e20)).unwrap_err();
        assert!(err.to_string().contains("as a string"));
        assert_eq!(
            decode_amount("f", &json!("100000000000000000000")).unwrap(),
            100_000_000_000_000_000_000
        );
        assert!(decode_amount("f", &json!(1.5)).is_err());
        assert!(decode_amount("f", &json!("ten")).is_err());
        assert!(decode_amount("f", &json!(null)).is_err());
    }

    #[test]
    fn test_at_requires_every_operation() {
        let pxe = MemoryPxe::new(1);
        let mut artifact = MemoryPxe::token_artifact();
        artifact.functions.retain(|f| f.name != "redeem_shield");

        let err = TokenContract::at(AztecAddress::ZERO, artifact, &pxe).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::MissingFunction { function, .. } if function == "redeem_shield"
        ));
    }

    #[test]
    fn test_at_requires_shield_layout() {
        let pxe = MemoryPxe::new(1);

        let mut artifact = MemoryPxe::token_artifact();
        artifact.storage_layout.clear();
        let err = TokenContract::at(AztecAddress::ZERO, artifact, &pxe).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::MissingStorageSlot { slot, .. } if slot == PENDING_SHIELDS_SLOT
        ));

        let mut artifact = MemoryPxe::token_artifact();
        artifact.notes.clear();
        let err = TokenContract::at(AztecAddress::ZERO, artifact, &pxe).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::MissingNoteType { note, .. } if note == TRANSPARENT_NOTE
        ));
    }

    #[tokio::test]
    async fn test_send_requires_wallet() {
        let pxe = MemoryPxe::new(1);
        let token = pxe.deploy_token(AztecAddress(Fr::from_u64(0xbeef)));
        let contract = TokenContract::at(token, MemoryPxe::token_artifact(), &pxe).unwrap();

        let err = contract
            .mint_public(AztecAddress(Fr::from_u64(1)), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, PxeError::MissingWallet { function } if function == "mint_public"));
    }

    #[test]
    fn test_pending_shield_note_uses_artifact_layout() {
        let pxe = MemoryPxe::new(1);
        let artifact = MemoryPxe::token_artifact();
        let slot = artifact.storage_slot(PENDING_SHIELDS_SLOT).unwrap();
        let note_type = artifact.note_type_id(TRANSPARENT_NOTE).unwrap();

        let address = AztecAddress(Fr::from_u64(0xbeef));
        let owner = AztecAddress(Fr::from_u64(1));
        let contract = TokenContract::at(address, artifact, &pxe).unwrap();

        let note = contract.pending_shield_note(owner, 20, Fr::from_u64(9), TxHash([3u8; 32]));
        assert_eq!(note.storage_slot, slot);
        assert_eq!(note.note_type_id, note_type);
        assert_eq!(note.contract_address, address);
        assert_eq!(note.owner, owner);
        assert_eq!(note.note, Note::transparent(20, Fr::from_u64(9)));
    }
}

//! Compiled Contract Interface
//!
//! Only the parts of the artifact a client needs: function names and
//! parameter lists, the storage layout, and note type ids.
//!
//! ```json
//! {
//!   "name": "Token",
//!   "functions": [{ "name": "mint_public", "functionType": "open", "parameters": [...] }],
//!   "storageLayout": { "pending_shields": { "slot": "0x05" } },
//!   "notes": { "TransparentNote": { "id": "0x...", "typ": "TransparentNote" } }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use shieldmint_primitives::Fr;

use crate::{ArtifactError, read_json};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    pub name: String,
    #[serde(default)]
    pub functions: Vec<FunctionArtifact>,
    #[serde(default)]
    pub storage_layout: BTreeMap<String, StorageSlot>,
    #[serde(default)]
    pub notes: BTreeMap<String, NoteTypeInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionArtifact {
    pub name: String,
    #[serde(default)]
    pub function_type: Option<String>,
    #[serde(default)]
    pub is_internal: bool,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// ABI type description, kept opaque
    #[serde(rename = "type", default)]
    pub typ: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSlot {
    pub slot: Fr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteTypeInfo {
    pub id: Fr,
    #[serde(default)]
    pub typ: String,
}

impl ContractArtifact {
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let artifact: Self = read_json(path)?;
        log::debug!(
            "Loaded artifact '{}' ({} functions) from {}",
            artifact.name,
            artifact.functions.len(),
            path.display()
        );
        Ok(artifact)
    }

    pub fn storage_slot(&self, name: &str) -> Result<Fr, ArtifactError> {
        self.storage_layout
            .get(name)
            .map(|s| s.slot)
            .ok_or_else(|| ArtifactError::MissingStorageSlot {
                artifact: self.name.clone(),
                slot: name.to_string(),
            })
    }

    pub fn note_type_id(&self, name: &str) -> Result<Fr, ArtifactError> {
        self.notes
            .get(name)
            .map(|n| n.id)
            .ok_or_else(|| ArtifactError::MissingNoteType {
                artifact: self.name.clone(),
                note: name.to_string(),
            })
    }

    pub fn function(&self, name: &str) -> Result<&FunctionArtifact, ArtifactError> {
        self.functions
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| ArtifactError::MissingFunction {
                artifact: self.name.clone(),
                function: name.to_string(),
            })
    }

    /// Fail on the first function in `names` the artifact does not expose
    pub fn require_functions(&self, names: &[&str]) -> Result<(), ArtifactError> {
        for name in names {
            self.function(name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN_JSON: &str = r#"{
        "name": "Token",
        "functions": [
            { "name": "mint_public", "functionType": "open",
              "parameters": [{ "name": "to", "type": { "kind": "struct" } }, { "name": "amount" }] },
            { "name": "balance_of_public", "functionType": "unconstrained", "parameters": [{ "name": "owner" }] }
        ],
        "storageLayout": { "pending_shields": { "slot": "0x05" } },
        "notes": { "TransparentNote": { "id": "0x0c", "typ": "TransparentNote" } }
    }"#;

    fn token() -> ContractArtifact {
        serde_json::from_str(TOKEN_JSON).unwrap()
    }

    #[test]
    fn test_lookups() {
        let artifact = token();
        assert_eq!(artifact.storage_slot("pending_shields").unwrap(), Fr::from_u64(5));
        assert_eq!(artifact.note_type_id("TransparentNote").unwrap(), Fr::from_u64(12));

        let mint = artifact.function("mint_public").unwrap();
        assert_eq!(mint.function_type.as_deref(), Some("open"));
        assert_eq!(mint.parameters.len(), 2);
        assert!(mint.parameters[1].typ.is_null());
    }

    #[test]
    fn test_missing_entries() {
        let artifact = token();
        assert!(matches!(
            artifact.storage_slot("balances"),
            Err(ArtifactError::MissingStorageSlot { .. })
        ));
        assert!(matches!(
            artifact.note_type_id("ValueNote"),
            Err(ArtifactError::MissingNoteType { .. })
        ));

        let err = artifact
            .require_functions(&["mint_public", "redeem_shield"])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "artifact 'Token' has no function 'redeem_shield'"
        );
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token_contract-Token.json");
        std::fs::write(&path, TOKEN_JSON).unwrap();

        let artifact = ContractArtifact::load(&path).unwrap();
        assert_eq!(artifact, token());

        let missing = ContractArtifact::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, ArtifactError::Io { .. }));
    }
}

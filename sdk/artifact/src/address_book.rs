use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use shieldmint_primitives::AztecAddress;

use crate::{ArtifactError, read_json};

/// Deployed contract addresses keyed by logical name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressBook(BTreeMap<String, AztecAddress>);

impl AddressBook {
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let book: Self = read_json(path)?;
        log::debug!("Loaded {} contract address(es) from {}", book.0.len(), path.display());
        Ok(book)
    }

    pub fn address(&self, name: &str) -> Result<AztecAddress, ArtifactError> {
        self.0
            .get(name)
            .copied()
            .ok_or_else(|| ArtifactError::MissingAddress(name.to_string()))
    }
}

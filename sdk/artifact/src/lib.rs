//! Shieldmint Artifacts
//!
//! Local files that tell us where a contract lives and what it looks like:
//!
//! - `addresses.json`: logical contract name → deployed address
//! - `<crate>-<Contract>.json`: compiled interface (functions, storage
//!   layout, note type ids)
//!
//! Both are read once and never written.

pub mod address_book;
pub mod contract;

pub use address_book::AddressBook;
pub use contract::{ContractArtifact, FunctionArtifact, NoteTypeInfo, Parameter, StorageSlot};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no address recorded for contract '{0}'")]
    MissingAddress(String),

    #[error("artifact '{artifact}' has no storage slot '{slot}'")]
    MissingStorageSlot { artifact: String, slot: String },

    #[error("artifact '{artifact}' has no note type '{note}'")]
    MissingNoteType { artifact: String, note: String },

    #[error("artifact '{artifact}' has no function '{function}'")]
    MissingFunction { artifact: String, function: String },
}

pub(crate) fn read_json<T: serde::de::DeserializeOwned>(
    path: &std::path::Path,
) -> Result<T, ArtifactError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}

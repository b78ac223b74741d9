//! Shieldmint Notes
//!
//! Records for the two-step private mint:
//!
//! ```text
//! mint_private(amount, H(secret))   -> pending shield on chain
//! add_note(ExtendedNote)            -> PXE can now see the pending note
//! redeem_shield(to, amount, secret) -> private balance += amount
//! ```

pub mod note;
pub mod secret;

pub use note::{ExtendedNote, Note};
pub use secret::{GENERATOR_INDEX_SECRET_HASH, Secret, compute_secret_hash};

//! Shieldmint CLI
//!
//! The mint workflow lives here so it can be driven against any [`Pxe`]
//! implementation; `main.rs` only wires it to the configured node.
//!
//! [`Pxe`]: shieldmint_pxe::Pxe

pub mod workflow;

pub use workflow::{BalanceEntry, MintReport, RunReport, Visibility, Workflow};

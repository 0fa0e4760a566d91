//! Configuration types for the airdrop tool.
//!
//! This crate provides:
//! - The network-to-router table (which batched-transfer contract to use on which chain)
//! - Builder overrides for chains that are not known up front

pub mod router;

pub use router::{RouterEntry, RouterTable, RouterTableBuilder};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No router is configured for the connected chain
    #[error("No router configured for chain {0}, please use a supported chain")]
    UnsupportedChain(u64),

    /// The same chain appears twice in the router table
    #[error("Duplicate router entry for chain {0}")]
    DuplicateChain(u64),
}

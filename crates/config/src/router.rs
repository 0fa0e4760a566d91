//! Network-to-router table.
//!
//! Maps a chain id to the address of the batched-transfer router deployed
//! on that chain. A missing entry is a configuration error, surfaced as
//! [`ConfigError::UnsupportedChain`] before any wallet interaction.

use crate::ConfigError;
use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Chain id of a local anvil/hardhat node.
pub const LOCAL_CHAIN_ID: u64 = 31337;

/// First contract deployed by the default anvil account.
pub const LOCAL_ROUTER: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");

/// A single `[[routers]]` entry as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterEntry {
    /// Chain ID
    pub chain_id: u64,
    /// Router contract address on that chain
    pub address: Address,
}

/// Lookup table from chain id to router address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterTable {
    routers: BTreeMap<u64, Address>,
}

impl Default for RouterTable {
    fn default() -> Self {
        RouterTableBuilder::defaults().build()
    }
}

impl RouterTable {
    /// Defaults overlaid with the entries from a config file.
    ///
    /// Entries override defaults for the same chain, but a chain listed twice
    /// in `entries` is rejected since it is ambiguous which one was meant.
    pub fn with_entries(entries: &[RouterEntry]) -> Result<Self, ConfigError> {
        let mut seen = BTreeMap::new();
        for entry in entries {
            if seen.insert(entry.chain_id, entry.address).is_some() {
                return Err(ConfigError::DuplicateChain(entry.chain_id));
            }
        }

        let builder = seen
            .into_iter()
            .fold(RouterTableBuilder::defaults(), |builder, (chain_id, address)| {
                builder.router(chain_id, address)
            });

        Ok(builder.build())
    }

    /// Router address for a chain, if one is configured.
    pub fn get(&self, chain_id: u64) -> Option<Address> {
        self.routers.get(&chain_id).copied()
    }

    /// Router address for a chain, or `UnsupportedChain`.
    pub fn resolve(&self, chain_id: u64) -> Result<Address, ConfigError> {
        self.get(chain_id)
            .ok_or(ConfigError::UnsupportedChain(chain_id))
    }

    /// Configured chain ids in ascending order.
    pub fn chains(&self) -> impl Iterator<Item = u64> + '_ {
        self.routers.keys().copied()
    }
}

/// Builder for custom router tables.
#[derive(Debug, Clone)]
pub struct RouterTableBuilder {
    routers: BTreeMap<u64, Address>,
}

impl RouterTableBuilder {
    /// Start with no entries.
    pub const fn empty() -> Self {
        Self {
            routers: BTreeMap::new(),
        }
    }

    /// Start with the built-in entries (local development chain only).
    pub fn defaults() -> Self {
        Self::empty().router(LOCAL_CHAIN_ID, LOCAL_ROUTER)
    }

    /// Set or override the router for a chain.
    pub fn router(mut self, chain_id: u64, address: Address) -> Self {
        self.routers.insert(chain_id, address);
        self
    }

    /// Remove the router for a chain.
    pub fn without(mut self, chain_id: u64) -> Self {
        self.routers.remove(&chain_id);
        self
    }

    /// Build the router table.
    pub fn build(self) -> RouterTable {
        RouterTable {
            routers: self.routers,
        }
    }
}

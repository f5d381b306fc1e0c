//! Client library for managing Solana address lookup tables.
//!
//! A connected wallet can create a lookup table, extend an existing table
//! with more addresses, and inspect a table's contents. Extension is
//! duplicate-aware: candidates already stored in the table are detected
//! before anything is signed, and the caller decides whether to proceed
//! with the remaining unique addresses (see [workflow::ExtendWorkflow]).

use solana_address_lookup_table_program::state::AddressLookupTable;
use solana_sdk::{
    account::Account, address_lookup_table_account::AddressLookupTableAccount, clock::Slot,
    pubkey::Pubkey,
};

pub mod address;
pub mod analyzer;
pub mod error;
pub mod instructions;
pub mod network;
pub mod notifications;
pub mod view;

#[cfg(feature = "client")]
pub mod common;
#[cfg(feature = "client")]
pub mod reader;
#[cfg(feature = "client")]
pub mod wallet;
#[cfg(feature = "client")]
pub mod workflow;
#[cfg(feature = "client")]
pub mod writer;

pub use error::{ErrorKind, LutManagerError, LutManagerResult};
pub use solana_address_lookup_table_program::ID as LOOKUP_TABLE_ID;

/// The number of addresses a single lookup table can store.
pub const LOOKUP_TABLE_MAX_ADDRESSES: usize = 256;

/// The member addresses of a lookup table as read at a point in time.
///
/// A snapshot is never updated in place. After a mutation the table is
/// fetched again and a new snapshot replaces the old one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTableSnapshot {
    pub key: Pubkey,
    /// The stored addresses, in on-chain index order.
    ///
    /// This is kept as a list rather than a set: the lookup table program does
    /// not enforce uniqueness, and collapsing repeats would hide how full the
    /// table actually is.
    pub addresses: Vec<Pubkey>,
    /// `None` once the table has been frozen
    pub authority: Option<Pubkey>,
    pub deactivation_slot: Slot,
}

impl LookupTableSnapshot {
    /// Decode a snapshot from a raw account.
    ///
    /// Returns `None` if the account is not an initialized lookup table.
    pub fn from_account(key: Pubkey, account: &Account) -> Option<Self> {
        if account.owner != LOOKUP_TABLE_ID {
            return None;
        }
        let table = AddressLookupTable::deserialize(&account.data).ok()?;
        Some(Self {
            key,
            addresses: table.addresses.to_vec(),
            authority: table.meta.authority,
            deactivation_slot: table.meta.deactivation_slot,
        })
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Addresses that can still be appended before the table is full
    pub fn remaining_capacity(&self) -> usize {
        LOOKUP_TABLE_MAX_ADDRESSES.saturating_sub(self.addresses.len())
    }

    pub fn is_frozen(&self) -> bool {
        self.authority.is_none()
    }

    pub fn is_active(&self) -> bool {
        self.deactivation_slot == Slot::MAX
    }
}

impl From<LookupTableSnapshot> for AddressLookupTableAccount {
    fn from(value: LookupTableSnapshot) -> Self {
        AddressLookupTableAccount {
            key: value.key,
            addresses: value.addresses,
        }
    }
}

pub fn derive_lookup_table_address(authority: &Pubkey, recent_block_slot: Slot) -> Pubkey {
    solana_address_lookup_table_program::instruction::derive_lookup_table_address(
        authority,
        recent_block_slot,
    )
    .0
}


#[cfg(all(test, feature = "client"))]
pub(crate) mod test_utils;

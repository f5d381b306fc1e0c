//! An in-memory chain for exercising the client without a validator.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use anyhow::anyhow;
use async_trait::async_trait;
use solana_address_lookup_table_program::instruction::ProgramInstruction;
use solana_sdk::{
    clock::Slot, hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction,
};
use tokio::sync::Notify;

use crate::{
    common::{BlockReference, ChainClient, ChainError},
    error::WalletError,
    wallet::Wallet,
    LookupTableSnapshot, LOOKUP_TABLE_ID,
};

pub(crate) const MOCK_SLOT: Slot = 188227418;

#[derive(Default)]
pub(crate) struct MockChain {
    tables: Mutex<HashMap<Pubkey, LookupTableSnapshot>>,
    reads: AtomicUsize,
    submissions: Mutex<Vec<Transaction>>,
    read_failure: Mutex<Option<String>>,
    submit_failure: Mutex<Option<String>>,
    held_reads: Mutex<HashMap<Pubkey, Arc<Notify>>>,
    held_submissions: Mutex<Option<Arc<Notify>>>,
}

impl MockChain {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn insert_table(&self, key: Pubkey, addresses: Vec<Pubkey>) {
        self.tables.lock().unwrap().insert(
            key,
            LookupTableSnapshot {
                key,
                addresses,
                authority: None,
                deactivation_slot: Slot::MAX,
            },
        );
    }

    pub(crate) fn table(&self, key: &Pubkey) -> Option<LookupTableSnapshot> {
        self.tables.lock().unwrap().get(key).cloned()
    }

    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub(crate) fn submissions(&self) -> Vec<Transaction> {
        self.submissions.lock().unwrap().clone()
    }

    /// Every `ExtendLookupTable` payload submitted so far
    pub(crate) fn extended(&self) -> Vec<Vec<Pubkey>> {
        self.submissions()
            .iter()
            .flat_map(|tx| decode_instructions(tx))
            .filter_map(|(_, ix)| match ix {
                ProgramInstruction::ExtendLookupTable { new_addresses } => Some(new_addresses),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn fail_reads(&self, message: Option<&str>) {
        *self.read_failure.lock().unwrap() = message.map(str::to_string);
    }

    pub(crate) fn fail_submissions(&self, message: Option<&str>) {
        *self.submit_failure.lock().unwrap() = message.map(str::to_string);
    }

    /// Reads of `table` wait until the returned handle is notified
    pub(crate) fn hold_reads(&self, table: Pubkey) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.held_reads.lock().unwrap().insert(table, notify.clone());
        notify
    }

    /// Let the held read of `table` finish and stop holding later ones
    pub(crate) fn release_reads(&self, table: &Pubkey) {
        if let Some(notify) = self.held_reads.lock().unwrap().remove(table) {
            notify.notify_one();
        }
    }

    /// Submissions wait until the returned handle is notified
    pub(crate) fn hold_submissions(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.held_submissions.lock().unwrap() = Some(notify.clone());
        notify
    }

    fn apply(&self, transaction: &Transaction) {
        let mut tables = self.tables.lock().unwrap();
        for (accounts, ix) in decode_instructions(transaction) {
            match ix {
                ProgramInstruction::CreateLookupTable { .. } => {
                    tables.insert(
                        accounts[0],
                        LookupTableSnapshot {
                            key: accounts[0],
                            addresses: vec![],
                            authority: Some(accounts[1]),
                            deactivation_slot: Slot::MAX,
                        },
                    );
                }
                ProgramInstruction::ExtendLookupTable { new_addresses } => {
                    if let Some(table) = tables.get_mut(&accounts[0]) {
                        table.addresses.extend(new_addresses);
                    }
                }
                _ => {}
            }
        }
    }
}

/// Decode the lookup table instructions of a transaction with their accounts
fn decode_instructions(transaction: &Transaction) -> Vec<(Vec<Pubkey>, ProgramInstruction)> {
    let keys = &transaction.message.account_keys;
    transaction
        .message
        .instructions
        .iter()
        .filter(|ix| keys[ix.program_id_index as usize] == LOOKUP_TABLE_ID)
        .map(|ix| {
            let accounts = ix.accounts.iter().map(|i| keys[*i as usize]).collect();
            (accounts, bincode::deserialize(&ix.data).unwrap())
        })
        .collect()
}

#[async_trait]
impl ChainClient for MockChain {
    async fn get_lookup_table(&self, address: &Pubkey) -> Result<LookupTableSnapshot, ChainError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let held = self.held_reads.lock().unwrap().get(address).cloned();
        if let Some(notify) = held {
            notify.notified().await;
        }
        if let Some(message) = self.read_failure.lock().unwrap().clone() {
            return Err(anyhow!(message).into());
        }
        self.table(address).ok_or(ChainError::AccountNotFound)
    }

    async fn get_recent_block_reference(&self) -> Result<BlockReference, ChainError> {
        Ok(BlockReference {
            slot: MOCK_SLOT,
            blockhash: Hash::new_unique(),
        })
    }

    async fn submit_and_confirm(&self, transaction: &Transaction) -> Result<Signature, ChainError> {
        let held = self.held_submissions.lock().unwrap().clone();
        if let Some(notify) = held {
            notify.notified().await;
        }
        if let Some(message) = self.submit_failure.lock().unwrap().clone() {
            return Err(anyhow!(message).into());
        }
        transaction
            .verify()
            .map_err(|e| anyhow!("signature verification failed: {e}"))?;
        self.submissions.lock().unwrap().push(transaction.clone());
        self.apply(transaction);
        Ok(transaction.signatures[0])
    }
}

/// A wallet whose user declines every request
pub(crate) struct RejectingWallet(pub Pubkey);

#[async_trait]
impl Wallet for RejectingWallet {
    fn public_key(&self) -> Option<Pubkey> {
        Some(self.0)
    }

    async fn sign_transaction(&self, _: Transaction) -> Result<Transaction, WalletError> {
        Err(WalletError::Rejected("User rejected the request.".to_string()))
    }
}

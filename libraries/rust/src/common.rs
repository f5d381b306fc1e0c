use async_trait::async_trait;
use solana_client::{client_error::ClientError, nonblocking::rpc_client::RpcClient};
use solana_sdk::{
    clock::Slot, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::{Transaction, TransactionError},
};

use crate::{error::LutManagerError, LookupTableSnapshot};

/// What a creation request needs from the chain to be built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockReference {
    /// Used to derive a new table's address
    pub slot: Slot,
    pub blockhash: Hash,
}

/// The chain operations the lookup table manager relies on.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn get_lookup_table(&self, address: &Pubkey) -> Result<LookupTableSnapshot, ChainError>;

    async fn get_recent_block_reference(&self) -> Result<BlockReference, ChainError>;

    /// Submit a signed transaction and wait until it is confirmed
    async fn submit_and_confirm(&self, transaction: &Transaction) -> Result<Signature, ChainError>;
}

#[async_trait]
impl ChainClient for RpcClient {
    async fn get_lookup_table(&self, address: &Pubkey) -> Result<LookupTableSnapshot, ChainError> {
        let account = self
            .get_account_with_commitment(address, self.commitment())
            .await?
            .value
            .ok_or(ChainError::AccountNotFound)?;
        LookupTableSnapshot::from_account(*address, &account).ok_or(ChainError::AccountNotFound)
    }

    async fn get_recent_block_reference(&self) -> Result<BlockReference, ChainError> {
        let slot = self.get_slot().await?;
        let blockhash = self.get_latest_blockhash().await?;
        Ok(BlockReference { slot, blockhash })
    }

    async fn submit_and_confirm(&self, transaction: &Transaction) -> Result<Signature, ChainError> {
        self.send_and_confirm_transaction(transaction)
            .await
            .map_err(Into::into)
    }
}

#[derive(Debug)]
pub enum ChainError {
    AccountNotFound,
    Custom(anyhow::Error),
}

impl From<ClientError> for ChainError {
    fn from(value: ClientError) -> Self {
        if value.get_transaction_error() == Some(TransactionError::AccountNotFound) {
            ChainError::AccountNotFound
        } else {
            ChainError::Custom(anyhow::anyhow!(value))
        }
    }
}

impl From<anyhow::Error> for ChainError {
    fn from(value: anyhow::Error) -> Self {
        ChainError::Custom(value)
    }
}

impl ChainError {
    /// Convert a failed read of `table`, keeping "no such table" distinct.
    pub fn into_lookup_error(self, table: Pubkey) -> LutManagerError {
        match self {
            ChainError::AccountNotFound => LutManagerError::NotFound(table),
            ChainError::Custom(e) => LutManagerError::Transport(e),
        }
    }
}

impl From<ChainError> for LutManagerError {
    fn from(value: ChainError) -> Self {
        match value {
            // Outside of a table read this means the payer or another
            // referenced account is missing, which the node rejects.
            ChainError::AccountNotFound => {
                LutManagerError::Transport(anyhow::anyhow!("Account not found"))
            }
            ChainError::Custom(e) => LutManagerError::Transport(e),
        }
    }
}

impl From<ClientError> for LutManagerError {
    fn from(value: ClientError) -> Self {
        ChainError::from(value).into()
    }
}

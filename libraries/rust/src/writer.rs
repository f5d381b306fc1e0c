//! Helpers to create and extend lookup tables with a connected wallet

use std::{ops::Deref, sync::Arc};

use solana_sdk::{
    instruction::Instruction, message::Message, pubkey::Pubkey, signature::Signature,
    transaction::Transaction,
};

use crate::{
    address::parse_address_list,
    common::{BlockReference, ChainClient},
    error::{LutManagerResult, ValidationError, WalletError},
    instructions::InstructionBuilder,
    wallet::Wallet,
    LOOKUP_TABLE_MAX_ADDRESSES,
};

/// The result of creating a lookup table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTable {
    pub address: Pubkey,
    pub signature: Signature,
    pub addresses: Vec<Pubkey>,
}

/// A writer client that creates and extends lookup tables owned by the
/// connected wallet. The wallet is both authority and payer.
pub struct LookupTableWriter<A> {
    rpc: A,
    wallet: Arc<dyn Wallet>,
}

impl<A: Clone> Clone for LookupTableWriter<A> {
    fn clone(&self) -> Self {
        Self {
            rpc: self.rpc.clone(),
            wallet: self.wallet.clone(),
        }
    }
}

impl<A> LookupTableWriter<A> {
    pub fn new(rpc: A, wallet: Arc<dyn Wallet>) -> Self {
        Self { rpc, wallet }
    }

    pub fn wallet(&self) -> &Arc<dyn Wallet> {
        &self.wallet
    }

    fn builder(&self) -> Result<InstructionBuilder, WalletError> {
        let authority = self.wallet.public_key().ok_or(WalletError::NotConnected)?;
        Ok(InstructionBuilder::new(authority, authority))
    }
}

impl<A: Deref<Target = X>, X: ChainClient + ?Sized> LookupTableWriter<A> {
    /// Create a lookup table holding the addresses in `input`, one per line.
    ///
    /// The table is created and filled in a single transaction.
    pub async fn create_lookup_table(&self, input: &str) -> LutManagerResult<CreatedTable> {
        let addresses = parse_address_list(input)?;
        if addresses.len() > LOOKUP_TABLE_MAX_ADDRESSES {
            return Err(ValidationError::CapacityExceeded(addresses.len()).into());
        }
        let builder = self.builder()?;

        let block = self.rpc.get_recent_block_reference().await?;
        let (create_ix, table) = builder.create_lookup_table(block.slot);
        let extend_ix = builder.extend_lookup_table(table, &addresses);

        let signature = self
            .send_transaction(&builder, &[create_ix, extend_ix], block)
            .await?;
        tracing::info!(%table, %signature, addresses = addresses.len(), "created lookup table");

        Ok(CreatedTable {
            address: table,
            signature,
            addresses,
        })
    }

    /// Append `addresses` to a lookup table exactly as given.
    pub async fn extend_lookup_table(
        &self,
        lookup_table: Pubkey,
        addresses: &[Pubkey],
    ) -> LutManagerResult<Signature> {
        if addresses.is_empty() {
            return Err(ValidationError::NothingToAdd.into());
        }
        let builder = self.builder()?;
        let ix = builder.extend_lookup_table(lookup_table, addresses);

        let block = self.rpc.get_recent_block_reference().await?;
        let signature = self.send_transaction(&builder, &[ix], block).await?;
        tracing::info!(%lookup_table, %signature, addresses = addresses.len(), "extended lookup table");

        Ok(signature)
    }

    async fn send_transaction(
        &self,
        builder: &InstructionBuilder,
        instructions: &[Instruction],
        block: BlockReference,
    ) -> LutManagerResult<Signature> {
        let message =
            Message::new_with_blockhash(instructions, Some(&builder.payer), &block.blockhash);
        let transaction = self
            .wallet
            .sign_transaction(Transaction::new_unsigned(message))
            .await?;

        Ok(self.rpc.submit_and_confirm(&transaction).await?)
    }
}

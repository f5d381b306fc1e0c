use std::path::Path;

use anyhow::anyhow;
use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair},
    signer::{Signer, SignerError},
    transaction::Transaction,
};

use crate::error::WalletError;

/// The signing side of a connected wallet.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// `None` when no wallet is connected
    fn public_key(&self) -> Option<Pubkey>;

    /// Sign a transaction whose fee payer is [Wallet::public_key].
    async fn sign_transaction(&self, transaction: Transaction) -> Result<Transaction, WalletError>;
}

/// A wallet backed by a local keypair. Without a keypair it behaves as a
/// disconnected wallet.
#[derive(Debug, Default)]
pub struct KeypairWallet {
    keypair: Option<Keypair>,
}

impl KeypairWallet {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair: Some(keypair),
        }
    }

    pub fn disconnected() -> Self {
        Self { keypair: None }
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let keypair = read_keypair_file(path)
            .map_err(|e| anyhow!("failed to read keypair {}: {e}", path.display()))?;
        Ok(Self::new(keypair))
    }
}

#[async_trait]
impl Wallet for KeypairWallet {
    fn public_key(&self) -> Option<Pubkey> {
        self.keypair.as_ref().map(Signer::pubkey)
    }

    async fn sign_transaction(
        &self,
        mut transaction: Transaction,
    ) -> Result<Transaction, WalletError> {
        let Some(keypair) = &self.keypair else {
            return Err(WalletError::NotConnected);
        };
        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_sign(&[keypair], blockhash)
            .map_err(|e| match e {
                SignerError::UserCancel(reason) => WalletError::Rejected(reason),
                other => WalletError::SigningUnavailable(other.to_string()),
            })?;
        Ok(transaction)
    }
}

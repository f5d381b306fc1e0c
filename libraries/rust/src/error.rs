use solana_sdk::pubkey::Pubkey;

/// Input problems caught locally. These never reach the network.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter at least one address")]
    EmptyInput,
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("LUT address is required")]
    MissingTable,
    #[error("Invalid LUT address: {0}")]
    InvalidTable(String),
    #[error("No new addresses to add")]
    NothingToAdd,
    #[error("Lookup table would hold {0} addresses, the limit is 256")]
    CapacityExceeded(usize),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Wallet not connected")]
    NotConnected,
    #[error("Request rejected by wallet: {0}")]
    Rejected(String),
    #[error("Signing unavailable: {0}")]
    SigningUnavailable(String),
}

#[derive(thiserror::Error, Debug)]
pub enum LutManagerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error("LUT not found: {0}")]
    NotFound(Pubkey),
    /// RPC unreachable, submission failed, or confirmation timed out
    #[error("{0:#}")]
    Transport(anyhow::Error),
}

pub type LutManagerResult<T> = Result<T, LutManagerError>;

/// The coarse error class, used to decide how a failure is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Wallet,
    Transport,
    NotFound,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Wallet => "wallet",
            ErrorKind::Transport => "transport",
            ErrorKind::NotFound => "not_found",
        }
    }
}

impl LutManagerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LutManagerError::Validation(_) => ErrorKind::Validation,
            LutManagerError::Wallet(_) => ErrorKind::Wallet,
            LutManagerError::NotFound(_) => ErrorKind::NotFound,
            LutManagerError::Transport(_) => ErrorKind::Transport,
        }
    }
}

impl From<anyhow::Error> for LutManagerError {
    fn from(value: anyhow::Error) -> Self {
        LutManagerError::Transport(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_variants() {
        let err: LutManagerError = ValidationError::EmptyInput.into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "Please enter at least one address");

        let err: LutManagerError = WalletError::NotConnected.into();
        assert_eq!(err.kind(), ErrorKind::Wallet);

        let err: LutManagerError = anyhow::anyhow!("connection refused")
            .context("get_latest_blockhash")
            .into();
        assert_eq!(err.kind(), ErrorKind::Transport);
        // the whole chain reaches the user
        assert_eq!(err.to_string(), "get_latest_blockhash: connection refused");
    }
}

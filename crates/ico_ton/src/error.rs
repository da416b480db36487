//! Deployment error types.

use crate::wallet::WalletError;

/// Errors a deployment run can end with.
///
/// Everything except [`DeployError::Wallet`] is raised before the wallet is
/// contacted, so no on-chain side effect has happened.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// A message or metadata field violates the binary format.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The sale window ends before it starts.
    #[error("invalid sale window: start_time {start_time} is after end_time {end_time}")]
    InvalidWindow { start_time: u64, end_time: u64 },

    /// Contract code or data cannot form a valid StateInit.
    #[error("malformed contract init: {0}")]
    MalformedInit(String),

    /// Surfaced unchanged from the wallet collaborator.
    #[error(transparent)]
    Wallet(#[from] WalletError),
}

impl DeployError {
    pub(crate) fn encoding(err: everscale_types::error::Error) -> Self {
        Self::Encoding(err.to_string())
    }

    pub(crate) fn malformed(err: impl std::fmt::Display) -> Self {
        Self::MalformedInit(err.to_string())
    }

    /// Whether the run stopped before any wallet interaction.
    pub fn is_pre_network(&self) -> bool {
        !matches!(self, Self::Wallet(_))
    }
}

//! The wallet collaborator: nonce, balance and signed submission.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use everscale_types::models::StdAddr;
use serde::{Deserialize, Serialize};

use ico_core::{ClassifiedCategory, classify_message};

use crate::message::OutboundMessage;

/// Errors surfaced by a wallet. The orchestrator passes them through
/// unchanged and never retries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("stale seqno {seqno}: the wallet has already advanced")]
    StaleNonce { seqno: u32 },

    #[error("insufficient balance: {balance} nano available, {required} nano required")]
    InsufficientBalance { balance: u128, required: u128 },

    #[error("network error: {0}")]
    Network(String),

    #[error("transfer rejected: {0}")]
    Rejected(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("invalid transfer: {0}")]
    InvalidTransfer(String),
}

/// What the wallet knew about a transfer when it submitted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferContext {
    pub seqno: u32,
    /// Balance read right before submission, in nano units.
    pub balance: u128,
    /// Total value attached to the transfer, in nano units.
    pub required: u128,
}

impl WalletError {
    /// Map a node-side failure message onto a wallet error kind.
    pub fn from_node_message(ctx: &TransferContext, message: &str) -> Self {
        match classify_message(message).category {
            ClassifiedCategory::StaleNonce => Self::StaleNonce { seqno: ctx.seqno },
            ClassifiedCategory::InsufficientBalance => Self::InsufficientBalance {
                balance: ctx.balance,
                required: ctx.required,
            },
            ClassifiedCategory::Network => Self::Network(message.to_string()),
            _ => Self::Rejected(message.to_string()),
        }
    }
}

/// Proof that a transfer was accepted for broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub seqno: u32,
    /// Hex representation hash of the submitted external message.
    pub message_hash: String,
    pub submitted_at: DateTime<Utc>,
}

/// A sender wallet. Holds its own key; callers never see it.
#[async_trait]
pub trait WalletClient: Send + Sync {
    fn address(&self) -> &StdAddr;

    async fn seqno(&self) -> Result<u32, WalletError>;

    /// Spendable balance in nano units.
    async fn balance(&self) -> Result<u128, WalletError>;

    /// Sign `messages` under `seqno` as one transfer and submit it.
    async fn send_transfer(
        &self,
        seqno: u32,
        messages: &[OutboundMessage],
    ) -> Result<SubmissionReceipt, WalletError>;
}

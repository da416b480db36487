//! Wallet v4r2 over the v4 node API.

use async_trait::async_trait;
use chrono::Utc;
use everscale_types::error::Error;
use everscale_types::models::StdAddr;
use everscale_types::prelude::*;
use tracing::{debug, info, warn};

use crate::message::{OutboundMessage, external_message};
use crate::node::{NodeClient, NodeError};
use crate::wallet::{SubmissionReceipt, TransferContext, WalletClient, WalletError};

/// Default subwallet id for basechain wallets; other workchains add theirs.
pub const DEFAULT_SUBWALLET_ID: u32 = 698_983_191;

/// A v4 wallet accepts at most four messages per transfer.
pub const MAX_MESSAGES: usize = 4;

/// Pay forwarding fees separately from the attached value.
pub const SEND_MODE_PAY_GAS_SEPARATELY: u8 = 1;
pub const SEND_MODE_IGNORE_ERRORS: u8 = 2;

const DEFAULT_VALIDITY_SECS: u32 = 60;
const OP_SIMPLE_SEND: u8 = 0;

/// Produces ed25519 signatures over a transfer hash. Key material stays
/// inside the implementation.
pub trait TransferSigner: Send + Sync {
    fn sign(&self, digest: &[u8; 32]) -> Result<[u8; 64], WalletError>;
}

/// A v4r2 wallet identified by its address, signing through `S`.
pub struct WalletV4<S> {
    address: StdAddr,
    subwallet_id: u32,
    send_mode: u8,
    validity_secs: u32,
    node: NodeClient,
    signer: S,
}

/// The signed part of a v4 transfer.
struct Payload<'a> {
    subwallet_id: u32,
    valid_until: u32,
    seqno: u32,
    send_mode: u8,
    messages: &'a [Cell],
}

impl Payload<'_> {
    fn write(&self, b: &mut CellBuilder) -> Result<(), Error> {
        b.store_u32(self.subwallet_id)?;
        b.store_u32(self.valid_until)?;
        b.store_u32(self.seqno)?;
        b.store_u8(OP_SIMPLE_SEND)?;
        for message in self.messages {
            b.store_u8(self.send_mode)?;
            b.store_reference(message.clone())?;
        }
        Ok(())
    }

    fn to_cell(&self) -> Result<Cell, Error> {
        let mut b = CellBuilder::new();
        self.write(&mut b)?;
        b.build()
    }

    fn signed(&self, signature: &[u8; 64]) -> Result<Cell, Error> {
        let mut b = CellBuilder::new();
        b.store_raw(signature, 512)?;
        self.write(&mut b)?;
        b.build()
    }
}

impl<S: TransferSigner> WalletV4<S> {
    pub fn new(address: StdAddr, node: NodeClient, signer: S) -> Self {
        let subwallet_id = DEFAULT_SUBWALLET_ID.wrapping_add(address.workchain as u32);
        Self {
            address,
            subwallet_id,
            send_mode: SEND_MODE_PAY_GAS_SEPARATELY,
            validity_secs: DEFAULT_VALIDITY_SECS,
            node,
            signer,
        }
    }

    pub fn with_send_mode(mut self, send_mode: u8) -> Self {
        self.send_mode = send_mode;
        self
    }

    pub fn with_validity(mut self, secs: u32) -> Self {
        self.validity_secs = secs;
        self
    }

    pub fn subwallet_id(&self) -> u32 {
        self.subwallet_id
    }

    /// Build the signed external message for `messages` at time `now`.
    pub fn build_transfer(
        &self,
        seqno: u32,
        messages: &[OutboundMessage],
        now: u32,
    ) -> Result<Cell, WalletError> {
        let cells = message_cells(messages)?;
        self.assemble(seqno, &cells, now)
    }

    fn assemble(&self, seqno: u32, cells: &[Cell], now: u32) -> Result<Cell, WalletError> {
        let valid_until = if seqno == 0 {
            u32::MAX
        } else {
            now.saturating_add(self.validity_secs)
        };
        let payload = self.payload(seqno, valid_until, cells);

        let unsigned = payload.to_cell().map_err(invalid_transfer)?;
        let signature = self.signer.sign(&unsigned.repr_hash().0)?;

        let body = payload.signed(&signature).map_err(invalid_transfer)?;
        external_message(&self.address, body).map_err(invalid_transfer)
    }

    fn payload<'a>(&self, seqno: u32, valid_until: u32, messages: &'a [Cell]) -> Payload<'a> {
        Payload {
            subwallet_id: self.subwallet_id,
            valid_until,
            seqno,
            send_mode: self.send_mode,
            messages,
        }
    }
}

/// Serialize every message, enforcing the v4 message count.
fn message_cells(messages: &[OutboundMessage]) -> Result<Vec<Cell>, WalletError> {
    if messages.is_empty() || messages.len() > MAX_MESSAGES {
        return Err(WalletError::InvalidTransfer(format!(
            "a v4 transfer carries 1 to {MAX_MESSAGES} messages, got {}",
            messages.len()
        )));
    }
    messages
        .iter()
        .map(|m| m.to_cell().map_err(invalid_transfer))
        .collect()
}

#[async_trait]
impl<S: TransferSigner> WalletClient for WalletV4<S> {
    fn address(&self) -> &StdAddr {
        &self.address
    }

    async fn seqno(&self) -> Result<u32, WalletError> {
        self.node
            .wallet_seqno(&self.address)
            .await
            .map_err(|e| node_error(None, e))
    }

    async fn balance(&self) -> Result<u128, WalletError> {
        self.node
            .balance(&self.address)
            .await
            .map_err(|e| node_error(None, e))
    }

    async fn send_transfer(
        &self,
        seqno: u32,
        messages: &[OutboundMessage],
    ) -> Result<SubmissionReceipt, WalletError> {
        let required = messages
            .iter()
            .try_fold(0u128, |acc, m| acc.checked_add(m.value))
            .ok_or_else(|| WalletError::InvalidTransfer("attached value overflows".into()))?;
        let cells = message_cells(messages)?;

        let current = self.seqno().await?;
        if current != seqno {
            warn!(expected = seqno, current, "Wallet seqno moved before submission");
            return Err(WalletError::StaleNonce { seqno });
        }
        let balance = self.balance().await?;
        if balance < required {
            return Err(WalletError::InsufficientBalance { balance, required });
        }

        let now = u32::try_from(Utc::now().timestamp()).unwrap_or(u32::MAX);
        let external = self.assemble(seqno, &cells, now)?;
        debug!(seqno, messages = messages.len(), "Submitting wallet transfer");

        let ctx = TransferContext {
            seqno,
            balance,
            required,
        };
        self.node
            .send_message(&external)
            .await
            .map_err(|e| node_error(Some(&ctx), e))?;

        let receipt = SubmissionReceipt {
            seqno,
            message_hash: external.repr_hash().to_string(),
            submitted_at: Utc::now(),
        };
        info!(
            wallet = %self.address,
            seqno,
            message_hash = %receipt.message_hash,
            "Transfer accepted by node"
        );
        Ok(receipt)
    }
}

fn invalid_transfer(err: Error) -> WalletError {
    WalletError::InvalidTransfer(err.to_string())
}

fn node_error(ctx: Option<&TransferContext>, err: NodeError) -> WalletError {
    match err {
        NodeError::Timeout | NodeError::Network(_) => WalletError::Network(err.to_string()),
        NodeError::Status { status, .. } if status >= 500 => WalletError::Network(err.to_string()),
        NodeError::Status { ref body, .. } => match ctx {
            Some(ctx) => WalletError::from_node_message(ctx, body),
            None => WalletError::Rejected(err.to_string()),
        },
        NodeError::Decode(_) => WalletError::Network(err.to_string()),
    }
}

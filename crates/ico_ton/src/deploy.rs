//! Deployment orchestration: derive the contract address, encode the mint and
//! sale setup messages, and submit both in one wallet transfer.

use std::sync::Arc;

use anyhow::Context;
use everscale_types::models::StdAddr;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use ico_core::{DeployConfig, from_nano};

use crate::address::AddressExt;
use crate::codec::{check_coins, encode_mint, encode_setup_ico};
use crate::contract::{ContractCode, ContractInit};
use crate::error::DeployError;
use crate::lock::DeploymentLocks;
use crate::message::{MessageSummary, OutboundMessage};
use crate::metadata::{MetadataEncoder, TokenMetadata};
use crate::wallet::{SubmissionReceipt, WalletClient};

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Sale configuration sent in `SetupICO`. Amounts are nano units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaleParams {
    pub price: u128,
    pub start_time: u64,
    pub end_time: u64,
    pub hard_cap: u128,
}

/// Everything a deployment needs besides the code and the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployParams {
    pub workchain: i8,
    pub metadata: TokenMetadata,
    pub max_supply: u128,
    /// Minted to the deployer.
    pub initial_mint: u128,
    pub sale: SaleParams,
    /// Value attached to each of the two messages.
    pub message_value: u128,
}

impl DeployParams {
    /// Convert decimal config amounts into nano units.
    ///
    /// The sale window is copied as is; an inverted window is reported by the
    /// encoder when the batch is prepared.
    pub fn from_config(config: &DeployConfig) -> anyhow::Result<Self> {
        let amounts = config.amounts().context("invalid deployment amounts")?;
        Ok(Self {
            workchain: config.workchain,
            metadata: config.metadata.clone(),
            max_supply: amounts.max_supply,
            initial_mint: amounts.initial_mint,
            sale: SaleParams {
                price: amounts.price,
                start_time: config.start_time,
                end_time: config.end_time,
                hard_cap: amounts.hard_cap,
            },
            message_value: amounts.message_value,
        })
    }
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// The two messages of a deployment: `Mint` first, then `SetupICO`. Both
/// target the derived address and carry the same init.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentBatch {
    address: StdAddr,
    init: ContractInit,
    messages: [OutboundMessage; 2],
}

impl DeploymentBatch {
    fn new(
        init: ContractInit,
        address: StdAddr,
        mint: OutboundMessage,
        setup: OutboundMessage,
    ) -> Self {
        Self {
            address,
            init,
            messages: [mint, setup],
        }
    }

    pub fn address(&self) -> &StdAddr {
        &self.address
    }

    pub fn init(&self) -> &ContractInit {
        &self.init
    }

    pub fn messages(&self) -> &[OutboundMessage; 2] {
        &self.messages
    }

    pub fn mint(&self) -> &OutboundMessage {
        &self.messages[0]
    }

    pub fn setup_ico(&self) -> &OutboundMessage {
        &self.messages[1]
    }

    /// Value attached across both messages, before fees.
    pub fn total_value(&self) -> u128 {
        self.messages
            .iter()
            .fold(0u128, |acc, m| acc.saturating_add(m.value))
    }

    pub fn summaries(&self) -> [MessageSummary; 2] {
        [self.messages[0].summary(), self.messages[1].summary()]
    }
}

/// Build the batch without touching the network. Any failure here happens
/// before the wallet is asked for anything.
pub async fn prepare_deployment(
    params: &DeployParams,
    code: &ContractCode,
    owner: &StdAddr,
    metadata: &dyn MetadataEncoder,
) -> Result<DeploymentBatch, DeployError> {
    check_coins("message_value", params.message_value)?;
    let content = metadata.build_onchain_metadata(&params.metadata).await?;
    let init = ContractInit::new(params.workchain, code, owner, content, params.max_supply)?;
    let address = init.address()?;

    let mint_body = encode_mint(params.initial_mint, owner)?;
    let setup_body = encode_setup_ico(
        params.sale.price,
        params.sale.start_time,
        params.sale.end_time,
        params.sale.hard_cap,
    )?;

    let message = |body| OutboundMessage {
        to: address.clone(),
        value: params.message_value,
        bounce: true,
        init: Some(init.clone()),
        body,
    };
    let mint = message(mint_body);
    let setup = message(setup_body);
    for message in [&mint, &setup] {
        message.to_cell().map_err(DeployError::encoding)?;
    }
    Ok(DeploymentBatch::new(init, address, mint, setup))
}

// ---------------------------------------------------------------------------
// Deployer
// ---------------------------------------------------------------------------

/// Outcome of a submitted deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentReport {
    pub run_id: Uuid,
    #[serde(serialize_with = "crate::address::serialize_raw")]
    pub address: StdAddr,
    /// Seqno the transfer was signed under.
    pub seqno: u32,
    /// Wallet balance observed just before submission, nano units.
    pub balance: u128,
    pub receipt: SubmissionReceipt,
}

pub struct Deployer {
    params: DeployParams,
    code: ContractCode,
    wallet: Arc<dyn WalletClient>,
    metadata: Arc<dyn MetadataEncoder>,
    locks: Option<DeploymentLocks>,
}

impl Deployer {
    pub fn new(
        params: DeployParams,
        code: ContractCode,
        wallet: Arc<dyn WalletClient>,
        metadata: Arc<dyn MetadataEncoder>,
    ) -> Self {
        Self {
            params,
            code,
            wallet,
            metadata,
            locks: None,
        }
    }

    /// Serialize this deployer's runs with others sharing `locks`.
    pub fn with_locks(mut self, locks: DeploymentLocks) -> Self {
        self.locks = Some(locks);
        self
    }

    pub fn params(&self) -> &DeployParams {
        &self.params
    }

    /// Prepare the batch with the wallet as owner and mint receiver.
    pub async fn prepare(&self) -> Result<DeploymentBatch, DeployError> {
        prepare_deployment(
            &self.params,
            &self.code,
            self.wallet.address(),
            self.metadata.as_ref(),
        )
        .await
    }

    /// Prepare, then submit both messages in a single transfer under the
    /// wallet's current seqno. Wallet errors are returned as they come.
    pub async fn deploy(&self) -> Result<DeploymentReport, DeployError> {
        let run_id = Uuid::new_v4();
        let sender = self.wallet.address().clone();

        let batch = self.prepare().await?;
        let address = batch.address().clone();
        info!(
            %run_id,
            address = %address.to_friendly(true, false),
            raw = %address,
            "Derived contract address"
        );

        let _guard = match &self.locks {
            Some(locks) => Some(locks.acquire(&sender).await),
            None => None,
        };

        let seqno = self.wallet.seqno().await?;
        let balance = self.wallet.balance().await?;
        info!(
            %run_id,
            wallet = %sender,
            seqno,
            balance = %from_nano(balance),
            minting = %from_nano(self.params.initial_mint),
            "Preparing deployment transfer"
        );
        if balance < batch.total_value() {
            warn!(
                %run_id,
                balance = %from_nano(balance),
                required = %from_nano(batch.total_value()),
                "Wallet balance looks too low for the attached value"
            );
        }
        for summary in batch.summaries() {
            debug!(
                %run_id,
                to = %summary.to,
                value = %from_nano(summary.value),
                body = %summary.body_hash,
                "Outbound message"
            );
        }

        let receipt = self.wallet.send_transfer(seqno, batch.messages()).await?;
        info!(
            %run_id,
            address = %address,
            seqno = receipt.seqno,
            message_hash = %receipt.message_hash,
            "Deployment message sent"
        );

        Ok(DeploymentReport {
            run_id,
            address,
            seqno,
            balance,
            receipt,
        })
    }
}

//! HTTP client for the TonHub v4 node API.

use std::time::Duration;

use everscale_types::models::StdAddr;
use everscale_types::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ico_core::Endpoint;

use crate::address::AddressExt;

/// Maximum number of body characters kept in error messages.
const MAX_ERROR_BODY: usize = 300;

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("node request timed out")]
    Timeout,

    #[error("node connection error: {0}")]
    Network(String),

    #[error("node returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected node response: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LatestBlockResponse {
    last: BlockRef,
}

#[derive(Debug, Deserialize)]
struct BlockRef {
    seqno: u32,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    account: AccountBody,
}

#[derive(Debug, Deserialize)]
struct AccountBody {
    state: AccountStateBody,
    balance: BalanceBody,
}

#[derive(Debug, Deserialize)]
struct AccountStateBody {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct BalanceBody {
    coins: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunMethodResponse {
    exit_code: i32,
    #[serde(default)]
    result: Vec<StackEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StackEntry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendRequest {
    boc: String,
}

impl SendRequest {
    fn new(message: &Cell) -> Self {
        Self {
            boc: Boc::encode_base64(message),
        }
    }
}

// ---------------------------------------------------------------------------
// Public views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Uninit,
    Active,
    Frozen,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountInfo {
    pub status: AccountStatus,
    /// Balance in nano units.
    pub balance: u128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetMethodResult {
    pub exit_code: i32,
    pub stack: Vec<StackEntry>,
}

impl GetMethodResult {
    /// The `index`-th stack entry as an integer.
    pub fn int(&self, index: usize) -> Result<i128, NodeError> {
        let entry = self
            .stack
            .get(index)
            .ok_or_else(|| NodeError::Decode(format!("stack has no entry {index}")))?;
        if entry.kind != "int" {
            return Err(NodeError::Decode(format!(
                "stack entry {index} is {}, expected int",
                entry.kind
            )));
        }
        entry
            .value
            .as_deref()
            .ok_or_else(|| NodeError::Decode(format!("stack entry {index} has no value")))?
            .parse()
            .map_err(|e| NodeError::Decode(format!("stack entry {index}: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Thin client over the v4 HTTP API. Every request carries the endpoint's
/// timeout; there is no retry.
#[derive(Debug, Clone)]
pub struct NodeClient {
    base_url: String,
    client: reqwest::Client,
}

impl NodeClient {
    pub fn new(endpoint: &Endpoint) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(endpoint.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: endpoint.url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn latest_block(&self) -> Result<u32, NodeError> {
        let resp: LatestBlockResponse = self.get_json("/block/latest").await?;
        Ok(resp.last.seqno)
    }

    pub async fn account(&self, block: u32, address: &StdAddr) -> Result<AccountInfo, NodeError> {
        let path = format!("/block/{block}/{}", path_address(address));
        let resp: AccountResponse = self.get_json(&path).await?;
        parse_account(resp)
    }

    pub async fn run_get_method(
        &self,
        block: u32,
        address: &StdAddr,
        method: &str,
    ) -> Result<GetMethodResult, NodeError> {
        let path = format!("/block/{block}/{}/run/{method}", path_address(address));
        let resp: RunMethodResponse = self.get_json(&path).await?;
        Ok(GetMethodResult {
            exit_code: resp.exit_code,
            stack: resp.result,
        })
    }

    /// Current wallet seqno. Undeployed wallets report 0.
    pub async fn wallet_seqno(&self, address: &StdAddr) -> Result<u32, NodeError> {
        let block = self.latest_block().await?;
        let account = self.account(block, address).await?;
        if account.status != AccountStatus::Active {
            return Ok(0);
        }
        let result = self.run_get_method(block, address, "seqno").await?;
        seqno_from_result(&result)
    }

    pub async fn balance(&self, address: &StdAddr) -> Result<u128, NodeError> {
        let block = self.latest_block().await?;
        Ok(self.account(block, address).await?.balance)
    }

    /// Broadcast an external message.
    pub async fn send_message(&self, message: &Cell) -> Result<(), NodeError> {
        let url = format!("{}/send", self.base_url);
        let request = SendRequest::new(message);
        debug!(url = %url, chars = request.boc.len(), "Posting external message");
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(resp).await?;
        Ok(())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, NodeError> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "Node request");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let resp = check_status(resp).await?;
        resp.json::<T>()
            .await
            .map_err(|e| NodeError::Decode(e.to_string()))
    }
}

fn path_address(address: &StdAddr) -> String {
    address.to_friendly(true, false)
}

fn parse_account(resp: AccountResponse) -> Result<AccountInfo, NodeError> {
    let status = match resp.account.state.kind.as_str() {
        "uninit" => AccountStatus::Uninit,
        "active" => AccountStatus::Active,
        "frozen" => AccountStatus::Frozen,
        other => return Err(NodeError::Decode(format!("unknown account state {other}"))),
    };
    let balance = resp
        .account
        .balance
        .coins
        .parse()
        .map_err(|e| NodeError::Decode(format!("balance: {e}")))?;
    Ok(AccountInfo { status, balance })
}

/// A failing `seqno` get-method means the wallet code has not run yet.
fn seqno_from_result(result: &GetMethodResult) -> Result<u32, NodeError> {
    if result.exit_code != 0 && result.exit_code != 1 {
        return Ok(0);
    }
    let value = result.int(0)?;
    u32::try_from(value).map_err(|_| NodeError::Decode(format!("seqno {value} out of range")))
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, NodeError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(NodeError::Status {
        status: status.as_u16(),
        body: truncate_error(&body),
    })
}

fn map_reqwest_error(e: reqwest::Error) -> NodeError {
    if e.is_timeout() {
        NodeError::Timeout
    } else if e.is_connect() {
        NodeError::Network(format!("connection failed: {e}"))
    } else {
        NodeError::Network(e.to_string())
    }
}

fn truncate_error(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY {
        body.to_string()
    } else {
        let cut: String = body.chars().take(MAX_ERROR_BODY).collect();
        format!("{cut}...")
    }
}

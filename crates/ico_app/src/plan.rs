use anyhow::{Context, Result};
use everscale_types::models::StdAddr;
use everscale_types::prelude::*;
use serde::Serialize;

use ico_core::{DeployConfig, from_nano};
use ico_ton::{
    AddressExt, ContractCode, DeployParams, DeploymentBatch, OnchainMetadataEncoder,
    parse_address, prepare_deployment,
};

/// Offline view of a deployment: what would be sent, and where.
#[derive(Debug, Serialize)]
pub struct DeploymentPlan {
    pub network: String,
    pub owner: String,
    pub address: String,
    pub address_raw: String,
    pub code_hash: String,
    pub data_hash: String,
    pub state_init_boc: String,
    pub mint_body_boc: String,
    pub setup_ico_body_boc: String,
    pub value_per_message: String,
    pub total_value: String,
}

pub fn deployer_address(config: &DeployConfig) -> Result<StdAddr> {
    let raw = config
        .deployer_address
        .as_deref()
        .context("config is missing deployer_address")?;
    parse_address(raw).with_context(|| format!("invalid deployer_address {raw}"))
}

pub async fn build_plan(config: &DeployConfig) -> Result<DeploymentPlan> {
    let owner = deployer_address(config)?;
    let params = DeployParams::from_config(config)?;
    let code = ContractCode::load(config.contract_code_path()?, config.system_cell.as_deref())?;

    let batch = prepare_deployment(&params, &code, &owner, &OnchainMetadataEncoder).await?;
    describe(config, &owner, &batch)
}

fn describe(
    config: &DeployConfig,
    owner: &StdAddr,
    batch: &DeploymentBatch,
) -> Result<DeploymentPlan> {
    let test_only = config.network.is_test_only();
    let init = batch.init();
    let state_init = init
        .state_init_cell()
        .context("failed to build state init")?;
    Ok(DeploymentPlan {
        network: config.network.label().to_string(),
        owner: owner.to_friendly(true, test_only),
        address: batch.address().to_friendly(true, test_only),
        address_raw: batch.address().to_string(),
        code_hash: init.code.repr_hash().to_string(),
        data_hash: init.data.repr_hash().to_string(),
        state_init_boc: Boc::encode_base64(&state_init),
        mint_body_boc: Boc::encode_base64(&batch.mint().body),
        setup_ico_body_boc: Boc::encode_base64(&batch.setup_ico().body),
        value_per_message: from_nano(batch.mint().value),
        total_value: from_nano(batch.total_value()),
    })
}

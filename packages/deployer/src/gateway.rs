use async_trait::async_trait;
use cosmwasm_std::{from_json, to_json_binary, Binary, Coin};
use fee_distribution_base::{
    error::deployer::DeployResult,
    state::deployment::{Account, ContractDeployment},
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::artifacts::{Artifact, Artifacts};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxResult {
    pub transaction_hash: String,
    pub height: u64,
}

/// The four chain primitives plus the bank helpers the deployer needs.
/// Each call is atomic on chain and is awaited before the next one starts,
/// so implementations need not be shared across threads.
#[async_trait(?Send)]
pub trait ChainGateway {
    /// The signing account.
    fn account(&self) -> &Account;

    async fn upload(&self, wasm: &[u8]) -> DeployResult<u64>;

    async fn instantiate(
        &self,
        code_id: u64,
        msg: &Binary,
        label: &str,
        admin: Option<&str>,
    ) -> DeployResult<String>;

    async fn execute(&self, contract: &str, msg: &Binary, funds: &[Coin])
        -> DeployResult<TxResult>;

    async fn query(&self, contract: &str, msg: &Binary) -> DeployResult<Binary>;

    async fn balance(&self, address: &str, denom: &str) -> DeployResult<Coin>;

    async fn send_tokens(&self, to: &str, coins: &[Coin]) -> DeployResult<TxResult>;
}

/// Instantiates with the signing account as admin.
pub async fn instantiate_contract<M: Serialize>(
    gateway: &dyn ChainGateway,
    code_id: u64,
    msg: &M,
    label: &str,
) -> DeployResult<String> {
    let admin = gateway.account().address.clone();
    gateway
        .instantiate(code_id, &to_json_binary(msg)?, label, Some(&admin))
        .await
}

/// Uploads the artifact and instantiates it under `label`.
pub async fn deploy_contract<M: Serialize>(
    gateway: &dyn ChainGateway,
    artifacts: &Artifacts,
    artifact: Artifact,
    label: &str,
    msg: &M,
) -> DeployResult<ContractDeployment> {
    let wasm = artifacts.read(artifact).await?;
    let code_id = gateway.upload(&wasm).await?;
    debug!(label, code_id, "uploaded");
    let address = instantiate_contract(gateway, code_id, msg, label).await?;
    Ok(ContractDeployment { address, code_id })
}

pub async fn execute_contract<M: Serialize>(
    gateway: &dyn ChainGateway,
    contract: &str,
    msg: &M,
    funds: &[Coin],
) -> DeployResult<TxResult> {
    gateway
        .execute(contract, &to_json_binary(msg)?, funds)
        .await
}

pub async fn query_contract<Q: Serialize, R: DeserializeOwned>(
    gateway: &dyn ChainGateway,
    contract: &str,
    msg: &Q,
) -> DeployResult<R> {
    let raw = gateway.query(contract, &to_json_binary(msg)?).await?;
    Ok(from_json(&raw)?)
}

use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use cosmwasm_std::{from_json, Addr, Binary, Coin, Empty, QueryRequest, WasmQuery};
use cw_multi_test::{App, BankSudo, Contract, ContractWrapper, Executor, SudoMsg};
use fee_distribution_base::{
    error::deployer::{DeployError, DeployResult},
    state::deployment::Account,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::{
    address::{derive_address, ACCOUNT_ADDRESS_LENGTH},
    artifacts::Artifact,
    gateway::{ChainGateway, TxResult},
};

mod collector;
mod distributor;
mod staking;

pub const BLOCK_TIME_SECONDS: u64 = 6;

fn receipt_token_contract() -> Box<dyn Contract<Empty>> {
    Box::new(ContractWrapper::new(
        cw20_base::contract::execute,
        cw20_base::contract::instantiate,
        cw20_base::contract::query,
    ))
}

/// Native code standing in for an uploaded artifact. Only placeholder
/// bytecode is recognised.
fn native_contract(wasm: &[u8]) -> Option<Box<dyn Contract<Empty>>> {
    let artifact = Artifact::ALL
        .into_iter()
        .find(|artifact| artifact.placeholder() == wasm)?;
    Some(match artifact {
        Artifact::Cw20 => receipt_token_contract(),
        Artifact::Collector => collector::contract(),
        Artifact::Staking => staking::contract(),
        Artifact::Distributor => distributor::contract(),
    })
}

fn rejected(operation: &str, err: anyhow::Error) -> DeployError {
    DeployError::gateway(operation, format!("{err:#}"))
}

/// In-process chain running the collector, distributor and staking contracts
/// next to cw20-base on a multi-test [`App`]. Used by the tests and by the
/// `local` network.
pub struct SimulatedChain {
    account: Account,
    app: Mutex<App>,
}

impl SimulatedChain {
    /// The signing account address is derived from `mnemonic` under `prefix`.
    pub fn new(prefix: &str, mnemonic: &str) -> DeployResult<Self> {
        let address = derive_address(
            prefix,
            format!("account/{mnemonic}").as_bytes(),
            ACCOUNT_ADDRESS_LENGTH,
        )?;
        Ok(Self {
            account: Account { address },
            app: Mutex::new(App::default()),
        })
    }

    /// Mints `coins` to `address`, like a genesis balance.
    pub fn fund(&self, address: &str, coins: &[Coin]) -> DeployResult<()> {
        self.lock("fund")?
            .sudo(SudoMsg::Bank(BankSudo::Mint {
                to_address: address.to_string(),
                amount: coins.to_vec(),
            }))
            .map_err(|err| rejected("fund", err))?;
        Ok(())
    }

    fn lock(&self, operation: &str) -> DeployResult<MutexGuard<'_, App>> {
        self.app
            .lock()
            .map_err(|_| DeployError::gateway(operation, "simulated chain is poisoned"))
    }

    /// Runs `f` in the current block and seals the block when it succeeds.
    /// The app rolls a failed transaction back on its own.
    fn transact<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut App, Addr) -> AnyResult<T>,
    ) -> DeployResult<(T, TxResult)> {
        let mut app = self.lock(operation)?;
        let value = f(&mut app, Addr::unchecked(&self.account.address))
            .map_err(|err| rejected(operation, err))?;
        let height = app.block_info().height;
        app.update_block(|block| {
            block.height += 1;
            block.time = block.time.plus_seconds(BLOCK_TIME_SECONDS);
        });
        let hash = Sha256::digest(format!("{height}/{operation}"));
        Ok((
            value,
            TxResult {
                transaction_hash: hex::encode_upper(hash),
                height,
            },
        ))
    }
}

#[async_trait(?Send)]
impl ChainGateway for SimulatedChain {
    fn account(&self) -> &Account {
        &self.account
    }

    async fn upload(&self, wasm: &[u8]) -> DeployResult<u64> {
        let code = native_contract(wasm).ok_or_else(|| {
            DeployError::gateway("upload", "bytecode has no native counterpart")
        })?;
        Ok(self.transact("upload", |app, _| Ok(app.store_code(code)))?.0)
    }

    async fn instantiate(
        &self,
        code_id: u64,
        msg: &Binary,
        label: &str,
        admin: Option<&str>,
    ) -> DeployResult<String> {
        let msg: Value = serde_json::from_slice(msg.as_slice())?;
        let (address, _) = self.transact("instantiate", |app, sender| {
            app.instantiate_contract(code_id, sender, &msg, &[], label, admin.map(str::to_string))
        })?;
        Ok(address.into_string())
    }

    async fn execute(
        &self,
        contract: &str,
        msg: &Binary,
        funds: &[Coin],
    ) -> DeployResult<TxResult> {
        let msg: Value = serde_json::from_slice(msg.as_slice())?;
        Ok(self
            .transact("execute", |app, sender| {
                app.execute_contract(sender, Addr::unchecked(contract), &msg, funds)
            })?
            .1)
    }

    async fn query(&self, contract: &str, msg: &Binary) -> DeployResult<Binary> {
        let request = QueryRequest::Wasm(WasmQuery::Smart {
            contract_addr: contract.to_string(),
            msg: msg.clone(),
        });
        let response: Value = self
            .lock("query")?
            .wrap()
            .query(&request)
            .map_err(|err| DeployError::gateway("query", err))?;
        Ok(Binary::from(serde_json::to_vec(&response)?))
    }

    async fn balance(&self, address: &str, denom: &str) -> DeployResult<Coin> {
        self.lock("balance")?
            .wrap()
            .query_balance(address, denom)
            .map_err(|err| DeployError::gateway("balance", err))
    }

    async fn send_tokens(&self, to: &str, coins: &[Coin]) -> DeployResult<TxResult> {
        Ok(self
            .transact("send", |app, sender| {
                app.send_tokens(sender, Addr::unchecked(to), coins)
            })?
            .1)
    }
}

/// A gateway call as seen by [`RecordingGateway`].
#[derive(Clone, Debug, PartialEq)]
pub enum GatewayCall {
    Upload {
        code_id: u64,
    },
    Instantiate {
        code_id: u64,
        label: String,
        msg: Binary,
        admin: Option<String>,
    },
    Execute {
        contract: String,
        msg: Binary,
        funds: Vec<Coin>,
    },
    Query {
        contract: String,
        msg: Binary,
    },
    Balance {
        address: String,
        denom: String,
    },
    SendTokens {
        to: String,
        coins: Vec<Coin>,
    },
}

/// Wraps a gateway, recording every successful call in order. Instantiation
/// under an overridden label returns the configured address instead of
/// reaching the inner gateway.
pub struct RecordingGateway<G> {
    inner: G,
    calls: Mutex<Vec<GatewayCall>>,
    overrides: BTreeMap<String, String>,
}

impl<G: ChainGateway> RecordingGateway<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            calls: Mutex::new(vec![]),
            overrides: BTreeMap::new(),
        }
    }

    pub fn override_instantiate(mut self, label: &str, address: &str) -> Self {
        self.overrides
            .insert(label.to_string(), address.to_string());
        self
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Decoded instantiate message sent under `label`, if any.
    pub fn instantiate_msg<T: DeserializeOwned>(&self, label: &str) -> Option<T> {
        self.calls().into_iter().find_map(|call| match call {
            GatewayCall::Instantiate {
                label: sent, msg, ..
            } if sent == label => from_json(&msg).ok(),
            _ => None,
        })
    }

    fn record(&self, call: GatewayCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait(?Send)]
impl<G: ChainGateway> ChainGateway for RecordingGateway<G> {
    fn account(&self) -> &Account {
        self.inner.account()
    }

    async fn upload(&self, wasm: &[u8]) -> DeployResult<u64> {
        let code_id = self.inner.upload(wasm).await?;
        self.record(GatewayCall::Upload { code_id });
        Ok(code_id)
    }

    async fn instantiate(
        &self,
        code_id: u64,
        msg: &Binary,
        label: &str,
        admin: Option<&str>,
    ) -> DeployResult<String> {
        let address = match self.overrides.get(label) {
            Some(address) => address.clone(),
            None => self.inner.instantiate(code_id, msg, label, admin).await?,
        };
        self.record(GatewayCall::Instantiate {
            code_id,
            label: label.to_string(),
            msg: msg.clone(),
            admin: admin.map(str::to_string),
        });
        Ok(address)
    }

    async fn execute(
        &self,
        contract: &str,
        msg: &Binary,
        funds: &[Coin],
    ) -> DeployResult<TxResult> {
        let tx = self.inner.execute(contract, msg, funds).await?;
        self.record(GatewayCall::Execute {
            contract: contract.to_string(),
            msg: msg.clone(),
            funds: funds.to_vec(),
        });
        Ok(tx)
    }

    async fn query(&self, contract: &str, msg: &Binary) -> DeployResult<Binary> {
        let response = self.inner.query(contract, msg).await?;
        self.record(GatewayCall::Query {
            contract: contract.to_string(),
            msg: msg.clone(),
        });
        Ok(response)
    }

    async fn balance(&self, address: &str, denom: &str) -> DeployResult<Coin> {
        let coin = self.inner.balance(address, denom).await?;
        self.record(GatewayCall::Balance {
            address: address.to_string(),
            denom: denom.to_string(),
        });
        Ok(coin)
    }

    async fn send_tokens(&self, to: &str, coins: &[Coin]) -> DeployResult<TxResult> {
        let tx = self.inner.send_tokens(to, coins).await?;
        self.record(GatewayCall::SendTokens {
            to: to.to_string(),
            coins: coins.to_vec(),
        });
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use cosmwasm_std::Uint128;
    use cw20::{Cw20QueryMsg, MinterResponse, TokenInfoResponse};
    use fee_distribution_base::msg::{collector, distributor, staking};

    use super::*;
    use crate::{
        artifacts::Artifacts,
        gateway::{execute_contract, instantiate_contract, query_contract},
        pipeline::{COLLECTOR_LABEL, DISTRIBUTOR_LABEL, STAKING_LABEL},
    };

    fn funded_chain() -> SimulatedChain {
        let chain = SimulatedChain::new("osmo", "test mnemonic").unwrap();
        let owner = chain.account().address.clone();
        chain
            .fund(&owner, &[Coin::new(1_000_000u128, "ureward")])
            .unwrap();
        chain
    }

    async fn upload(chain: &SimulatedChain, artifact: Artifact) -> u64 {
        let wasm = Artifacts::in_memory().read(artifact).await.unwrap();
        chain.upload(&wasm).await.unwrap()
    }

    async fn instantiate_collector(chain: &SimulatedChain) -> String {
        let code_id = upload(chain, Artifact::Collector).await;
        instantiate_contract(
            chain,
            code_id,
            &collector::InstantiateMsg {},
            COLLECTOR_LABEL,
        )
        .await
        .unwrap()
    }

    #[test]
    fn account_follows_mnemonic_and_prefix() {
        let osmo = SimulatedChain::new("osmo", "first words").unwrap();
        let neutron = SimulatedChain::new("neutron", "first words").unwrap();
        let other = SimulatedChain::new("osmo", "other words").unwrap();

        assert!(osmo.account().address.starts_with("osmo1"));
        assert!(neutron.account().address.starts_with("neutron1"));
        assert_ne!(osmo.account(), other.account());
    }

    #[tokio::test]
    async fn foreign_bytecode_is_rejected() {
        let chain = funded_chain();
        let err = chain.upload(b"\0asm compiled elsewhere").await.unwrap_err();
        assert!(matches!(err, DeployError::Gateway { operation, .. } if operation == "upload"));
    }

    #[tokio::test]
    async fn collector_token_list_is_capped() {
        let chain = funded_chain();
        let collector = instantiate_collector(&chain).await;
        for token in ["a", "b", "c"] {
            execute_contract(
                &chain,
                &collector,
                &collector::ExecuteMsg::AddToken {
                    token: token.to_string(),
                },
                &[],
            )
            .await
            .unwrap();
        }
        let err = execute_contract(
            &chain,
            &collector,
            &collector::ExecuteMsg::AddToken {
                token: "d".to_string(),
            },
            &[],
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("The token capacity is already reached"));

        let page: collector::AllTokenResponse = query_contract(
            &chain,
            &collector,
            &collector::QueryMsg::GetTokenList { limit: Some(2) },
        )
        .await
        .unwrap();
        assert_eq!(page.token_list, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn failed_transaction_leaves_no_trace() {
        let chain = funded_chain();
        let owner = chain.account().address.clone();
        let collector = instantiate_collector(&chain).await;
        let first = execute_contract(
            &chain,
            &collector,
            &collector::ExecuteMsg::AddToken {
                token: "ureward".to_string(),
            },
            &[],
        )
        .await
        .unwrap();

        // The attached funds move before the contract rejects the message.
        let err = execute_contract(
            &chain,
            &collector,
            &collector::ExecuteMsg::SendToken {
                token: "ureward".to_string(),
                amount: Uint128::zero(),
                recipient: owner.clone(),
            },
            &[Coin::new(10u128, "ureward")],
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Cannot transfer zero tokens"));
        assert_eq!(
            chain.balance(&owner, "ureward").await.unwrap().amount,
            Uint128::new(1_000_000)
        );
        assert_eq!(
            chain.balance(&collector, "ureward").await.unwrap().amount,
            Uint128::zero()
        );

        let next = chain
            .send_tokens(&collector, &[Coin::new(5u128, "ureward")])
            .await
            .unwrap();
        assert_eq!(next.height, first.height + 1);
        assert_ne!(next.transaction_hash, first.transaction_hash);
    }

    #[tokio::test]
    async fn distributor_rejects_bad_weights() {
        let chain = funded_chain();
        let code_id = upload(&chain, Artifact::Distributor).await;
        let recipient = chain.account().address.clone();
        let err = instantiate_contract(
            &chain,
            code_id,
            &distributor::InstantiateMsg {
                token: "ureward".to_string(),
                distribution: vec![(recipient, Uint128::new(999_999))],
            },
            DISTRIBUTOR_LABEL,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("total weight must equal to"));
    }

    #[tokio::test]
    async fn staking_creates_its_receipt_token() {
        let chain = funded_chain();
        let collector = instantiate_collector(&chain).await;
        let token_code_id = upload(&chain, Artifact::Cw20).await;
        let staking_code_id = upload(&chain, Artifact::Staking).await;
        let staking = instantiate_contract(
            &chain,
            staking_code_id,
            &staking::InstantiateMsg {
                fee_collector: collector,
                deposit_denom: "ustake".to_string(),
                reward_denom: "ureward".to_string(),
                deposit_decimals: 6,
                reward_decimals: 6,
                tokens_per_interval: Uint128::new(10_000),
                token_code_id,
                token_name: "stakedSTAKE".to_string(),
            },
            STAKING_LABEL,
        )
        .await
        .unwrap();

        let config: staking::ConfigResponse =
            query_contract(&chain, &staking, &staking::QueryMsg::Config {})
                .await
                .unwrap();
        let info: TokenInfoResponse =
            query_contract(&chain, &config.staked_denom, &Cw20QueryMsg::TokenInfo {})
                .await
                .unwrap();
        assert_eq!(info.symbol, "veustake");
        assert_eq!(info.decimals, 6);
        assert_eq!(info.total_supply, Uint128::zero());
        let minter: MinterResponse =
            query_contract(&chain, &config.staked_denom, &Cw20QueryMsg::Minter {})
                .await
                .unwrap();
        assert_eq!(minter.minter, staking);

        let state: staking::StateResponse =
            query_contract(&chain, &staking, &staking::QueryMsg::State {})
                .await
                .unwrap();
        assert!(!state.is_open);
    }
}

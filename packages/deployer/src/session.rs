//! Start-up: environment, profile and chain, in that order.

use std::path::Path;

use cosmwasm_std::Coin;
use fee_distribution_base::{
    error::deployer::{DeployError, DeployResult},
    state::deployment::DeploymentConfig,
};
use tracing::info;

use crate::{
    artifacts::Artifacts,
    config::{self, ChainConfig},
    gateway::ChainGateway,
    testing::SimulatedChain,
};

/// Balance of each profile denom the signing account starts with on a fresh
/// simulated chain.
pub const GENESIS_AMOUNT: u128 = 1_000_000_000_000;

/// What every command runs against.
pub struct Session<G> {
    pub chain: ChainConfig,
    pub profile: DeploymentConfig,
    pub artifacts: Artifacts,
    pub gateway: G,
}

/// Reads the connection settings through `lookup`, picks the deployment
/// profile (`profile_path` wins over the one named by `NETWORK`) and only then
/// calls `connect`. Nothing reaches a chain when a setting is missing.
pub async fn open<L, F, G>(
    lookup: L,
    profile_path: Option<&Path>,
    artifacts_dir: &Path,
    connect: F,
) -> DeployResult<Session<G>>
where
    L: Fn(&str) -> Option<String>,
    F: FnOnce(&ChainConfig, &DeploymentConfig) -> DeployResult<G>,
{
    let chain = ChainConfig::from_lookup(lookup)?;
    info!(config = ?chain, "chain config loaded");
    let profile = match profile_path {
        Some(path) => config::load_profile(path).await?,
        None => config::profile(&chain.network, &chain.prefix)?,
    };
    let gateway = connect(&chain, &profile)?;
    info!(network = %chain.network, "connected");
    let artifacts = artifacts(&chain.network, artifacts_dir);
    Ok(Session {
        chain,
        profile,
        artifacts,
        gateway,
    })
}

/// The local network runs native contract code, so it gets placeholder
/// bytecode whatever the directory holds.
pub fn artifacts(network: &str, dir: &Path) -> Artifacts {
    if network == config::LOCAL {
        return Artifacts::in_memory();
    }
    Artifacts::from_dir(dir)
}

/// Gateway factory for the binary. Only the local network has a gateway
/// linked in; it starts empty with the signing account funded in both
/// profile denoms.
pub fn connect_local(
    chain: &ChainConfig,
    profile: &DeploymentConfig,
) -> DeployResult<SimulatedChain> {
    if chain.network != config::LOCAL {
        return Err(DeployError::UnsupportedNetwork {
            name: chain.network.clone(),
        });
    }
    let simulated = SimulatedChain::new(&chain.prefix, &chain.mnemonic)?;
    let owner = simulated.account().address.clone();
    simulated.fund(
        &owner,
        &[
            Coin::new(GENESIS_AMOUNT, profile.deposit_denom()),
            Coin::new(GENESIS_AMOUNT, profile.reward_denom()),
        ],
    )?;
    Ok(simulated)
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, collections::HashMap, path::PathBuf};

    use cosmwasm_std::Uint128;

    use super::*;
    use crate::{artifacts::Artifact, testing::RecordingGateway};

    const LOCAL_ENV: &[(&str, &str)] = &[
        ("MNEMONIC", "abandon abandon about"),
        ("CHAINID", "localosmosis"),
        ("RPC", "http://localhost:26657"),
        ("PREFIX", "osmo"),
        ("NETWORK", "local"),
    ];

    fn vars(without: Option<&str>) -> HashMap<String, String> {
        LOCAL_ENV
            .iter()
            .filter(|(name, _)| Some(*name) != without)
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn missing_connection_value_stops_before_connecting() {
        for missing in ["CHAINID", "RPC", "PREFIX"] {
            let env = vars(Some(missing));
            let connects = Cell::new(0);
            let recorder = RecordingGateway::new(SimulatedChain::new("osmo", "unused").unwrap());

            let result = open(
                |name| env.get(name).cloned(),
                None,
                Path::new("artifacts"),
                |_, _| {
                    connects.set(connects.get() + 1);
                    Ok(&recorder)
                },
            )
            .await;

            assert!(
                matches!(&result, Err(DeployError::MissingEnv { name }) if name == missing),
                "{missing}"
            );
            assert_eq!(connects.get(), 0);
            assert!(recorder.calls().is_empty());
        }
    }

    #[tokio::test]
    async fn connects_once_and_leaves_the_chain_alone() {
        let env = vars(None);
        let connects = Cell::new(0);
        let recorder = RecordingGateway::new(SimulatedChain::new("osmo", "unused").unwrap());

        let session = open(
            |name| env.get(name).cloned(),
            None,
            Path::new("artifacts"),
            |_, _| {
                connects.set(connects.get() + 1);
                Ok(&recorder)
            },
        )
        .await
        .unwrap();

        assert_eq!(connects.get(), 1);
        assert_eq!(session.chain.network, config::LOCAL);
        assert!(session.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn local_network_starts_funded() {
        let env = vars(None);
        let session = open(
            |name| env.get(name).cloned(),
            None,
            Path::new("artifacts"),
            connect_local,
        )
        .await
        .unwrap();

        let owner = session.gateway.account().address.clone();
        assert!(owner.starts_with("osmo1"));
        let deposit = session
            .gateway
            .balance(&owner, session.profile.deposit_denom())
            .await
            .unwrap();
        assert_eq!(deposit.amount, Uint128::new(GENESIS_AMOUNT));
        assert_eq!(
            session.artifacts.path(Artifact::Collector),
            PathBuf::from("collector.wasm")
        );
    }

    #[tokio::test]
    async fn other_networks_have_no_gateway() {
        let mut env = vars(None);
        env.insert("NETWORK".to_string(), "testnet".to_string());

        let result = open(
            |name| env.get(name).cloned(),
            None,
            Path::new("artifacts"),
            connect_local,
        )
        .await;

        assert!(matches!(
            result,
            Err(DeployError::UnsupportedNetwork { name }) if name == "testnet"
        ));
    }
}

use std::{fmt, path::Path};

use cosmwasm_std::Uint128;
use fee_distribution_base::{
    error::deployer::{DeployError, DeployResult},
    msg::{collector, distributor, staking},
    state::deployment::DeploymentConfig,
};

use crate::address::{derive_address, ACCOUNT_ADDRESS_LENGTH};

pub const TESTNET: &str = "testnet";
pub const LOCAL: &str = "local";

const TESTNET_PROTOCOL: &str = "osmo1rrmlcs4nr52uy239ljthnkhl9cvgfzvwdsjlch";
const TESTNET_MANAGER: &str = "osmo164sw03784vjpqtf6ef8zs09zznrf7rnusw8v0e";
const TESTNET_REWARD_DENOM: &str =
    "ibc/A8C2D23A1E6F95DA4E48BA349667E322BD7A6C996D8A4AAE8BA72E190F3D1477";

/// Chain connection settings, read once at start.
#[derive(Clone, PartialEq, Eq)]
pub struct ChainConfig {
    pub mnemonic: String,
    pub chain_id: String,
    pub rpc: String,
    pub prefix: String,
    pub network: String,
}

impl fmt::Debug for ChainConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainConfig")
            .field("mnemonic", &"<redacted>")
            .field("chain_id", &self.chain_id)
            .field("rpc", &self.rpc)
            .field("prefix", &self.prefix)
            .field("network", &self.network)
            .finish()
    }
}

impl ChainConfig {
    /// Builds the config from `lookup`, failing on the first absent or blank
    /// value.
    pub fn from_lookup<F>(lookup: F) -> DeployResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| DeployError::MissingEnv {
                    name: name.to_string(),
                })
        };
        Ok(Self {
            mnemonic: require("MNEMONIC")?,
            chain_id: require("CHAINID")?,
            rpc: require("RPC")?,
            prefix: require("PREFIX")?,
            network: require("NETWORK")?,
        })
    }

    pub fn from_env() -> DeployResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

/// Deployment profile selected by the `NETWORK` value.
pub fn profile(network: &str, prefix: &str) -> DeployResult<DeploymentConfig> {
    match network {
        TESTNET => Ok(testnet()),
        LOCAL => local(prefix),
        _ => Err(DeployError::UnknownNetwork {
            name: network.to_string(),
        }),
    }
}

pub async fn load_profile(path: &Path) -> DeployResult<DeploymentConfig> {
    let raw = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&raw)?)
}

pub fn testnet() -> DeploymentConfig {
    build(
        TESTNET_PROTOCOL.to_string(),
        TESTNET_MANAGER.to_string(),
        "uosmo",
        TESTNET_REWARD_DENOM,
        "stakedOSMO",
    )
}

/// Same shape as [`testnet`], with protocol and manager addresses derived
/// under `prefix` and plain denoms.
pub fn local(prefix: &str) -> DeployResult<DeploymentConfig> {
    Ok(build(
        derive_address(prefix, b"local/protocol", ACCOUNT_ADDRESS_LENGTH)?,
        derive_address(prefix, b"local/manager", ACCOUNT_ADDRESS_LENGTH)?,
        "ustake",
        "ureward",
        "stakedSTAKE",
    ))
}

fn build(
    protocol_address: String,
    manager_address: String,
    deposit_denom: &str,
    reward_denom: &str,
    token_name: &str,
) -> DeploymentConfig {
    DeploymentConfig {
        distributor: distributor::InstantiateMsg {
            token: reward_denom.to_string(),
            distribution: vec![
                (protocol_address.clone(), Uint128::new(200_000)),
                (manager_address.clone(), Uint128::new(300_000)),
            ],
        },
        staking: staking::InstantiateMsg {
            fee_collector: String::new(),
            deposit_denom: deposit_denom.to_string(),
            reward_denom: reward_denom.to_string(),
            deposit_decimals: 6,
            reward_decimals: 6,
            tokens_per_interval: Uint128::new(10_000),
            token_code_id: 0,
            token_name: token_name.to_string(),
        },
        collector: collector::InstantiateMsg {},
        protocol_address,
        manager_address,
    }
}

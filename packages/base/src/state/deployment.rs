use cosmwasm_schema::cw_serde;
use cosmwasm_std::Uint128;
use serde::{Deserialize, Serialize};

use crate::msg::{collector, distributor, staking};

/// Weight given to the fee collector when it joins the distribution.
pub const COLLECTOR_DISTRIBUTION_WEIGHT: u128 = 500_000;

/// Cross-contract parameters of one deployment profile.
///
/// Fields that depend on earlier deployment results start out as
/// placeholders (`staking.fee_collector` empty, `staking.token_code_id`
/// zero) and are only ever filled through the `with_*` methods, each of
/// which returns a new value and leaves the receiver untouched.
#[cw_serde]
pub struct DeploymentConfig {
    pub protocol_address: String,
    pub manager_address: String,
    #[serde(default)]
    pub collector: collector::InstantiateMsg,
    pub distributor: distributor::InstantiateMsg,
    pub staking: staking::InstantiateMsg,
}

impl DeploymentConfig {
    pub fn with_fee_collector(&self, address: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.staking.fee_collector = address.into();
        next
    }

    pub fn with_token_code_id(&self, code_id: u64) -> Self {
        let mut next = self.clone();
        next.staking.token_code_id = code_id;
        next
    }

    /// Appends `(address, weight)` to the distribution. An address that is
    /// already a recipient keeps its position and gets the new weight, so the
    /// list never shrinks and never holds the same recipient twice.
    pub fn with_distribution_entry(&self, address: impl Into<String>, weight: Uint128) -> Self {
        let address = address.into();
        let mut next = self.clone();
        match next
            .distributor
            .distribution
            .iter_mut()
            .find(|(recipient, _)| *recipient == address)
        {
            Some(entry) => entry.1 = weight,
            None => next.distributor.distribution.push((address, weight)),
        }
        next
    }

    pub fn deposit_denom(&self) -> &str {
        &self.staking.deposit_denom
    }

    pub fn reward_denom(&self) -> &str {
        &self.staking.reward_denom
    }
}

#[cw_serde]
pub struct ContractDeployment {
    pub address: String,
    pub code_id: u64,
}

/// Addresses persisted after a successful deployment.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub collector_address: String,
    pub distributor_address: String,
    pub staking_address: String,
}

/// The signing account, derived once at start.
#[cw_serde]
pub struct Account {
    pub address: String,
}

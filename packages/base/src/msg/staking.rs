use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Timestamp, Uint128};
use cw20::{Cw20Coin, Cw20ReceiveMsg, MinterResponse};

#[cw_serde]
pub struct InstantiateMsg {
    /// Filled in by the deployer once the collector is instantiated.
    pub fee_collector: String,
    pub deposit_denom: String,
    pub reward_denom: String,
    pub deposit_decimals: u32,
    pub reward_decimals: u32,
    pub tokens_per_interval: Uint128,
    /// Filled in by the deployer once the cw20 code is uploaded.
    pub token_code_id: u64,
    pub token_name: String,
}

#[cw_serde]
pub enum ExecuteMsg {
    Stake {},
    Receive(Cw20ReceiveMsg),
    Claim {
        recipient: Option<String>,
    },
    Unpause {},
}

/// Instantiates the receipt token; the staking contract is its minter.
#[cw_serde]
pub struct Cw20TokenInstantiateMsg {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub initial_balances: Vec<Cw20Coin>,
    pub mint: Option<MinterResponse>,
}

/// Payload carried by a cw20 `send` to the staking contract.
#[cw_serde]
pub enum Cw20HookMsg {
    Unstake {},
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(ConfigResponse)]
    Config {},
    #[returns(StateResponse)]
    State {},
    #[returns(Uint128)]
    GetClaimable { user: String },
    #[returns(UserStakeResponse)]
    GetUserStakedAmount { user: String },
}

#[cw_serde]
pub struct ConfigResponse {
    pub owner: Addr,
    pub fee_collector: Addr,
    pub deposit_denom: String,
    pub deposit_decimals: u32,
    /// Address of the cw20 receipt token minted on stake.
    pub staked_denom: String,
    pub reward_denom: String,
    pub reward_decimals: u32,
    pub tokens_per_interval: Uint128,
}

#[cw_serde]
pub struct StateResponse {
    pub is_open: bool,
    pub last_distribution: Timestamp,
}

#[cw_serde]
#[derive(Default)]
pub struct UserStakeResponse {
    pub staked_amounts: Uint128,
    pub claimable_rewards: Uint128,
    pub previous_cumulative_rewards_per_token: Uint128,
    pub cumulative_rewards: Uint128,
}

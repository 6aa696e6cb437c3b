use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Uint128};

/// Weights of a distribution add up to this value.
pub const DISTRIBUTION_DECIMALS: u128 = 1_000_000;
pub const RECIPIENT_LIMIT: usize = 5;

#[cw_serde]
pub struct InstantiateMsg {
    /// Denom the distributor hands out.
    pub token: String,
    pub distribution: Vec<(String, Uint128)>,
}

#[cw_serde]
pub enum ExecuteMsg {
    Distribute {},
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(OwnerResponse)]
    GetOwner {},
    #[returns(ConfigResponse)]
    GetConfig {},
    #[returns(String)]
    GetToken {},
}

#[cw_serde]
pub struct OwnerResponse {
    pub owner: Addr,
}

#[cw_serde]
pub struct ConfigResponse {
    pub distribution: Vec<(Addr, Uint128)>,
}

use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Uint128};

#[cw_serde]
#[derive(Default)]
pub struct InstantiateMsg {}

#[cw_serde]
pub enum ExecuteMsg {
    AddToken {
        token: String,
    },
    UpdateWhitelist {
        address: String,
    },
    SendToken {
        token: String,
        amount: Uint128,
        recipient: String,
    },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(OwnerResponse)]
    GetOwner {},
    #[returns(WhitelistResponse)]
    GetWhitelist {},
    #[returns(AllTokenResponse)]
    GetTokenList { limit: Option<u32> },
}

#[cw_serde]
pub struct OwnerResponse {
    pub owner: Addr,
}

#[cw_serde]
pub struct WhitelistResponse {
    pub address: Addr,
}

#[cw_serde]
pub struct AllTokenResponse {
    pub token_list: Vec<String>,
}

use cosmwasm_std::{
    ensure, to_json_binary, Addr, BankMsg, Binary, Coin, Deps, DepsMut, Empty, Env, MessageInfo,
    Response, StdError, StdResult, Uint128,
};
use cw_multi_test::{Contract, ContractWrapper};
use cw_storage_plus::Item;
use fee_distribution_base::msg::collector::{
    AllTokenResponse, ExecuteMsg, InstantiateMsg, OwnerResponse, QueryMsg, WhitelistResponse,
};

const TOKEN_LIMIT: usize = 3;
const DEFAULT_PAGE: u32 = 10;

const OWNER: Item<Addr> = Item::new("owner");
const WHITELIST: Item<Addr> = Item::new("whitelist");
const TOKENS: Item<Vec<String>> = Item::new("tokens");

pub fn contract() -> Box<dyn Contract<Empty>> {
    Box::new(ContractWrapper::new(execute, instantiate, query))
}

fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    _msg: InstantiateMsg,
) -> StdResult<Response> {
    OWNER.save(deps.storage, &info.sender)?;
    WHITELIST.save(deps.storage, &info.sender)?;
    TOKENS.save(deps.storage, &vec![])?;
    Ok(Response::new().add_attribute("action", "instantiate"))
}

fn execute(deps: DepsMut, env: Env, info: MessageInfo, msg: ExecuteMsg) -> StdResult<Response> {
    match msg {
        ExecuteMsg::AddToken { token } => exec_add_token(deps, info, token),
        ExecuteMsg::UpdateWhitelist { address } => exec_update_whitelist(deps, info, address),
        ExecuteMsg::SendToken {
            token,
            amount,
            recipient,
        } => exec_send_token(deps, env, info, token, amount, recipient),
    }
}

fn assert_owner(deps: Deps, sender: &Addr) -> StdResult<()> {
    ensure!(
        OWNER.load(deps.storage)? == *sender,
        StdError::generic_err("unauthorized")
    );
    Ok(())
}

fn exec_add_token(deps: DepsMut, info: MessageInfo, token: String) -> StdResult<Response> {
    assert_owner(deps.as_ref(), &info.sender)?;
    let mut tokens = TOKENS.load(deps.storage)?;
    ensure!(
        !tokens.contains(&token),
        StdError::generic_err("This token is already added")
    );
    ensure!(
        tokens.len() < TOKEN_LIMIT,
        StdError::generic_err("The token capacity is already reached")
    );
    tokens.push(token.clone());
    TOKENS.save(deps.storage, &tokens)?;
    Ok(Response::new()
        .add_attribute("action", "add_token")
        .add_attribute("token", token))
}

fn exec_update_whitelist(
    deps: DepsMut,
    info: MessageInfo,
    address: String,
) -> StdResult<Response> {
    assert_owner(deps.as_ref(), &info.sender)?;
    let address = deps.api.addr_validate(&address)?;
    WHITELIST.save(deps.storage, &address)?;
    Ok(Response::new()
        .add_attribute("action", "update_whitelist")
        .add_attribute("address", address))
}

fn exec_send_token(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    token: String,
    amount: Uint128,
    recipient: String,
) -> StdResult<Response> {
    ensure!(
        !amount.is_zero(),
        StdError::generic_err("Cannot transfer zero tokens")
    );
    let owner = OWNER.load(deps.storage)?;
    let whitelist = WHITELIST.load(deps.storage)?;
    ensure!(
        info.sender == owner || info.sender == whitelist,
        StdError::generic_err("unauthorized")
    );
    let recipient = deps.api.addr_validate(&recipient)?;
    ensure!(
        TOKENS.load(deps.storage)?.contains(&token),
        StdError::generic_err("This token is not supported")
    );
    let balance = deps
        .querier
        .query_balance(&env.contract.address, &token)?;
    ensure!(
        balance.amount >= amount,
        StdError::generic_err("Insufficient funds")
    );
    Ok(Response::new()
        .add_message(BankMsg::Send {
            to_address: recipient.to_string(),
            amount: vec![Coin {
                denom: token,
                amount,
            }],
        })
        .add_attribute("action", "send_token")
        .add_attribute("amount", amount))
}

fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::GetOwner {} => to_json_binary(&OwnerResponse {
            owner: OWNER.load(deps.storage)?,
        }),
        QueryMsg::GetWhitelist {} => to_json_binary(&WhitelistResponse {
            address: WHITELIST.load(deps.storage)?,
        }),
        QueryMsg::GetTokenList { limit } => query_token_list(deps, limit),
    }
}

fn query_token_list(deps: Deps, limit: Option<u32>) -> StdResult<Binary> {
    let tokens = TOKENS.load(deps.storage)?;
    ensure!(
        !tokens.is_empty(),
        StdError::generic_err("No tokens are stored")
    );
    let limit = limit.unwrap_or(DEFAULT_PAGE).min(TOKEN_LIMIT as u32) as usize;
    to_json_binary(&AllTokenResponse {
        token_list: tokens.into_iter().take(limit).collect(),
    })
}

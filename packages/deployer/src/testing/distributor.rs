use cosmwasm_std::{
    to_json_binary, Addr, BankMsg, Binary, Coin, Deps, DepsMut, Empty, Env, MessageInfo,
    Response, StdResult, Uint128,
};
use cw_multi_test::{Contract, ContractWrapper};
use cw_storage_plus::Item;
use fee_distribution_base::msg::distributor::{
    ConfigResponse, ExecuteMsg, InstantiateMsg, OwnerResponse, QueryMsg, DISTRIBUTION_DECIMALS,
    RECIPIENT_LIMIT,
};
use fee_distribution_helpers::validation::validate_distribution;

const OWNER: Item<Addr> = Item::new("owner");
const TOKEN: Item<String> = Item::new("token");
const DISTRIBUTION: Item<Vec<(Addr, Uint128)>> = Item::new("distribution");

pub fn contract() -> Box<dyn Contract<Empty>> {
    Box::new(ContractWrapper::new(execute, instantiate, query))
}

fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> StdResult<Response> {
    validate_distribution(
        &msg.distribution,
        Uint128::new(DISTRIBUTION_DECIMALS),
        RECIPIENT_LIMIT,
    )?;
    let distribution = msg
        .distribution
        .iter()
        .map(|(recipient, share)| Ok((deps.api.addr_validate(recipient)?, *share)))
        .collect::<StdResult<Vec<_>>>()?;

    OWNER.save(deps.storage, &info.sender)?;
    TOKEN.save(deps.storage, &msg.token)?;
    DISTRIBUTION.save(deps.storage, &distribution)?;
    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("token", msg.token))
}

fn execute(deps: DepsMut, env: Env, _info: MessageInfo, msg: ExecuteMsg) -> StdResult<Response> {
    match msg {
        ExecuteMsg::Distribute {} => exec_distribute(deps, env),
    }
}

/// Splits the whole balance by weight. Shares that round down to zero are
/// skipped and the rounding dust stays behind.
fn exec_distribute(deps: DepsMut, env: Env) -> StdResult<Response> {
    let token = TOKEN.load(deps.storage)?;
    let total = deps
        .querier
        .query_balance(&env.contract.address, &token)?
        .amount;
    let messages = DISTRIBUTION
        .load(deps.storage)?
        .into_iter()
        .map(|(recipient, share)| (recipient, total.multiply_ratio(share, DISTRIBUTION_DECIMALS)))
        .filter(|(_, amount)| !amount.is_zero())
        .map(|(recipient, amount)| BankMsg::Send {
            to_address: recipient.into_string(),
            amount: vec![Coin {
                denom: token.clone(),
                amount,
            }],
        });
    Ok(Response::new()
        .add_messages(messages)
        .add_attribute("action", "distribute")
        .add_attribute("total", total))
}

fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::GetOwner {} => to_json_binary(&OwnerResponse {
            owner: OWNER.load(deps.storage)?,
        }),
        QueryMsg::GetConfig {} => to_json_binary(&ConfigResponse {
            distribution: DISTRIBUTION.load(deps.storage)?,
        }),
        QueryMsg::GetToken {} => to_json_binary(&TOKEN.load(deps.storage)?),
    }
}

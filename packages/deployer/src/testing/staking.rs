use cosmwasm_std::{
    ensure, from_json, to_json_binary, wasm_execute, Addr, BankMsg, Binary, Coin, CosmosMsg, Deps,
    DepsMut, Empty, Env, MessageInfo, QuerierWrapper, Reply, Response, StdError, StdResult, SubMsg,
    Uint128, WasmMsg,
};
use cw20::{Cw20ExecuteMsg, Cw20QueryMsg, Cw20ReceiveMsg, MinterResponse, TokenInfoResponse};
use cw_multi_test::{Contract, ContractWrapper};
use cw_storage_plus::{Item, Map};
use cw_utils::{may_pay, parse_reply_instantiate_data};
use fee_distribution_base::msg::{
    collector,
    staking::{
        ConfigResponse, Cw20HookMsg, Cw20TokenInstantiateMsg, ExecuteMsg, InstantiateMsg,
        QueryMsg, StateResponse, UserStakeResponse,
    },
};

const RECEIPT_TOKEN_LABEL: &str = "staking receipt token";
const RECEIPT_TOKEN_REPLY_ID: u64 = 1;

const CONFIG: Item<ConfigResponse> = Item::new("config");
const STATE: Item<StateResponse> = Item::new("state");
const REWARDS_PER_TOKEN: Item<Uint128> = Item::new("rewards_per_token");
const STAKERS: Map<&Addr, UserStakeResponse> = Map::new("stakers");

pub fn contract() -> Box<dyn Contract<Empty>> {
    Box::new(ContractWrapper::new(execute, instantiate, query).with_reply(reply))
}

/// Starts paused. The receipt token is created in the same transaction and
/// its address lands in `staked_denom` once the reply comes back.
fn instantiate(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> StdResult<Response> {
    let fee_collector = deps.api.addr_validate(&msg.fee_collector)?;
    let decimals = u8::try_from(msg.deposit_decimals)
        .map_err(|_| StdError::generic_err("deposit decimals out of range"))?;
    CONFIG.save(
        deps.storage,
        &ConfigResponse {
            owner: info.sender,
            fee_collector,
            deposit_denom: msg.deposit_denom.clone(),
            deposit_decimals: msg.deposit_decimals,
            staked_denom: String::new(),
            reward_denom: msg.reward_denom,
            reward_decimals: msg.reward_decimals,
            tokens_per_interval: msg.tokens_per_interval,
        },
    )?;
    STATE.save(
        deps.storage,
        &StateResponse {
            is_open: false,
            last_distribution: env.block.time,
        },
    )?;
    REWARDS_PER_TOKEN.save(deps.storage, &Uint128::zero())?;

    let receipt_token = WasmMsg::Instantiate {
        admin: Some(env.contract.address.to_string()),
        code_id: msg.token_code_id,
        msg: to_json_binary(&Cw20TokenInstantiateMsg {
            name: msg.token_name,
            symbol: format!("ve{}", msg.deposit_denom),
            decimals,
            initial_balances: vec![],
            mint: Some(MinterResponse {
                minter: env.contract.address.to_string(),
                cap: None,
            }),
        })?,
        funds: vec![],
        label: RECEIPT_TOKEN_LABEL.to_string(),
    };
    Ok(Response::new()
        .add_submessage(SubMsg::reply_on_success(
            receipt_token,
            RECEIPT_TOKEN_REPLY_ID,
        ))
        .add_attribute("action", "instantiate"))
}

fn reply(deps: DepsMut, _env: Env, msg: Reply) -> StdResult<Response> {
    ensure!(
        msg.id == RECEIPT_TOKEN_REPLY_ID,
        StdError::generic_err(format!("unknown reply id {}", msg.id))
    );
    let token = parse_reply_instantiate_data(msg)
        .map_err(|err| StdError::generic_err(err.to_string()))?
        .contract_address;
    CONFIG.update(deps.storage, |mut config| -> StdResult<_> {
        config.staked_denom = token.clone();
        Ok(config)
    })?;
    Ok(Response::new().add_attribute("staked_denom", token))
}

fn execute(deps: DepsMut, env: Env, info: MessageInfo, msg: ExecuteMsg) -> StdResult<Response> {
    match msg {
        ExecuteMsg::Stake {} => exec_stake(deps, env, info),
        ExecuteMsg::Receive(receive) => match from_json(&receive.msg)? {
            Cw20HookMsg::Unstake {} => exec_unstake(deps, env, info, receive),
        },
        ExecuteMsg::Claim { recipient } => exec_claim(deps, env, info, recipient),
        ExecuteMsg::Unpause {} => exec_unpause(deps, info),
    }
}

fn assert_open(deps: Deps) -> StdResult<()> {
    ensure!(
        STATE.load(deps.storage)?.is_open,
        StdError::generic_err("Contract is paused")
    );
    Ok(())
}

fn reward_precision(config: &ConfigResponse) -> StdResult<Uint128> {
    10u128
        .checked_pow(config.reward_decimals)
        .map(Uint128::new)
        .ok_or_else(|| StdError::generic_err("reward decimals out of range"))
}

fn pending_rewards(config: &ConfigResponse, state: &StateResponse, env: &Env) -> StdResult<Uint128> {
    let elapsed = env
        .block
        .time
        .seconds()
        .saturating_sub(state.last_distribution.seconds());
    Ok(Uint128::from(elapsed).checked_mul(config.tokens_per_interval)?)
}

fn token_supply(querier: QuerierWrapper, token: &str) -> StdResult<Uint128> {
    let info: TokenInfoResponse = querier.query_wasm_smart(token, &Cw20QueryMsg::TokenInfo {})?;
    Ok(info.total_supply)
}

/// Folds the rewards accrued since the last distribution into the per-token
/// accumulator and settles `account` against it. Accrual is capped by what the
/// collector holds; the returned amount is what has to be pulled from it.
fn update_rewards(deps: DepsMut, env: &Env, account: &Addr) -> StdResult<Uint128> {
    let config = CONFIG.load(deps.storage)?;
    let mut state = STATE.load(deps.storage)?;
    let available = deps
        .querier
        .query_balance(&config.fee_collector, &config.reward_denom)?
        .amount;
    let block_rewards = pending_rewards(&config, &state, env)?.min(available);
    state.last_distribution = env.block.time;
    STATE.save(deps.storage, &state)?;

    let precision = reward_precision(&config)?;
    let supply = token_supply(deps.querier, &config.staked_denom)?;
    let mut rewards_per_token = REWARDS_PER_TOKEN.load(deps.storage)?;
    if !supply.is_zero() && !block_rewards.is_zero() {
        rewards_per_token = rewards_per_token
            .checked_add(block_rewards.checked_mul(precision)?.checked_div(supply)?)?;
        REWARDS_PER_TOKEN.save(deps.storage, &rewards_per_token)?;
    }

    let mut stake = STAKERS.may_load(deps.storage, account)?.unwrap_or_default();
    let delta = rewards_per_token.checked_sub(stake.previous_cumulative_rewards_per_token)?;
    let reward = stake.staked_amounts.checked_mul(delta)?.checked_div(precision)?;
    stake.claimable_rewards = stake.claimable_rewards.checked_add(reward)?;
    stake.previous_cumulative_rewards_per_token = rewards_per_token;
    if !reward.is_zero() && !stake.staked_amounts.is_zero() {
        stake.cumulative_rewards = stake.cumulative_rewards.checked_add(reward)?;
    }
    STAKERS.save(deps.storage, account, &stake)?;
    Ok(block_rewards)
}

fn pull_rewards(
    config: &ConfigResponse,
    env: &Env,
    rewards: Uint128,
) -> StdResult<Vec<CosmosMsg>> {
    if rewards.is_zero() {
        return Ok(vec![]);
    }
    Ok(vec![wasm_execute(
        &config.fee_collector,
        &collector::ExecuteMsg::SendToken {
            token: config.reward_denom.clone(),
            amount: rewards,
            recipient: env.contract.address.to_string(),
        },
        vec![],
    )?
    .into()])
}

fn exec_stake(mut deps: DepsMut, env: Env, info: MessageInfo) -> StdResult<Response> {
    let config = CONFIG.load(deps.storage)?;
    let amount = may_pay(&info, &config.deposit_denom)
        .map_err(|_| StdError::generic_err("Invalid Funds"))?;
    assert_open(deps.as_ref())?;
    ensure!(!amount.is_zero(), StdError::generic_err("Invalid funds"));

    let rewards = update_rewards(deps.branch(), &env, &info.sender)?;
    STAKERS.update(deps.storage, &info.sender, |stake| -> StdResult<_> {
        let mut stake = stake.unwrap_or_default();
        stake.staked_amounts = stake.staked_amounts.checked_add(amount)?;
        Ok(stake)
    })?;

    Ok(Response::new()
        .add_messages(pull_rewards(&config, &env, rewards)?)
        .add_message(wasm_execute(
            &config.staked_denom,
            &Cw20ExecuteMsg::Mint {
                recipient: info.sender.to_string(),
                amount,
            },
            vec![],
        )?)
        .add_attribute("action", "stake")
        .add_attribute("amount", amount))
}

fn exec_unstake(
    mut deps: DepsMut,
    env: Env,
    info: MessageInfo,
    receive: Cw20ReceiveMsg,
) -> StdResult<Response> {
    let staker = deps.api.addr_validate(&receive.sender)?;
    assert_open(deps.as_ref())?;
    let config = CONFIG.load(deps.storage)?;
    ensure!(
        info.sender.as_str() == config.staked_denom && !receive.amount.is_zero(),
        StdError::generic_err("Invalid funds")
    );

    let rewards = update_rewards(deps.branch(), &env, &staker)?;
    STAKERS.update(deps.storage, &staker, |stake| -> StdResult<_> {
        let mut stake = stake.unwrap_or_default();
        stake.staked_amounts = stake.staked_amounts.checked_sub(receive.amount)?;
        Ok(stake)
    })?;

    Ok(Response::new()
        .add_messages(pull_rewards(&config, &env, rewards)?)
        .add_message(wasm_execute(
            &config.staked_denom,
            &Cw20ExecuteMsg::Burn {
                amount: receive.amount,
            },
            vec![],
        )?)
        .add_message(BankMsg::Send {
            to_address: staker.into_string(),
            amount: vec![Coin {
                denom: config.deposit_denom,
                amount: receive.amount,
            }],
        })
        .add_attribute("action", "unstake")
        .add_attribute("amount", receive.amount))
}

fn exec_claim(
    mut deps: DepsMut,
    env: Env,
    info: MessageInfo,
    recipient: Option<String>,
) -> StdResult<Response> {
    assert_open(deps.as_ref())?;
    let config = CONFIG.load(deps.storage)?;
    let recipient = match recipient {
        Some(recipient) => deps.api.addr_validate(&recipient)?,
        None => info.sender.clone(),
    };

    let rewards = update_rewards(deps.branch(), &env, &info.sender)?;
    let mut claimed = Uint128::zero();
    STAKERS.update(deps.storage, &info.sender, |stake| -> StdResult<_> {
        let mut stake = stake.unwrap_or_default();
        claimed = std::mem::take(&mut stake.claimable_rewards);
        Ok(stake)
    })?;

    let mut response = Response::new().add_messages(pull_rewards(&config, &env, rewards)?);
    if !claimed.is_zero() {
        response = response.add_message(BankMsg::Send {
            to_address: recipient.into_string(),
            amount: vec![Coin {
                denom: config.reward_denom,
                amount: claimed,
            }],
        });
    }
    Ok(response
        .add_attribute("action", "claim")
        .add_attribute("amount", claimed))
}

fn exec_unpause(deps: DepsMut, info: MessageInfo) -> StdResult<Response> {
    let config = CONFIG.load(deps.storage)?;
    ensure!(
        info.sender == config.owner,
        StdError::generic_err("Unauthorized")
    );
    let mut state = STATE.load(deps.storage)?;
    ensure!(!state.is_open, StdError::generic_err("Contract is not paused"));
    state.is_open = true;
    STATE.save(deps.storage, &state)?;
    Ok(Response::new().add_attribute("action", "unpause"))
}

fn query(deps: Deps, env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => to_json_binary(&CONFIG.load(deps.storage)?),
        QueryMsg::State {} => to_json_binary(&STATE.load(deps.storage)?),
        QueryMsg::GetClaimable { user } => to_json_binary(&query_claimable(deps, env, user)?),
        QueryMsg::GetUserStakedAmount { user } => {
            let user = deps.api.addr_validate(&user)?;
            to_json_binary(&STAKERS.may_load(deps.storage, &user)?.unwrap_or_default())
        }
    }
}

/// Claimable rewards as if the accumulator were updated right now, without
/// capping by the collector balance.
fn query_claimable(deps: Deps, env: Env, user: String) -> StdResult<Uint128> {
    let user = deps.api.addr_validate(&user)?;
    let stake = STAKERS.may_load(deps.storage, &user)?.unwrap_or_default();
    if stake.staked_amounts.is_zero() {
        return Ok(Uint128::zero());
    }
    let config = CONFIG.load(deps.storage)?;
    let state = STATE.load(deps.storage)?;
    let precision = reward_precision(&config)?;
    let pending = pending_rewards(&config, &state, &env)?.checked_mul(precision)?;
    let supply = token_supply(deps.querier, &config.staked_denom)?;
    let next_rewards_per_token = REWARDS_PER_TOKEN
        .load(deps.storage)?
        .checked_add(pending.checked_div(supply)?)?;
    let latest = stake
        .staked_amounts
        .checked_mul(next_rewards_per_token.checked_sub(stake.previous_cumulative_rewards_per_token)?)?
        .checked_div(precision)?;
    Ok(stake.claimable_rewards.checked_add(latest)?)
}

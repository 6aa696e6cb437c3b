use cosmwasm_std::{from_json, to_json_binary, Binary, Uint128};
use cw20::Cw20ExecuteMsg;
use serde_json::{json, Value};

use super::{collector, distributor, staking};

fn wire(msg: &impl serde::Serialize) -> Value {
    serde_json::from_slice(to_json_binary(msg).unwrap().as_slice()).unwrap()
}

#[test]
fn test_collector_messages_on_the_wire() {
    assert_eq!(
        wire(&collector::ExecuteMsg::AddToken {
            token: "uosmo".to_string()
        }),
        json!({"add_token": {"token": "uosmo"}})
    );
    assert_eq!(
        wire(&collector::ExecuteMsg::UpdateWhitelist {
            address: "staking".to_string()
        }),
        json!({"update_whitelist": {"address": "staking"}})
    );
    assert_eq!(
        wire(&collector::QueryMsg::GetTokenList { limit: None }),
        json!({"get_token_list": {"limit": null}})
    );
    let bare: collector::QueryMsg = from_json(br#"{"get_token_list":{}}"#).unwrap();
    assert_eq!(bare, collector::QueryMsg::GetTokenList { limit: None });
}

#[test]
fn test_distributor_distribution_is_a_list_of_pairs() {
    let msg = distributor::InstantiateMsg {
        token: "ureward".to_string(),
        distribution: vec![
            ("protocol".to_string(), Uint128::new(200_000)),
            ("collector".to_string(), Uint128::new(500_000)),
        ],
    };
    assert_eq!(
        wire(&msg),
        json!({
            "token": "ureward",
            "distribution": [["protocol", "200000"], ["collector", "500000"]]
        })
    );
    assert_eq!(
        wire(&distributor::ExecuteMsg::Distribute {}),
        json!({"distribute": {}})
    );
}

#[test]
fn test_staking_claim_and_stake() {
    assert_eq!(wire(&staking::ExecuteMsg::Stake {}), json!({"stake": {}}));
    assert_eq!(
        wire(&staking::ExecuteMsg::Claim {
            recipient: Some("owner".to_string())
        }),
        json!({"claim": {"recipient": "owner"}})
    );
    assert_eq!(
        wire(&staking::QueryMsg::GetUserStakedAmount {
            user: "owner".to_string()
        }),
        json!({"get_user_staked_amount": {"user": "owner"}})
    );
}

#[test]
fn test_unstake_hook_is_embedded_as_base64_json() {
    let hook = to_json_binary(&staking::Cw20HookMsg::Unstake {}).unwrap();
    assert_eq!(hook, Binary::from(br#"{"unstake":{}}"#.as_slice()));

    let send = Cw20ExecuteMsg::Send {
        contract: "staking".to_string(),
        amount: Uint128::new(1000),
        msg: hook,
    };
    assert_eq!(
        wire(&send),
        json!({
            "send": {
                "contract": "staking",
                "amount": "1000",
                "msg": "eyJ1bnN0YWtlIjp7fX0="
            }
        })
    );
}

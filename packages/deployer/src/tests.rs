use cosmwasm_std::{Coin, Uint128};
use fee_distribution_base::{
    error::deployer::DeployError,
    msg::{distributor, staking},
    state::deployment::{DeploymentConfig, COLLECTOR_DISTRIBUTION_WEIGHT},
};

use crate::{
    artifacts::Artifacts,
    checkpoint::{Prompt, Unattended},
    config,
    gateway::ChainGateway,
    lifecycle::{
        Exerciser, LifecycleParams, Stage, COLLECTOR, DISTRIBUTOR, MANAGER, OWNER, PROTOCOL,
        STAKING,
    },
    pipeline::{DeploymentOutcome, Pipeline, COLLECTOR_LABEL, DISTRIBUTOR_LABEL, STAKING_LABEL},
    record::RecordStore,
    testing::{GatewayCall, RecordingGateway, SimulatedChain},
};

const PREFIX: &str = "osmo";
const DEPOSIT: &str = "ustake";
const REWARD: &str = "ureward";

fn funded_chain() -> SimulatedChain {
    let chain = SimulatedChain::new(PREFIX, "abandon abandon about").unwrap();
    let owner = chain.account().address.clone();
    chain
        .fund(
            &owner,
            &[
                Coin::new(100_000_000u128, DEPOSIT),
                Coin::new(100_000_000u128, REWARD),
            ],
        )
        .unwrap();
    chain
}

fn local_config() -> DeploymentConfig {
    config::local(PREFIX).unwrap()
}

async fn deploy(
    gateway: &RecordingGateway<SimulatedChain>,
    pipeline: Pipeline,
) -> Result<DeploymentOutcome, DeployError> {
    pipeline
        .run(
            gateway,
            &Artifacts::in_memory(),
            &local_config(),
            &mut Unattended,
        )
        .await
}

fn instantiated_labels(gateway: &RecordingGateway<SimulatedChain>) -> Vec<String> {
    gateway
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            GatewayCall::Instantiate { label, .. } => Some(label),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn staking_is_instantiated_after_its_dependencies() {
    let gateway = RecordingGateway::new(funded_chain());
    let outcome = deploy(&gateway, Pipeline::deploy()).await.unwrap();

    assert_eq!(
        instantiated_labels(&gateway),
        vec![COLLECTOR_LABEL, STAKING_LABEL, DISTRIBUTOR_LABEL]
    );
    let init: staking::InstantiateMsg = gateway.instantiate_msg(STAKING_LABEL).unwrap();
    assert_eq!(init.fee_collector, outcome.collector.address);
    assert_ne!(init.token_code_id, 0);
    assert_eq!(init.token_code_id, outcome.cw20_code_id);
    assert_eq!(outcome.config.staking, init);

    // The profile passed in still carries the placeholders.
    assert_eq!(local_config().staking.fee_collector, "");
}

#[tokio::test]
async fn collector_joins_the_distribution_once() {
    let gateway = RecordingGateway::new(funded_chain());
    let outcome = deploy(&gateway, Pipeline::deploy()).await.unwrap();

    let profile = local_config();
    let init: distributor::InstantiateMsg = gateway.instantiate_msg(DISTRIBUTOR_LABEL).unwrap();
    assert_eq!(init.distribution.len(), 3);
    assert_eq!(
        init.distribution[..2],
        profile.distributor.distribution[..]
    );
    assert_eq!(
        init.distribution[2],
        (
            outcome.collector.address.clone(),
            Uint128::new(COLLECTOR_DISTRIBUTION_WEIGHT)
        )
    );
}

#[tokio::test]
async fn empty_collector_address_aborts_before_staking() {
    let gateway = RecordingGateway::new(funded_chain()).override_instantiate(COLLECTOR_LABEL, "");
    let err = deploy(&gateway, Pipeline::deploy()).await.unwrap_err();

    match err {
        DeployError::UnsetDependency { step, field } => {
            assert_eq!(step, "deploy_staking");
            assert_eq!(field, "collector_address");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(instantiated_labels(&gateway), vec![COLLECTOR_LABEL]);
    let uploads = gateway
        .calls()
        .iter()
        .filter(|call| matches!(call, GatewayCall::Upload { .. }))
        .count();
    assert_eq!(uploads, 2);
}

#[tokio::test]
async fn unbalanced_distribution_never_reaches_the_chain() {
    let gateway = RecordingGateway::new(funded_chain());
    let mut profile = local_config();
    profile.distributor.distribution[1].1 = Uint128::new(400_000);

    let err = Pipeline::deploy()
        .run(&gateway, &Artifacts::in_memory(), &profile, &mut Unattended)
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::InvalidDistribution { .. }));
    assert!(!instantiated_labels(&gateway).contains(&DISTRIBUTOR_LABEL.to_string()));
}

#[tokio::test]
async fn closed_input_stops_before_the_first_step() {
    let gateway = RecordingGateway::new(funded_chain());
    let mut prompt = Prompt::new(&b""[..], Vec::new());

    let err = Pipeline::deploy()
        .run(
            &gateway,
            &Artifacts::in_memory(),
            &local_config(),
            &mut prompt,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::InputClosed { .. }));
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn record_round_trips_through_the_store() {
    let gateway = RecordingGateway::new(funded_chain());
    let outcome = deploy(&gateway, Pipeline::deploy()).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::new(dir.path().join("contract-address.json"));
    store.save(&outcome.record).await.unwrap();

    let record = store.load().await.unwrap();
    assert_eq!(record, outcome.record);
    assert_eq!(record.staking_address, outcome.staking.address);
    assert_ne!(record.collector_address, record.distributor_address);
}

#[tokio::test]
async fn lifecycle_moves_funds_as_expected() {
    let gateway = RecordingGateway::new(funded_chain());
    let outcome = deploy(&gateway, Pipeline::end_to_end()).await.unwrap();

    let report = Exerciser::new(&gateway, &outcome.config, &outcome.record)
        .run(&mut Unattended)
        .await
        .unwrap();
    assert_eq!(report.final_stage, Stage::Done);
    assert_eq!(report.transitions.len(), 6);

    let funded = report.transition(Stage::Funded).unwrap();
    assert_eq!(funded.before.amount(DISTRIBUTOR, REWARD), Uint128::zero());
    assert_eq!(
        funded.after.amount(DISTRIBUTOR, REWARD),
        Uint128::new(20_000_000)
    );

    let distributed = report.transition(Stage::Distributed).unwrap();
    let gained = |role: &str| {
        distributed.after.amount(role, REWARD) - distributed.before.amount(role, REWARD)
    };
    assert_eq!(gained(COLLECTOR), Uint128::new(10_000_000));
    assert_eq!(gained(PROTOCOL), Uint128::new(4_000_000));
    assert_eq!(gained(MANAGER), Uint128::new(6_000_000));
    assert_eq!(
        distributed.after.amount(DISTRIBUTOR, REWARD),
        Uint128::zero()
    );

    let staked = report.transition(Stage::Staked).unwrap();
    let token = report.receipt_token.as_str();
    assert_eq!(
        staked.after.amount(STAKING, DEPOSIT),
        Uint128::new(10_000_000)
    );
    assert_eq!(staked.after.amount(OWNER, token), Uint128::new(10_000_000));
    assert_eq!(
        staked.before.amount(OWNER, DEPOSIT) - staked.after.amount(OWNER, DEPOSIT),
        Uint128::new(10_000_000)
    );
    assert_eq!(report.position.staked_amounts, Uint128::new(10_000_000));

    // One block of rewards, all of it going to the only staker.
    let claimed = report.transition(Stage::Claimed).unwrap();
    assert_eq!(
        claimed.after.amount(OWNER, REWARD) - claimed.before.amount(OWNER, REWARD),
        Uint128::new(60_000)
    );
    assert_eq!(
        claimed.before.amount(COLLECTOR, REWARD) - claimed.after.amount(COLLECTOR, REWARD),
        Uint128::new(60_000)
    );

    let unstaked = report.transition(Stage::Unstaked).unwrap();
    assert_eq!(unstaked.after.amount(OWNER, token), Uint128::zero());
    assert_eq!(unstaked.after.amount(STAKING, DEPOSIT), Uint128::zero());
    assert_eq!(
        unstaked.after.amount(OWNER, DEPOSIT),
        report.initial.amount(OWNER, DEPOSIT)
    );
}

#[tokio::test]
async fn lifecycle_needs_the_collector_whitelist() {
    let gateway = RecordingGateway::new(funded_chain());
    let outcome = deploy(&gateway, Pipeline::deploy()).await.unwrap();

    let err = Exerciser::new(&gateway, &outcome.config, &outcome.record)
        .run(&mut Unattended)
        .await
        .unwrap_err();
    assert!(matches!(err, DeployError::Gateway { .. }));
    assert!(err.to_string().contains("unauthorized"));
}

#[tokio::test]
async fn standalone_unstake_asks_for_the_amount() {
    let gateway = RecordingGateway::new(funded_chain());
    let outcome = deploy(&gateway, Pipeline::end_to_end()).await.unwrap();
    let report = Exerciser::new(&gateway, &outcome.config, &outcome.record)
        .with_params(LifecycleParams {
            unstake_amount: Some(Uint128::new(4_000_000)),
            ..LifecycleParams::default()
        })
        .run(&mut Unattended)
        .await
        .unwrap();
    let token = report.receipt_token.as_str();

    let mut prompt = Prompt::new(&b"all of it\n2500000\n"[..], Vec::new());
    let unstaked = Exerciser::new(&gateway, &outcome.config, &outcome.record)
        .unstake(&mut prompt)
        .await
        .unwrap();

    assert_eq!(unstaked.stage, Stage::Unstaked);
    assert_eq!(unstaked.before.amount(OWNER, token), Uint128::new(6_000_000));
    assert_eq!(unstaked.after.amount(OWNER, token), Uint128::new(3_500_000));
    assert_eq!(
        unstaked.after.amount(OWNER, DEPOSIT) - unstaked.before.amount(OWNER, DEPOSIT),
        Uint128::new(2_500_000)
    );
    let output = String::from_utf8(prompt.into_output()).unwrap();
    assert!(output.contains("Please enter a whole number"));
}

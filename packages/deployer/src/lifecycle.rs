use cosmwasm_std::{to_json_binary, Addr, Coin, Uint128};
use cw20::{Cw20ExecuteMsg, Cw20QueryMsg, Denom};
use fee_distribution_base::{
    error::deployer::DeployResult,
    msg::{distributor, staking},
    state::deployment::{DeploymentConfig, DeploymentRecord},
};
use fee_distribution_helpers::{
    answer::balances_block,
    fsm::{Fsm, Transition},
};
use tracing::info;

use crate::{
    checkpoint::Checkpoint,
    gateway::{execute_contract, query_contract, ChainGateway, TxResult},
};

pub const DEFAULT_FUND_AMOUNT: u128 = 20_000_000;
pub const DEFAULT_STAKE_AMOUNT: u128 = 10_000_000;

pub const OWNER: &str = "owner";
pub const PROTOCOL: &str = "protocol";
pub const MANAGER: &str = "manager";
pub const COLLECTOR: &str = "collector";
pub const DISTRIBUTOR: &str = "distributor";
pub const STAKING: &str = "staking";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Funded,
    Distributed,
    Staked,
    RewardsAccrued,
    Claimed,
    Unstaked,
    Done,
}

const STAGES: &[Transition<Stage>] = &[
    Transition {
        from: Stage::Idle,
        to: Stage::Funded,
    },
    Transition {
        from: Stage::Funded,
        to: Stage::Distributed,
    },
    Transition {
        from: Stage::Distributed,
        to: Stage::Staked,
    },
    Transition {
        from: Stage::Staked,
        to: Stage::RewardsAccrued,
    },
    Transition {
        from: Stage::RewardsAccrued,
        to: Stage::Claimed,
    },
    Transition {
        from: Stage::Claimed,
        to: Stage::Unstaked,
    },
    Transition {
        from: Stage::Unstaked,
        to: Stage::Done,
    },
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LifecycleParams {
    pub fund_amount: Uint128,
    pub stake_amount: Uint128,
    /// `None` unstakes the whole receipt-token balance.
    pub unstake_amount: Option<Uint128>,
}

impl Default for LifecycleParams {
    fn default() -> Self {
        Self {
            fund_amount: Uint128::new(DEFAULT_FUND_AMOUNT),
            stake_amount: Uint128::new(DEFAULT_STAKE_AMOUNT),
            unstake_amount: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartyBalances {
    pub role: String,
    pub address: String,
    /// Receipt tokens show up with the token contract address as denom.
    pub coins: Vec<Coin>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub parties: Vec<PartyBalances>,
}

impl BalanceSnapshot {
    /// Zero when the role or denom was not part of the snapshot.
    pub fn amount(&self, role: &str, denom: &str) -> Uint128 {
        self.parties
            .iter()
            .filter(|party| party.role == role)
            .flat_map(|party| party.coins.iter())
            .find(|coin| coin.denom == denom)
            .map(|coin| coin.amount)
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionReport {
    pub stage: Stage,
    pub tx_hash: Option<String>,
    pub before: BalanceSnapshot,
    pub after: BalanceSnapshot,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LifecycleReport {
    pub initial: BalanceSnapshot,
    pub transitions: Vec<TransitionReport>,
    pub receipt_token: String,
    pub position: staking::UserStakeResponse,
    pub claimable: Uint128,
    pub final_stage: Stage,
}

impl LifecycleReport {
    pub fn transition(&self, stage: Stage) -> Option<&TransitionReport> {
        self.transitions
            .iter()
            .find(|transition| transition.stage == stage)
    }
}

struct Watch<'a> {
    role: &'static str,
    address: &'a str,
    denoms: Vec<Denom>,
}

fn native(denom: &str) -> Denom {
    Denom::Native(denom.to_string())
}

fn receipt(token: &str) -> Denom {
    Denom::Cw20(Addr::unchecked(token))
}

/// Walks a deployed system through fund, distribute, stake, claim and
/// unstake, snapshotting balances around every transaction.
pub struct Exerciser<'a> {
    gateway: &'a dyn ChainGateway,
    config: &'a DeploymentConfig,
    record: &'a DeploymentRecord,
    params: LifecycleParams,
}

impl<'a> Exerciser<'a> {
    pub fn new(
        gateway: &'a dyn ChainGateway,
        config: &'a DeploymentConfig,
        record: &'a DeploymentRecord,
    ) -> Self {
        Self {
            gateway,
            config,
            record,
            params: LifecycleParams::default(),
        }
    }

    pub fn with_params(self, params: LifecycleParams) -> Self {
        Self { params, ..self }
    }

    fn owner(&self) -> &str {
        &self.gateway.account().address
    }

    async fn holding(&self, address: &str, denom: &Denom) -> DeployResult<Coin> {
        match denom {
            Denom::Native(denom) => self.gateway.balance(address, denom).await,
            Denom::Cw20(token) => {
                let res: cw20::BalanceResponse = query_contract(
                    self.gateway,
                    token.as_str(),
                    &Cw20QueryMsg::Balance {
                        address: address.to_string(),
                    },
                )
                .await?;
                Ok(Coin {
                    denom: token.to_string(),
                    amount: res.balance,
                })
            }
        }
    }

    async fn snapshot(&self, watches: &[Watch<'_>]) -> DeployResult<BalanceSnapshot> {
        let mut parties = Vec::with_capacity(watches.len());
        for watch in watches {
            let mut coins = Vec::with_capacity(watch.denoms.len());
            for denom in &watch.denoms {
                coins.push(self.holding(watch.address, denom).await?);
            }
            info!("{}", balances_block(watch.address, watch.role, &coins));
            parties.push(PartyBalances {
                role: watch.role.to_string(),
                address: watch.address.to_string(),
                coins,
            });
        }
        Ok(BalanceSnapshot { parties })
    }

    async fn staking_config(&self) -> DeployResult<staking::ConfigResponse> {
        let state: staking::StateResponse = query_contract(
            self.gateway,
            &self.record.staking_address,
            &staking::QueryMsg::State {},
        )
        .await?;
        let config: staking::ConfigResponse = query_contract(
            self.gateway,
            &self.record.staking_address,
            &staking::QueryMsg::Config {},
        )
        .await?;
        info!(state = ?state, config = ?config, "staking contract");
        Ok(config)
    }

    async fn send_unstake(&self, token: &str, amount: Uint128) -> DeployResult<TxResult> {
        execute_contract(
            self.gateway,
            token,
            &Cw20ExecuteMsg::Send {
                contract: self.record.staking_address.clone(),
                amount,
                msg: to_json_binary(&staking::Cw20HookMsg::Unstake {})?,
            },
            &[],
        )
        .await
    }

    pub async fn run(&self, checkpoint: &mut dyn Checkpoint) -> DeployResult<LifecycleReport> {
        let mut fsm = Fsm::new(Stage::Idle, STAGES);
        let mut transitions = vec![];
        let owner = self.owner().to_string();
        let deposit = self.config.deposit_denom();
        let reward = self.config.reward_denom();
        let both = || vec![native(deposit), native(reward)];

        checkpoint.wait("Querying all balances start...").await?;
        let initial = self
            .snapshot(&[
                Watch {
                    role: OWNER,
                    address: &owner,
                    denoms: both(),
                },
                Watch {
                    role: PROTOCOL,
                    address: &self.config.protocol_address,
                    denoms: both(),
                },
                Watch {
                    role: MANAGER,
                    address: &self.config.manager_address,
                    denoms: both(),
                },
                Watch {
                    role: COLLECTOR,
                    address: &self.record.collector_address,
                    denoms: both(),
                },
            ])
            .await?;

        checkpoint.wait("Deposit fees into distributor...").await?;
        let watches = [
            Watch {
                role: DISTRIBUTOR,
                address: &self.record.distributor_address,
                denoms: vec![native(reward)],
            },
            Watch {
                role: OWNER,
                address: &owner,
                denoms: vec![native(reward)],
            },
        ];
        let before = self.snapshot(&watches).await?;
        let tx = self
            .gateway
            .send_tokens(
                &self.record.distributor_address,
                &[Coin {
                    denom: reward.to_string(),
                    amount: self.params.fund_amount,
                }],
            )
            .await?;
        info!(tx = %tx.transaction_hash, "Deposit tx");
        let after = self.snapshot(&watches).await?;
        fsm.go_to(Stage::Funded)?;
        transitions.push(TransitionReport {
            stage: Stage::Funded,
            tx_hash: Some(tx.transaction_hash),
            before,
            after,
        });

        checkpoint
            .wait("Distribute fees from distributor...")
            .await?;
        let watches = [
            Watch {
                role: DISTRIBUTOR,
                address: &self.record.distributor_address,
                denoms: vec![native(reward)],
            },
            Watch {
                role: COLLECTOR,
                address: &self.record.collector_address,
                denoms: vec![native(reward)],
            },
            Watch {
                role: PROTOCOL,
                address: &self.config.protocol_address,
                denoms: vec![native(reward)],
            },
            Watch {
                role: MANAGER,
                address: &self.config.manager_address,
                denoms: vec![native(reward)],
            },
        ];
        let before = self.snapshot(&watches).await?;
        let tx = execute_contract(
            self.gateway,
            &self.record.distributor_address,
            &distributor::ExecuteMsg::Distribute {},
            &[],
        )
        .await?;
        info!(tx = %tx.transaction_hash, "Distribute tx");
        let after = self.snapshot(&watches).await?;
        fsm.go_to(Stage::Distributed)?;
        transitions.push(TransitionReport {
            stage: Stage::Distributed,
            tx_hash: Some(tx.transaction_hash),
            before,
            after,
        });

        checkpoint
            .wait("Stake deposit token into staking contract...")
            .await?;
        let staking_config = self.staking_config().await?;
        let token = staking_config.staked_denom.as_str();
        let watches = [
            Watch {
                role: STAKING,
                address: &self.record.staking_address,
                denoms: vec![native(deposit)],
            },
            Watch {
                role: OWNER,
                address: &owner,
                denoms: vec![native(deposit), receipt(token)],
            },
        ];
        let before = self.snapshot(&watches).await?;
        let tx = execute_contract(
            self.gateway,
            &self.record.staking_address,
            &staking::ExecuteMsg::Stake {},
            &[Coin {
                denom: deposit.to_string(),
                amount: self.params.stake_amount,
            }],
        )
        .await?;
        info!(tx = %tx.transaction_hash, "Staking tx");
        let after = self.snapshot(&watches).await?;
        fsm.go_to(Stage::Staked)?;
        transitions.push(TransitionReport {
            stage: Stage::Staked,
            tx_hash: Some(tx.transaction_hash),
            before,
            after,
        });

        let watches = [Watch {
            role: OWNER,
            address: &owner,
            denoms: vec![receipt(token), native(reward)],
        }];
        let accrued = self.snapshot(&watches).await?;
        let position: staking::UserStakeResponse = query_contract(
            self.gateway,
            &self.record.staking_address,
            &staking::QueryMsg::GetUserStakedAmount {
                user: owner.clone(),
            },
        )
        .await?;
        let claimable: Uint128 = query_contract(
            self.gateway,
            &self.record.staking_address,
            &staking::QueryMsg::GetClaimable {
                user: owner.clone(),
            },
        )
        .await?;
        info!(position = ?position, claimable = %claimable, "staking position");
        fsm.go_to(Stage::RewardsAccrued)?;
        transitions.push(TransitionReport {
            stage: Stage::RewardsAccrued,
            tx_hash: None,
            before: accrued.clone(),
            after: accrued,
        });

        checkpoint.wait("Claim rewards...").await?;
        let watches = [
            Watch {
                role: OWNER,
                address: &owner,
                denoms: vec![native(reward), receipt(token)],
            },
            Watch {
                role: STAKING,
                address: &self.record.staking_address,
                denoms: vec![native(reward)],
            },
            Watch {
                role: COLLECTOR,
                address: &self.record.collector_address,
                denoms: vec![native(reward)],
            },
        ];
        let before = self.snapshot(&watches).await?;
        let tx = execute_contract(
            self.gateway,
            &self.record.staking_address,
            &staking::ExecuteMsg::Claim {
                recipient: Some(owner.clone()),
            },
            &[],
        )
        .await?;
        info!(tx = %tx.transaction_hash, "Claim rewards tx");
        let after = self.snapshot(&watches).await?;
        fsm.go_to(Stage::Claimed)?;
        transitions.push(TransitionReport {
            stage: Stage::Claimed,
            tx_hash: Some(tx.transaction_hash),
            before,
            after,
        });

        checkpoint
            .wait("Unstake deposit token from staking contract...")
            .await?;
        let watches = [
            Watch {
                role: STAKING,
                address: &self.record.staking_address,
                denoms: vec![native(deposit)],
            },
            Watch {
                role: OWNER,
                address: &owner,
                denoms: vec![native(deposit), receipt(token)],
            },
        ];
        let before = self.snapshot(&watches).await?;
        let amount = self
            .params
            .unstake_amount
            .unwrap_or_else(|| before.amount(OWNER, token));
        let tx = self.send_unstake(token, amount).await?;
        info!(tx = %tx.transaction_hash, amount = %amount, "Unstaking tx");
        let after = self.snapshot(&watches).await?;
        fsm.go_to(Stage::Unstaked)?;
        transitions.push(TransitionReport {
            stage: Stage::Unstaked,
            tx_hash: Some(tx.transaction_hash),
            before,
            after,
        });

        fsm.go_to(Stage::Done)?;
        Ok(LifecycleReport {
            initial,
            transitions,
            receipt_token: staking_config.staked_denom.clone(),
            position,
            claimable,
            final_stage: *fsm.current_state(),
        })
    }

    /// Unstakes from an already running system. Without a preset amount the
    /// checkpoint picks it: an unattended run takes the whole receipt balance,
    /// a prompt asks again until it reads a whole number.
    pub async fn unstake(&self, checkpoint: &mut dyn Checkpoint) -> DeployResult<TransitionReport> {
        let owner = self.owner().to_string();
        let staking_config = self.staking_config().await?;
        let token = staking_config.staked_denom.as_str();
        let watches = [
            Watch {
                role: STAKING,
                address: &self.record.staking_address,
                denoms: vec![native(&staking_config.deposit_denom)],
            },
            Watch {
                role: OWNER,
                address: &owner,
                denoms: vec![native(&staking_config.deposit_denom), receipt(token)],
            },
        ];
        let before = self.snapshot(&watches).await?;
        let amount = match self.params.unstake_amount {
            Some(amount) => amount,
            None => {
                checkpoint
                    .amount("Amount of receipt tokens to unstake", before.amount(OWNER, token))
                    .await?
            }
        };
        let tx = self.send_unstake(token, amount).await?;
        info!(tx = %tx.transaction_hash, amount = %amount, "Unstaking tx");
        let after = self.snapshot(&watches).await?;
        Ok(TransitionReport {
            stage: Stage::Unstaked,
            tx_hash: Some(tx.transaction_hash),
            before,
            after,
        })
    }
}

use std::fmt;

use cosmwasm_std::Uint128;
use fee_distribution_base::{
    error::deployer::{DeployError, DeployResult},
    msg::{
        collector,
        distributor::{self, DISTRIBUTION_DECIMALS, RECIPIENT_LIMIT},
        staking,
    },
    state::deployment::{
        ContractDeployment, DeploymentConfig, DeploymentRecord, COLLECTOR_DISTRIBUTION_WEIGHT,
    },
};
use fee_distribution_helpers::validation::validate_distribution;
use tracing::info;

use crate::{
    artifacts::{Artifact, Artifacts},
    checkpoint::Checkpoint,
    gateway::{deploy_contract, execute_contract, query_contract, ChainGateway},
};

pub const COLLECTOR_LABEL: &str = "collector";
pub const STAKING_LABEL: &str = "staking";
pub const DISTRIBUTOR_LABEL: &str = "distributor";

/// A value produced by one step and consumed by later ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Cw20CodeId,
    CollectorAddress,
    StakingAddress,
    DistributorAddress,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Cw20CodeId => "cw20_code_id",
            Field::CollectorAddress => "collector_address",
            Field::StakingAddress => "staking_address",
            Field::DistributorAddress => "distributor_address",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    UploadCw20,
    DeployCollector,
    DeployStaking,
    DeployDistributor,
    AddRewardToken,
    UnpauseStaking,
    WhitelistStaking,
    Verify,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::UploadCw20 => "upload_cw20",
            Step::DeployCollector => "deploy_collector",
            Step::DeployStaking => "deploy_staking",
            Step::DeployDistributor => "deploy_distributor",
            Step::AddRewardToken => "add_reward_token",
            Step::UnpauseStaking => "unpause_staking",
            Step::WhitelistStaking => "whitelist_staking",
            Step::Verify => "verify",
        }
    }

    pub fn banner(&self) -> &'static str {
        match self {
            Step::UploadCw20 => "Uploading CW20...",
            Step::DeployCollector => "Deploying Fee Collector...",
            Step::DeployStaking => "Deploying Staking...",
            Step::DeployDistributor => "Deploying Distributor...",
            Step::AddRewardToken => "Add token to collector...",
            Step::UnpauseStaking => "Unpause staking contract...",
            Step::WhitelistStaking => "Update collector contract whitelist...",
            Step::Verify => "Querying deployed contracts...",
        }
    }

    pub fn reads(&self) -> &'static [Field] {
        match self {
            Step::UploadCw20 | Step::DeployCollector => &[],
            Step::DeployStaking => &[Field::Cw20CodeId, Field::CollectorAddress],
            Step::DeployDistributor => &[Field::CollectorAddress],
            Step::AddRewardToken | Step::WhitelistStaking => {
                &[Field::CollectorAddress, Field::StakingAddress]
            }
            Step::UnpauseStaking => &[Field::StakingAddress],
            Step::Verify => &[
                Field::CollectorAddress,
                Field::StakingAddress,
                Field::DistributorAddress,
            ],
        }
    }

    pub fn writes(&self) -> &'static [Field] {
        match self {
            Step::UploadCw20 => &[Field::Cw20CodeId],
            Step::DeployCollector => &[Field::CollectorAddress],
            Step::DeployStaking => &[Field::StakingAddress],
            Step::DeployDistributor => &[Field::DistributorAddress],
            Step::AddRewardToken | Step::UnpauseStaking | Step::WhitelistStaking | Step::Verify => {
                &[]
            }
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const DEPLOY_STEPS: &[Step] = &[
    Step::UploadCw20,
    Step::DeployCollector,
    Step::DeployStaking,
    Step::DeployDistributor,
    Step::AddRewardToken,
    Step::UnpauseStaking,
    Step::Verify,
];

const END_TO_END_STEPS: &[Step] = &[
    Step::UploadCw20,
    Step::DeployCollector,
    Step::DeployStaking,
    Step::DeployDistributor,
    Step::AddRewardToken,
    Step::UnpauseStaking,
    Step::WhitelistStaking,
    Step::Verify,
];

fn check_order(steps: &[Step]) -> DeployResult<()> {
    let mut written: Vec<Field> = vec![];
    for step in steps {
        if let Some(field) = step.reads().iter().find(|field| !written.contains(field)) {
            return Err(DeployError::PipelineOrder {
                step: step.to_string(),
                field: field.to_string(),
            });
        }
        written.extend_from_slice(step.writes());
    }
    Ok(())
}

/// Everything known after a given step. Steps never modify a state in place,
/// each one returns the next state.
#[derive(Clone, Debug, PartialEq)]
pub struct DeploymentState {
    pub config: DeploymentConfig,
    pub cw20_code_id: Option<u64>,
    pub collector: Option<ContractDeployment>,
    pub staking: Option<ContractDeployment>,
    pub distributor: Option<ContractDeployment>,
}

impl DeploymentState {
    pub fn new(config: DeploymentConfig) -> Self {
        Self {
            config,
            cw20_code_id: None,
            collector: None,
            staking: None,
            distributor: None,
        }
    }

    fn cw20_code_id(&self, step: &str) -> DeployResult<u64> {
        self.cw20_code_id
            .filter(|code_id| *code_id != 0)
            .ok_or_else(|| unset(step, Field::Cw20CodeId))
    }

    fn contract(&self, step: &str, field: Field) -> DeployResult<&ContractDeployment> {
        let deployment = match field {
            Field::CollectorAddress => self.collector.as_ref(),
            Field::StakingAddress => self.staking.as_ref(),
            Field::DistributorAddress => self.distributor.as_ref(),
            Field::Cw20CodeId => None,
        };
        deployment
            .filter(|deployment| !deployment.address.is_empty())
            .ok_or_else(|| unset(step, field))
    }

    fn address(&self, step: Step, field: Field) -> DeployResult<String> {
        Ok(self.contract(step.name(), field)?.address.clone())
    }
}

fn unset(step: &str, field: Field) -> DeployError {
    DeployError::UnsetDependency {
        step: step.to_string(),
        field: field.to_string(),
    }
}

/// Result of a complete run.
#[derive(Clone, Debug, PartialEq)]
pub struct DeploymentOutcome {
    pub record: DeploymentRecord,
    /// The config with every dependent field filled in.
    pub config: DeploymentConfig,
    pub cw20_code_id: u64,
    pub collector: ContractDeployment,
    pub staking: ContractDeployment,
    pub distributor: ContractDeployment,
}

impl DeploymentOutcome {
    fn from_state(state: DeploymentState) -> DeployResult<Self> {
        const STEP: &str = "outcome";
        let cw20_code_id = state.cw20_code_id(STEP)?;
        let collector = state.contract(STEP, Field::CollectorAddress)?.clone();
        let staking = state.contract(STEP, Field::StakingAddress)?.clone();
        let distributor = state.contract(STEP, Field::DistributorAddress)?.clone();
        Ok(Self {
            record: DeploymentRecord {
                collector_address: collector.address.clone(),
                distributor_address: distributor.address.clone(),
                staking_address: staking.address.clone(),
            },
            config: state.config,
            cw20_code_id,
            collector,
            staking,
            distributor,
        })
    }
}

/// Ordered deployment steps whose field dependencies are checked when the
/// pipeline is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pipeline {
    steps: Vec<Step>,
}

impl Pipeline {
    pub fn new(steps: Vec<Step>) -> DeployResult<Self> {
        check_order(&steps)?;
        Ok(Self { steps })
    }

    pub fn deploy() -> Self {
        Self {
            steps: DEPLOY_STEPS.to_vec(),
        }
    }

    /// [`Pipeline::deploy`] plus whitelisting staking on the collector, which
    /// the lifecycle walk needs to pull rewards.
    pub fn end_to_end() -> Self {
        Self {
            steps: END_TO_END_STEPS.to_vec(),
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub async fn run(
        &self,
        gateway: &dyn ChainGateway,
        artifacts: &Artifacts,
        config: &DeploymentConfig,
        checkpoint: &mut dyn Checkpoint,
    ) -> DeployResult<DeploymentOutcome> {
        info!(owner = %gateway.account().address, "Wallet address from seed (owner)");
        let mut state = DeploymentState::new(config.clone());
        for step in &self.steps {
            checkpoint.wait(step.banner()).await?;
            info!("{}", step.banner());
            state = apply(*step, state, gateway, artifacts).await?;
        }
        DeploymentOutcome::from_state(state)
    }
}

/// Runs one step against `state` and returns the state that follows it.
pub async fn apply(
    step: Step,
    state: DeploymentState,
    gateway: &dyn ChainGateway,
    artifacts: &Artifacts,
) -> DeployResult<DeploymentState> {
    match step {
        Step::UploadCw20 => {
            let wasm = artifacts.read(Artifact::Cw20).await?;
            let code_id = gateway.upload(&wasm).await?;
            info!(code_id, "CW20 uploaded");
            Ok(DeploymentState {
                cw20_code_id: Some(code_id),
                ..state
            })
        }
        Step::DeployCollector => {
            let collector = deploy_contract(
                gateway,
                artifacts,
                Artifact::Collector,
                COLLECTOR_LABEL,
                &state.config.collector,
            )
            .await?;
            info!(address = %collector.address, code_id = collector.code_id, "Fee Collector deployed");
            Ok(DeploymentState {
                collector: Some(collector),
                ..state
            })
        }
        Step::DeployStaking => {
            let code_id = state.cw20_code_id(step.name())?;
            let fee_collector = state.address(step, Field::CollectorAddress)?;
            let config = state
                .config
                .with_fee_collector(fee_collector)
                .with_token_code_id(code_id);
            info!(init = ?config.staking, "staking init message");
            let staking = deploy_contract(
                gateway,
                artifacts,
                Artifact::Staking,
                STAKING_LABEL,
                &config.staking,
            )
            .await?;
            info!(address = %staking.address, code_id = staking.code_id, "Staking deployed");
            Ok(DeploymentState {
                config,
                staking: Some(staking),
                ..state
            })
        }
        Step::DeployDistributor => {
            let collector = state.address(step, Field::CollectorAddress)?;
            let config = state
                .config
                .with_distribution_entry(collector, Uint128::new(COLLECTOR_DISTRIBUTION_WEIGHT));
            validate_distribution(
                &config.distributor.distribution,
                Uint128::new(DISTRIBUTION_DECIMALS),
                RECIPIENT_LIMIT,
            )
            .map_err(|err| DeployError::InvalidDistribution {
                reason: err.to_string(),
            })?;
            let distributor = deploy_contract(
                gateway,
                artifacts,
                Artifact::Distributor,
                DISTRIBUTOR_LABEL,
                &config.distributor,
            )
            .await?;
            info!(address = %distributor.address, code_id = distributor.code_id, "Distributor deployed");
            Ok(DeploymentState {
                config,
                distributor: Some(distributor),
                ..state
            })
        }
        Step::AddRewardToken => {
            let collector = state.address(step, Field::CollectorAddress)?;
            state.address(step, Field::StakingAddress)?;
            let tx = execute_contract(
                gateway,
                &collector,
                &collector::ExecuteMsg::AddToken {
                    token: state.config.reward_denom().to_string(),
                },
                &[],
            )
            .await?;
            info!(tx = %tx.transaction_hash, token = state.config.reward_denom(), "reward token added");
            Ok(state)
        }
        Step::UnpauseStaking => {
            let staking = state.address(step, Field::StakingAddress)?;
            let tx = execute_contract(gateway, &staking, &staking::ExecuteMsg::Unpause {}, &[])
                .await?;
            info!(tx = %tx.transaction_hash, "staking unpaused");
            Ok(state)
        }
        Step::WhitelistStaking => {
            let collector = state.address(step, Field::CollectorAddress)?;
            let staking = state.address(step, Field::StakingAddress)?;
            let tx = execute_contract(
                gateway,
                &collector,
                &collector::ExecuteMsg::UpdateWhitelist { address: staking },
                &[],
            )
            .await?;
            info!(tx = %tx.transaction_hash, "collector whitelist updated");
            Ok(state)
        }
        Step::Verify => {
            verify(&state, gateway).await?;
            Ok(state)
        }
    }
}

/// Read-only queries whose results are only logged.
async fn verify(state: &DeploymentState, gateway: &dyn ChainGateway) -> DeployResult<()> {
    let step = Step::Verify;
    let collector = state.address(step, Field::CollectorAddress)?;
    let distributor = state.address(step, Field::DistributorAddress)?;
    let staking = state.address(step, Field::StakingAddress)?;

    let owner: collector::OwnerResponse =
        query_contract(gateway, &collector, &collector::QueryMsg::GetOwner {}).await?;
    let whitelist: collector::WhitelistResponse =
        query_contract(gateway, &collector, &collector::QueryMsg::GetWhitelist {}).await?;
    let tokens: collector::AllTokenResponse = query_contract(
        gateway,
        &collector,
        &collector::QueryMsg::GetTokenList { limit: None },
    )
    .await?;
    info!(
        owner = %owner.owner,
        whitelist = %whitelist.address,
        tokens = ?tokens.token_list,
        "collector"
    );

    let owner: distributor::OwnerResponse =
        query_contract(gateway, &distributor, &distributor::QueryMsg::GetOwner {}).await?;
    let config: distributor::ConfigResponse =
        query_contract(gateway, &distributor, &distributor::QueryMsg::GetConfig {}).await?;
    let token: String =
        query_contract(gateway, &distributor, &distributor::QueryMsg::GetToken {}).await?;
    info!(
        owner = %owner.owner,
        distribution = ?config.distribution,
        token = %token,
        "distributor"
    );

    let contract_state: staking::StateResponse =
        query_contract(gateway, &staking, &staking::QueryMsg::State {}).await?;
    let config: staking::ConfigResponse =
        query_contract(gateway, &staking, &staking::QueryMsg::Config {}).await?;
    info!(state = ?contract_state, config = ?config, "staking");
    Ok(())
}

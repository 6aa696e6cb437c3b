use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use cosmwasm_std::Uint128;
use fee_distribution_base::state::deployment::DeploymentConfig;
use fee_distribution_deployer::{
    artifacts::Artifacts,
    checkpoint::{Checkpoint, Prompt, Unattended},
    gateway::ChainGateway,
    lifecycle::{Exerciser, LifecycleParams, DEFAULT_FUND_AMOUNT, DEFAULT_STAKE_AMOUNT},
    logging::{self, LogFormat},
    pipeline::Pipeline,
    record::{RecordStore, DEFAULT_RECORD_PATH},
    session,
};
use tokio::io::BufReader;
use tracing::info;

#[derive(Parser, Debug)]
#[clap(
    name = "fee-distribution-deployer",
    about = "Deploys the fee distribution contracts and walks them through their lifecycle"
)]
struct Opts {
    /// Directory holding the compiled contracts. The local network runs
    /// native code and does not read it.
    #[clap(long, global = true, default_value = "../artifacts")]
    artifacts: PathBuf,
    #[clap(long, global = true, default_value = DEFAULT_RECORD_PATH)]
    record: PathBuf,
    /// Wait for enter before every step.
    #[clap(long, global = true)]
    interactive: bool,
    /// JSON deployment profile used instead of the one named by NETWORK.
    #[clap(long, global = true)]
    profile: Option<PathBuf>,
    #[clap(long, global = true, value_enum, default_value_t)]
    log_format: LogFormat,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Deploy the contracts and record their addresses.
    Deploy,
    /// Deploy, whitelist staking on the collector and walk the lifecycle.
    EndToEnd(LifecycleArgs),
    /// Walk the lifecycle of the recorded deployment.
    Exercise(LifecycleArgs),
    /// Unstake receipt tokens from the recorded deployment.
    Unstake {
        /// Asked for at a prompt when interactive, otherwise the whole balance.
        #[clap(long)]
        amount: Option<u128>,
    },
}

#[derive(Args, Debug)]
struct LifecycleArgs {
    #[clap(long, default_value_t = DEFAULT_FUND_AMOUNT)]
    fund_amount: u128,
    #[clap(long, default_value_t = DEFAULT_STAKE_AMOUNT)]
    stake_amount: u128,
    /// Defaults to the whole receipt-token balance.
    #[clap(long)]
    unstake_amount: Option<u128>,
}

impl LifecycleArgs {
    fn params(&self) -> LifecycleParams {
        LifecycleParams {
            fund_amount: Uint128::new(self.fund_amount),
            stake_amount: Uint128::new(self.stake_amount),
            unstake_amount: self.unstake_amount.map(Uint128::new),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let opts = Opts::parse();
    logging::init(opts.log_format)?;

    let result = start(&opts).await;
    if let Err(err) = &result {
        logging::report_failure(err);
    }
    result
}

async fn start(opts: &Opts) -> Result<()> {
    let session = session::open(
        |name| std::env::var(name).ok(),
        opts.profile.as_deref(),
        &opts.artifacts,
        session::connect_local,
    )
    .await?;
    let mut checkpoint: Box<dyn Checkpoint> = if opts.interactive {
        Box::new(Prompt::new(
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
        ))
    } else {
        Box::new(Unattended)
    };
    let store = RecordStore::new(&opts.record);

    run(
        &opts.command,
        &session.gateway,
        &session.artifacts,
        &session.profile,
        &store,
        checkpoint.as_mut(),
    )
    .await
}

async fn run(
    command: &Command,
    gateway: &dyn ChainGateway,
    artifacts: &Artifacts,
    profile: &DeploymentConfig,
    store: &RecordStore,
    checkpoint: &mut dyn Checkpoint,
) -> Result<()> {
    match command {
        Command::Deploy => {
            let outcome = Pipeline::deploy()
                .run(gateway, artifacts, profile, checkpoint)
                .await?;
            store.save(&outcome.record).await?;
        }
        Command::EndToEnd(args) => {
            let outcome = Pipeline::end_to_end()
                .run(gateway, artifacts, profile, checkpoint)
                .await?;
            store.save(&outcome.record).await?;
            let report = Exerciser::new(gateway, &outcome.config, &outcome.record)
                .with_params(args.params())
                .run(checkpoint)
                .await?;
            info!(
                stage = ?report.final_stage,
                receipt_token = %report.receipt_token,
                "lifecycle finished"
            );
        }
        Command::Exercise(args) => {
            let record = store.load().await?;
            let report = Exerciser::new(gateway, profile, &record)
                .with_params(args.params())
                .run(checkpoint)
                .await?;
            info!(
                stage = ?report.final_stage,
                receipt_token = %report.receipt_token,
                "lifecycle finished"
            );
        }
        Command::Unstake { amount } => {
            let record = store.load().await?;
            let params = LifecycleParams {
                unstake_amount: amount.map(Uint128::new),
                ..LifecycleParams::default()
            };
            let report = Exerciser::new(gateway, profile, &record)
                .with_params(params)
                .unstake(checkpoint)
                .await?;
            info!(tx = ?report.tx_hash, "unstaked");
        }
    }
    Ok(())
}

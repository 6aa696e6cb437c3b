use async_trait::async_trait;
use cosmwasm_std::Uint128;
use fee_distribution_base::error::deployer::{DeployError, DeployResult};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Gate awaited between deployment and lifecycle steps.
#[async_trait]
pub trait Checkpoint: Send {
    async fn wait(&mut self, label: &str) -> DeployResult<()>;

    /// Asks for an amount. Unattended runs take `default`.
    async fn amount(&mut self, label: &str, default: Uint128) -> DeployResult<Uint128>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Unattended;

#[async_trait]
impl Checkpoint for Unattended {
    async fn wait(&mut self, _label: &str) -> DeployResult<()> {
        Ok(())
    }

    async fn amount(&mut self, _label: &str, default: Uint128) -> DeployResult<Uint128> {
        Ok(default)
    }
}

/// Blocks on a line of input at every checkpoint.
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R, W> Prompt<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    async fn say(&mut self, text: &str) -> DeployResult<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;
        Ok(())
    }

    async fn read_line(&mut self, label: &str) -> DeployResult<String> {
        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Err(DeployError::InputClosed {
                label: label.to_string(),
            });
        }
        Ok(line)
    }
}

#[async_trait]
impl<R, W> Checkpoint for Prompt<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn wait(&mut self, label: &str) -> DeployResult<()> {
        self.say(&format!("\n{label}\nPress enter to continue...\n"))
            .await?;
        self.read_line(label).await?;
        Ok(())
    }

    async fn amount(&mut self, label: &str, default: Uint128) -> DeployResult<Uint128> {
        loop {
            self.say(&format!("{label} (available {default}): ")).await?;
            let line = self.read_line(label).await?;
            match line.trim().parse::<u128>() {
                Ok(amount) => return Ok(Uint128::new(amount)),
                Err(_) => self.say("Please enter a whole number\n").await?,
            }
        }
    }
}

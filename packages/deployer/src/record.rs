use std::path::{Path, PathBuf};

use fee_distribution_base::{
    error::deployer::DeployResult, state::deployment::DeploymentRecord,
};
use tracing::info;

pub const DEFAULT_RECORD_PATH: &str = "contract-address.json";

/// Flat JSON file holding the addresses of the last successful deployment.
#[derive(Clone, Debug)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrites whatever the file held before.
    pub async fn save(&self, record: &DeploymentRecord) -> DeployResult<()> {
        let content = serde_json::to_vec(record)?;
        tokio::fs::write(&self.path, content).await?;
        info!(path = %self.path.display(), "deployment record saved");
        Ok(())
    }

    pub async fn load(&self) -> DeployResult<DeploymentRecord> {
        let content = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&content)?)
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new(DEFAULT_RECORD_PATH)
    }
}

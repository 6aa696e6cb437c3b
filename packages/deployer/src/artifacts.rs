use std::{collections::BTreeMap, path::PathBuf};

use fee_distribution_base::error::deployer::{DeployError, DeployResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Artifact {
    Cw20,
    Collector,
    Staking,
    Distributor,
}

impl Artifact {
    pub const ALL: [Artifact; 4] = [
        Artifact::Cw20,
        Artifact::Collector,
        Artifact::Staking,
        Artifact::Distributor,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Artifact::Cw20 => "cw20_base.wasm",
            Artifact::Collector => "collector.wasm",
            Artifact::Staking => "staking.wasm",
            Artifact::Distributor => "distributor.wasm",
        }
    }

    /// Stand-in bytecode: the wasm magic number followed by the file name.
    pub fn placeholder(&self) -> Vec<u8> {
        let mut blob = b"\0asm".to_vec();
        blob.extend_from_slice(self.file_name().as_bytes());
        blob
    }
}

#[derive(Clone, Debug)]
enum Source {
    Dir(PathBuf),
    Memory(BTreeMap<Artifact, Vec<u8>>),
}

/// Wasm bytecode of the four contracts, read as opaque blobs.
#[derive(Clone, Debug)]
pub struct Artifacts {
    source: Source,
}

impl Artifacts {
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::Dir(dir.into()),
        }
    }

    /// Placeholder bytecode for every contract, see [`Artifact::placeholder`].
    pub fn in_memory() -> Self {
        let blobs = Artifact::ALL
            .iter()
            .map(|artifact| (*artifact, artifact.placeholder()))
            .collect();
        Self {
            source: Source::Memory(blobs),
        }
    }

    pub fn path(&self, artifact: Artifact) -> PathBuf {
        match &self.source {
            Source::Dir(dir) => dir.join(artifact.file_name()),
            Source::Memory(_) => PathBuf::from(artifact.file_name()),
        }
    }

    pub async fn read(&self, artifact: Artifact) -> DeployResult<Vec<u8>> {
        match &self.source {
            Source::Dir(_) => {
                let path = self.path(artifact);
                tokio::fs::read(&path)
                    .await
                    .map_err(|err| DeployError::Artifact {
                        path: path.display().to_string(),
                        reason: err.to_string(),
                    })
            }
            Source::Memory(blobs) => {
                blobs
                    .get(&artifact)
                    .cloned()
                    .ok_or_else(|| DeployError::Artifact {
                        path: artifact.file_name().to_string(),
                        reason: "not loaded".to_string(),
                    })
            }
        }
    }
}

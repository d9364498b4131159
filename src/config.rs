//! Runtime configuration shared by the service and the CLI.
//!
//! Built once at startup from command-line arguments, with environment
//! variables (and a `.env` file, loaded by `main`) as fallbacks.

use anyhow::{Context, Result, bail};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::store::{FsRecordStore, RecordStore, S3RecordStore};

#[derive(Debug, Clone, Args)]
pub struct Config {
    /// S3 bucket holding the vote records
    #[arg(long, env = "TALLY_BUCKET", conflicts_with = "data_dir")]
    pub bucket: Option<String>,

    /// Local directory holding the vote records, instead of S3
    #[arg(long, env = "TALLY_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Key prefix (folder) the records live under
    #[arg(long, env = "TALLY_PREFIX", default_value = "vote_results")]
    pub prefix: String,

    /// Value of the Access-Control-Allow-Origin response header
    #[arg(long, env = "TALLY_ALLOWED_ORIGIN", default_value = "*")]
    pub allowed_origin: String,
}

impl Config {
    /// A configuration for the given prefix with no backend selected.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            bucket: None,
            data_dir: None,
            prefix: prefix.into(),
            allowed_origin: "*".to_string(),
        }
    }

    /// Opens the record store selected by `bucket` or `data_dir`.
    pub async fn open_store(&self) -> Result<Arc<dyn RecordStore>> {
        match (&self.bucket, &self.data_dir) {
            (Some(bucket), _) if !bucket.is_empty() => {
                info!(bucket = %bucket, prefix = %self.prefix, "Using S3 record store");
                Ok(Arc::new(S3RecordStore::from_env(bucket.clone()).await))
            }
            (_, Some(dir)) => {
                info!(dir = %dir.display(), prefix = %self.prefix, "Using local record store");
                tokio::fs::create_dir_all(dir)
                    .await
                    .with_context(|| format!("failed to create data dir '{}'", dir.display()))?;
                Ok(Arc::new(FsRecordStore::new(dir.clone())))
            }
            _ => bail!("no record store configured: set --bucket (TALLY_BUCKET) or --data-dir (TALLY_DATA_DIR)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_store_requires_a_backend() {
        let config = Config::with_prefix("vote_results");
        assert!(config.open_store().await.is_err());
    }

    #[tokio::test]
    async fn test_open_store_with_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: Some(dir.path().to_path_buf()),
            ..Config::with_prefix("vote_results")
        };

        let store = config.open_store().await.unwrap();
        assert!(store.list_keys("vote_results/").await.unwrap().is_empty());
    }
}

use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::warn;

use super::{RecordStore, StoreError, WriteMode};

/// Stores records as files under a local directory.
///
/// Keys are `/`-separated paths relative to `root`. Useful for running the
/// service without a bucket.
#[derive(Debug, Clone)]
pub struct FsRecordStore {
    root: PathBuf,
}

impl FsRecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait::async_trait]
impl RecordStore for FsRecordStore {
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound && dir != self.root => continue,
                Err(e) => {
                    return Err(StoreError::unavailable(format!(
                        "Failed to list '{}': {e}",
                        dir.display()
                    )));
                }
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StoreError::unavailable(format!("Failed to list '{}': {e}", dir.display())))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| StoreError::unavailable(e.to_string()))?;

                if file_type.is_dir() {
                    pending.push(path);
                } else if let Some(key) = relative_key(&self.root, &path) {
                    if key.starts_with(prefix) {
                        keys.push(key);
                    }
                }
            }
        }

        Ok(keys)
    }

    async fn get(&self, key: &str) -> Result<Bytes, StoreError> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(contents) => Ok(Bytes::from(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound {
                key: key.to_string(),
            }),
            Err(e) => Err(StoreError::unavailable(format!("Failed to read '{key}': {e}"))),
        }
    }

    async fn put(&self, key: &str, body: Bytes, mode: WriteMode) -> Result<(), StoreError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::unavailable(format!("Failed to create '{}': {e}", parent.display())))?;
        }

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true);
        match mode {
            WriteMode::Create => options.create_new(true),
            WriteMode::Overwrite => options.create(true).truncate(true),
        };

        let mut file = options.open(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::AlreadyExists {
                StoreError::AlreadyExists {
                    key: key.to_string(),
                }
            } else {
                StoreError::unavailable(format!("Failed to open '{key}': {e}"))
            }
        })?;

        write_or_discard(file, &path, &body)
            .await
            .map_err(|e| StoreError::unavailable(format!("Failed to write '{key}': {e}")))
    }
}

/// Writes `body` through `writer`. If the write fails, the partial file at
/// `path` is removed so a retried create does not hit a stale key.
async fn write_or_discard<W>(mut writer: W, path: &Path, body: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        writer.write_all(body).await?;
        writer.flush().await
    }
    .await;

    if written.is_err() {
        drop(writer);
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "Failed to remove partially written record");
        }
    }
    written
}

fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

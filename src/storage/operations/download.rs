use crate::error::{IsDirectorySnafu, Result};
use crate::storage::utils::error::map_not_found;
use crate::storage::utils::path::is_dir_path;
use bytes::Bytes;
use opendal::Operator;
use snafu::ensure;

/// Trait for downloading objects from storage.
pub trait Downloader {
    /// Read a single object fully into memory.
    ///
    /// # Arguments
    /// * `remote_path` - Object key in storage
    ///
    /// # Returns
    /// * `Result<Bytes>` - Object content, `PathNotFound` when the key is missing
    async fn download(&self, remote_path: &str) -> Result<Bytes>;
}

/// Implementation of Downloader for OpenDAL Operator.
pub struct OpenDalDownloader {
    operator: Operator,
}

impl OpenDalDownloader {
    /// Create a new downloader with the given OpenDAL operator.
    pub fn new(operator: Operator) -> Self {
        Self { operator }
    }
}

impl Downloader for OpenDalDownloader {
    async fn download(&self, remote_path: &str) -> Result<Bytes> {
        ensure!(
            !is_dir_path(remote_path),
            IsDirectorySnafu {
                path: remote_path.to_string()
            }
        );

        let data = self
            .operator
            .read(remote_path)
            .await
            .map_err(|e| map_not_found(remote_path, e))?;
        Ok(data.to_bytes())
    }
}

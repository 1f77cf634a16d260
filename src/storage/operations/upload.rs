use crate::error::{Result, ValidationSnafu};
use crate::storage::utils::path::is_dir_path;
use bytes::Bytes;
use opendal::Operator;
use snafu::ensure;

/// Trait for uploading objects to storage.
pub trait Uploader {
    /// Write one object, overwriting any existing object at the same key.
    ///
    /// # Arguments
    /// * `remote_path` - Destination key in storage
    /// * `data` - Object content
    /// * `content_type` - MIME type recorded with the object
    ///
    /// # Returns
    /// * `Result<u64>` - Number of bytes written
    async fn upload(&self, remote_path: &str, data: Bytes, content_type: &str) -> Result<u64>;
}

/// Implementation of Uploader for OpenDAL Operator.
pub struct OpenDalUploader {
    operator: Operator,
}

impl OpenDalUploader {
    /// Create a new uploader with the given OpenDAL operator.
    pub fn new(operator: Operator) -> Self {
        Self { operator }
    }
}

impl Uploader for OpenDalUploader {
    async fn upload(&self, remote_path: &str, data: Bytes, content_type: &str) -> Result<u64> {
        ensure!(
            !remote_path.is_empty() && !is_dir_path(remote_path),
            ValidationSnafu {
                message: format!("'{remote_path}' is not a valid object key")
            }
        );

        let total_bytes = data.len() as u64;
        self.operator
            .write_with(remote_path, data)
            .content_type(content_type)
            .await?;
        Ok(total_bytes)
    }
}

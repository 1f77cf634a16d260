use crate::error::Result;
use crate::storage::utils::error::map_not_found;
use jiff::Timestamp;
use opendal::{EntryMode, Metadata, Operator};
use serde::Serialize;

/// Object metadata returned by the `metadata` gateway call.
///
/// - `path`: The queried object path (as provided by caller)
/// - `is_directory`: Whether the key names a virtual directory
/// - `size`: Content length in bytes
/// - `last_modified`: Backend modification time if available
/// - `content_type`: MIME type if available
/// - `etag`: Backend provided entity tag if available
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectMeta {
    pub path: String,
    pub is_directory: bool,
    pub size: u64,
    pub last_modified: Option<Timestamp>,
    pub content_type: Option<String>,
    pub etag: Option<String>,
}

/// Convert the backend modification time into a `jiff` timestamp.
pub(crate) fn timestamp_of(meta: &Metadata) -> Option<Timestamp> {
    meta.last_modified()
        .and_then(|t| t.to_rfc3339().parse::<Timestamp>().ok())
}

/// Trait for fetching object metadata from storage.
pub trait Stater {
    /// Create a new stater with the given OpenDAL operator.
    fn new(operator: Operator) -> Self;

    /// Fetch metadata for a single object or directory.
    ///
    /// # Arguments
    /// * `path` - Object path to query. Accepts any type implementing `AsRef<str>`.
    ///
    /// # Returns
    /// * `Result<ObjectMeta>` - Collected metadata, `PathNotFound` when missing
    async fn stat<P: AsRef<str>>(&self, path: P) -> Result<ObjectMeta>;
}

/// Implementation of `Stater` for OpenDAL `Operator`.
#[derive(Clone)]
pub struct OpenDalStater {
    operator: Operator,
}

impl Stater for OpenDalStater {
    fn new(operator: Operator) -> Self {
        Self { operator }
    }

    async fn stat<P: AsRef<str>>(&self, path: P) -> Result<ObjectMeta> {
        let path = path.as_ref();
        let meta = self
            .operator
            .stat(path)
            .await
            .map_err(|e| map_not_found(path, e))?;

        Ok(ObjectMeta {
            path: path.to_owned(),
            is_directory: meta.mode() == EntryMode::DIR,
            size: meta.content_length(),
            last_modified: timestamp_of(&meta),
            content_type: meta.content_type().map(|s| s.to_string()),
            etag: meta.etag().map(|s| s.to_string()),
        })
    }
}

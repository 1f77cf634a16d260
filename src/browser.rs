//! View controller: one per user session.
//!
//! Owns the [`Session`], the [`PathCursor`] and the notices waiting to be
//! shown on the next page. Every user action is a single method call that
//! runs to completion before the next one is accepted.

use bytes::Bytes;
use serde::Serialize;
use snafu::ensure;
use std::sync::Arc;

use crate::config::BrowserConfig;
use crate::cursor::{Breadcrumb, PathCursor};
use crate::error::{
    ConfirmationRequiredSnafu, Error, ExtensionNotAllowedSnafu, IsDirectorySnafu, Result,
    ValidationSnafu,
};
use crate::preview::{Preview, PreviewKind};
use crate::session::{Credentials, Session, SessionState};
use crate::storage::constants::DEFAULT_CONTENT_TYPE;
use crate::storage::utils::path::{basename, build_remote_path, is_dir_path, parent_prefix};
use crate::storage::{Connector, DirectoryEntry, ObjectMeta};
use crate::wrap_err;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// The current directory as shown to the user.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub prefix: String,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub entries: Vec<DirectoryEntry>,
    pub query: Option<String>,
}

/// One file received from the upload form.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Result of uploading one file of a batch.
#[derive(Debug)]
pub struct UploadOutcome {
    pub name: String,
    /// Key written and its size in bytes.
    pub result: Result<(String, u64)>,
}

/// An object fetched for the user's browser.
#[derive(Debug, Clone)]
pub struct Download {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// What a confirmed delete removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    /// Resolved key or directory prefix.
    pub path: String,
    /// Number of objects deleted.
    pub deleted: usize,
}

/// Metadata and inline preview of one object.
#[derive(Debug, Clone, Serialize)]
pub struct Details {
    pub meta: ObjectMeta,
    pub preview: Preview,
}

/// Strip any client-side directories from an uploaded file name.
fn sanitize_file_name(name: &str) -> Result<String> {
    let unified = name.replace('\\', "/");
    let base = unified.rsplit('/').next().unwrap_or_default().trim();
    ensure!(
        !base.is_empty() && base != "." && base != "..",
        ValidationSnafu {
            message: format!("'{name}' is not a valid file name")
        }
    );
    Ok(base.to_string())
}

pub struct Browser {
    config: Arc<BrowserConfig>,
    session: Session,
    cursor: PathCursor,
    notices: Vec<Notice>,
}

impl Browser {
    pub fn new(config: Arc<BrowserConfig>) -> Result<Self> {
        let cursor = PathCursor::new(&config.root_prefix)?;
        Ok(Self {
            config,
            session: Session::new(),
            cursor,
            notices: Vec::new(),
        })
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    pub fn cursor(&self) -> &PathCursor {
        &self.cursor
    }

    pub async fn connect(
        &mut self,
        connector: &dyn Connector,
        credentials: Credentials,
    ) -> Result<()> {
        self.session.connect(connector, credentials).await?;
        self.cursor.reset();
        Ok(())
    }

    pub async fn reconnect(&mut self, connector: &dyn Connector) -> Result<()> {
        self.session.reconnect(connector).await?;
        self.cursor.reset();
        Ok(())
    }

    pub fn disconnect(&mut self) {
        self.session.disconnect();
        self.cursor.reset();
    }

    /// List the current directory and apply the configured filters.
    pub async fn listing(&self, query: Option<&str>) -> Result<Listing> {
        let client = self.session.client()?;
        let prefix = self.cursor.prefix();
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        let needle = query.map(str::to_lowercase);

        let mut entries: Vec<DirectoryEntry> = client
            .list(&prefix)
            .await?
            .into_iter()
            .filter(|entry| self.config.show_hidden || !entry.name.starts_with('.'))
            .filter(|entry| entry.is_directory || self.config.is_extension_allowed(&entry.name))
            .filter(|entry| match &needle {
                Some(needle) => entry.name.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.is_directory
                .cmp(&a.is_directory)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });

        Ok(Listing {
            prefix,
            breadcrumbs: self.cursor.breadcrumbs(),
            entries,
            query: query.map(str::to_string),
        })
    }

    /// Descend into a directory entry of the current listing.
    pub async fn navigate(&mut self, entry: &DirectoryEntry) -> Result<Listing> {
        ensure!(
            entry.is_directory,
            ValidationSnafu {
                message: format!("'{}' is not a directory", entry.name)
            }
        );
        self.cursor.push(&entry.name)?;
        self.listing(None).await
    }

    pub async fn navigate_up(&mut self) -> Result<Listing> {
        self.cursor.pop();
        self.listing(None).await
    }

    /// Move the cursor without listing. An empty path is the root prefix.
    pub fn change_directory(&mut self, path: &str) -> Result<()> {
        if path.trim_matches('/').is_empty() {
            self.cursor.reset();
            return Ok(());
        }
        self.cursor.set(path)
    }

    /// Jump to a breadcrumb or any directory inside the root prefix.
    pub async fn navigate_to(&mut self, path: &str) -> Result<Listing> {
        self.change_directory(path)?;
        self.listing(None).await
    }

    /// Upload every file under the current prefix. Each file succeeds or
    /// fails on its own; earlier uploads are never rolled back.
    pub async fn upload_action(&self, files: Vec<UploadFile>) -> Result<Vec<UploadOutcome>> {
        let client = self.session.client()?;
        let prefix = self.cursor.prefix();
        let mut outcomes = Vec::with_capacity(files.len());

        for file in files {
            let UploadFile {
                name: original_name,
                content_type,
                data,
            } = file;
            let result = async {
                let name = sanitize_file_name(&original_name)?;
                ensure!(
                    self.config.is_extension_allowed(&name),
                    ExtensionNotAllowedSnafu { name: name.clone() }
                );
                let remote_path = build_remote_path(&prefix, &name);
                let content_type = content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE);
                let size = wrap_err!(
                    client.upload(&remote_path, data, content_type).await,
                    UploadFailed {
                        name: name.clone(),
                        remote_path: remote_path.clone()
                    }
                )?;
                Ok::<_, Error>((remote_path, size))
            }
            .await;

            match &result {
                Ok((path, size)) => log::info!("uploaded path={path} size={size}"),
                Err(e) => log::warn!(
                    "upload of '{original_name}' failed: {}",
                    self.session.redact(&e.to_string())
                ),
            }
            outcomes.push(UploadOutcome {
                name: original_name,
                result,
            });
        }

        Ok(outcomes)
    }

    /// Delete an object, or a whole directory when `path` ends with '/'.
    /// Nothing is touched unless `confirmed` is set.
    pub async fn delete_action(&mut self, path: &str, confirmed: bool) -> Result<Removal> {
        let client = self.session.client()?;
        let key = self.cursor.resolve(path)?;
        ensure!(
            key != self.cursor.root(),
            ValidationSnafu {
                message: "the root directory cannot be deleted".to_string()
            }
        );
        ensure!(confirmed, ConfirmationRequiredSnafu { path: key.clone() });

        let deleted = client.delete(&key).await?;
        log::info!("deleted path={key} objects={deleted}");

        // Leave a directory that no longer exists.
        if is_dir_path(&key) && self.cursor.prefix().starts_with(&key) {
            self.cursor.set(&parent_prefix(&key))?;
        }
        Ok(Removal { path: key, deleted })
    }

    /// Fetch an object for the user. Nothing is written to local disk.
    pub async fn download_action(&self, path: &str) -> Result<Download> {
        let client = self.session.client()?;
        let key = self.cursor.resolve(path)?;
        ensure!(!is_dir_path(&key), IsDirectorySnafu { path: key.clone() });
        let meta = client.metadata(&key).await?;
        ensure!(!meta.is_directory, IsDirectorySnafu { path: key.clone() });

        let data = client.download(&key).await?;
        Ok(Download {
            file_name: basename(&key),
            content_type: meta
                .content_type
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            data,
        })
    }

    pub async fn metadata(&self, path: &str) -> Result<ObjectMeta> {
        let client = self.session.client()?;
        let key = self.cursor.resolve(path)?;
        client.metadata(&key).await
    }

    /// Metadata plus a preview for small objects of a known type.
    pub async fn details(&self, path: &str) -> Result<Details> {
        let client = self.session.client()?;
        let key = self.cursor.resolve(path)?;
        ensure!(!is_dir_path(&key), IsDirectorySnafu { path: key.clone() });
        let meta = client.metadata(&key).await?;
        ensure!(!meta.is_directory, IsDirectorySnafu { path: key.clone() });

        let preview = match PreviewKind::for_path(&key) {
            None => Preview::Unsupported,
            Some(_) if meta.size > self.config.preview_max_bytes => {
                Preview::TooLarge { size: meta.size }
            }
            Some(kind) => {
                let data = client.download(&key).await?;
                Preview::render(kind, &data)
            }
        };
        Ok(Details { meta, preview })
    }

    pub fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let message = self.session.redact(&message.into());
        self.notices.push(Notice { level, message });
    }

    /// Queue an error for display, scrubbed of secrets.
    pub fn notify_error(&mut self, error: &Error) {
        log::warn!(
            "action failed kind={:?}: {}",
            error.kind(),
            self.session.redact(&error.to_string())
        );
        self.notify(NoticeLevel::Error, error.to_string());
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

use crate::error::{Error, Result};
use bytes::Bytes;
use futures::stream::TryStreamExt;
use opendal::Operator;
use std::str::FromStr;

mod connector;
pub mod constants;
mod operations;
pub mod utils;

pub use self::connector::{Connector, OpenDalConnector};
pub use self::operations::list::DirectoryEntry;
pub use self::operations::stat::ObjectMeta;

use self::operations::delete::OpenDalDeleter;
use self::operations::download::OpenDalDownloader;
use self::operations::list::OpenDalLister;
use self::operations::stat::OpenDalStater;
use self::operations::upload::OpenDalUploader;
use self::operations::{Deleter, Downloader, Lister, Stater, Uploader};
use self::utils::path::to_operator_path;
use crate::wrap_err;

/// Storage provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageProvider {
    Azblob,
    Memory,
}

impl FromStr for StorageProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "azblob" | "azure" => Ok(Self::Azblob),
            "memory" => Ok(Self::Memory),
            _ => Err(Error::UnsupportedProvider {
                provider: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for StorageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Azblob => write!(f, "azblob"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Connection settings for one container
#[derive(Clone)]
pub struct StorageConfig {
    pub provider: StorageProvider,
    pub container: String,
    pub account_name: Option<String>,
    pub sas_token: Option<String>,
    pub endpoint: Option<String>,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("provider", &self.provider)
            .field("container", &self.container)
            .field("account_name", &self.account_name)
            .field("sas_token", &self.sas_token.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl StorageConfig {
    pub fn azblob(
        account_name: String,
        container: String,
        sas_token: String,
        endpoint: Option<String>,
    ) -> Self {
        Self {
            provider: StorageProvider::Azblob,
            container,
            account_name: Some(account_name),
            sas_token: Some(sas_token),
            endpoint,
        }
    }

    pub fn memory(container: String) -> Self {
        Self {
            provider: StorageProvider::Memory,
            container,
            account_name: None,
            sas_token: None,
            endpoint: None,
        }
    }
}

/// Storage gateway for one container, backed by OpenDAL
#[derive(Clone)]
pub struct StorageClient {
    operator: Operator,
    provider: StorageProvider,
}

impl StorageClient {
    pub fn new(config: StorageConfig) -> Result<Self> {
        let operator = Self::build_operator(&config)?;
        Ok(Self::from_operator(operator, config.provider))
    }

    pub fn from_operator(operator: Operator, provider: StorageProvider) -> Self {
        Self { operator, provider }
    }

    pub fn provider(&self) -> StorageProvider {
        self.provider
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    fn build_operator(config: &StorageConfig) -> Result<Operator> {
        match &config.provider {
            StorageProvider::Azblob => {
                #[cfg(feature = "azblob")]
                {
                    let account_name = config.account_name.as_deref().unwrap_or_default();
                    let endpoint = config
                        .endpoint
                        .clone()
                        .unwrap_or_else(|| format!("https://{account_name}.blob.core.windows.net"));
                    let mut builder = opendal::services::Azblob::default()
                        .container(&config.container)
                        .account_name(account_name)
                        .endpoint(&endpoint);
                    if let Some(sas_token) = &config.sas_token {
                        builder = builder.sas_token(sas_token);
                    }
                    Ok(Operator::new(builder)?.finish())
                }

                #[cfg(not(feature = "azblob"))]
                {
                    Err(Error::UnsupportedProvider {
                        provider: "azblob (feature disabled)".to_string(),
                    })
                }
            }
            StorageProvider::Memory => {
                #[cfg(feature = "memory")]
                {
                    let builder = opendal::services::Memory::default();
                    Ok(Operator::new(builder)?.finish())
                }

                #[cfg(not(feature = "memory"))]
                {
                    Err(Error::UnsupportedProvider {
                        provider: "memory (feature disabled)".to_string(),
                    })
                }
            }
        }
    }

    /// Issue one listing call on the container root to prove the
    /// credentials can reach and read the container.
    pub async fn verify(&self) -> Result<()> {
        log::debug!("verify provider={:?}", self.provider);
        let mut lister = self.operator.lister(to_operator_path("")).await?;
        lister.try_next().await?;
        Ok(())
    }

    pub async fn list(&self, prefix: &str) -> Result<Vec<DirectoryEntry>> {
        log::debug!("list provider={:?} prefix={}", self.provider, prefix);
        let lister = OpenDalLister::new(self.operator.clone());
        wrap_err!(
            lister.list(prefix).await,
            ListDirectoryFailed {
                path: prefix.to_string()
            }
        )
    }

    pub async fn upload(&self, remote_path: &str, data: Bytes, content_type: &str) -> Result<u64> {
        log::debug!(
            "upload provider={:?} remote_path={} size={} content_type={}",
            self.provider,
            remote_path,
            data.len(),
            content_type
        );
        let uploader = OpenDalUploader::new(self.operator.clone());
        uploader.upload(remote_path, data, content_type).await
    }

    pub async fn download(&self, remote_path: &str) -> Result<Bytes> {
        log::debug!(
            "download provider={:?} remote_path={}",
            self.provider,
            remote_path
        );
        let downloader = OpenDalDownloader::new(self.operator.clone());
        wrap_err!(
            downloader.download(remote_path).await,
            DownloadFailed {
                remote_path: remote_path.to_string()
            }
        )
    }

    pub async fn delete(&self, path: &str) -> Result<usize> {
        log::debug!("delete provider={:?} path={}", self.provider, path);
        let deleter = OpenDalDeleter::new(self.operator.clone());
        wrap_err!(
            deleter.delete(path).await,
            DeleteFailed {
                path: path.to_string()
            }
        )
    }

    pub async fn metadata(&self, path: &str) -> Result<ObjectMeta> {
        log::debug!("metadata provider={:?} path={}", self.provider, path);
        let stater = OpenDalStater::new(self.operator.clone());
        wrap_err!(
            stater.stat(path).await,
            MetadataFailed {
                path: path.to_string()
            }
        )
    }
}

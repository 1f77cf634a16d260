// Turns session credentials into a storage gateway
use crate::error::Result;
use crate::session::Credentials;
use crate::storage::{StorageClient, StorageConfig, StorageProvider};
use opendal::Operator;
use std::collections::HashMap;
use std::sync::Mutex;

/// Builds a [`StorageClient`] for the container named by a set of credentials.
///
/// The view layer only ever talks to the client this returns, so swapping the
/// connector swaps the backing storage.
pub trait Connector: Send + Sync {
    fn open(&self, credentials: &Credentials) -> Result<StorageClient>;
}

/// Connector over the OpenDAL backends compiled into this build.
pub struct OpenDalConnector {
    provider: StorageProvider,
    endpoint: Option<String>,
    // Memory containers live for the whole process so every session sees the same data.
    memory: Mutex<HashMap<String, Operator>>,
}

impl OpenDalConnector {
    pub fn new(provider: StorageProvider, endpoint: Option<String>) -> Self {
        Self {
            provider,
            endpoint,
            memory: Mutex::new(HashMap::new()),
        }
    }

    fn open_memory(&self, container: &str) -> Result<StorageClient> {
        let mut containers = self
            .memory
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(operator) = containers.get(container) {
            return Ok(StorageClient::from_operator(
                operator.clone(),
                StorageProvider::Memory,
            ));
        }

        let client = StorageClient::new(StorageConfig::memory(container.to_string()))?;
        containers.insert(container.to_string(), client.operator().clone());
        Ok(client)
    }
}

impl Connector for OpenDalConnector {
    fn open(&self, credentials: &Credentials) -> Result<StorageClient> {
        match self.provider {
            StorageProvider::Azblob => {
                let (account_name, endpoint) = match credentials.account_endpoint() {
                    Some((name, url)) => (name, Some(url)),
                    None => (credentials.account().to_string(), self.endpoint.clone()),
                };
                StorageClient::new(StorageConfig::azblob(
                    account_name,
                    credentials.container().to_string(),
                    credentials.token().expose().to_string(),
                    endpoint,
                ))
            }
            StorageProvider::Memory => self.open_memory(credentials.container()),
        }
    }
}

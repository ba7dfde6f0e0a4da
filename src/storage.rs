//! Remote storage seam
//!
//! `RemoteStorage` is the single create-file operation the upload loop
//! needs. `StorageConnector` produces an authenticated storage handle plus
//! the destination folder for one request; the production connector reads
//! credentials from its source, authenticates and builds a [`DriveClient`].

use crate::api_contracts::RemoteFile;
use crate::auth;
use crate::credentials::DriveDestination;
use crate::drive_client::DriveClient;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Arguments of a create-file call
#[derive(Debug, Clone, Copy)]
pub struct CreateFileRequest<'a> {
    pub name: &'a str,
    pub parent_folder_id: &'a str,
    pub mime_type: &'a str,
    pub local_path: &'a Path,
}

#[async_trait]
pub trait RemoteStorage: Send + Sync {
    async fn create_file(&self, request: CreateFileRequest<'_>) -> Result<RemoteFile, String>;
}

/// Authenticated storage for the lifetime of one request
pub struct StorageSession {
    pub storage: Arc<dyn RemoteStorage>,
    pub folder_id: String,
}

impl std::fmt::Debug for StorageSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageSession")
            .field("folder_id", &self.folder_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait StorageConnector: Send + Sync {
    async fn connect(&self) -> Result<StorageSession, String>;
}

/// Where the connector gets its destination from, called once per request
pub type CredentialSource = Arc<dyn Fn() -> Result<DriveDestination, String> + Send + Sync>;

/// Connects to Google Drive as a service account
pub struct DriveConnector {
    api_root: String,
    timeout: Duration,
    credentials: CredentialSource,
}

impl DriveConnector {
    /// Connector reading `GOOGLE_*` variables from the process environment
    pub fn new(api_root: String, timeout: Duration) -> Self {
        Self::with_credentials(api_root, timeout, DriveDestination::from_env)
    }

    pub fn with_credentials<F>(api_root: String, timeout: Duration, credentials: F) -> Self
    where
        F: Fn() -> Result<DriveDestination, String> + Send + Sync + 'static,
    {
        Self {
            api_root,
            timeout,
            credentials: Arc::new(credentials),
        }
    }
}

#[async_trait]
impl StorageConnector for DriveConnector {
    async fn connect(&self) -> Result<StorageSession, String> {
        let destination = (self.credentials)()?;
        tracing::debug!(
            client_email = %destination.credentials.client_email,
            folder_id = %destination.folder_id,
            "Loaded service account credentials"
        );

        let authenticator = auth::service_account_authenticator(&destination.credentials).await?;
        auth::fetch_access_token(&authenticator).await?;

        let client = DriveClient::with_timeout(&self.api_root, authenticator, self.timeout)?;
        Ok(StorageSession {
            storage: Arc::new(client),
            folder_id: destination.folder_id,
        })
    }
}

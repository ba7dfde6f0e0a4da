//! Service-account token exchange
//!
//! Turns the relay's service-account credentials into a short-lived bearer
//! token for the Drive API. A new authenticator is built for every request,
//! so tokens are never shared between requests.

use crate::credentials::ServiceAccountCredentials;
use crate::drive_client::{https_connector, HttpsConnector};
use google_drive3::hyper_util::client::legacy::Client;
use google_drive3::hyper_util::rt::TokioExecutor;
use google_drive3::yup_oauth2::authenticator::Authenticator;
use google_drive3::yup_oauth2::client::CustomHyperClientBuilder;
use google_drive3::yup_oauth2::{ServiceAccountAuthenticator, ServiceAccountKey};

/// Token source handed to the Drive hub
pub type DriveAuthenticator = Authenticator<HttpsConnector>;

/// Only files created by the relay are visible to it.
pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

/// Convert credentials into the key type understood by `yup-oauth2`.
///
/// Goes through the JSON key-file layout so the mapping stays identical to
/// loading a downloaded key from disk.
pub fn service_account_key(credentials: &ServiceAccountCredentials) -> Result<ServiceAccountKey, String> {
    let value = serde_json::to_value(credentials)
        .map_err(|e| format!("Failed to serialize service account credentials: {}", e))?;

    serde_json::from_value(value)
        .map_err(|e| format!("Invalid service account credentials: {}", e))
}

/// Build an authenticator for the service account
pub async fn service_account_authenticator(
    credentials: &ServiceAccountCredentials,
) -> Result<DriveAuthenticator, String> {
    let key = service_account_key(credentials)?;
    let client = Client::builder(TokioExecutor::new()).build(https_connector()?);

    ServiceAccountAuthenticator::with_client(key, CustomHyperClientBuilder::from(client))
        .build()
        .await
        .map_err(|e| format!("Failed to build service account authenticator: {}", e))
}

/// Obtain an access token with drive.file scope.
///
/// The authenticator caches the token, so the hub's own lookup for the same
/// scope reuses it.
pub async fn fetch_access_token(authenticator: &DriveAuthenticator) -> Result<String, String> {
    let token = authenticator
        .token(&[DRIVE_FILE_SCOPE])
        .await
        .map_err(|e| format!("Failed to obtain access token: {}", e))?;

    token
        .token()
        .map(str::to_string)
        .ok_or_else(|| "Token endpoint returned no access token".to_string())
}

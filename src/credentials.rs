//! Service-account credentials and upload destination
//!
//! The relay authenticates as a Google service account. The identity and
//! the destination folder come from the environment and are collected into
//! one read-only value that is handed to the storage connector.

use serde::Serialize;
use std::env;

pub const ENV_PROJECT_ID: &str = "GOOGLE_PROJECT_ID";
pub const ENV_PRIVATE_KEY_ID: &str = "GOOGLE_PRIVATE_KEY_ID";
pub const ENV_PRIVATE_KEY: &str = "GOOGLE_PRIVATE_KEY";
pub const ENV_CLIENT_EMAIL: &str = "GOOGLE_CLIENT_EMAIL";
pub const ENV_CLIENT_ID: &str = "GOOGLE_CLIENT_ID";
pub const ENV_FOLDER_ID: &str = "GOOGLE_DRIVE_FOLDER_ID";

pub const AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
pub const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const AUTH_PROVIDER_CERT_URL: &str = "https://www.googleapis.com/oauth2/v1/certs";
pub const UNIVERSE_DOMAIN: &str = "googleapis.com";

/// Service-account identity, serialized in the layout of a downloaded
/// Google JSON key file
#[derive(Clone, Serialize)]
pub struct ServiceAccountCredentials {
    #[serde(rename = "type")]
    pub key_type: String,
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    pub client_id: String,
    pub auth_uri: String,
    pub token_uri: String,
    pub auth_provider_x509_cert_url: String,
    pub universe_domain: String,
}

// Keep the private key out of logs.
impl std::fmt::Debug for ServiceAccountCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountCredentials")
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("client_email", &self.client_email)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// Everything needed to place files in Drive: who we are and where files go
#[derive(Debug, Clone)]
pub struct DriveDestination {
    pub credentials: ServiceAccountCredentials,
    pub folder_id: String,
}

impl DriveDestination {
    /// Read credentials and folder id from the process environment.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read credentials and folder id through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| format!("Missing required environment variable {}", key))
        };

        let credentials = ServiceAccountCredentials {
            key_type: "service_account".to_string(),
            project_id: require(ENV_PROJECT_ID)?,
            private_key_id: require(ENV_PRIVATE_KEY_ID)?,
            private_key: unescape_newlines(&require(ENV_PRIVATE_KEY)?),
            client_email: require(ENV_CLIENT_EMAIL)?,
            client_id: require(ENV_CLIENT_ID)?,
            auth_uri: AUTH_URI.to_string(),
            token_uri: TOKEN_URI.to_string(),
            auth_provider_x509_cert_url: AUTH_PROVIDER_CERT_URL.to_string(),
            universe_domain: UNIVERSE_DOMAIN.to_string(),
        };

        Ok(Self {
            credentials,
            folder_id: require(ENV_FOLDER_ID)?,
        })
    }
}

/// Private keys are usually stored in env vars with literal `\n` sequences.
pub fn unescape_newlines(raw: &str) -> String {
    raw.replace("\\n", "\n")
}

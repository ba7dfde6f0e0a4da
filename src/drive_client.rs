use crate::api_contracts::{GoogleErrorResponse, RemoteFile};
use crate::auth::DriveAuthenticator;
use crate::storage::{CreateFileRequest, RemoteStorage};
use async_trait::async_trait;
use google_drive3 as drive3;
use http_body_util::BodyExt;
use std::time::Duration;

use drive3::hyper::StatusCode;
use drive3::hyper_util::client::legacy::connect::HttpConnector;
use drive3::hyper_util::client::legacy::Client;
use drive3::hyper_util::rt::TokioExecutor;
use drive3::DriveHub;

/// TLS connector shared by the Drive hub and the token client
pub type HttpsConnector = drive3::hyper_rustls::HttpsConnector<HttpConnector>;

/// Build the HTTPS connector used for all Google calls.
///
/// Plain `http` stays allowed so the Drive root can point at a local server.
pub fn https_connector() -> Result<HttpsConnector, String> {
    let connector = drive3::hyper_rustls::HttpsConnectorBuilder::new()
        .with_native_roots()
        .map_err(|e| format!("Failed to load native root certificates: {}", e))?
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .build();
    Ok(connector)
}

/// API client for Google Drive v3 file creation
pub struct DriveClient {
    hub: DriveHub<HttpsConnector>,
    timeout: Duration,
}

impl DriveClient {
    /// Create a Drive client with the default request timeout
    pub fn new(api_root: &str, authenticator: DriveAuthenticator) -> Result<Self, String> {
        Self::with_timeout(api_root, authenticator, Duration::from_secs(300))
    }

    /// Create a Drive client with an explicit request timeout
    pub fn with_timeout(
        api_root: &str,
        authenticator: DriveAuthenticator,
        timeout: Duration,
    ) -> Result<Self, String> {
        let client = Client::builder(TokioExecutor::new()).build(https_connector()?);

        let mut hub = DriveHub::new(client, authenticator);
        hub.root_url(hub_root_url(api_root));
        // Include version in User-Agent header for tracking
        hub.user_agent(format!("DriveUploadRelay/{}", env!("CARGO_PKG_VERSION")));

        Ok(Self { hub, timeout })
    }

    /// Create a file in Drive with its content read from local disk
    pub async fn create_file(&self, request: CreateFileRequest<'_>) -> Result<RemoteFile, String> {
        let file = std::fs::File::open(request.local_path)
            .map_err(|e| format!("Failed to open file: {}", e))?;

        let mime: mime::Mime = request
            .mime_type
            .parse()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM);

        let metadata = drive3::api::File {
            name: Some(request.name.to_string()),
            parents: Some(vec![request.parent_folder_id.to_string()]),
            mime_type: Some(request.mime_type.to_string()),
            ..Default::default()
        };

        let call = self.hub
            .files()
            .create(metadata)
            .supports_all_drives(true)
            .param("fields", "id,name")
            .add_scope(drive3::api::Scope::File)
            .upload(file, mime);

        let (_response, created) = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(created)) => created,
            Ok(Err(e)) => return Err(describe_hub_error(e).await),
            Err(_) => {
                return Err(format!(
                    "Network error: request timed out after {}s",
                    self.timeout.as_secs()
                ))
            }
        };

        let id = created
            .id
            .ok_or_else(|| "Failed to parse response: file id missing".to_string())?;

        Ok(RemoteFile {
            id,
            name: created.name.unwrap_or_else(|| request.name.to_string()),
        })
    }
}

#[async_trait]
impl RemoteStorage for DriveClient {
    async fn create_file(&self, request: CreateFileRequest<'_>) -> Result<RemoteFile, String> {
        DriveClient::create_file(self, request).await
    }
}

/// The hub joins paths onto its root, so the root must end with '/'
fn hub_root_url(api_root: &str) -> String {
    format!("{}/", api_root.trim_end_matches('/'))
}

async fn describe_hub_error(error: drive3::Error) -> String {
    match error {
        drive3::Error::BadRequest(value) => {
            match serde_json::from_value::<GoogleErrorResponse>(value.clone()) {
                Ok(envelope) => envelope.error.message,
                Err(_) => format!("Drive API error: {}", value),
            }
        }
        drive3::Error::Failure(response) => {
            let status = response.status();
            let body = match response.into_body().collect().await {
                Ok(collected) => String::from_utf8_lossy(&collected.to_bytes()).into_owned(),
                Err(_) => String::new(),
            };
            describe_api_error(status, &body)
        }
        drive3::Error::JsonDecodeError(_, e) => format!("Failed to parse response: {}", e),
        other => format!("Network error: {}", other),
    }
}

/// Prefer the message from Google's error envelope over the raw body
fn describe_api_error(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<GoogleErrorResponse>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => format!("Drive API error {}", status),
        Err(_) => format!("Drive API error {}: {}", status, body.trim()),
    }
}

//! Test harness for the relay
//!
//! Provides a mock Drive upload server (mockito), a builder for raw
//! multipart request bodies, and in-memory storage doubles so handler tests
//! run without real infrastructure.

use crate::api_contracts::RemoteFile;
use crate::auth::DriveAuthenticator;
use crate::drive_client::https_connector;
use crate::storage::{CreateFileRequest, RemoteStorage, StorageConnector, StorageSession};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request};
use google_drive3::hyper_util::client::legacy::Client;
use google_drive3::hyper_util::rt::TokioExecutor;
use google_drive3::yup_oauth2::client::CustomHyperClientBuilder;
use google_drive3::yup_oauth2::AccessTokenAuthenticator;
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::json;
use std::sync::{Arc, Mutex};

pub const TEST_BOUNDARY: &str = "relay-test-boundary";
pub const TEST_TOKEN: &str = "test-access-token";

/// A test harness that sets up a mock Drive upload endpoint
pub struct TestHarness {
    pub server: ServerGuard,
}

impl TestHarness {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        Self { server }
    }

    pub fn url(&self) -> String {
        self.server.url()
    }

    /// Mock a successful `files.create` multipart upload
    pub fn mock_create_success(&mut self, file_id: &str, name: &str) -> Mock {
        self.server.mock("POST", "/upload/drive/v3/files")
            .match_header("authorization", format!("Bearer {}", TEST_TOKEN).as_str())
            .match_header("content-type", Matcher::Regex(r"^multipart/related; boundary=.+".to_string()))
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("uploadType".into(), "multipart".into()),
                Matcher::UrlEncoded("fields".into(), "id,name".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "id": file_id, "name": name }).to_string())
            .create()
    }

    /// Mock a Google API error envelope
    pub fn mock_create_error(&mut self, status: usize, message: &str) -> Mock {
        self.server.mock("POST", "/upload/drive/v3/files")
            .match_query(Matcher::Any)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(json!({
                "error": { "code": status, "message": message, "status": "FAILED" }
            }).to_string())
            .create()
    }

    /// Mock an error response that is not JSON
    pub fn mock_create_plain_error(&mut self, status: usize, body: &str) -> Mock {
        self.server.mock("POST", "/upload/drive/v3/files")
            .match_query(Matcher::Any)
            .with_status(status)
            .with_body(body)
            .create()
    }
}

/// Authenticator that always hands out [`TEST_TOKEN`]
pub async fn token_authenticator() -> DriveAuthenticator {
    let client = Client::builder(TokioExecutor::new()).build(https_connector().unwrap());
    AccessTokenAuthenticator::with_client(TEST_TOKEN.to_string(), CustomHyperClientBuilder::from(client))
        .build()
        .await
        .unwrap()
}

/// Builder for raw `multipart/form-data` bodies
#[derive(Default)]
pub struct MultipartBody {
    bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.bytes.extend_from_slice(format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            TEST_BOUNDARY, name, value
        ).as_bytes());
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, contents: &[u8]) -> Self {
        self.bytes.extend_from_slice(format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            TEST_BOUNDARY, name, filename, content_type
        ).as_bytes());
        self.bytes.extend_from_slice(contents);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    pub fn file_without_type(mut self, name: &str, filename: &str, contents: &[u8]) -> Self {
        self.bytes.extend_from_slice(format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\r\n",
            TEST_BOUNDARY, name, filename
        ).as_bytes());
        self.bytes.extend_from_slice(contents);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type() -> String {
        format!("multipart/form-data; boundary={}", TEST_BOUNDARY)
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.bytes.extend_from_slice(format!("--{}--\r\n", TEST_BOUNDARY).as_bytes());
        self.bytes
    }

    pub fn into_request(self, uri: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, Self::content_type())
            .body(Body::from(self.finish()))
            .unwrap()
    }
}

/// Call recorded by [`MockStorage`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCreate {
    pub name: String,
    pub parent_folder_id: String,
    pub mime_type: String,
    pub contents: Vec<u8>,
}

/// In-memory storage that fails for chosen original file contents
#[derive(Clone, Default)]
pub struct MockStorage {
    pub calls: Arc<Mutex<Vec<RecordedCreate>>>,
    fail_when_contents: Arc<Vec<Vec<u8>>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any upload whose file body equals `contents`
    pub fn failing_for(contents: &[&[u8]]) -> Self {
        Self {
            calls: Arc::default(),
            fail_when_contents: Arc::new(contents.iter().map(|c| c.to_vec()).collect()),
        }
    }

    pub fn recorded(&self) -> Vec<RecordedCreate> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteStorage for MockStorage {
    async fn create_file(&self, request: CreateFileRequest<'_>) -> Result<RemoteFile, String> {
        let contents = tokio::fs::read(request.local_path).await.map_err(|e| e.to_string())?;

        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(RecordedCreate {
                name: request.name.to_string(),
                parent_folder_id: request.parent_folder_id.to_string(),
                mime_type: request.mime_type.to_string(),
                contents: contents.clone(),
            });
            calls.len()
        };

        if self.fail_when_contents.contains(&contents) {
            return Err("The user has exceeded their Drive storage quota".to_string());
        }

        Ok(RemoteFile {
            id: format!("remote-{}", index),
            name: request.name.to_string(),
        })
    }
}

/// Connector handing out a shared [`MockStorage`], or failing to connect
#[derive(Clone)]
pub struct MockConnector {
    pub storage: MockStorage,
    pub connect_error: Option<String>,
    pub connects: Arc<Mutex<usize>>,
}

impl MockConnector {
    pub fn new(storage: MockStorage) -> Self {
        Self { storage, connect_error: None, connects: Arc::default() }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            storage: MockStorage::new(),
            connect_error: Some(message.to_string()),
            connects: Arc::default(),
        }
    }

    pub fn connect_count(&self) -> usize {
        *self.connects.lock().unwrap()
    }
}

#[async_trait]
impl StorageConnector for MockConnector {
    async fn connect(&self) -> Result<StorageSession, String> {
        *self.connects.lock().unwrap() += 1;
        match &self.connect_error {
            Some(message) => Err(message.clone()),
            None => Ok(StorageSession {
                storage: Arc::new(self.storage.clone()),
                folder_id: "folder-test".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_harness_creation() {
        let harness = TestHarness::new().await;
        assert!(harness.url().starts_with("http://"));
    }

    #[test]
    fn test_multipart_body_is_terminated() {
        let body = MultipartBody::new().text("a", "b").finish();
        let text = String::from_utf8(body).unwrap();
        assert!(text.starts_with(&format!("--{}", TEST_BOUNDARY)));
        assert!(text.ends_with(&format!("--{}--\r\n", TEST_BOUNDARY)));
    }
}

/**
 * API Contract Types for the Drive Upload Relay
 *
 * These types define the exact JSON bodies exchanged with browser clients
 * posting to the upload endpoint, and the subset of the Google Drive v3
 * `files` resource the relay reads back.
 *
 * Principles:
 * - Field names match the JSON the web form expects (camelCase)
 * - Per-file results are a discriminated union: success or error
 * - Serialization is tested against literal JSON
 */

use serde::{Deserialize, Serialize};

pub const METHOD_NOT_ALLOWED: &str = "Method not allowed";
pub const UPLOAD_FAILED: &str = "Upload failed";

// =============================================================================
// Upload Endpoint
// =============================================================================

/// File stored in Drive for one input file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub original_name: String,
    pub remote_id: String,
    pub remote_name: String,
}

/// Input file the relay could not store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FailedFile {
    pub original_name: String,
    pub error: String,
}

/// Outcome for one input file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum UploadResult {
    Uploaded(UploadedFile),
    Failed(FailedFile),
}

impl UploadResult {
    pub fn uploaded(original_name: impl Into<String>, remote: RemoteFile) -> Self {
        UploadResult::Uploaded(UploadedFile {
            original_name: original_name.into(),
            remote_id: remote.id,
            remote_name: remote.name,
        })
    }

    pub fn failed(original_name: impl Into<String>, error: impl Into<String>) -> Self {
        UploadResult::Failed(FailedFile {
            original_name: original_name.into(),
            error: error.into(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadResult::Uploaded(_))
    }

    pub fn original_name(&self) -> &str {
        match self {
            UploadResult::Uploaded(f) => &f.original_name,
            UploadResult::Failed(f) => &f.original_name,
        }
    }

    /// Error message if the upload failed, None otherwise
    pub fn error(&self) -> Option<&str> {
        match self {
            UploadResult::Uploaded(_) => None,
            UploadResult::Failed(f) => Some(&f.error),
        }
    }
}

/// 200 response body for a processed upload request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadResponse {
    pub success: bool,  // Always true; per-file failures live in results
    pub message: String,
    pub results: Vec<UploadResult>,
}

impl UploadResponse {
    pub fn from_results(results: Vec<UploadResult>) -> Self {
        let uploaded = results.iter().filter(|r| r.is_success()).count();
        Self {
            success: true,
            message: format!("Successfully uploaded {} files", uploaded),
            results,
        }
    }
}

/// 500 response body when the request as a whole could not be processed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadFailureResponse {
    pub success: bool,  // Always false
    pub error: String,
    pub details: String,
}

impl UploadFailureResponse {
    pub fn new(details: impl Into<String>) -> Self {
        Self {
            success: false,
            error: UPLOAD_FAILED.to_string(),
            details: details.into(),
        }
    }
}

/// 405 response body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

// =============================================================================
// Google Drive v3
// =============================================================================

/// Metadata part of a multipart `files.create` request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DriveFileMetadata {
    pub name: String,
    pub parents: Vec<String>,
    pub mime_type: String,
}

/// `files.create` response with `fields=id,name`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
}

/// Google API error envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoogleErrorResponse {
    pub error: GoogleError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoogleError {
    pub code: u16,
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

//! Upload execution service
//!
//! Sends every parsed file to remote storage under a timestamped name and
//! collects exactly one result per file. A failing file is recorded and the
//! loop moves on; it never aborts the batch.

use crate::api_contracts::UploadResult;
use crate::multipart_form::IncomingFile;
use crate::storage::{CreateFileRequest, RemoteStorage, StorageSession};
use chrono::{DateTime, SecondsFormat, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;

/// Service for executing file uploads
pub struct UploadExecutor {
    storage: Arc<dyn RemoteStorage>,
    folder_id: String,
    concurrency: usize,
}

impl UploadExecutor {
    /// `concurrency` of 1 uploads strictly one file after another
    pub fn new(session: StorageSession, concurrency: usize) -> Self {
        Self {
            storage: session.storage,
            folder_id: session.folder_id,
            concurrency: concurrency.max(1),
        }
    }

    /// Upload all files and return their results in input order
    pub async fn execute(&self, files: Vec<IncomingFile>) -> Vec<UploadResult> {
        let total = files.len();
        tracing::info!(
            total,
            folder_id = %self.folder_id,
            concurrency = self.concurrency,
            "Uploading {} file(s)",
            total
        );

        // `buffered` yields in submission order, not completion order
        let results: Vec<UploadResult> = stream::iter(files.into_iter().enumerate())
            .map(|(i, file)| self.upload_single_file(file, i + 1, total))
            .buffered(self.concurrency)
            .collect()
            .await;

        let uploaded = results.iter().filter(|r| r.is_success()).count();
        tracing::info!(uploaded, failed = total - uploaded, "Upload execution complete");

        results
    }

    /// Upload one file, then remove its temp copy whatever the outcome
    async fn upload_single_file(&self, file: IncomingFile, index: usize, total: usize) -> UploadResult {
        let destination = destination_name(Utc::now(), &file.original_filename);
        tracing::info!(
            "[{}/{}] Uploading {} as {} ({} bytes)",
            index, total, file.original_filename, destination, file.size_bytes
        );

        let request = CreateFileRequest {
            name: &destination,
            parent_folder_id: &self.folder_id,
            mime_type: &file.mime_type,
            local_path: file.local_path(),
        };

        let result = match self.storage.create_file(request).await {
            Ok(remote) => {
                tracing::info!(remote_id = %remote.id, "File uploaded successfully: {}", remote.name);
                UploadResult::uploaded(file.original_filename.clone(), remote)
            }
            Err(e) => {
                tracing::error!("Error uploading file {}: {}", file.original_filename, e);
                UploadResult::failed(file.original_filename.clone(), e)
            }
        };

        let temp_path = file.local_path().to_path_buf();
        if let Err(e) = file.discard() {
            tracing::warn!("Failed to remove temp file {}: {}", temp_path.display(), e);
        }

        result
    }
}

/// `<ISO-8601 timestamp with ':' and '.' replaced by '-'>_<original>`
///
/// e.g. `2024-05-01T10-20-30-123Z_report.pdf`
pub fn destination_name(now: DateTime<Utc>, original_filename: &str) -> String {
    let timestamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{}_{}", timestamp, original_filename)
}

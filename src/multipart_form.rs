//! Multipart form parsing
//!
//! Streams every file part of an upload request into its own temporary file
//! and enforces the per-file size cap while doing so. Text fields are kept
//! for logging only.
//!
//! Temp files are owned by [`IncomingFile`] and removed when it is dropped,
//! so an early return anywhere in the request leaves nothing behind.

use axum::extract::Multipart;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Limits and placement for parsed files
#[derive(Debug, Clone)]
pub struct FormLimits {
    pub max_file_size: u64,
    pub temp_dir: PathBuf,
}

/// One uploaded file, spooled to local disk
#[derive(Debug)]
pub struct IncomingFile {
    pub field_name: String,
    pub original_filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
    temp_path: TempPath,
}

impl IncomingFile {
    pub fn new(
        field_name: String,
        original_filename: String,
        mime_type: String,
        size_bytes: u64,
        temp_path: TempPath,
    ) -> Self {
        Self {
            field_name,
            original_filename,
            mime_type,
            size_bytes,
            temp_path,
        }
    }

    pub fn local_path(&self) -> &Path {
        &self.temp_path
    }

    /// Delete the temp file now, reporting any I/O error.
    pub fn discard(self) -> io::Result<()> {
        self.temp_path.close()
    }
}

/// Parsed request body
///
/// Files are grouped by field name. Groups keep the order in which their
/// field name first appeared; files inside a group keep arrival order.
#[derive(Debug, Default)]
pub struct ParsedForm {
    pub fields: Vec<(String, String)>,
    groups: Vec<(String, Vec<IncomingFile>)>,
}

impl ParsedForm {
    fn push_file(&mut self, file: IncomingFile) {
        match self.groups.iter_mut().find(|(name, _)| *name == file.field_name) {
            Some((_, files)) => files.push(file),
            None => self.groups.push((file.field_name.clone(), vec![file])),
        }
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.groups.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn file_count(&self) -> usize {
        self.groups.iter().map(|(_, files)| files.len()).sum()
    }

    /// Flatten into upload order.
    pub fn into_files(self) -> Vec<IncomingFile> {
        self.groups.into_iter().flat_map(|(_, files)| files).collect()
    }
}

/// Read the whole multipart body into temp files.
///
/// Any failure (malformed body, oversized or empty file, disk error) fails
/// the entire request; files spooled so far are dropped and deleted.
pub async fn parse_multipart(mut multipart: Multipart, limits: &FormLimits) -> Result<ParsedForm, String> {
    let mut form = ParsedForm::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Invalid multipart data: {}", e))?
    {
        let field_name = field.name().unwrap_or_default().to_string();

        let file_name = field.file_name().map(str::to_string);
        let original_filename = match file_name {
            Some(name) => name,
            None => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| format!("Failed to read field '{}': {}", field_name, e))?;
                form.fields.push((field_name, value));
                continue;
            }
        };

        // Browsers send an unnamed, empty part when no file was chosen
        if original_filename.is_empty() {
            tracing::debug!(field = %field_name, "Skipping file part without a filename");
            continue;
        }

        let mime_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

        let (std_file, temp_path) = create_temp_file(&limits.temp_dir, &original_filename).await?;
        let mut file = tokio::fs::File::from_std(std_file);

        let mut size_bytes: u64 = 0;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| format!("Failed to read file '{}': {}", original_filename, e))?
        {
            size_bytes += chunk.len() as u64;
            if size_bytes > limits.max_file_size {
                return Err(format!(
                    "maxFileSize ({} bytes) exceeded by file '{}'",
                    limits.max_file_size, original_filename
                ));
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| format!("Failed to write temp file: {}", e))?;
        }
        file.flush()
            .await
            .map_err(|e| format!("Failed to write temp file: {}", e))?;

        if size_bytes == 0 {
            return Err(format!("File '{}' is empty", original_filename));
        }

        tracing::debug!(
            field = %field_name,
            file = %original_filename,
            size_bytes,
            "Spooled upload to temp file"
        );

        form.push_file(IncomingFile::new(field_name, original_filename, mime_type, size_bytes, temp_path));
    }

    Ok(form)
}

/// Create an owned temp file in `dir` on the blocking pool
async fn create_temp_file(dir: &Path, original_filename: &str) -> Result<(std::fs::File, TempPath), String> {
    let dir = dir.to_path_buf();
    let suffix = extension_suffix(original_filename);

    let temp = tokio::task::spawn_blocking(move || {
        tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&suffix)
            .tempfile_in(&dir)
    })
    .await
    .map_err(|e| format!("Temp file task failed: {}", e))?
    .map_err(|e| format!("Failed to create temp file: {}", e))?;

    Ok(temp.into_parts())
}

/// Keep the original extension on the temp file (".txt", ".tar", ...)
fn extension_suffix(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

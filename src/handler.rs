//! HTTP surface of the relay
//!
//! `/upload` (and the `/api/upload` alias) accepts `POST` multipart bodies,
//! answers `OPTIONS` preflights and rejects every other method with 405.
//! All responses carry permissive CORS headers.

use crate::api_contracts::{ErrorResponse, UploadFailureResponse, UploadResponse, METHOD_NOT_ALLOWED};
use crate::multipart_form::{parse_multipart, FormLimits};
use crate::services::UploadExecutor;
use crate::storage::StorageConnector;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{post, MethodRouter};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// Shared, read-only state for upload requests
#[derive(Clone)]
pub struct AppState {
    pub connector: Arc<dyn StorageConnector>,
    pub limits: FormLimits,
    pub upload_concurrency: usize,
}

/// Whole-request failure, rendered as a 500 with the underlying message
#[derive(Debug)]
pub struct UploadFailure {
    details: String,
}

impl From<String> for UploadFailure {
    fn from(details: String) -> Self {
        Self { details }
    }
}

impl From<MultipartRejection> for UploadFailure {
    fn from(rejection: MultipartRejection) -> Self {
        Self { details: rejection.body_text() }
    }
}

impl IntoResponse for UploadFailure {
    fn into_response(self) -> Response {
        tracing::error!("Upload error: {}", self.details);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(UploadFailureResponse::new(self.details)),
        )
            .into_response()
    }
}

pub fn router(state: AppState, max_request_size: usize) -> Router {
    let upload_route: MethodRouter<AppState> = post(upload)
        .options(preflight)
        .fallback(method_not_allowed);

    Router::new()
        .route("/upload", upload_route.clone())
        .route("/api/upload", upload_route)
        .layer(DefaultBodyLimit::max(max_request_size))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse { error: METHOD_NOT_ALLOWED.to_string() }),
    )
}

async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, UploadFailure> {
    tracing::info!("Starting file upload process...");

    let form = parse_multipart(multipart?, &state.limits).await?;
    tracing::info!(
        fields = ?form.field_names(),
        text_fields = form.fields.len(),
        "Files parsed: {} file(s)",
        form.file_count()
    );

    let session = state.connector.connect().await?;
    tracing::info!("Google Drive API initialized");

    let executor = UploadExecutor::new(session, state.upload_concurrency);
    let results = executor.execute(form.into_files()).await;

    tracing::info!("Upload process completed");
    Ok(Json(UploadResponse::from_results(results)))
}

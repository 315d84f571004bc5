//! Scanner preparation handlers
//!
//! Folder provisioning and scanner SDK launch. Launching is fire-and-forget
//! from the caller's point of view; the process outcome is available later
//! from `GET /scanner/launch/{launch_id}`.

use std::path::PathBuf;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use bindu_core::LaunchStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::{json_body, required_field};

/// Request for provisioning a folder
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    /// Folder path relative to the server's data directory
    #[serde(default)]
    #[schema(example = "temp/scanner")]
    pub folder_path: Option<String>,
}

/// Response for a provisioned folder
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateFolderResponse {
    pub message: &'static str,
    pub success: bool,
    /// Absolute or data-dir-relative path of the folder on disk
    pub path: String,
}

/// Ensure a folder exists under the data directory
///
/// Idempotent: provisioning an existing folder succeeds.
#[utoipa::path(
    post,
    path = "/scanner/create-temp-folder",
    tag = "Scanner",
    request_body = CreateFolderRequest,
    responses(
        (status = 200, description = "Folder exists", body = CreateFolderResponse),
        (status = 400, description = "Missing or invalid folderPath"),
        (status = 500, description = "Folder could not be created")
    )
)]
pub async fn create_temp_folder_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateFolderRequest>, JsonRejection>,
) -> Result<Json<CreateFolderResponse>, ApiError> {
    let request = json_body(payload)?;
    let folder_path = required_field(request.folder_path, "Folder path is required")?;

    let full_path = state.provisioner.provision(&folder_path).await?;

    Ok(Json(CreateFolderResponse {
        message: "Temporary folder created successfully",
        success: true,
        path: full_path.display().to_string(),
    }))
}

/// Request for launching the scanner SDK
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LaunchRequest {
    /// Path of the scanner SDK executable
    #[serde(default)]
    #[schema(example = "C:\\Program Files\\ZKFinger SDK\\ZKFinger Demo.exe")]
    pub sdk_path: Option<String>,
}

/// Response for a started scanner process
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LaunchResponse {
    pub message: &'static str,
    pub success: bool,
    /// Handle for polling the process outcome
    #[schema(value_type = String, example = "550e8400-e29b-41d4-a716-446655440000")]
    pub launch_id: Uuid,
}

/// Launch the fingerprint scanner SDK
///
/// Responds as soon as the process has started. The process is not tied to
/// any capture; poll `GET /scanner/launch/{launch_id}` for its outcome.
#[utoipa::path(
    post,
    path = "/scanner/launch-sdk",
    tag = "Scanner",
    request_body = LaunchRequest,
    responses(
        (status = 200, description = "SDK process started", body = LaunchResponse),
        (status = 400, description = "Missing sdkPath"),
        (status = 404, description = "SDK executable not found"),
        (status = 500, description = "SDK process could not be started")
    )
)]
pub async fn launch_sdk_handler(
    State(state): State<AppState>,
    payload: Result<Json<LaunchRequest>, JsonRejection>,
) -> Result<Json<LaunchResponse>, ApiError> {
    let request = json_body(payload)?;
    let sdk_path = required_field(request.sdk_path, "SDK path is required")?;

    let launch_id = state.launcher.launch(&PathBuf::from(sdk_path)).await?;

    Ok(Json(LaunchResponse {
        message: "Fingerprint scanner SDK launched successfully",
        success: true,
        launch_id,
    }))
}

/// Outcome of a launched scanner process
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LaunchStatusResponse {
    #[schema(value_type = String)]
    pub launch_id: Uuid,
    pub sdk_path: String,
    /// `running`, `exited` or `failed`
    #[schema(example = "exited")]
    pub status: &'static str,
    /// Process exit code, once exited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Error waiting for the process, if it failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[schema(value_type = String)]
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Poll the outcome of a scanner launch
#[utoipa::path(
    get,
    path = "/scanner/launch/{launch_id}",
    tag = "Scanner",
    params(("launch_id" = String, Path, description = "Id returned by launch-sdk")),
    responses(
        (status = 200, description = "Launch status", body = LaunchStatusResponse),
        (status = 400, description = "Malformed launch id"),
        (status = 404, description = "Unknown or expired launch id")
    )
)]
pub async fn launch_status_handler(
    State(state): State<AppState>,
    Path(launch_id): Path<String>,
) -> Result<Json<LaunchStatusResponse>, ApiError> {
    let launch_id = Uuid::parse_str(&launch_id)
        .map_err(|_| ApiError::bad_request("Invalid launch id"))?;

    let record = state
        .launcher
        .status(&launch_id)
        .ok_or_else(|| ApiError::not_found("Launch not found"))?;

    let (exit_code, error) = match &record.status {
        LaunchStatus::Running => (None, None),
        LaunchStatus::Exited { code } => (*code, None),
        LaunchStatus::Failed { error } => (None, Some(error.clone())),
    };

    Ok(Json(LaunchStatusResponse {
        launch_id: record.id,
        sdk_path: record.sdk_path.display().to_string(),
        status: record.status.as_str(),
        exit_code,
        error,
        started_at: record.started_at,
        finished_at: record.finished_at,
    }))
}

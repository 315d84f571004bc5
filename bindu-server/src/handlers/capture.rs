//! Fingerprint capture handler
//!
//! Handles POST /scanner/watch-fingerprint. The request stays open until the
//! scanner image has settled and been stored, the capture deadline passes
//! (408), or the watch fails (500).

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::{json_body, required_field};

/// Request for a capture watch
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WatchFingerprintRequest {
    /// User the captured image is attached to
    #[serde(default)]
    #[schema(example = "65f1c0ffee0ddba11deadbee")]
    pub user_id: Option<String>,
}

/// Response for a stored capture
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WatchFingerprintResponse {
    pub message: &'static str,
    pub success: bool,
    /// Public path of the stored image
    #[schema(example = "/uploads/fingerprints/fingerprint-65f1c0ffee-1718000000000-4821.bmp")]
    pub file_path: String,
    pub file_name: String,
    /// Correlates this capture with the detection record created from it
    #[schema(example = "1718000000000-4821")]
    pub analysis_id: String,
    pub profile_id: String,
    /// `data:` URI of the stored image, omitted if it could not be re-read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base64_image: Option<String>,
}

/// Wait for the scanner image and attach it to a user
///
/// The watch applies a 2 s write-stability window and gives up after 30 s.
#[utoipa::path(
    post,
    path = "/scanner/watch-fingerprint",
    tag = "Scanner",
    request_body = WatchFingerprintRequest,
    responses(
        (status = 200, description = "Fingerprint image saved", body = WatchFingerprintResponse),
        (status = 400, description = "Missing userId"),
        (status = 404, description = "User not found"),
        (status = 408, description = "No image appeared before the deadline"),
        (status = 500, description = "Watch, copy or user update failed")
    )
)]
pub async fn watch_fingerprint_handler(
    State(state): State<AppState>,
    payload: Result<Json<WatchFingerprintRequest>, JsonRejection>,
) -> Result<Json<WatchFingerprintResponse>, ApiError> {
    let request = json_body(payload)?;
    let user_id = required_field(request.user_id, "User ID is required")?;

    let receipt = state.capture.capture(&user_id).await?;

    Ok(Json(WatchFingerprintResponse {
        message: "Fingerprint image saved successfully",
        success: true,
        file_path: receipt.file_path,
        file_name: receipt.file_name,
        analysis_id: receipt.analysis_id.to_string(),
        profile_id: receipt.profile_id,
        base64_image: receipt.data_uri,
    }))
}

//! OpenAPI documentation configuration
//!
//! Generates OpenAPI 3.0 specification for the Bindu capture API.

use utoipa::OpenApi;

use crate::handlers::{
    CreateFolderRequest, CreateFolderResponse, HealthResponse, LaunchRequest, LaunchResponse,
    LaunchStatusResponse, ReadyResponse, WatchFingerprintRequest, WatchFingerprintResponse,
};

/// Bindu Capture API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bindu - Fingerprint Capture API",
        version = "0.1.0",
        description = r#"
## Fingerprint capture bridge

Connects a vendor fingerprint scanner to Bindu user profiles.

### Capture sequence

1. Provision a working folder via `POST /scanner/create-temp-folder`
2. Start the scanner SDK via `POST /scanner/launch-sdk` (poll `GET /scanner/launch/{launch_id}` for its outcome)
3. Start a capture via `POST /scanner/watch-fingerprint`; the request stays open until the scanner image settles
4. The stored image is served from `/uploads/fingerprints/...`

A capture that sees no image within 30 seconds fails with 408; start again from step 2.
"#,
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    tags(
        (name = "Scanner", description = "Scanner launch and fingerprint capture"),
        (name = "Health", description = "Service health and readiness endpoints")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::handlers::scanner::create_temp_folder_handler,
        crate::handlers::scanner::launch_sdk_handler,
        crate::handlers::scanner::launch_status_handler,
        crate::handlers::capture::watch_fingerprint_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            CreateFolderRequest,
            CreateFolderResponse,
            LaunchRequest,
            LaunchResponse,
            LaunchStatusResponse,
            WatchFingerprintRequest,
            WatchFingerprintResponse,
        )
    )
)]
pub struct ApiDoc;

//! Health and service-info endpoints

use axum::Json;
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// GET /health handler
pub async fn handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Service info response for the root endpoint
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    service: &'static str,
    version: &'static str,
    status: &'static str,
    endpoints: [&'static str; 2],
}

/// GET / handler
///
/// The extension pings this endpoint to verify the backend is reachable
/// before opening its side panel.
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "Guidepost",
        version: env!("CARGO_PKG_VERSION"),
        status: "online",
        endpoints: ["/respond", "/health"],
    })
}

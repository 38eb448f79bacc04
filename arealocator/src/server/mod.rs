//! HTTP surface for the locator.
//!
//! Exposes the single geolocation route. Transport framing stays thin: the
//! handler forwards the two query parameters to [`Locator::locate`] and
//! serializes the result. Locate outcomes are 200 responses, including
//! `status: ERROR`; only process-level faults (an unloadable district
//! dataset) map to a 500 with a `{search, message}` body carrying a
//! generic message. Provider error details never reach the caller.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::geocode::GeocodingProvider;
use crate::locator::Locator;

/// Route of the geolocation endpoint.
pub const GEOLOCATION_ROUTE: &str = "/api/v1/geolocation";

/// Query parameters of the geolocation endpoint.
#[derive(Debug, Deserialize)]
pub struct LocateParams {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Serialize)]
struct FaultBody {
    search: String,
    message: String,
}

/// Builds the application router around a shared locator.
pub fn router<P>(locator: Arc<Locator<P>>) -> Router
where
    P: GeocodingProvider + 'static,
{
    Router::new()
        .route(GEOLOCATION_ROUTE, get(locate_handler::<P>))
        .with_state(locator)
}

async fn locate_handler<P>(
    State(locator): State<Arc<Locator<P>>>,
    Query(params): Query<LocateParams>,
) -> Response
where
    P: GeocodingProvider + 'static,
{
    match locator.locate(&params.search, &params.address).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => {
            error!(search = %params.search, error = %err, "internal fault during locate");
            let body = FaultBody {
                search: params.search,
                message: "internal error while locating the address".to_string(),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

/// Binds the listen address and serves the router until ctrl-c.
pub async fn serve<P>(locator: Arc<Locator<P>>, addr: SocketAddr) -> std::io::Result<()>
where
    P: GeocodingProvider + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router(locator))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to install ctrl-c handler");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::geocode::testing::{sample_result, ScriptedProvider};
    use crate::geocode::ProviderChain;
    use crate::locator::LocateStatus;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn districts_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"{
                "type": "FeatureCollection",
                "features": [
                    {
                        "type": "Feature",
                        "properties": {"Name": "Center"},
                        "geometry": {
                            "type": "Polygon",
                            "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]
                        }
                    }
                ]
            }"#,
        )
        .unwrap();
        file
    }

    fn locator(file: &NamedTempFile) -> Arc<Locator<ScriptedProvider>> {
        Arc::new(Locator::new(
            ProviderChain::new(vec![ScriptedProvider::succeeding("p", sample_result())]),
            file.path(),
            CacheConfig::default(),
        ))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_locate_route_returns_result_json() {
        let file = districts_file();
        let response = locate_handler(
            State(locator(&file)),
            Query(LocateParams {
                search: "s-1".to_string(),
                address: "1 Main St".to_string(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "OK");
        assert_eq!(json["search"], "s-1");
        assert_eq!(json["location"]["serviceArea"], "Center");
    }

    #[tokio::test]
    async fn test_error_status_is_still_a_200() {
        let file = districts_file();
        let failing = Arc::new(Locator::new(
            ProviderChain::new(vec![ScriptedProvider::failing(
                "p",
                crate::geocode::GeocodeError::new("403", "bad key", "x"),
            )]),
            file.path(),
            CacheConfig::default(),
        ));

        let response = locate_handler(
            State(failing),
            Query(LocateParams {
                search: "s-2".to_string(),
                address: "1 Main St".to_string(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ERROR");
        assert!(json.get("location").is_none());
    }

    #[tokio::test]
    async fn test_internal_fault_maps_to_500_with_generic_body() {
        let broken = Arc::new(Locator::new(
            ProviderChain::new(vec![ScriptedProvider::succeeding("p", sample_result())]),
            "/nonexistent/districts.json",
            CacheConfig::default(),
        ));

        let response = locate_handler(
            State(broken),
            Query(LocateParams {
                search: "s-3".to_string(),
                address: "1 Main St".to_string(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["search"], "s-3");
        // Generic message only; no provider or filesystem details leak.
        assert_eq!(json["message"], "internal error while locating the address");
    }

    #[test]
    fn test_result_status_enum_round_trip() {
        let status: LocateStatus = serde_json::from_str("\"NOT_FOUND\"").unwrap();
        assert_eq!(status, LocateStatus::NotFound);
    }
}

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use chrono::SecondsFormat;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "layers": state.gis_config.layers.len(),
        "started_at": state.started_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    }))
}

/// Map bootstrap configuration. Never cached so key or layer changes apply on reload.
pub async fn get_gis_config(State(state): State<AppState>) -> Response {
    let mut response = Json(state.gis_config.as_ref().clone()).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::path::PathBuf;

    use fieldmap_shared::{GisConfig, LayerType, MapOptions, default_layers};

    use crate::state::AppState;

    async fn spawn_test_server(state: AppState) -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        let app = crate::app::build_app(state);
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve test app");
        });
        (addr, handle)
    }

    fn test_state() -> AppState {
        AppState::new(
            GisConfig {
                api_key: "test-key".to_string(),
                map: MapOptions {
                    ready_timeout_ms: 3_000,
                    ..MapOptions::default()
                },
                layers: default_layers(),
            },
            PathBuf::from("does-not-exist"),
        )
    }

    #[tokio::test]
    async fn health_exposes_expected_contract() {
        let state = test_state();
        let started_at = state.started_at;
        let (addr, server_handle) = spawn_test_server(state).await;
        let client = reqwest::Client::new();

        let body: serde_json::Value = client
            .get(format!("http://{addr}/api/health"))
            .send()
            .await
            .expect("health request")
            .error_for_status()
            .expect("health status")
            .json()
            .await
            .expect("health JSON");

        assert_eq!(body["status"], "ok");
        assert_eq!(body["layers"], LayerType::ALL.len());
        let reported = body["started_at"].as_str().expect("started_at string");
        let parsed = chrono::DateTime::parse_from_rfc3339(reported).expect("RFC 3339 timestamp");
        assert_eq!(parsed.timestamp(), started_at.timestamp());

        server_handle.abort();
    }

    #[tokio::test]
    async fn gis_config_round_trips_to_the_client_type() {
        let (addr, server_handle) = spawn_test_server(test_state()).await;
        let response = reqwest::get(format!("http://{addr}/api/gis/config"))
            .await
            .expect("config request");

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(reqwest::header::CACHE_CONTROL)
                .and_then(|v| v.to_str().ok()),
            Some("no-cache")
        );
        let config: GisConfig = response.json().await.expect("config JSON");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.map.ready_timeout_ms, 3_000);
        assert_eq!(config.layers, default_layers());

        server_handle.abort();
    }

    #[tokio::test]
    async fn layer_types_serialize_in_kebab_case() {
        let (addr, server_handle) = spawn_test_server(test_state()).await;
        let body: serde_json::Value = reqwest::get(format!("http://{addr}/api/gis/config"))
            .await
            .expect("config request")
            .json()
            .await
            .expect("config JSON");

        let types: Vec<&str> = body["layers"]
            .as_array()
            .expect("layers array")
            .iter()
            .filter_map(|layer| layer["layer_type"].as_str())
            .collect();
        assert!(types.contains(&"pipelines"));
        assert!(types.contains(&"gateways"));

        server_handle.abort();
    }
}

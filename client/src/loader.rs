#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use geojson::{FeatureCollection, GeoJson};
use log::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait HttpFetch {
    fn get(&self, url: &str) -> LocalBoxFuture<'static, Result<HttpResponse, String>>;
}

/// Browser `fetch` via gloo-net.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlooFetch;

impl HttpFetch for GlooFetch {
    fn get(&self, url: &str) -> LocalBoxFuture<'static, Result<HttpResponse, String>> {
        let url = url.to_string();
        async move {
            let resp = gloo_net::http::Request::get(&url)
                .send()
                .await
                .map_err(|e| format!("fetch error: {e}"))?;
            let status = resp.status();
            let body = resp
                .text()
                .await
                .map_err(|e| format!("read error: {e}"))?;
            Ok(HttpResponse { status, body })
        }
        .boxed_local()
    }
}

pub fn parse_feature_collection(body: &str) -> Result<FeatureCollection, String> {
    match body.parse::<GeoJson>() {
        Ok(GeoJson::FeatureCollection(collection)) => Ok(collection),
        Ok(GeoJson::Feature(_)) => Err("expected a FeatureCollection, got a Feature".into()),
        Ok(GeoJson::Geometry(_)) => Err("expected a FeatureCollection, got a Geometry".into()),
        Err(e) => Err(format!("parse error: {e}")),
    }
}

/// Fetches layer sources. Every call goes to the network; nothing is cached.
pub struct GeoJsonLoader<F> {
    fetch: F,
}

impl<F: HttpFetch> GeoJsonLoader<F> {
    pub fn new(fetch: F) -> Self {
        Self { fetch }
    }

    /// `None` on any failure; the caller skips the layer.
    pub async fn load(&self, url: &str) -> Option<FeatureCollection> {
        let response = match self.fetch.get(url).await {
            Ok(response) => response,
            Err(e) => {
                warn!("layer source {url} unreachable: {e}");
                return None;
            }
        };
        if !response.ok() {
            warn!("layer source {url} returned HTTP {}", response.status);
            return None;
        }
        match parse_feature_collection(&response.body) {
            Ok(collection) => {
                debug!(
                    "layer source {url} parsed ({} features)",
                    collection.features.len()
                );
                Some(collection)
            }
            Err(e) => {
                warn!("layer source {url} unusable: {e}");
                None
            }
        }
    }
}

//! Request handlers

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;

use super::envelope::Envelope;
use super::AppState;
use crate::fetch::Fetcher;
use crate::pipeline;
use crate::sites::{Site, TwoDFan, TWODFAN_ASSET_HOST};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
    pub site: String,
}

/// `GET /search` — runs the pipeline and projects the outcome into the
/// envelope; all failure kinds render as `success:false` with HTTP 200
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Envelope> {
    let site: Site = match params.site.parse() {
        Ok(site) => site,
        Err(_) => return Json(Envelope::err("unsupported site")),
    };

    tracing::info!("Search {:?} on {}", params.query, site.as_str());
    let extractor = site.extractor();

    match pipeline::run(
        extractor.as_ref(),
        &params.query,
        state.config.proxy.as_deref(),
    )
    .await
    {
        Ok(records) => Json(Envelope::ok(records)),
        Err(e) => {
            tracing::error!("Search pipeline failed: {}", e);
            Json(Envelope::err(e.to_string()))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ImageParams {
    pub url: String,
}

/// `GET /image` — streamed proxy for cover images from the allow-listed
/// asset host, cached downstream for an hour
pub async fn image(
    State(state): State<AppState>,
    Query(params): Query<ImageParams>,
) -> Response {
    if !params.url.starts_with(TWODFAN_ASSET_HOST) {
        return (StatusCode::BAD_REQUEST, "unknown image host").into_response();
    }

    let config = TwoDFan::image_fetch_config().proxy(state.config.proxy.clone());
    let fetcher = match Fetcher::new(config).await {
        Ok(fetcher) => fetcher,
        Err(e) => {
            tracing::error!("Image proxy client failed: {}", e);
            return (StatusCode::BAD_GATEWAY, e.to_string()).into_response();
        }
    };

    match fetcher.get(&params.url).await {
        Ok(upstream) => {
            let content_type = upstream
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("image/jpeg")
                .to_string();

            (
                [
                    (header::CONTENT_TYPE, content_type),
                    (
                        header::CACHE_CONTROL,
                        "public, max-age=3600".to_string(),
                    ),
                ],
                Body::from_stream(upstream.bytes_stream()),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Image proxy fetch failed for {}: {}", params.url, e);
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}

/// `GET /health` — liveness only
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

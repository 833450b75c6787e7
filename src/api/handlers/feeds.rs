use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::api::error::{ApiError, ApiResult};
use crate::api::middleware::AuthUser;
use crate::api::with_store;
use crate::app::{self, AppContext, QuireError};
use crate::domain::Feed;

#[derive(Debug, Deserialize)]
pub struct CreateFeedRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFeedRequest {
    pub enabled: bool,
}

/// Only absolute http(s) URLs can be polled.
fn validate_feed_url(raw: &str) -> app::Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(QuireError::Validation("url required".to_string()));
    }
    let url = Url::parse(raw)?;
    match url.scheme() {
        "http" | "https" if url.host().is_some() => Ok(url),
        _ => Err(QuireError::Validation("url must be http or https".to_string())),
    }
}

/// Enabled feeds only.
pub async fn list(State(ctx): State<AppContext>) -> ApiResult<Json<Vec<Feed>>> {
    Ok(Json(with_store(&ctx, |s| s.list_enabled_feeds()).await?))
}

pub async fn create(
    State(ctx): State<AppContext>,
    Extension(auth): Extension<AuthUser>,
    payload: Result<Json<CreateFeedRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Feed>)> {
    let Json(req) = payload?;
    validate_feed_url(&req.url)?;

    // Stored as submitted so uniqueness matches what the admin typed.
    let url = req.url.trim().to_string();
    let feed = with_store(&ctx, move |s| s.add_feed(&url)).await?;
    tracing::info!(user_id = auth.id, feed_id = feed.id, url = %feed.url, "Feed added");
    Ok((StatusCode::CREATED, Json(feed)))
}

pub async fn set_enabled(
    State(ctx): State<AppContext>,
    Extension(auth): Extension<AuthUser>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateFeedRequest>, JsonRejection>,
) -> ApiResult<Json<Feed>> {
    let Path(id) = id?;
    let Json(req) = payload?;

    let enabled = req.enabled;
    let feed = with_store(&ctx, move |s| {
        s.set_feed_enabled(id, enabled)?;
        s.get_feed(id)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("feed not found"))?;

    tracing::info!(user_id = auth.id, feed_id = id, enabled = req.enabled, "Feed updated");
    Ok(Json(feed))
}

pub async fn delete(
    State(ctx): State<AppContext>,
    Extension(auth): Extension<AuthUser>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = id?;

    with_store(&ctx, move |s| s.delete_feed(id)).await?;
    tracing::info!(user_id = auth.id, feed_id = id, "Feed deleted");
    Ok(Json(json!({ "deleted": true })))
}

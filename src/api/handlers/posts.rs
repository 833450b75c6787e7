use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::error::{ApiError, ApiResult};
use crate::api::middleware::AuthUser;
use crate::api::with_store;
use crate::app::AppContext;
use crate::domain::{NewPost, Post};

/// Number of posts returned by the public listing.
pub const LIST_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct PostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl PostRequest {
    fn validated(&self) -> ApiResult<(String, String)> {
        let title = self.title.trim();
        let content = self.content.trim();
        if title.is_empty() || content.is_empty() {
            return Err(ApiError::bad_request("title and content required"));
        }
        Ok((title.to_string(), content.to_string()))
    }
}

pub async fn list(State(ctx): State<AppContext>) -> ApiResult<Json<Vec<Post>>> {
    Ok(Json(with_store(&ctx, |s| s.list_posts(LIST_LIMIT, 0)).await?))
}

pub async fn get(
    State(ctx): State<AppContext>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Post>> {
    let Path(id) = id?;
    with_store(&ctx, move |s| s.get_post(id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("post not found"))
}

pub async fn create(
    State(ctx): State<AppContext>,
    Extension(auth): Extension<AuthUser>,
    payload: Result<Json<PostRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let Json(req) = payload?;
    let (title, content) = req.validated()?;

    let new_post = NewPost::authored(title, content);
    let post = with_store(&ctx, move |s| s.add_post(&new_post)).await?;
    tracing::info!(user_id = auth.id, post_id = post.id, "Post created");
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn update(
    State(ctx): State<AppContext>,
    Extension(auth): Extension<AuthUser>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<PostRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = id?;
    let Json(req) = payload?;
    let (title, content) = req.validated()?;

    with_store(&ctx, move |s| s.update_post(id, &title, &content)).await?;
    tracing::info!(user_id = auth.id, post_id = id, "Post updated");
    Ok(Json(json!({ "updated": true })))
}

pub async fn delete(
    State(ctx): State<AppContext>,
    Extension(auth): Extension<AuthUser>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = id?;

    with_store(&ctx, move |s| s.delete_post(id)).await?;
    tracing::info!(user_id = auth.id, post_id = id, "Post deleted");
    Ok(Json(json!({ "deleted": true })))
}

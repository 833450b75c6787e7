use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::api::error::{ApiError, ApiResult};
use crate::api::middleware::AuthUser;
use crate::api::with_store;
use crate::app::AppContext;
use crate::domain::User;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

pub async fn list(State(ctx): State<AppContext>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(with_store(&ctx, |s| s.list_users()).await?))
}

pub async fn create(
    State(ctx): State<AppContext>,
    Extension(auth): Extension<AuthUser>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let Json(req) = payload?;
    let email = req.email.trim().to_string();
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("email and password required"));
    }

    let user = tokio::task::spawn_blocking(move || {
        ctx.register_user(&email, &req.password, req.is_admin)
    })
    .await??;

    tracing::info!(
        user_id = auth.id,
        created = user.id,
        is_admin = user.is_admin,
        "User created"
    );
    Ok((StatusCode::CREATED, Json(user)))
}

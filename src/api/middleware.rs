use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::error::{ApiError, ApiResult};
use crate::api::with_store;
use crate::app::AppContext;

/// Identity attached to a request by [`require_auth`]. Handlers behind the
/// gate receive it as `Extension<AuthUser>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    /// Claim carried in the token. Admin routes re-check it against storage.
    pub is_admin: bool,
}

/// Rejects requests without a valid `Authorization: Bearer <token>` header.
pub async fn require_auth(
    State(ctx): State<AppContext>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;

    let subject = ctx.tokens.validate(token).map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        ApiError::unauthorized("invalid token")
    })?;

    req.extensions_mut().insert(AuthUser {
        id: subject.subject_id,
        is_admin: subject.is_admin,
    });
    Ok(next.run(req).await)
}

/// Must sit behind [`require_auth`]. The admin flag is read from storage on
/// every request so revocation takes effect before the token expires.
pub async fn require_admin(
    State(ctx): State<AppContext>,
    req: Request,
    next: Next,
) -> ApiResult<Response> {
    let Some(auth) = req.extensions().get::<AuthUser>().copied() else {
        return Err(ApiError::forbidden("forbidden"));
    };

    let id = auth.id;
    match with_store(&ctx, move |s| s.get_user_by_id(id)).await {
        Ok(Some(user)) if user.is_admin => Ok(next.run(req).await),
        Ok(Some(_)) => {
            if auth.is_admin {
                tracing::info!(user_id = id, "Admin token used after admin rights were revoked");
            }
            Err(ApiError::forbidden("admin only"))
        }
        Ok(None) => Err(ApiError::forbidden("forbidden")),
        Err(e) => {
            tracing::warn!("Admin check failed for user {}: {}", id, e);
            Err(ApiError::forbidden("forbidden"))
        }
    }
}

//! HTTP surface.
//!
//! Public routes are open to anyone; admin routes pass through
//! [`middleware::require_auth`] and then [`middleware::require_admin`].

pub mod error;
pub mod handlers;
pub mod middleware;

use axum::middleware::from_fn_with_state;
use axum::routing::{get, patch, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app::{self, AppContext};
use crate::store::Store;
use handlers::{auth, feeds, posts, users};

pub use error::{ApiError, ApiResult};
pub use middleware::AuthUser;

pub fn router(ctx: AppContext) -> Router {
    let public = Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/admin/login", post(auth::login))
        .route("/posts", get(posts::list))
        .route("/posts/{id}", get(posts::get))
        .route("/feeds", get(feeds::list));

    // Layers run outermost-first, so authentication precedes the admin check.
    let admin = Router::new()
        .route("/posts", post(posts::create))
        .route("/posts/{id}", put(posts::update).delete(posts::delete))
        .route("/users", get(users::list).post(users::create))
        .route("/feeds", post(feeds::create))
        .route("/feeds/{id}", patch(feeds::set_enabled).delete(feeds::delete))
        .route_layer(from_fn_with_state(ctx.clone(), middleware::require_admin))
        .route_layer(from_fn_with_state(ctx.clone(), middleware::require_auth));

    let allow_cors = ctx.config.server.allow_cors;
    let app = public
        .merge(admin)
        .with_state(ctx)
        .layer(TraceLayer::new_for_http());

    if allow_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Runs a storage call on the blocking pool. SQLite calls hold a mutex and
/// do file I/O, so they stay off the runtime workers.
pub(crate) async fn with_store<T, F>(ctx: &AppContext, f: F) -> ApiResult<T>
where
    F: FnOnce(&dyn Store) -> app::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let store = ctx.store.clone();
    Ok(tokio::task::spawn_blocking(move || f(store.as_ref())).await??)
}

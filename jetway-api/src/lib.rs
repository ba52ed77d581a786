use axum::{
    http::{header, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod bookings;
pub mod error;
pub mod flights;
pub mod manual;
pub mod middleware;
pub mod state;
pub mod users;

pub use state::AppState;

use middleware::{auth_middleware, rate_limit_middleware, require_admin};

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::USER_AGENT]);

    let public = Router::new()
        .route("/health", get(health))
        .merge(flights::public_routes())
        .merge(manual::routes());

    let authenticated = Router::new()
        .merge(flights::routes())
        .merge(bookings::routes())
        .merge(users::routes())
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    // Layers run outermost-last: auth first, then the admin check.
    let admin = admin::routes()
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let mut router = Router::new()
        .merge(public)
        .merge(authenticated)
        .merge(admin)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    if state.redis.is_some() {
        router = router.layer(from_fn_with_state(state.clone(), rate_limit_middleware));
    }

    router.with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now(),
    }))
}

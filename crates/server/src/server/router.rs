//! Axum router construction.

use axum::{
    routing::{get, post},
    Router,
};
use common::protocol::{LOGIN_PATH, LOGOUT_PATH, REGISTER_PATH, SECRET_PATH};
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};

use super::{handlers, middleware, state::AppState};

/// Build the application [`Router`] with all routes and middleware attached.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route(REGISTER_PATH, post(handlers::register))
        .route(LOGIN_PATH, post(handlers::login))
        .route(LOGOUT_PATH, post(handlers::logout))
        .route(
            SECRET_PATH,
            post(handlers::create_secret).get(handlers::list_secrets),
        )
        .route(
            "/api/secret/:id",
            get(handlers::get_secret)
                .put(handlers::update_secret)
                .delete(handlers::delete_secret),
        )
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(middleware::REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
        .with_state(state)
}

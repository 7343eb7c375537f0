use crate::controller::stream_controller::{Announcement, TickerMessage};
use crate::controller::{health_check_controller, stream_controller};
use crate::AppState;
use axum::{
    http::{HeaderValue, Method},
    middleware::from_fn,
    routing::get,
    Router,
};
use log::*;
use tower_http::cors::CorsLayer;

pub fn define_routes(app_state: AppState) -> Router {
    let sse_options = app_state.sse_options();
    let cors_layer = cors_layer(&app_state.config.allowed_origins);

    Router::new()
        .route("/health", get(health_check_controller::health_check))
        .route(
            "/ticker",
            get(stream_controller::ticker)
                .layer(from_fn(sse::bind::<TickerMessage, _>(Some(sse_options)))),
        )
        .route(
            "/announce",
            get(stream_controller::announce)
                .layer(from_fn(sse::bind::<Announcement, _>(Some(sse_options)))),
        )
        .layer(cors_layer)
        .with_state(app_state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {origin:?}: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET])
}

pub mod config;
pub mod engine;
pub mod health;
pub mod logs;
pub mod scenarios;
pub mod stats;
pub mod unmatched;
pub mod ws;

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/v1/scenarios",
            get(scenarios::list)
                .post(scenarios::create)
                .delete(scenarios::clear_all),
        )
        .route("/v1/scenarios/bulk", post(scenarios::bulk_replace))
        .route("/v1/scenarios/validate", post(scenarios::validate))
        .route(
            "/v1/scenarios/:id",
            get(scenarios::get).put(scenarios::update).delete(scenarios::delete),
        )
        .route("/v1/config", get(config::get).put(config::update))
        .route("/v1/config/validate", post(config::validate))
        .route("/v1/unmatched", get(unmatched::list).delete(unmatched::clear))
        .route("/v1/suggestions", get(unmatched::suggestions))
        .route("/v1/stats", get(stats::get))
        .route("/v1/logs", get(logs::list).delete(logs::clear))
        .route("/v1/engine/status", get(engine::status))
        .route("/v1/engine/trigger", post(engine::trigger))
        .route("/v1/engine/simulate", post(engine::simulate))
        .route("/v1/engine/reload", post(engine::reload))
        .route("/ws", get(ws::upgrade))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

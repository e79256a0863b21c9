use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use clap::Parser;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::EnvFilter;

use scenariod_domain::fingerprint::{Clock, FingerprintParts};
use scenariod_gateway::cli::{Cli, Command};
use scenariod_gateway::config::{CorsConfig, ServerConfig};
use scenariod_gateway::{api, bootstrap, matcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None | Some(Command::Serve) => {
            init_tracing();
            let (config, _path) = scenariod_gateway::cli::load_server_config()?;
            run_server(Arc::new(config)).await
        }
        Some(Command::Validate) => {
            let (config, path) = scenariod_gateway::cli::load_server_config()?;
            tracing::info!(path = %path, "loaded server config");
            let _ = bootstrap::build_app_state(Arc::new(config))?;
            println!("rules.json and config.json are valid");
            Ok(())
        }
        Some(Command::Simulate {
            room,
            flags,
            interaction,
        }) => {
            let (config, _path) = scenariod_gateway::cli::load_server_config()?;
            let (state, _rx) = bootstrap::build_app_state(Arc::new(config))?;

            let rule_config = state.store.config();
            let canonical_room = rule_config.canonical_room(&room);
            let bucket_minutes = rule_config.system_settings.time_bucket_granularity.minutes();
            let now = state.clock.now();
            let time_bucket = scenariod_domain::fingerprint::time_bucket(now, bucket_minutes)?;
            let day_type = scenariod_domain::fingerprint::day_type(now).to_string();

            let mut flags = flags;
            flags.sort();

            let parts = FingerprintParts {
                room: canonical_room,
                time_bucket,
                day_type,
                flags,
                interaction_type: interaction,
            };
            let result = matcher::find_match(
                &state.store.rules,
                &parts,
                rule_config.system_settings.fallback_enabled,
            )?;

            match result.rule {
                Some(rule) => println!(
                    "matched {:?} (fallback depth {:?}): {}",
                    result.fingerprint,
                    result.fallback_depth,
                    rule.name
                ),
                None => println!(
                    "no match for {:?} (tried: {:?})",
                    result.fingerprint, result.candidates_tried
                ),
            }
            Ok(())
        }
        Some(Command::Version) => {
            println!("scenariod {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,scenariod_gateway=debug")),
        )
        .json()
        .init();
}

async fn run_server(server_config: Arc<ServerConfig>) -> anyhow::Result<()> {
    tracing::info!("scenariod starting");

    bootstrap::ensure_default_config(&server_config.config_path)?;
    let (state, rx) = bootstrap::build_app_state(server_config.clone())?;
    bootstrap::spawn_engine_loop(rx, &state);

    let cors_layer = build_cors_layer(&state.server_config.cors);
    let max_concurrent = state.server_config.max_concurrent_requests;

    let app = api::router()
        .layer(cors_layer)
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_concurrent))
        .with_state(state.clone());

    let addr = state.server_config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;

    tracing::info!(addr = %addr, "scenariod listening");

    axum::serve(listener, app).await.context("axum server error")?;

    Ok(())
}

/// Build a [`CorsLayer`] from the configured allowed origins. Origins may
/// carry a trailing `:*` wildcard port (`http://localhost:*`); a bare `"*"`
/// allows everything (not recommended outside development).
fn build_cors_layer(cors: &CorsConfig) -> CorsLayer {
    use axum::http::header;

    if cors.allowed_origins.len() == 1 && cors.allowed_origins[0] == "*" {
        tracing::warn!("CORS configured with wildcard \"*\" — all origins allowed");
        return CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);
    }

    let mut exact: Vec<HeaderValue> = Vec::new();
    let mut wildcard_prefixes: Vec<String> = Vec::new();

    for origin in &cors.allowed_origins {
        if origin.ends_with(":*") {
            wildcard_prefixes.push(origin.trim_end_matches('*').to_owned());
        } else if let Ok(hv) = origin.parse::<HeaderValue>() {
            exact.push(hv);
        } else {
            tracing::warn!(origin = %origin, "invalid CORS origin, skipping");
        }
    }

    let allow_origin = if wildcard_prefixes.is_empty() {
        AllowOrigin::list(exact)
    } else {
        AllowOrigin::predicate(move |origin, _| {
            let origin_str = origin.to_str().unwrap_or("");
            if exact.iter().any(|e| e.as_bytes() == origin.as_bytes()) {
                return true;
            }
            wildcard_prefixes.iter().any(|prefix| {
                origin_str
                    .strip_prefix(prefix.as_str())
                    .map(|port| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()))
                    .unwrap_or(false)
            })
        })
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

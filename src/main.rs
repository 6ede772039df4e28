mod auth;
mod config;
mod dto;
mod errors;
mod handlers;
mod models;
mod password;
mod routes;
mod services;
mod state;

use crate::{config::Config, routes::app_router, state::AppState};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vision_stream=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Config::from_env();
    let state = Arc::new(AppState::new(&cfg).await.expect("init state"));

    let app = app_router(state.clone());

    let listener = TcpListener::bind(&cfg.bind_addr).await.unwrap();
    tracing::info!(bind_addr = %cfg.bind_addr, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .unwrap();

    // connection pool is opened in AppState::new and must be drained before exit
    state.client.clone().shutdown().await;
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    tracing::info!("shutdown signal received");
}

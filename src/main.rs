#![warn(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::single_match_else, clippy::missing_errors_doc)]

use crate::{config::RuntimeConfiguration, routes::build_router, state::RosterState};
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[macro_use]
extern crate tracing;

mod config;
mod data;
mod error;
mod routes;
mod service;
mod state;
mod storage;
mod upload;
mod validation;

async fn shutdown_signal(state: RosterState) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    warn!("signal received, starting graceful shutdown");
    state.sensible_shutdown().await;
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("not loading a .env file: {e}");
    }

    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish(),
    )
    .expect("unable to set tracing subscriber");

    info!("`tracing` online");

    let options = PgPoolOptions::new().max_connections(15);
    let config = RuntimeConfiguration::new().expect("unable to create config");
    let state = RosterState::new(options, config)
        .await
        .expect("unable to create state");

    let storage_config = state.config().storage_config();
    let app = build_router(
        state.students(),
        storage_config.public_dir().map(PathBuf::as_path),
    );

    let server_ip = state.config().server_ip().to_string();
    let listener = TcpListener::bind(&server_ip)
        .await
        .expect("unable to listen on server ip");

    info!(?server_ip, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .expect("unable to serve app");
}

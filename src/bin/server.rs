use std::{
    fs::OpenOptions,
    net::SocketAddr,
    process::ExitCode,
    sync::Arc,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;

#[cfg(debug_assertions)]
use tower_livereload::LiveReloadLayer;

use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use budget_tracker::{AppState, Config, build_router, graceful_shutdown, logging_middleware};

/// The web server for the budget tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The port to serve the app from.
    #[arg(short, long, env = "PORT", default_value_t = 8000)]
    port: u16,

    #[command(flatten)]
    config: Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    setup_logging(args.config.is_development());

    if !args.config.plaid.has_credentials() {
        tracing::warn!(
            "PLAID_CLIENT_ID and PLAID_SECRET are not set, bank account linking is disabled."
        );
    }

    let database_path = args.config.database_path();
    let connection = match Connection::open(database_path) {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not open database at {database_path}: {error}");
            return ExitCode::FAILURE;
        }
    };

    let state = match AppState::new(connection, &args.config) {
        Ok(state) => state,
        Err(error) => {
            tracing::error!("Could not start the server: {error}");
            return ExitCode::FAILURE;
        }
    };

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state));

    #[cfg(debug_assertions)]
    let router = router.layer(LiveReloadLayer::new());

    let address = SocketAddr::from(([0, 0, 0, 0], args.port));
    tracing::info!("HTTP server listening on {address}");

    if let Err(error) = axum_server::bind(address)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        tracing::error!("Server error: {error}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn setup_logging(is_development: bool) {
    let stdout_level = if is_development {
        filter::LevelFilter::DEBUG
    } else {
        filter::LevelFilter::INFO
    };
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(stdout_level);

    let debug_log = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .inspect_err(|error| eprintln!("Could not open debug.log, logging to stdout only: {error}"))
        .ok()
        .map(|log_file| {
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(Arc::new(log_file))
                .with_filter(filter::LevelFilter::DEBUG)
        });

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged by the handlers, so skip the 5xx logging.
        .on_failure(());

    router
        .layer(middleware::from_fn(logging_middleware))
        .layer(tracing_layer)
}

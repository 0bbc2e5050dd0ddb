use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    process::ExitCode,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use course_catalog::{
    AppState, BcryptHasher, DEFAULT_TOKEN_TTL, ServerConfig, TokenIssuer, build_router,
    count_users, graceful_shutdown, initialize_db,
};

/// The REST API server for the course catalog.
///
/// The database location and token secret are read from the `DATABASE_URL` and
/// `JWT_SECRET` environment variables, or from a `.env` file.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 5000)]
    port: u16,

    /// The address to listen on.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    host: IpAddr,
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();

    let args = Args::parse();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!("Could not load config: {error}");
            return ExitCode::FAILURE;
        }
    };

    let token_issuer = match TokenIssuer::new(&config.jwt_secret, DEFAULT_TOKEN_TTL) {
        Ok(token_issuer) => token_issuer,
        Err(error) => {
            tracing::error!("Could not create token issuer: {error}");
            return ExitCode::FAILURE;
        }
    };

    let connection = match Connection::open(&config.database_url) {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!(
                "Could not open database at {}: {error}",
                config.database_url
            );
            return ExitCode::FAILURE;
        }
    };

    if let Err(error) = initialize_db(&connection) {
        tracing::error!("Could not initialize database: {error}");
        return ExitCode::FAILURE;
    }

    match count_users(&connection) {
        Ok(count) => tracing::info!("Connected to database with {count} registered users"),
        Err(error) => tracing::warn!("Could not count users: {error}"),
    }

    let state = AppState::new(connection, token_issuer, BcryptHasher::default());

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state));

    let addr = SocketAddr::new(args.host, args.port);
    tracing::info!("HTTP server listening on {}", addr);

    if let Err(error) = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        tracing::error!("Server stopped with an error: {error}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().pretty())
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
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}

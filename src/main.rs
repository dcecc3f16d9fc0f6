//! Guidepost HTTP server
//!
//! Starts an Axum web server that streams guidance responses to the
//! browser extension.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use clap::Parser;
use guidepost::{
    cli::{Cli, Command, generate_config_template},
    config::Config,
    handlers::{self, AppState},
    middleware::request_id_middleware,
    telemetry,
};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(&path, template)?;
                println!("Wrote template configuration to {}", path);
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    let config = Config::from_file(&cli.config)?;

    telemetry::init(&config.observability.log_level);

    tracing::info!(
        "Starting Guidepost server on {}:{}",
        config.server.host,
        config.server.port
    );

    let host = config.server.host.clone();
    let port = config.server.port;
    let state = AppState::new(config);

    // The extension calls from arbitrary page origins, so CORS stays open.
    let app = Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::handler))
        .route("/respond", post(handlers::respond::handler))
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from((
        host.parse::<std::net::IpAddr>()
            .unwrap_or_else(|_| std::net::IpAddr::from([127, 0, 0, 1])),
        port,
    ));

    tracing::info!("Listening on {}", addr);
    tracing::info!("Respond endpoint available at http://{}/respond", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

use envconfig::Envconfig;
use tokio::signal;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use template_api::config::Config;
use template_api::server::serve;
use template_api::state::State;

async fn shutdown() {
    let mut term = signal::unix::signal(signal::unix::SignalKind::terminate())
        .expect("failed to register SIGTERM handler");

    let mut interrupt = signal::unix::signal(signal::unix::SignalKind::interrupt())
        .expect("failed to register SIGINT handler");

    tokio::select! {
        _ = term.recv() => {},
        _ = interrupt.recv() => {},
    };

    tracing::info!("Shutting down gracefully...");
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() {
    let config = Config::init_from_env().expect("Invalid configuration:");

    let log_layer = {
        let base_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_level(true);

        if config.debug {
            // Development: pretty colored output
            base_layer
                .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
                .with_ansi(true)
                .with_filter(env_filter())
                .boxed()
        } else {
            // Production: JSON lines
            base_layer.json().with_filter(env_filter()).boxed()
        }
    };
    tracing_subscriber::registry().with(log_layer).init();

    // Backends that fail to connect are registered as unavailable; startup continues
    let state = State::from_config(&config).await;

    // Open the TCP port and start the server
    let listener = tokio::net::TcpListener::bind(config.bind())
        .await
        .expect("could not bind port");
    serve(state, listener, shutdown()).await;

    tracing::info!("Shutdown complete");
}

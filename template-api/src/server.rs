use std::{future::Future, net::SocketAddr};

use tokio::net::TcpListener;

use crate::{router::router, state::State};

/// Serve until `shutdown` resolves, then release the backends once in-flight
/// requests have drained.
pub async fn serve<F>(state: State, listener: TcpListener, shutdown: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match listener.local_addr() {
        Ok(addr) => tracing::info!("listening on {:?}", addr),
        Err(e) => tracing::warn!(error = %e, "could not read listen address"),
    }

    let app = router(
        state.registry.clone(),
        &state.cors_origins,
        state.enable_metrics,
    );

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    {
        tracing::error!(error = %e, "server error");
    }

    state.registry.shutdown().await;
}

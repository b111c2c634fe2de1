use std::{
    net::SocketAddr,
    sync::{Arc, Once},
};

use template_api::state::State;
use template_api::{config::Config, server::serve};
use tokio::{net::TcpListener, sync::Notify};

static TRACING_INIT: Once = Once::new();
pub fn setup_tracing() {
    TRACING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_writer(tracing_subscriber::fmt::TestWriter::new())
            .init()
    });
}

/// Test config whose cache points at a port nothing listens on, so tests
/// never depend on a local Redis.
pub fn offline_config() -> Config {
    Config {
        redis_url: "redis://127.0.0.1:1".to_string(),
        ..Config::default_for_test()
    }
}

pub struct ServerHandle {
    pub addr: SocketAddr,
    pub shutdown: Arc<Notify>,
}

impl ServerHandle {
    pub async fn for_config(config: Config) -> Self {
        setup_tracing();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let notify = Arc::new(Notify::new());
        let shutdown = notify.clone();

        let state = State::from_config(&config).await;

        tokio::spawn(async move {
            serve(state, listener, async move { notify.notified().await }).await
        });

        Self { addr, shutdown }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.shutdown.notify_one()
    }
}

//! Helpers for tests that need a real HTTP peer

use axum::Router;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use crate::core::config::PipelineConfig;

/// Serve `router` on an ephemeral localhost port
pub(crate) async fn spawn_stub(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    addr
}

/// Sample configuration whose provider lives at `addr`
pub(crate) fn config_with_provider(addr: SocketAddr) -> PipelineConfig {
    PipelineConfig {
        api_url: format!("http://{}", addr),
        ..PipelineConfig::sample()
    }
}

/// Records values seen by a stub handler
#[derive(Clone, Default)]
pub(crate) struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    pub(crate) fn push(&self, value: impl Into<String>) {
        self.0.lock().unwrap().push(value.into());
    }

    pub(crate) fn values(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

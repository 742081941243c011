//! In-process server for end-to-end tests.

use std::net::SocketAddr;

use inscription_config::AppConfig;
use inscription_core::{Client, Server, ShutdownSignal};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// A [`Server`] running on a background task.
///
/// The server is told to shut down when this value is dropped.
pub struct TestServer {
    addr: SocketAddr,
    shutdown: broadcast::Sender<ShutdownSignal>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Bind `config` (normally with port 0) and start serving.
    pub async fn start(config: AppConfig) -> Self {
        let server = Server::bind(config)
            .await
            .expect("failed to bind test server");
        let addr = server.local_addr().expect("test server has no address");
        let shutdown = server.shutdown_sender();
        let handle = tokio::spawn(async move {
            if let Err(e) = server.run().await {
                tracing::error!(error = %e, "test server failed");
            }
        });

        Self {
            addr,
            shutdown,
            handle: Some(handle),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// A client pointed at this server.
    pub fn client(&self) -> Client {
        Client::new(self.addr.to_string())
    }

    /// Stop the server and wait for its loop to exit.
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(ShutdownSignal);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.shutdown.send(ShutdownSignal);
    }
}

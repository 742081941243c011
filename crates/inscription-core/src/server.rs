//! Listener loop. Accepts and serves one connection at a time.
//!
//! Connections are served inline, never spawned: connection N+1 is not
//! accepted before connection N is closed. A slow client therefore holds the
//! only serving slot until its read/write deadline expires.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::broadcast;
use tracing::{info, warn};

use inscription_config::AppConfig;

use crate::connection::Connection;
use crate::dispatch::HandlerRegistry;
use crate::wire::{Deadlines, WireError};

/// Shutdown signal sent via broadcast channel.
#[derive(Debug, Clone)]
pub struct ShutdownSignal;

/// Errors from starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("could not resolve listen address {0}")]
    Resolve(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The course registration server.
pub struct Server {
    config: AppConfig,
    registry: HandlerRegistry,
    listener: TcpListener,
    shutdown_tx: broadcast::Sender<ShutdownSignal>,
    // Created with the sender so a signal sent before `run` is not lost.
    shutdown_rx: broadcast::Receiver<ShutdownSignal>,
}

impl Server {
    /// Bind the listening socket with the built-in handlers.
    pub async fn bind(config: AppConfig) -> Result<Self, ServerError> {
        let registry = HandlerRegistry::with_builtin(&config.storage);
        Self::bind_with_registry(config, registry).await
    }

    /// Bind the listening socket with a caller-supplied handler registry.
    pub async fn bind_with_registry(
        config: AppConfig,
        registry: HandlerRegistry,
    ) -> Result<Self, ServerError> {
        let address = config.server.address();
        let addr = tokio::net::lookup_host(&address)
            .await?
            .next()
            .ok_or_else(|| ServerError::Resolve(address.clone()))?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket
            .bind(addr)
            .map_err(|source| ServerError::Bind { addr, source })?;
        let listener = socket.listen(config.server.backlog)?;

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        Ok(Self {
            config,
            registry,
            listener,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// The bound address (useful when the configured port is 0).
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// A sender that stops [`run`](Self::run) once the current connection is done.
    pub fn shutdown_sender(&self) -> broadcast::Sender<ShutdownSignal> {
        self.shutdown_tx.clone()
    }

    /// Request a graceful shutdown. Takes effect even if `run` has not
    /// started yet.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(ShutdownSignal);
    }

    /// Accept and serve connections until a shutdown signal or Ctrl-C.
    pub async fn run(mut self) -> Result<(), ServerError> {
        info!(
            addr = %self.local_addr()?,
            verbs = ?self.registry.verbs(),
            catalog = %self.config.storage.catalog_path.display(),
            registrations = %self.config.storage.registrations_path.display(),
            "inscription server listening"
        );

        let fresh = self.shutdown_tx.subscribe();
        let mut shutdown_rx = std::mem::replace(&mut self.shutdown_rx, fresh);
        loop {
            let accepted = tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received, stopping server");
                    break;
                }
                _ = tokio::signal::ctrl_c() => {
                    warn!("Ctrl-C received, stopping server");
                    break;
                }
                accepted = self.listener.accept() => accepted,
            };

            match accepted {
                Ok((socket, peer)) => self.serve_connection(socket, peer).await,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    // Persistent accept errors (e.g. EMFILE) would otherwise spin.
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }

        info!("Server stopped");
        Ok(())
    }

    async fn serve_connection(&self, socket: TcpStream, peer: SocketAddr) {
        info!(%peer, "client connected");
        let deadlines = Deadlines::new(
            self.config.server.read_timeout(),
            self.config.server.write_timeout(),
        );

        let outcome: Result<_, WireError> = async {
            let conn = Connection::open(socket, peer.to_string(), deadlines).await?;
            conn.serve(&self.registry).await
        }
        .await;

        match outcome {
            Ok(reply) => info!(%peer, ok = reply.is_ok(), "client disconnected"),
            Err(e) => warn!(%peer, error = %e, "connection aborted"),
        }
    }
}

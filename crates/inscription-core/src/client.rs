//! Client for a running inscription server.
//!
//! Every call opens a fresh connection, sends one command (plus any follow-up
//! object), reads the single reply and closes.

use std::time::Duration;

use inscription_config::ServerConfig;
use serde::Serialize;
use tokio::net::TcpStream;
use tracing::debug;

use crate::command::Command;
use crate::model::{Course, RegistrationForm};
use crate::wire::{Deadlines, ObjectStream, Payload, Reply, WireError};

/// Errors from the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to connect to server at {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("server returned error: {0}")]
    Server(String),

    #[error("unexpected reply payload (expected {0})")]
    UnexpectedPayload(&'static str),
}

/// Client for one inscription server address.
#[derive(Debug, Clone)]
pub struct Client {
    addr: String,
    deadlines: Deadlines,
}

impl Client {
    /// Create a client for `addr` (`host:port`) with 30-second deadlines.
    pub fn new(addr: impl Into<String>) -> Self {
        let limit = Some(Duration::from_secs(30));
        Self {
            addr: addr.into(),
            deadlines: Deadlines::new(limit, limit),
        }
    }

    /// Create a client for the server described by `config`.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            addr: config.address(),
            deadlines: Deadlines::new(config.read_timeout(), config.write_timeout()),
        }
    }

    pub fn with_deadlines(mut self, deadlines: Deadlines) -> Self {
        self.deadlines = deadlines;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn connect(&self) -> Result<ObjectStream, ClientError> {
        let stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|source| ClientError::Connect {
                addr: self.addr.clone(),
                source,
            })?;
        Ok(ObjectStream::open(stream, self.deadlines).await?)
    }

    /// Send a raw command line and return the server's reply as-is.
    pub async fn send(&self, line: &str) -> Result<Reply, ClientError> {
        self.exchange::<()>(line, None).await
    }

    async fn exchange<T: Serialize>(
        &self,
        line: &str,
        follow_up: Option<&T>,
    ) -> Result<Reply, ClientError> {
        let mut stream = self.connect().await?;
        debug!(addr = %self.addr, command = line, "sending command");

        stream.write_object(line).await?;
        if let Some(object) = follow_up {
            stream.write_object(object).await?;
        }
        let reply: Reply = stream.read_object().await?;
        stream.close().await?;
        Ok(reply)
    }

    // ── Typed API methods ──────────────────────────────────────────────

    /// `CHARGER <session>` — list the courses offered in `session`.
    pub async fn load_courses(&self, session: &str) -> Result<Vec<Course>, ClientError> {
        let command = Command::load(session).to_string();
        match self.exchange::<()>(&command, None).await? {
            Reply::Ok {
                payload: Payload::Courses(courses),
            } => Ok(courses),
            Reply::Ok { .. } => Err(ClientError::UnexpectedPayload("course list")),
            Reply::Error { reason } => Err(ClientError::Server(reason)),
        }
    }

    /// `INSCRIRE` — submit `form` and return the confirmation message.
    pub async fn register(&self, form: &RegistrationForm) -> Result<String, ClientError> {
        let command = Command::register().to_string();
        match self.exchange(&command, Some(form)).await? {
            Reply::Ok {
                payload: Payload::Message(message),
            } => Ok(message),
            // An empty catalog list would decode as `Courses(vec![])`.
            Reply::Ok { .. } => Err(ClientError::UnexpectedPayload("confirmation message")),
            Reply::Error { reason } => Err(ClientError::Server(reason)),
        }
    }
}

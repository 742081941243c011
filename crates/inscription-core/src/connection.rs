//! One accepted connection, served for exactly one request.
//!
//! `Idle → AwaitingCommand → Dispatching → Closed`. Nothing survives a
//! connection; a client sends its next command on a new one.

use tracing::{debug, trace};

use crate::command::Command;
use crate::dispatch::HandlerRegistry;
use crate::wire::{Deadlines, ObjectStream, Reply, Transport, WireError};

/// Where a connection is in its single request/response exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Accepted, stream headers not yet exchanged.
    Idle,
    /// Headers exchanged, waiting for the command object.
    AwaitingCommand,
    /// Command parsed, handler running.
    Dispatching,
    /// Stream closed.
    Closed,
}

/// A client connection and its object stream.
pub struct Connection {
    stream: ObjectStream,
    peer: String,
    state: ConnectionState,
}

impl Connection {
    /// Exchange stream headers with the peer.
    pub async fn open<T: Transport + 'static>(
        io: T,
        peer: impl Into<String>,
        deadlines: Deadlines,
    ) -> Result<Self, WireError> {
        let peer = peer.into();
        trace!(%peer, state = ?ConnectionState::Idle, "opening object stream");
        let stream = ObjectStream::open(io, deadlines).await?;
        let mut conn = Self {
            stream,
            peer,
            state: ConnectionState::Idle,
        };
        conn.transition(ConnectionState::AwaitingCommand);
        Ok(conn)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Read one command, dispatch it, write its reply, and close.
    ///
    /// The stream is closed whether or not the exchange succeeded. The reply
    /// that was sent is returned.
    pub async fn serve(mut self, registry: &HandlerRegistry) -> Result<Reply, WireError> {
        let outcome = self.exchange(registry).await;
        self.transition(ConnectionState::Closed);
        let closed = self.stream.close().await;
        let reply = outcome?;
        closed?;
        Ok(reply)
    }

    async fn exchange(&mut self, registry: &HandlerRegistry) -> Result<Reply, WireError> {
        let reply = match self.stream.read_object::<String>().await {
            Ok(line) => {
                let command = Command::parse(&line);
                debug!(peer = %self.peer, %command, "command received");
                self.transition(ConnectionState::Dispatching);
                registry.dispatch(&command, &mut self.stream).await
            }
            Err(WireError::Json(e)) => {
                debug!(peer = %self.peer, error = %e, "command object is not a string");
                Reply::error("malformed command")
            }
            Err(e) => return Err(e),
        };
        self.stream.write_object(&reply).await?;
        Ok(reply)
    }

    fn transition(&mut self, next: ConnectionState) {
        trace!(peer = %self.peer, from = ?self.state, to = ?next, "connection state");
        self.state = next;
    }
}

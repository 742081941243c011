//! Verb → handler registry.
//!
//! Handlers are registered once at startup. Adding a command means
//! registering one more [`Handler`]; [`HandlerRegistry::dispatch`] never
//! changes.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::BoxFuture;
use crate::catalog::CatalogError;
use crate::command::Command;
use crate::registrations::RegistrationError;
use crate::wire::{ObjectStream, Reply, WireError};

/// A command handler.
pub trait Handler: Send + Sync {
    /// The verb this handler answers to.
    fn verb(&self) -> &str;

    /// A short description of what the command does.
    fn description(&self) -> &str;

    /// Run the command.
    ///
    /// The handler may read further objects from `stream`; it must not write
    /// to it. The returned reply is the one object sent back to the client.
    fn handle<'a>(
        &'a self,
        argument: &'a str,
        stream: &'a mut ObjectStream,
    ) -> BoxFuture<'a, Result<Reply, HandlerError>>;
}

/// Errors a handler can fail with. Each one is turned into an error reply.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error("failed to read request: {0}")]
    Wire(#[from] WireError),

    #[error("invalid registration form: {}", .0.join("; "))]
    InvalidForm(Vec<String>),

    #[error("course {code} is not offered in session {session}")]
    UnknownCourse { code: String, session: String },
}

/// Registry of command handlers keyed by verb.
pub struct HandlerRegistry {
    handlers: HashMap<String, Box<dyn Handler>>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler, replacing any handler already bound to its verb.
    pub fn register(&mut self, handler: Box<dyn Handler>) {
        let verb = handler.verb().to_string();
        if self.handlers.insert(verb.clone(), handler).is_some() {
            warn!(verb = %verb, "replaced existing command handler");
        }
    }

    /// Look up a handler by verb.
    pub fn get(&self, verb: &str) -> Option<&dyn Handler> {
        self.handlers.get(verb).map(|h| h.as_ref())
    }

    /// All registered verbs, sorted.
    pub fn verbs(&self) -> Vec<&str> {
        let mut verbs: Vec<&str> = self.handlers.keys().map(|s| s.as_str()).collect();
        verbs.sort_unstable();
        verbs
    }

    /// Run the handler for `command` and produce the reply to send.
    ///
    /// Unknown verbs and handler failures become [`Reply::Error`]; this never
    /// leaves a request without a reply.
    pub async fn dispatch(&self, command: &Command, stream: &mut ObjectStream) -> Reply {
        let Some(handler) = self.get(&command.verb) else {
            warn!(verb = %command.verb, "unknown command");
            return Reply::error(format!("unknown command: {}", command.verb));
        };

        debug!(verb = %command.verb, argument = %command.argument, "dispatching");
        match handler.handle(&command.argument, stream).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(verb = %command.verb, error = %e, "command failed");
                Reply::error(e.to_string())
            }
        }
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

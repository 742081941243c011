#![deny(unsafe_code)]

//! Inscription core runtime.
//!
//! A small TCP server that lists the courses offered in a session (`CHARGER`)
//! and records student registrations (`INSCRIRE`). Connections are served one
//! at a time; each carries exactly one command and one reply.

use std::future::Future;
use std::pin::Pin;

/// A type-erased, `Send`-safe, boxed future, returned by [`dispatch::Handler`]
/// so handlers can live behind `Box<dyn Handler>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Course catalog reader.
pub mod catalog;
/// Typed client for a running server.
pub mod client;
/// Command-line parsing (`VERB argument...`).
pub mod command;
/// Per-connection request/reply session.
pub mod connection;
/// Verb → handler registry.
pub mod dispatch;
/// Built-in `CHARGER` and `INSCRIRE` handlers.
pub mod handlers;
/// Sessions, courses, and registration forms.
pub mod model;
/// Append-only registration log.
pub mod registrations;
/// Sequential TCP listener loop.
pub mod server;
/// Stream header, object framing, and reply envelope.
pub mod wire;

pub use catalog::{CatalogError, CatalogStore};
pub use client::{Client, ClientError};
pub use command::Command;
pub use connection::{Connection, ConnectionState};
pub use dispatch::{Handler, HandlerError, HandlerRegistry};
pub use model::{Course, RegistrationForm, Session, UnknownSession};
pub use registrations::{RegistrationError, RegistrationLog};
pub use server::{Server, ServerError, ShutdownSignal};
pub use wire::{Deadlines, ObjectStream, Payload, Reply, WireError};

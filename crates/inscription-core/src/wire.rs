//! Wire format: stream header, object framing, and the reply envelope.
//!
//! ```text
//! client                                   server
//!   │── header: "INSC" + u16 version ──────▶│   both sides write and flush
//!   │◀────── header: "INSC" + u16 version ──│   their header before reading
//!   │── [u32 len]["CHARGER Automne"] ──────▶│
//!   │◀── [u32 len]{"status":"ok",...} ──────│
//!   │                 close                 │
//! ```
//!
//! Every object is a JSON document prefixed by its big-endian `u32` length.
//! A request is a JSON string holding the command line, optionally followed by
//! further objects the handler asks for. Each request receives exactly one
//! [`Reply`].

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::model::Course;

/// First four bytes each peer writes on a fresh connection.
pub const STREAM_MAGIC: [u8; 4] = *b"INSC";

/// Protocol version carried in the stream header.
pub const PROTOCOL_VERSION: u16 = 1;

/// Largest object either side will accept.
pub const MAX_OBJECT_LEN: usize = 1024 * 1024;

const HEADER_LEN: usize = STREAM_MAGIC.len() + 2;

/// Any byte stream an [`ObjectStream`] can run over (TCP, in-memory duplex).
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Transport for T {}

/// Errors from the object stream.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("connection closed by peer")]
    Closed,

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("peer did not send an inscription stream header")]
    BadHeader,

    #[error("unsupported protocol version {0} (expected {PROTOCOL_VERSION})")]
    UnsupportedVersion(u16),

    #[error("malformed object: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-operation deadlines. `None` waits forever.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deadlines {
    pub read: Option<Duration>,
    pub write: Option<Duration>,
}

impl Deadlines {
    pub fn new(read: Option<Duration>, write: Option<Duration>) -> Self {
        Self { read, write }
    }
}

/// The single reply written for every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Reply {
    Ok { payload: Payload },
    Error { reason: String },
}

/// Successful reply contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Courses(Vec<Course>),
    Message(String),
}

impl Reply {
    pub fn courses(courses: Vec<Course>) -> Self {
        Reply::Ok {
            payload: Payload::Courses(courses),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Reply::Ok {
            payload: Payload::Message(message.into()),
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Reply::Error {
            reason: reason.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Ok { .. })
    }
}

/// A bidirectional stream of length-prefixed JSON objects.
pub struct ObjectStream {
    framed: Framed<Box<dyn Transport>, LengthDelimitedCodec>,
    deadlines: Deadlines,
}

impl ObjectStream {
    /// Exchange stream headers over `io`.
    ///
    /// The local header is written and flushed before the peer's header is
    /// read. Both ends follow that order, so opening never deadlocks.
    pub async fn open<T: Transport + 'static>(io: T, deadlines: Deadlines) -> Result<Self, WireError> {
        let mut io: Box<dyn Transport> = Box::new(io);

        let mut header = [0u8; HEADER_LEN];
        header[..STREAM_MAGIC.len()].copy_from_slice(&STREAM_MAGIC);
        header[STREAM_MAGIC.len()..].copy_from_slice(&PROTOCOL_VERSION.to_be_bytes());
        with_deadline(deadlines.write, async {
            io.write_all(&header).await?;
            io.flush().await?;
            Ok(())
        })
        .await?;

        let mut peer = [0u8; HEADER_LEN];
        with_deadline(deadlines.read, async {
            io.read_exact(&mut peer).await.map_err(eof_as_closed)?;
            Ok(())
        })
        .await?;
        if peer[..STREAM_MAGIC.len()] != STREAM_MAGIC {
            return Err(WireError::BadHeader);
        }
        let version = u16::from_be_bytes([peer[4], peer[5]]);
        if version != PROTOCOL_VERSION {
            return Err(WireError::UnsupportedVersion(version));
        }

        let codec = LengthDelimitedCodec::builder()
            .length_field_length(4)
            .max_frame_length(MAX_OBJECT_LEN)
            .new_codec();
        Ok(Self {
            framed: Framed::new(io, codec),
            deadlines,
        })
    }

    /// Read and decode the next object.
    pub async fn read_object<T: DeserializeOwned>(&mut self) -> Result<T, WireError> {
        let limit = self.deadlines.read;
        let framed = &mut self.framed;
        let frame = with_deadline(limit, async move {
            match framed.next().await {
                Some(frame) => Ok(frame.map_err(eof_as_closed)?),
                None => Err(WireError::Closed),
            }
        })
        .await?;
        Ok(serde_json::from_slice(&frame)?)
    }

    /// Encode and send one object, flushing it to the peer.
    pub async fn write_object<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), WireError> {
        let body = Bytes::from(serde_json::to_vec(value)?);
        let limit = self.deadlines.write;
        let framed = &mut self.framed;
        with_deadline(limit, async move { Ok(framed.send(body).await?) }).await
    }

    /// Flush, shut down the write half, then drop the read half and transport.
    pub async fn close(mut self) -> Result<(), WireError> {
        let limit = self.deadlines.write;
        let framed = &mut self.framed;
        with_deadline(limit, async move { Ok(SinkExt::<Bytes>::close(framed).await?) }).await
    }
}

fn eof_as_closed(e: std::io::Error) -> WireError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        WireError::Closed
    } else {
        WireError::Io(e)
    }
}

async fn with_deadline<T, F>(limit: Option<Duration>, fut: F) -> Result<T, WireError>
where
    F: Future<Output = Result<T, WireError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| WireError::Timeout(limit))?,
        None => fut.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Session;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    async fn pair() -> (ObjectStream, ObjectStream) {
        let (a, b) = tokio::io::duplex(64 * 1024);
        let (a, b) = tokio::join!(
            ObjectStream::open(a, Deadlines::default()),
            ObjectStream::open(b, Deadlines::default())
        );
        (a.unwrap(), b.unwrap())
    }

    #[test]
    fn test_reply_json_shape() {
        assert_eq!(
            serde_json::to_value(Reply::error("unknown command: X")).unwrap(),
            json!({"status": "error", "reason": "unknown command: X"})
        );
        assert_eq!(
            serde_json::to_value(Reply::message("ok")).unwrap(),
            json!({"status": "ok", "payload": "ok"})
        );
        assert_eq!(
            serde_json::to_value(Reply::courses(vec![Course::new(
                "Programmation 2",
                "INF1010",
                Session::Automne
            )]))
            .unwrap(),
            json!({"status": "ok", "payload": [
                {"name": "Programmation 2", "code": "INF1010", "session": "Automne"}
            ]})
        );
    }

    #[test]
    fn test_empty_course_list_decodes_as_courses() {
        let reply: Reply = serde_json::from_str(r#"{"status":"ok","payload":[]}"#).unwrap();
        assert_eq!(reply, Reply::courses(Vec::new()));
    }

    #[tokio::test]
    async fn test_objects_cross_the_stream() {
        let (mut client, mut server) = pair().await;

        client.write_object("CHARGER Hiver").await.unwrap();
        let line: String = server.read_object().await.unwrap();
        assert_eq!(line, "CHARGER Hiver");

        server.write_object(&Reply::courses(Vec::new())).await.unwrap();
        let reply: Reply = client.read_object().await.unwrap();
        assert!(reply.is_ok());
    }

    #[tokio::test]
    async fn test_close_is_seen_as_closed() {
        let (client, mut server) = pair().await;
        client.close().await.unwrap();
        let result = server.read_object::<String>().await;
        assert!(matches!(result, Err(WireError::Closed)));
    }

    #[tokio::test]
    async fn test_wrong_type_is_a_json_error() {
        let (mut client, mut server) = pair().await;
        client.write_object(&json!({"verb": "CHARGER"})).await.unwrap();
        let result = server.read_object::<String>().await;
        assert!(matches!(result, Err(WireError::Json(_))));
    }

    #[tokio::test]
    async fn test_rejects_foreign_header() {
        let (mut raw, b) = tokio::io::duplex(1024);
        raw.write_all(b"GET / HTTP/1.1\r\n").await.unwrap();
        let result = ObjectStream::open(b, Deadlines::default()).await;
        assert!(matches!(result, Err(WireError::BadHeader)));
    }

    #[tokio::test]
    async fn test_rejects_other_version() {
        let (mut raw, b) = tokio::io::duplex(1024);
        raw.write_all(b"INSC\x00\x02").await.unwrap();
        let result = ObjectStream::open(b, Deadlines::default()).await;
        assert!(matches!(result, Err(WireError::UnsupportedVersion(2))));
    }

    #[tokio::test]
    async fn test_silent_peer_times_out() {
        let (_raw, b) = tokio::io::duplex(1024);
        let deadlines = Deadlines::new(Some(Duration::from_millis(50)), None);
        let result = ObjectStream::open(b, deadlines).await;
        assert!(matches!(result, Err(WireError::Timeout(_))));
    }
}

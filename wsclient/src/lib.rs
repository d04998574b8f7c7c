//! Request/response test client over a single WebSocket connection.
//!
//! `ConnectionClient` owns at most one live session. Scenarios drive it
//! sequentially: connect, send a record, receive a record under a deadline,
//! close. Nothing here retries or reconnects; every failure goes straight
//! back to the caller.
//!
//! STATES
//! ======
//! - Disconnected: initial state, and the state after `close`.
//! - Connected: after a successful `connect`.
//!
//! Transport errors during send/receive do not change state. The caller
//! decides whether to `close` and `connect` again.

use std::io;
use std::time::Duration;

use frames::{CodecError, Encoding, Frame, Record};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info};

/// Receive deadline used when the caller does not pass one.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(5);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The transport session could not be established.
    #[error("websocket connect to {address} failed: {source}")]
    Connection {
        address: String,
        source: Box<tungstenite::Error>,
    },
    /// `send` or `receive` was called without an open session.
    #[error("websocket is not connected")]
    NotConnected,
    /// `connect` was called while a session is already open.
    #[error("websocket is already connected to {0}")]
    AlreadyConnected(String),
    /// Reading or writing on an established session failed, including the
    /// peer closing the connection.
    #[error("websocket transport failed: {0}")]
    Transport(Box<tungstenite::Error>),
    /// No data frame arrived before the deadline.
    #[error("no message received within {0:?}")]
    Timeout(Duration),
    /// A data frame arrived but is not a well-formed record.
    #[error("received frame is not a valid record: {0}")]
    Parse(#[from] CodecError),
    /// An outbound record cannot be carried in the configured encoding.
    #[error("record cannot be encoded: {0}")]
    Encode(CodecError),
}

impl ClientError {
    fn transport(err: tungstenite::Error) -> Self {
        Self::Transport(Box::new(err))
    }

    fn closed() -> Self {
        Self::transport(tungstenite::Error::ConnectionClosed)
    }
}

fn handshake_timed_out(limit: Duration) -> tungstenite::Error {
    tungstenite::Error::Io(io::Error::new(
        io::ErrorKind::TimedOut,
        format!("handshake did not complete within {limit:?}"),
    ))
}

/// An open transport session and the address it was opened against.
struct Session {
    address: String,
    stream: WsStream,
}

/// Test client owning one logical WebSocket connection.
pub struct ConnectionClient {
    session: Option<Session>,
    encoding: Encoding,
    receive_timeout: Duration,
}

impl Default for ConnectionClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionClient {
    /// Create a disconnected client that sends JSON text frames.
    #[must_use]
    pub fn new() -> Self {
        Self {
            session: None,
            encoding: Encoding::Json,
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
        }
    }

    /// Set the encoding used for outbound records.
    #[must_use]
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the deadline used by [`ConnectionClient::receive_default`].
    #[must_use]
    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = timeout;
        self
    }

    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    #[must_use]
    pub fn receive_timeout(&self) -> Duration {
        self.receive_timeout
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Address of the open session, if any.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.address.as_str())
    }

    /// Open a session to `address` (`ws://` or `wss://`).
    ///
    /// A client holds one session at a time. Calling this while connected is
    /// rejected and leaves the existing session untouched. The TCP connect and
    /// handshake together are bounded by the client's receive timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::AlreadyConnected`] when a session is open, or
    /// [`ClientError::Connection`] when the address is malformed, nothing is
    /// listening, the handshake fails, or the handshake does not finish in
    /// time. The client stays disconnected on failure.
    pub async fn connect(&mut self, address: &str) -> Result<(), ClientError> {
        if let Some(session) = &self.session {
            return Err(ClientError::AlreadyConnected(session.address.clone()));
        }

        let handshake = tokio::time::timeout(self.receive_timeout, connect_async(address))
            .await
            .unwrap_or_else(|_| Err(handshake_timed_out(self.receive_timeout)));
        let (stream, _) = handshake.map_err(|e| ClientError::Connection {
            address: address.to_owned(),
            source: Box::new(e),
        })?;

        info!(%address, "ws: connected");
        self.session = Some(Session {
            address: address.to_owned(),
            stream,
        });
        Ok(())
    }

    /// Encode `record` as one frame and write it.
    ///
    /// Delivery means the frame reached the transport, not that the peer
    /// acknowledged it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotConnected`] without a session,
    /// [`ClientError::Encode`] if the record does not fit the encoding (nothing
    /// is written), or [`ClientError::Transport`] if the write fails.
    pub async fn send(&mut self, record: &Record) -> Result<(), ClientError> {
        let session = self.session.as_mut().ok_or(ClientError::NotConnected)?;

        let frame = frames::encode_record(record, self.encoding).map_err(ClientError::Encode)?;
        let message = match frame {
            Frame::Text(text) => Message::Text(text.into()),
            Frame::Binary(bytes) => Message::Binary(bytes.into()),
        };
        session
            .stream
            .send(message)
            .await
            .map_err(ClientError::transport)?;

        debug!(address = %session.address, encoding = %self.encoding, "ws: sent record");
        Ok(())
    }

    /// Wait for the next data frame and decode it.
    ///
    /// Ping and pong control frames are skipped. The deadline covers the
    /// whole wait; expiry leaves the session open.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotConnected`] immediately without a session,
    /// [`ClientError::Timeout`] when nothing arrives before `timeout`,
    /// [`ClientError::Parse`] for a malformed frame, or
    /// [`ClientError::Transport`] on read failure or peer close.
    pub async fn receive(&mut self, timeout: Duration) -> Result<Record, ClientError> {
        let session = self.session.as_mut().ok_or(ClientError::NotConnected)?;
        let stream = &mut session.stream;

        let next = async {
            loop {
                let Some(msg) = stream.next().await else {
                    return Err(ClientError::closed());
                };
                match msg.map_err(ClientError::transport)? {
                    Message::Text(text) => return frames::decode_text(text.as_str()).map_err(ClientError::from),
                    Message::Binary(bytes) => return frames::decode_binary(&bytes).map_err(ClientError::from),
                    Message::Close(_) => return Err(ClientError::closed()),
                    _ => {}
                }
            }
        };

        let record = tokio::time::timeout(timeout, next)
            .await
            .map_err(|_| ClientError::Timeout(timeout))??;

        debug!(address = %session.address, keys = record.len(), "ws: received record");
        Ok(record)
    }

    /// [`ConnectionClient::receive`] with the client's configured deadline.
    ///
    /// # Errors
    ///
    /// Same as [`ConnectionClient::receive`].
    pub async fn receive_default(&mut self) -> Result<Record, ClientError> {
        self.receive(self.receive_timeout).await
    }

    /// Send `record` and wait for the next record in reply.
    ///
    /// Correlation is left to the peer: the next data frame is taken as the
    /// response.
    ///
    /// # Errors
    ///
    /// Any error from [`ConnectionClient::send`] or
    /// [`ConnectionClient::receive`].
    pub async fn request(&mut self, record: &Record, timeout: Duration) -> Result<Record, ClientError> {
        self.send(record).await?;
        self.receive(timeout).await
    }

    /// Release the session if one is open.
    ///
    /// Always succeeds. A failed close handshake is logged and the session is
    /// dropped regardless.
    pub async fn close(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        if let Err(e) = session.stream.close(None).await {
            debug!(address = %session.address, error = %e, "ws: close handshake failed");
        }
        info!(address = %session.address, "ws: closed");
    }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;

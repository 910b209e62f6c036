//! Outbound transmission.
//!
//! The downstream transmitter is a WebSocket server. It takes each message
//! as an ASCII `'0'`/`'1'` bit string, one text message per write, over a
//! single long-lived connection.

use crate::reassemble::LogicalMessage;
use async_trait::async_trait;
use futures::SinkExt;
use std::num::NonZeroU32;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Error talking to the downstream transmitter
#[derive(Debug, thiserror::Error)]
pub enum TransmitError {
    /// The connection could not be opened
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        /// Endpoint dialled
        endpoint: String,
        /// Underlying failure
        #[source]
        source: Box<tungstenite::Error>,
    },

    /// A frame could not be written
    #[error("failed to send frame: {0}")]
    Send(#[source] Box<tungstenite::Error>),

    /// The connection is no longer usable
    #[error("connection closed")]
    Closed,
}

impl From<tungstenite::Error> for TransmitError {
    fn from(err: tungstenite::Error) -> Self {
        Self::Send(Box::new(err))
    }
}

/// A persistent outbound connection
#[async_trait]
pub trait Transmitter: Send {
    /// Write one text frame
    async fn transmit(&mut self, frame: &str) -> Result<(), TransmitError>;

    /// Flush and release the connection
    async fn close(&mut self) -> Result<(), TransmitError>;
}

/// WebSocket client sending one text message per frame
pub struct WsTransmitter {
    endpoint: String,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsTransmitter {
    /// Connect to `endpoint`, a `ws://` URL
    ///
    /// # Errors
    ///
    /// Returns error if the connection or the opening handshake fails
    pub async fn connect(endpoint: &str) -> Result<Self, TransmitError> {
        let (stream, _response) = tokio_tungstenite::connect_async(endpoint)
            .await
            .map_err(|source| TransmitError::Connect {
                endpoint: endpoint.to_string(),
                source: Box::new(source),
            })?;
        tracing::info!(endpoint, "connected to transmitter");
        Ok(Self {
            endpoint: endpoint.to_string(),
            stream,
        })
    }

    /// Endpoint this transmitter is connected to
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transmitter for WsTransmitter {
    async fn transmit(&mut self, frame: &str) -> Result<(), TransmitError> {
        self.stream.send(Message::text(frame.to_string())).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransmitError> {
        match self.stream.close(None).await {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed) => {}
            Err(err) => return Err(err.into()),
        }
        tracing::debug!(endpoint = %self.endpoint, "transmitter connection closed");
        Ok(())
    }
}

/// Encodes messages and writes each one a fixed number of times
pub struct Dispatcher<T> {
    transmitter: T,
    transmit_count: NonZeroU32,
    frames_sent: u64,
}

impl<T: Transmitter> Dispatcher<T> {
    /// Wrap a transmitter
    #[must_use]
    pub fn new(transmitter: T, transmit_count: NonZeroU32) -> Self {
        Self {
            transmitter,
            transmit_count,
            frames_sent: 0,
        }
    }

    /// Bit-string encoding of a message's payload
    #[must_use]
    pub fn encode(message: &LogicalMessage) -> String {
        message.payload().to_bit_string()
    }

    /// Transmit one message `transmit_count` times, in order
    ///
    /// # Errors
    ///
    /// Returns the first transmission failure; nothing is retried
    pub async fn dispatch(&mut self, message: &LogicalMessage) -> Result<(), TransmitError> {
        let encoded = Self::encode(message);
        for attempt in 0..self.transmit_count.get() {
            tracing::debug!(attempt, bits = encoded.len(), frame = %encoded, "transmission attempt");
            self.transmitter.transmit(&encoded).await?;
            self.frames_sent += 1;
        }
        Ok(())
    }

    /// Release the underlying connection
    ///
    /// # Errors
    ///
    /// Returns error if the final flush fails
    pub async fn close(&mut self) -> Result<(), TransmitError> {
        self.transmitter.close().await
    }

    /// Frames written so far
    #[must_use]
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Writes per message
    #[must_use]
    pub fn transmit_count(&self) -> NonZeroU32 {
        self.transmit_count
    }

    /// Borrow the transmitter
    #[must_use]
    pub fn transmitter(&self) -> &T {
        &self.transmitter
    }
}

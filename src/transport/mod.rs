//! Transport contracts consumed by the MCP runtime
//!
//! A [`Transport`] produces a [`Connection`]; the runtime reads messages from the
//! connection until end of stream and writes its replies back to it.

use async_trait::async_trait;
use thiserror::Error;

use crate::protocol::{CodecError, Message};

pub mod stateless;

pub use stateless::{ConnectionState, ReplySlot, StatelessConnection, StatelessTransport};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("response already sent for this exchange")]
    ResponseAlreadySent,
    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[async_trait]
pub trait Connection: Send {
    /// Returns `Ok(None)` once the peer has nothing more to send.
    async fn read(&mut self) -> Result<Option<Message>, TransportError>;

    async fn write(&mut self, message: &Message) -> Result<(), TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;

    fn session_id(&self) -> Option<&str>;
}

#[async_trait]
pub trait Transport: Send {
    type Connection: Connection;

    async fn connect(self) -> Result<Self::Connection, TransportError>;
}

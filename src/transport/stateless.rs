//! Single-use transport for one HTTP request/response cycle
//!
//! The connection hands out exactly one inbound message and accepts exactly one reply,
//! which is parked in a [`ReplySlot`] shared with the HTTP handler. There is no session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::{Connection, Transport, TransportError};
use crate::protocol::{codec, Message};

#[derive(Default)]
struct Reply {
    written: bool,
    response: Option<Response>,
}

/// Shared between the HTTP handler, the transport and the connection it creates.
#[derive(Clone, Default)]
pub struct ReplySlot {
    inner: Arc<Mutex<Reply>>,
}

impl ReplySlot {
    pub fn response_written(&self) -> bool {
        self.lock().written
    }

    /// Takes the parked HTTP response. The slot stays marked as written.
    pub fn take(&self) -> Option<Response> {
        self.lock().response.take()
    }

    fn put(&self, response: Response) -> Result<(), TransportError> {
        let mut reply = self.lock();
        if reply.written {
            return Err(TransportError::ResponseAlreadySent);
        }

        reply.written = true;
        reply.response = Some(response);
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Reply> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct StatelessTransport {
    message: Message,
    reply: ReplySlot,
}

impl StatelessTransport {
    pub fn new(message: Message, reply: ReplySlot) -> Self {
        Self { message, reply }
    }

    pub fn response_written(&self) -> bool {
        self.reply.response_written()
    }
}

#[async_trait]
impl Transport for StatelessTransport {
    type Connection = StatelessConnection;

    async fn connect(self) -> Result<StatelessConnection, TransportError> {
        let mut connection = StatelessConnection::new(self.reply);
        connection.seed(self.message);
        Ok(connection)
    }
}

/// `Created -> MessageAvailable -> MessageConsumed -> ResponseSent -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Created,
    MessageAvailable,
    MessageConsumed,
    ResponseSent,
    Closed,
}

pub struct StatelessConnection {
    message: Option<Message>,
    reply: ReplySlot,
    state: ConnectionState,
    response_written: bool,
}

impl StatelessConnection {
    fn new(reply: ReplySlot) -> Self {
        Self {
            message: None,
            reply,
            state: ConnectionState::Created,
            response_written: false,
        }
    }

    fn seed(&mut self, message: Message) {
        self.message = Some(message);
        self.state = ConnectionState::MessageAvailable;
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }
}

#[async_trait]
impl Connection for StatelessConnection {
    async fn read(&mut self) -> Result<Option<Message>, TransportError> {
        let message = self.message.take();
        if message.is_some() {
            self.state = ConnectionState::MessageConsumed;
        }
        Ok(message)
    }

    async fn write(&mut self, message: &Message) -> Result<(), TransportError> {
        if self.response_written {
            return Err(TransportError::ResponseAlreadySent);
        }

        let body = codec::encode(message)?;
        let response = (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response();

        self.reply.put(response)?;
        self.response_written = true;
        if self.state != ConnectionState::Closed {
            self.state = ConnectionState::ResponseSent;
        }
        debug!(kind = message.kind(), "stateless reply written");
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.state = ConnectionState::Closed;
        Ok(())
    }

    fn session_id(&self) -> Option<&str> {
        None
    }
}

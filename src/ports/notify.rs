use std::{fmt, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{OwnerId, TenantId};

use super::events::Callback;

/// Where an outbound message goes: the conversation an event came from, or a
/// user directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecipientId {
    Conversation(TenantId),
    User(OwnerId),
}

impl From<TenantId> for RecipientId {
    fn from(tenant: TenantId) -> Self {
        RecipientId::Conversation(tenant)
    }
}

impl From<OwnerId> for RecipientId {
    fn from(owner: OwnerId) -> Self {
        RecipientId::User(owner)
    }
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipientId::Conversation(tenant) => write!(f, "conversation:{}", tenant),
            RecipientId::User(owner) => write!(f, "user:{}", owner),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub label: String,
    pub callback: Callback,
}

impl Button {
    pub fn new(label: impl Into<String>, callback: Callback) -> Self {
        Self {
            label: label.into(),
            callback,
        }
    }
}

/// Rows of buttons, rendered top to bottom.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ButtonLayout {
    pub rows: Vec<Vec<Button>>,
}

impl ButtonLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, row: Vec<Button>) -> Self {
        if !row.is_empty() {
            self.rows.push(row);
        }
        self
    }

    pub fn single(self, button: Button) -> Self {
        self.row(vec![button])
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub text: String,
    pub layout: Option<ButtonLayout>,
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            layout: None,
        }
    }

    pub fn with_layout(mut self, layout: ButtonLayout) -> Self {
        self.layout = (!layout.is_empty()).then_some(layout);
        self
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The recipient blocked the bot or never started a conversation.
    #[error("recipient {0} is unreachable")]
    Unreachable(RecipientId),
    #[error("delivery timed out after {0} s")]
    Timeout(u64),
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Outbound side of the chat platform.
#[async_trait]
pub trait NotificationPort: Send + Sync {
    async fn send(&self, recipient: RecipientId, message: OutboundMessage)
        -> Result<(), DeliveryError>;

    /// Ships a generated file. Transports without file support drop it.
    async fn send_document(
        &self,
        recipient: RecipientId,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), DeliveryError> {
        tracing::debug!(%recipient, file_name, size = bytes.len(), "document dropped");
        Ok(())
    }
}

/// Sends through `port`, turning an elapsed `limit` into
/// [`DeliveryError::Timeout`].
pub async fn send_with_timeout(
    port: &dyn NotificationPort,
    recipient: RecipientId,
    message: OutboundMessage,
    limit: Duration,
) -> Result<(), DeliveryError> {
    match tokio::time::timeout(limit, port.send(recipient, message)).await {
        Ok(result) => result,
        Err(_) => Err(DeliveryError::Timeout(limit.as_secs())),
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::address::ResourceAddress;

/// A successful mutation at `address`. Consumers re-query; there is no delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub address: ResourceAddress,
}

/// WebSocket message types that can be handled by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Start receiving changes for an address
    Subscribe,
    /// Stop receiving changes for an address
    Unsubscribe,
    /// Acknowledges a subscribe or unsubscribe request
    Subscribed,
    Unsubscribed,
    /// Change notification pushed to the client
    Change,
    /// Request could not be handled
    Error,
    Ping,
    Pong,
}

/// WebSocket message structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessage<T> {
    /// Message type
    #[serde(rename = "type")]
    pub type_: MessageType,
    /// Message data
    pub data: T,
    /// Timestamp when the message was created
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Optional message ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
}

impl<T> WebSocketMessage<T> {
    pub fn new(type_: MessageType, data: T) -> Self {
        Self {
            type_,
            data,
            timestamp: Utc::now(),
            id: Some(Uuid::new_v4()),
        }
    }
}

/// Payload of subscribe/unsubscribe requests and their acknowledgements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressData {
    pub address: String,
}

/// Payload of error replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorData {
    pub error: String,
}

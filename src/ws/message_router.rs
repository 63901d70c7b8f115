use async_trait::async_trait;
use serde_json::Value;

use crate::{
    error::{InventoryError, Result},
    models::{AddressData, MessageType, WebSocketMessage},
    services::inventory_service::SharedInventoryService,
    ws::connection::Connection,
};

/// Message router trait for handling websocket messages
#[async_trait]
pub trait MessageRouter: Send + Sync {
    async fn route_message(
        &self,
        connection: &Connection,
        message: WebSocketMessage<Value>,
    ) -> Result<()>;
}

/// Routes subscription requests to the inventory's notification hub
pub struct DefaultMessageRouter {
    service: SharedInventoryService,
}

impl DefaultMessageRouter {
    /// Create a new message router
    pub fn new(service: SharedInventoryService) -> Self {
        Self { service }
    }

    fn address_data(data: Value) -> Result<AddressData> {
        serde_json::from_value(data)
            .map_err(|e| InventoryError::BadRequest(format!("Invalid subscription request: {}", e)))
    }
}

#[async_trait]
impl MessageRouter for DefaultMessageRouter {
    async fn route_message(
        &self,
        connection: &Connection,
        message: WebSocketMessage<Value>,
    ) -> Result<()> {
        match message.type_ {
            MessageType::Subscribe => {
                let request = Self::address_data(message.data)?;
                connection.subscribe(&self.service, &request.address).await
            }
            MessageType::Unsubscribe => {
                let request = Self::address_data(message.data)?;
                connection.unsubscribe(&self.service, &request.address).await
            }
            MessageType::Ping => {
                connection
                    .send(WebSocketMessage::new(MessageType::Pong, Value::Null))
                    .await
            }
            other => {
                tracing::warn!("Unexpected message type from {}: {:?}", connection.id(), other);
                Err(InventoryError::BadRequest(format!(
                    "Unsupported message type: {:?}",
                    other
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::support::{dune, open_service};
    use axum::extract::ws::Message;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    async fn next_json(rx: &mut mpsc::Receiver<Message>) -> Value {
        let message = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        match message {
            Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
            other => panic!("Expected text message, got {:?}", other),
        }
    }

    fn request(type_: MessageType, address: &str) -> WebSocketMessage<Value> {
        WebSocketMessage::new(type_, serde_json::json!({ "address": address }))
    }

    #[tokio::test]
    async fn subscribed_connections_receive_changes() {
        let (_dir, service) = open_service().await;
        let router = DefaultMessageRouter::new(service.clone());
        let (tx, mut rx) = mpsc::channel(16);
        let connection = Connection::new(Uuid::new_v4(), tx);
        let collection = service.scheme().collection_address();

        router
            .route_message(&connection, request(MessageType::Subscribe, &collection))
            .await
            .unwrap();
        let ack = next_json(&mut rx).await;
        assert_eq!(ack["type"], "subscribed");
        assert_eq!(ack["data"]["address"], collection.as_str());

        service.insert(&collection, &dune()).await.unwrap();
        let change = next_json(&mut rx).await;
        assert_eq!(change["type"], "change");
        assert_eq!(change["data"]["address"], collection.as_str());

        router
            .route_message(&connection, request(MessageType::Unsubscribe, &collection))
            .await
            .unwrap();
        assert_eq!(next_json(&mut rx).await["type"], "unsubscribed");
        assert_eq!(service.hub().subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn bad_subscriptions_are_rejected() {
        let (_dir, service) = open_service().await;
        let router = DefaultMessageRouter::new(service.clone());
        let (tx, _rx) = mpsc::channel(16);
        let connection = Connection::new(Uuid::new_v4(), tx);

        let result = router
            .route_message(&connection, request(MessageType::Subscribe, "elsewhere/books"))
            .await;
        assert!(matches!(result, Err(InventoryError::UnsupportedAddress(_))));

        let result = router
            .route_message(
                &connection,
                WebSocketMessage::new(MessageType::Subscribe, serde_json::json!({})),
            )
            .await;
        assert!(matches!(result, Err(InventoryError::BadRequest(_))));

        let result = router
            .route_message(&connection, request(MessageType::Change, "x"))
            .await;
        assert!(matches!(result, Err(InventoryError::BadRequest(_))));
    }
}

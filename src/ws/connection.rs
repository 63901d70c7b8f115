use std::{collections::HashMap, sync::Arc};

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
};
use uuid::Uuid;

use crate::{
    error::{InventoryError, Result},
    models::{AddressData, ErrorData, MessageType, WebSocketMessage},
    services::inventory_service::SharedInventoryService,
    ws::MessageRouter,
};

struct ActiveSubscription {
    id: Uuid,
    forwarder: JoinHandle<()>,
}

/// One connected WebSocket client and the addresses it watches.
pub struct Connection {
    id: Uuid,
    sender: mpsc::Sender<Message>,
    subscriptions: Mutex<HashMap<String, ActiveSubscription>>,
}

impl Connection {
    pub fn new(id: Uuid, sender: mpsc::Sender<Message>) -> Self {
        Self {
            id,
            sender,
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Send a message to this connection
    pub async fn send(&self, message: impl Serialize) -> Result<()> {
        let message_json = serde_json::to_string(&message)?;
        self.sender
            .send(Message::Text(message_json.into()))
            .await
            .map_err(|e| {
                tracing::error!("Failed to send message to {}: {}", self.id, e);
                InventoryError::WebSocket(format!("Connection {} closed", self.id))
            })
    }

    pub async fn send_error(&self, error: &InventoryError) -> Result<()> {
        let message = WebSocketMessage::new(
            MessageType::Error,
            ErrorData {
                error: error.to_string(),
            },
        );
        self.send(message).await
    }

    /// Start forwarding changes at `address` to this connection.
    ///
    /// Subscribing twice to the same address keeps the first subscription.
    pub async fn subscribe(&self, service: &SharedInventoryService, address: &str) -> Result<()> {
        let mut subscriptions = self.subscriptions.lock().await;
        if !subscriptions.contains_key(address) {
            let mut subscription = service.subscribe(address).await?;
            let id = subscription.id();
            let scope = subscription.scope();
            let sender = self.sender.clone();
            let scheme = service.scheme().clone();

            let forwarder = tokio::spawn(async move {
                while let Some(event) = subscription.recv().await {
                    let message = WebSocketMessage::new(
                        MessageType::Change,
                        AddressData {
                            address: scheme.address_of(&event.address),
                        },
                    );
                    let Ok(message_json) = serde_json::to_string(&message) else {
                        continue;
                    };
                    if sender.send(Message::Text(message_json.into())).await.is_err() {
                        break;
                    }
                }
            });

            subscriptions.insert(address.to_string(), ActiveSubscription { id, forwarder });
            tracing::info!("Connection {} subscribed to {} ({:?})", self.id, address, scope);
        }
        drop(subscriptions);

        self.send(WebSocketMessage::new(
            MessageType::Subscribed,
            AddressData {
                address: address.to_string(),
            },
        ))
        .await
    }

    pub async fn unsubscribe(&self, service: &SharedInventoryService, address: &str) -> Result<()> {
        let removed = self.subscriptions.lock().await.remove(address);
        if let Some(subscription) = removed {
            service.hub().unsubscribe(&subscription.id).await;
            subscription.forwarder.abort();
            tracing::info!("Connection {} unsubscribed from {}", self.id, address);
        }

        self.send(WebSocketMessage::new(
            MessageType::Unsubscribed,
            AddressData {
                address: address.to_string(),
            },
        ))
        .await
    }

    /// Drop every subscription held by this connection.
    pub async fn close(&self, service: &SharedInventoryService) {
        let subscriptions: Vec<ActiveSubscription> =
            self.subscriptions.lock().await.drain().map(|(_, s)| s).collect();
        for subscription in subscriptions {
            service.hub().unsubscribe(&subscription.id).await;
            subscription.forwarder.abort();
        }
    }
}

/// Handle a WebSocket connection
pub async fn handle_socket(
    socket: WebSocket,
    service: SharedInventoryService,
    router: Arc<dyn MessageRouter>,
) {
    // Generate a connection ID
    let connection_id = Uuid::new_v4();
    tracing::info!("New websocket connection: {}", connection_id);

    // Split the socket into sender and receiver
    let (mut sender, mut receiver) = socket.split();

    // Create a channel for sending messages to this client
    let (tx, mut rx) = mpsc::channel::<Message>(100);
    let connection = Arc::new(Connection::new(connection_id, tx.clone()));

    // Task to forward messages from the channel to the WebSocket
    let forward_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = sender.send(message).await {
                tracing::error!("Error sending WebSocket message: {}", e);
                break;
            }
        }
    });

    // Task to handle incoming messages
    let receive_connection = connection.clone();
    let receive_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    tracing::debug!("Received message: {}", text.as_str());

                    match serde_json::from_str::<WebSocketMessage<Value>>(text.as_str()) {
                        Ok(message) => {
                            if let Err(e) = router.route_message(&receive_connection, message).await {
                                tracing::warn!("Error routing message: {}", e);
                                let _ = receive_connection.send_error(&e).await;
                            }
                        }
                        Err(e) => {
                            tracing::warn!("Error parsing message: {}", e);
                            let _ = receive_connection.send_error(&InventoryError::from(e)).await;
                        }
                    }
                }
                Ok(Message::Binary(_)) => {
                    tracing::debug!("Received binary message");
                }
                Ok(Message::Ping(data)) => {
                    // Automatically respond to pings
                    if let Err(e) = tx.send(Message::Pong(data)).await {
                        tracing::error!("Error sending pong: {}", e);
                    }
                }
                Ok(Message::Pong(_)) => {
                    tracing::debug!("Received pong");
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Client disconnected");
                    break;
                }
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            }
        }
    });

    join_first(forward_task, receive_task).await;

    connection.close(&service).await;
    tracing::info!("WebSocket connection closed: {}", connection_id);
}

/// Wait for either task to finish and abort the other.
async fn join_first(mut forward: JoinHandle<()>, mut receive: JoinHandle<()>) {
    tokio::select! {
        _ = &mut forward => receive.abort(),
        _ = &mut receive => forward.abort(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn surviving_task_is_aborted() {
        let (alive_tx, alive_rx) = oneshot::channel::<()>();
        let finished = tokio::spawn(async {});
        let stuck = tokio::spawn(async move {
            let _alive = alive_tx;
            std::future::pending::<()>().await;
        });

        join_first(finished, stuck).await;

        // The sender is dropped only once the stuck task is gone
        assert!(alive_rx.await.is_err());
    }

    #[tokio::test]
    async fn send_on_closed_channel_is_a_socket_error() {
        let (tx, rx) = mpsc::channel(1);
        let connection = Connection::new(Uuid::new_v4(), tx);
        drop(rx);

        let result = connection
            .send(WebSocketMessage::new(MessageType::Pong, Value::Null))
            .await;
        assert!(matches!(result, Err(InventoryError::WebSocket(_))));
    }
}

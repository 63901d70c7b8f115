use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::models::address::ResourceAddress;
use crate::models::message::ChangeEvent;

struct Subscriber {
    scope: ResourceAddress,
    sender: mpsc::UnboundedSender<ChangeEvent>,
}

/// Publish/subscribe registry for change notifications, keyed by address scope.
///
/// Every subscriber owns an unbounded queue, so `publish` enqueues and returns
/// without waiting on any consumer. Events reach one subscriber in publish order.
#[derive(Default)]
pub struct NotificationHub {
    subscribers: RwLock<HashMap<Uuid, Subscriber>>,
}

/// Receiving end of a subscription.
pub struct Subscription {
    id: Uuid,
    scope: ResourceAddress,
    receiver: mpsc::UnboundedReceiver<ChangeEvent>,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn scope(&self) -> ResourceAddress {
        self.scope
    }

    /// Wait for the next change. `None` once the hub has dropped the subscription.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.receiver.recv().await
    }

    /// Next change if one is already queued.
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.receiver.try_recv().ok()
    }
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in `scope` and everything it covers.
    pub async fn subscribe(&self, scope: ResourceAddress) -> Subscription {
        let id = Uuid::new_v4();
        let (sender, receiver) = mpsc::unbounded_channel();

        let mut subscribers = self.subscribers.write().await;
        subscribers.insert(id, Subscriber { scope, sender });
        tracing::debug!("Registered subscriber {} for {}", id, scope);

        Subscription {
            id,
            scope,
            receiver,
        }
    }

    /// Register a callback run on its own task for every change in `scope`.
    pub async fn subscribe_with<F, Fut>(&self, scope: ResourceAddress, mut callback: F) -> Uuid
    where
        F: FnMut(ChangeEvent) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut subscription = self.subscribe(scope).await;
        let id = subscription.id();

        tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                callback(event).await;
            }
            tracing::debug!("Subscriber {} stopped", id);
        });

        id
    }

    pub async fn unsubscribe(&self, id: &Uuid) -> bool {
        let mut subscribers = self.subscribers.write().await;
        let removed = subscribers.remove(id).is_some();
        if removed {
            tracing::debug!("Unregistered subscriber {}", id);
        }
        removed
    }

    /// Queue a change event for every subscriber whose scope covers `address`.
    pub async fn publish(&self, address: ResourceAddress) {
        let event = ChangeEvent { address };
        let mut closed = Vec::new();

        {
            let subscribers = self.subscribers.read().await;
            for (id, subscriber) in subscribers.iter() {
                if !subscriber.scope.covers(&address) {
                    continue;
                }
                if subscriber.sender.send(event.clone()).is_err() {
                    closed.push(*id);
                }
            }
        }

        if !closed.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for id in closed {
                subscribers.remove(&id);
                tracing::debug!("Pruned closed subscriber {}", id);
            }
        }

        tracing::debug!("Published change for {}", address);
    }

    pub async fn subscriber_count(&self) -> usize {
        let subscribers = self.subscribers.read().await;
        subscribers.len()
    }
}

/// Shared handle to the notification hub
pub type SharedNotificationHub = Arc<NotificationHub>;

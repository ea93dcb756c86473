use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Domain events published by the service layer.
///
/// Delivery is fire-and-forget over an in-process channel; a failed send is
/// logged and never fails the operation that produced the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Checkout events
    TransactionCompleted {
        transaction_id: Uuid,
        receipt_number: String,
        total_amount: Decimal,
    },
    CheckoutFailed {
        user_id: Uuid,
        reason: String,
    },
    TransactionDeleted(Uuid),

    // Inventory events
    StockDecremented {
        product_id: Uuid,
        old_quantity: i32,
        new_quantity: i32,
    },
    StockRestored {
        product_id: Uuid,
        restored_quantity: i32,
    },
    StockAdjusted {
        product_id: Uuid,
        old_quantity: i32,
        new_quantity: i32,
    },

    // Catalog events
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeactivated(Uuid),
    CategoryCreated(Uuid),

    // Account events
    UserRegistered(Uuid),
    ProfileUpdated(Uuid),

    // Generic event for custom messages
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl Event {
    /// Create a generic event with string data
    pub fn with_data(data: String) -> Self {
        Event::Generic {
            message: data,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging (instead of propagating) a channel failure
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            error!("Event publication failed: {}", e);
        }
    }
}

/// Processes incoming events. Currently every event is logged; side effects
/// such as outbound webhooks would hang off this loop.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::TransactionCompleted {
                transaction_id,
                receipt_number,
                total_amount,
            } => {
                info!(
                    transaction_id = %transaction_id,
                    receipt_number = %receipt_number,
                    total_amount = %total_amount,
                    "Transaction completed"
                );
            }
            Event::CheckoutFailed { user_id, reason } => {
                warn!(user_id = %user_id, reason = %reason, "Checkout failed");
            }
            Event::StockDecremented {
                product_id,
                old_quantity,
                new_quantity,
            }
            | Event::StockAdjusted {
                product_id,
                old_quantity,
                new_quantity,
            } => {
                info!(
                    product_id = %product_id,
                    old_quantity,
                    new_quantity,
                    "Stock level changed"
                );
            }
            Event::StockRestored {
                product_id,
                restored_quantity,
            } => {
                info!(
                    product_id = %product_id,
                    restored_quantity,
                    "Stock restored after rollback"
                );
            }
            other => {
                info!("Received event: {:?}", other);
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_event() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        sender.send(Event::ProductCreated(Uuid::new_v4())).await.unwrap();

        assert!(matches!(rx.recv().await, Some(Event::ProductCreated(_))));
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        // Must not panic or error out
        sender.send_or_log(Event::with_data("orphan".into())).await;
    }
}

//! Domain events.
//!
//! Services publish an [`Event`] after their transaction has committed. The
//! events are consumed by [`process_events`], which only logs and counts them;
//! publishing never affects the outcome of the operation that triggered it.

use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    ProductCreated {
        product_id: i32,
        category_id: i32,
    },
    ProductUpdated {
        product_id: i32,
    },
    ProductDeleted {
        product_id: i32,
    },
    InventoryAdjusted {
        inventory_id: i32,
        product_id: i32,
        previous_quantity: i32,
        new_quantity: i32,
    },
    SaleRecorded {
        sale_id: i32,
        product_id: i32,
        quantity: i32,
        total_price: Decimal,
        platform: String,
        sale_date: DateTime<Utc>,
    },
    LowStockDetected {
        inventory_id: i32,
        product_id: i32,
        quantity: i32,
        low_stock_threshold: i32,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::ProductCreated { .. } => "product_created",
            Event::ProductUpdated { .. } => "product_updated",
            Event::ProductDeleted { .. } => "product_deleted",
            Event::InventoryAdjusted { .. } => "inventory_adjusted",
            Event::SaleRecorded { .. } => "sale_recorded",
            Event::LowStockDetected { .. } => "low_stock_detected",
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

    /// Creates a sender together with the receiving half of its channel
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the consumer is gone
    pub async fn send_or_log(&self, event: Event) {
        let name = event.name();
        if let Err(e) = self.send(event).await {
            counter!("ecommerce_admin.events.dropped", 1);
            warn!(event = name, error = %e, "Event could not be published");
        }
    }
}

/// Consumes events until every sender has been dropped
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        counter!("ecommerce_admin.events.processed", 1, "event" => event.name());

        match &event {
            Event::LowStockDetected {
                inventory_id,
                product_id,
                quantity,
                low_stock_threshold,
            } => {
                counter!("ecommerce_admin.inventory.low_stock_alerts", 1);
                warn!(
                    inventory_id,
                    product_id,
                    quantity,
                    low_stock_threshold,
                    "Stock fell to or below its low-stock threshold"
                );
            }
            Event::SaleRecorded {
                sale_id,
                product_id,
                quantity,
                platform,
                ..
            } => {
                info!(sale_id, product_id, quantity, platform = %platform, "Sale recorded");
            }
            other => debug!(event = ?other, "Received event"),
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (sender, mut rx) = EventSender::channel(4);
        sender
            .send(Event::ProductDeleted { product_id: 3 })
            .await
            .unwrap();

        assert_eq!(rx.recv().await, Some(Event::ProductDeleted { product_id: 3 }));
    }

    #[tokio::test]
    async fn send_or_log_tolerates_closed_channel() {
        let (sender, rx) = EventSender::channel(1);
        drop(rx);

        assert!(sender
            .send(Event::ProductUpdated { product_id: 1 })
            .await
            .is_err());
        // Must not panic or propagate
        sender
            .send_or_log(Event::ProductUpdated { product_id: 1 })
            .await;
    }

    #[tokio::test]
    async fn process_events_drains_until_senders_drop() {
        let (sender, rx) = EventSender::channel(8);
        let worker = tokio::spawn(process_events(rx));

        sender
            .send(Event::LowStockDetected {
                inventory_id: 1,
                product_id: 1,
                quantity: 2,
                low_stock_threshold: 5,
            })
            .await
            .unwrap();
        drop(sender);

        worker.await.unwrap();
    }
}

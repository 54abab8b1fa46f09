use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

/// Events emitted by the settlement pipeline for the purchase-finalization
/// workflow and other observers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// A settlement validated successfully.
    SettlementCompleted {
        customer_id: Uuid,
        purchase_total_minor: i64,
        coupon_total_minor: i64,
        card_total_minor: i64,
        change_amount_minor: i64,
    },
    /// A settlement failed validation; no state was touched.
    SettlementRejected {
        customer_id: Uuid,
        errors: Vec<String>,
    },
    /// A change coupon was minted to return overpayment.
    ChangeCouponIssued {
        coupon_id: Uuid,
        customer_id: Uuid,
        value_minor: i64,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, logging (not failing) when no receiver is listening.
    /// Settlement outcomes never depend on event delivery.
    pub async fn send(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            warn!("failed to send settlement event: {}", e);
        }
    }
}

/// Creates an event channel with the given buffer size.
pub fn channel(buffer: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender::new(tx), rx)
}

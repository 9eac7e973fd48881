//! In-process change feed for bookings.
//!
//! Every committed mutation publishes only the fields it touched. Subscribers
//! apply them with [`shallow_merge`], which keeps every field the event did not
//! carry.

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use utoipa::ToSchema;
use uuid::Uuid;

const FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookingChange {
    pub booking_id: Uuid,
    #[schema(value_type = Object)]
    pub changes: Map<String, Value>,
}

#[derive(Clone)]
pub struct BookingFeed {
    sender: broadcast::Sender<BookingChange>,
}

impl Default for BookingFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, booking_id: Uuid, changes: Map<String, Value>) {
        // Err only means nobody is listening right now.
        let receivers = self
            .sender
            .send(BookingChange {
                booking_id,
                changes,
            })
            .unwrap_or(0);
        tracing::debug!(%booking_id, receivers, "booking change published");
    }

    pub fn subscribe(&self, booking_id: Uuid) -> BookingSubscription {
        BookingSubscription {
            booking_id,
            receiver: self.sender.subscribe(),
        }
    }
}

pub struct BookingSubscription {
    booking_id: Uuid,
    receiver: broadcast::Receiver<BookingChange>,
}

impl BookingSubscription {
    /// Next change for the subscribed booking, or `None` once the feed is gone.
    pub async fn next(&mut self) -> Option<BookingChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if change.booking_id == self.booking_id => return Some(change),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(booking_id = %self.booking_id, skipped, "booking subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Overwrite the pushed keys in `target`, leaving all others untouched.
pub fn shallow_merge(target: &mut Map<String, Value>, changes: &Map<String, Value>) {
    for (key, value) in changes {
        target.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn status_change(status: &str) -> Map<String, Value> {
        let mut changes = Map::new();
        changes.insert("status".into(), json!(status));
        changes
    }

    #[test]
    fn merge_keeps_fields_missing_from_the_push() {
        let mut local = json!({
            "status": "requested",
            "pickup_address": "SFO Terminal 2",
            "driver": { "full_name": "James Anderson" }
        });
        let push = json!({ "status": "confirmed", "driver_id": "d2c94382" });

        if let (Value::Object(target), Value::Object(changes)) = (&mut local, &push) {
            shallow_merge(target, changes);
        }

        assert_eq!(local["status"], "confirmed");
        assert_eq!(local["driver_id"], "d2c94382");
        assert_eq!(local["pickup_address"], "SFO Terminal 2");
        assert_eq!(local["driver"]["full_name"], "James Anderson");
    }

    #[tokio::test]
    async fn subscribers_only_see_their_booking() {
        let feed = BookingFeed::new();
        let watched = Uuid::new_v4();
        let mut subscription = feed.subscribe(watched);

        feed.publish(Uuid::new_v4(), status_change("confirmed"));
        feed.publish(watched, status_change("cancelled"));

        let change = subscription.next().await.expect("change for watched booking");
        assert_eq!(change.booking_id, watched);
        assert_eq!(change.changes["status"], "cancelled");
    }

    #[test]
    fn publishing_without_listeners_is_fine() {
        BookingFeed::new().publish(Uuid::new_v4(), status_change("confirmed"));
    }
}

//! In-memory order queue with a monotonic id sequence.

use delivery_domain::{Order, Point, Priority, Result};
use std::sync::{Mutex, MutexGuard, PoisonError};

struct OrderQueue {
    next_id: u64,
    orders: Vec<Order>,
}

/// Pending-order registry. Ids start at 1 and keep increasing across
/// `clear`, so ids are never reused within a process.
pub struct OrderRegistry {
    queue: Mutex<OrderQueue>,
}

impl Default for OrderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(OrderQueue {
                next_id: 1,
                orders: Vec::new(),
            }),
        }
    }

    fn guard(&self) -> MutexGuard<'_, OrderQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Submit a new order, assigning the next sequence id.
    ///
    /// # Errors
    /// Validation error on non-positive weight; the sequence does not
    /// advance on failure.
    pub fn submit(&self, x: f64, y: f64, weight_kg: f64, priority: Priority) -> Result<Order> {
        let mut q = self.guard();
        let order = Order::new(q.next_id, Point::new(x, y), weight_kg, priority)?;
        q.next_id += 1;
        q.orders.push(order.clone());
        Ok(order)
    }

    /// Snapshot of the queue in submission order.
    #[must_use]
    pub fn list(&self) -> Vec<Order> {
        self.guard().orders.clone()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guard().orders.is_empty()
    }

    pub fn clear(&self) {
        self.guard().orders.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let reg = OrderRegistry::new();
        let a = reg.submit(1.0, 1.0, 2.0, Priority::High).unwrap();
        let b = reg.submit(2.0, 2.0, 1.0, Priority::Low).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
    }

    #[test]
    fn test_clear_does_not_reset_sequence() {
        let reg = OrderRegistry::new();
        reg.submit(1.0, 1.0, 2.0, Priority::High).unwrap();
        reg.clear();
        assert!(reg.is_empty());
        let next = reg.submit(1.0, 1.0, 2.0, Priority::High).unwrap();
        assert_eq!(next.id, 2);
    }

    #[test]
    fn test_invalid_weight_leaves_queue_unchanged() {
        let reg = OrderRegistry::new();
        assert!(reg.submit(1.0, 1.0, 0.0, Priority::High).is_err());
        assert!(reg.is_empty());
        let ok = reg.submit(1.0, 1.0, 1.0, Priority::High).unwrap();
        assert_eq!(ok.id, 1, "failed submission must not burn an id");
    }
}

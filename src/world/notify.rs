//! Change notifications for presentation layers
//!
//! Every mutation the outside world cares about is reported as a
//! [`Notification`]. Observers registered with [`NotificationHub::subscribe`]
//! are called synchronously, in registration order, right after the
//! mutation. The same notifications are also queued so a frame-driven
//! consumer can poll them with [`NotificationHub::drain`] instead.

use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;

use crate::animal::{AnimalState, DeathCause};
use crate::core::types::{AnimalId, TileCoord};
use crate::world::tile::TileType;

/// Queue length after which the oldest undrained notifications are dropped
pub const DEFAULT_QUEUE_CAPACITY: usize = 1 << 16;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Notification {
    TileTypeChanged {
        coord: TileCoord,
        from: TileType,
        to: TileType,
    },
    AnimalCreated {
        id: AnimalId,
        coord: TileCoord,
    },
    AnimalDestroyed {
        id: AnimalId,
        coord: TileCoord,
        cause: DeathCause,
    },
    AnimalChanged {
        id: AnimalId,
        coord: TileCoord,
        state: AnimalState,
    },
    FoodSprouted {
        coord: TileCoord,
        nutrition: u32,
    },
    FoodChanged {
        coord: TileCoord,
        nutrition: u32,
    },
    FoodExhausted {
        coord: TileCoord,
    },
}

type Observer = Box<dyn FnMut(&Notification)>;

/// Multicast dispatcher plus a bounded poll queue
pub struct NotificationHub {
    observers: Vec<Observer>,
    queue: VecDeque<Notification>,
    capacity: usize,
    dropped: u64,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// A capacity of zero disables queueing; observers still fire
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            observers: Vec::new(),
            queue: VecDeque::new(),
            capacity,
            dropped: 0,
        }
    }

    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&Notification) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    pub fn emit(&mut self, notification: Notification) {
        for observer in &mut self.observers {
            observer(&notification);
        }

        if self.capacity == 0 {
            return;
        }
        if self.queue.len() == self.capacity {
            self.queue.pop_front();
            self.dropped += 1;
        }
        self.queue.push_back(notification);
    }

    /// Take every queued notification, oldest first
    pub fn drain(&mut self) -> Vec<Notification> {
        self.queue.drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Notifications lost because nobody drained the queue in time
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationHub")
            .field("observers", &self.observers.len())
            .field("pending", &self.queue.len())
            .field("dropped", &self.dropped)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn exhausted(x: i32) -> Notification {
        Notification::FoodExhausted { coord: TileCoord::new(x, 0) }
    }

    #[test]
    fn test_observers_fire_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut hub = NotificationHub::new();

        let first = Rc::clone(&log);
        hub.subscribe(move |_| first.borrow_mut().push("first"));
        let second = Rc::clone(&log);
        hub.subscribe(move |_| second.borrow_mut().push("second"));

        hub.emit(exhausted(0));
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_drain_returns_fifo_and_empties() {
        let mut hub = NotificationHub::new();
        hub.emit(exhausted(1));
        hub.emit(exhausted(2));

        let drained = hub.drain();
        assert_eq!(drained, vec![exhausted(1), exhausted(2)]);
        assert_eq!(hub.pending(), 0);
    }

    #[test]
    fn test_full_queue_drops_oldest() {
        let mut hub = NotificationHub::with_capacity(2);
        hub.emit(exhausted(1));
        hub.emit(exhausted(2));
        hub.emit(exhausted(3));

        assert_eq!(hub.dropped(), 1);
        assert_eq!(hub.drain(), vec![exhausted(2), exhausted(3)]);
    }

    #[test]
    fn test_zero_capacity_only_notifies_observers() {
        let count = Rc::new(RefCell::new(0));
        let mut hub = NotificationHub::with_capacity(0);
        let c = Rc::clone(&count);
        hub.subscribe(move |_| *c.borrow_mut() += 1);

        hub.emit(exhausted(0));
        assert_eq!(*count.borrow(), 1);
        assert_eq!(hub.pending(), 0);
        assert_eq!(hub.dropped(), 0);
    }
}

//! Typed change notifications
//!
//! One topic per kind of change. Subscribers get a handle back and can unsubscribe
//! with it; callbacks run synchronously on the publishing thread, in subscription order.

use crate::context::Context;
use crate::models::{Config, Request};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<T> = Box<dyn FnMut(&T) + Send>;

pub struct Topic<T> {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Callback<T>)>,
}

impl<T> Default for Topic<T> {
    fn default() -> Self {
        Topic {
            next_id: 0,
            subscribers: Vec::new(),
        }
    }
}

impl<T> Topic<T> {
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&T) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns false when the id was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn publish(&mut self, payload: &T) {
        for (_, callback) in self.subscribers.iter_mut() {
            callback(payload);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// The three change events of the application
#[derive(Default)]
pub struct EventBus {
    /// The draft request was replaced, or a stored request was saved or deleted
    pub request_changed: Topic<Request>,
    /// The tree display pattern changed
    pub config_changed: Topic<Config>,
    /// Context variables changed
    pub context_changed: Topic<Context>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_publish_reaches_subscribers_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();

        let first = Arc::clone(&seen);
        bus.config_changed
            .subscribe(move |c: &Config| first.lock().unwrap().push(format!("a:{}", c.pattern)));
        let second = Arc::clone(&seen);
        bus.config_changed
            .subscribe(move |c: &Config| second.lock().unwrap().push(format!("b:{}", c.pattern)));

        bus.config_changed.publish(&Config {
            pattern: "{m}".to_string(),
        });

        assert_eq!(*seen.lock().unwrap(), vec!["a:{m}", "b:{m}"]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let count = Arc::new(Mutex::new(0));
        let mut bus = EventBus::new();

        let counter = Arc::clone(&count);
        let id = bus
            .request_changed
            .subscribe(move |_| *counter.lock().unwrap() += 1);

        bus.request_changed.publish(&Request::default());
        assert!(bus.request_changed.unsubscribe(id));
        assert!(!bus.request_changed.unsubscribe(id));
        bus.request_changed.publish(&Request::default());

        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(bus.request_changed.subscriber_count(), 0);
    }

    #[test]
    fn test_topics_are_independent() {
        let count = Arc::new(Mutex::new(0));
        let mut bus = EventBus::new();

        let counter = Arc::clone(&count);
        bus.context_changed
            .subscribe(move |_| *counter.lock().unwrap() += 1);
        bus.config_changed.publish(&Config::default());

        assert_eq!(*count.lock().unwrap(), 0);
    }
}

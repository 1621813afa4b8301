//! Process-local publish/subscribe event bus (§4.5, Design Note §9).
//! Subscribers are invoked synchronously, in publish order; a subscriber
//! that panics is isolated and never reorders or drops events seen by
//! others.

use std::{panic::AssertUnwindSafe, sync::Mutex};

use log::error;

/// Payloads for the topics listed in §6. The key on cache events is `url`
/// (Open Question resolution, SPEC_FULL.md §9): `CacheDecorator` always has
/// a `reqwest::Url` in hand, never a bare URI string.
#[derive(Clone, Debug)]
pub enum Event {
    CacheHit { url: String },
    CacheMiss { url: String },
    DownloadStarted { total_size: Option<u64> },
    DownloadProgress { current_size: u64, total_size: Option<u64> },
    DownloadCompleted { total_size: u64 },
    UploadStarted { total_size: Option<u64> },
    UploadProgress { current_size: u64, total_size: Option<u64> },
    UploadCompleted { total_size: u64 },
    ModChanged { name: String },
}

type Subscriber = Box<dyn Fn(&Event) + Send + Sync>;

#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Subscriber>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: impl Fn(&Event) + Send + Sync + 'static) {
        self.subscribers.lock().unwrap().push(Box::new(callback));
    }

    pub fn publish(&self, event: Event) {
        let subscribers = self.subscribers.lock().unwrap();
        for subscriber in subscribers.iter() {
            let result = std::panic::catch_unwind(AssertUnwindSafe(|| subscriber(&event)));
            if result.is_err() {
                error!("event subscriber panicked handling {event:?}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex as StdMutex};

    use super::*;

    #[test]
    fn subscribers_see_events_in_publish_order() {
        let bus = EventBus::new();
        let seen = Arc::new(StdMutex::new(Vec::new()));

        let seen_clone = seen.clone();
        bus.subscribe(move |event| {
            if let Event::CacheHit { url } = event {
                seen_clone.lock().unwrap().push(url.clone());
            }
        });

        bus.publish(Event::CacheHit { url: "a".into() });
        bus.publish(Event::CacheHit { url: "b".into() });

        assert_eq!(*seen.lock().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn a_panicking_subscriber_does_not_block_others() {
        let bus = EventBus::new();
        let seen = Arc::new(StdMutex::new(false));

        bus.subscribe(|_event| panic!("broken subscriber"));
        let seen_clone = seen.clone();
        bus.subscribe(move |_event| {
            *seen_clone.lock().unwrap() = true;
        });

        bus.publish(Event::CacheMiss { url: "x".into() });
        assert!(*seen.lock().unwrap());
    }
}

//! In-memory event store
//!
//! Keeps every inserted event in insertion order. Inserts and pings can be
//! made to fail, and both can be slowed down, to exercise the observer's
//! failure paths without a live database.

use super::event::{ErrorEvent, Event, MetricsEvent};
use super::store::EventStore;
use crate::error::StoreError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Default)]
pub struct MemoryStore {
    events: Mutex<Vec<Event>>,
    fail_inserts: AtomicBool,
    fail_pings: AtomicBool,
    delays: Mutex<Delays>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Delays {
    insert: Duration,
    ping: Duration,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following insert fail with `StoreError::Unavailable`
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_pings(&self, fail: bool) {
        self.fail_pings.store(fail, Ordering::SeqCst);
    }

    /// Sleep for `delay` before each insert completes
    pub fn set_insert_delay(&self, delay: Duration) {
        self.delays().insert = delay;
    }

    /// Sleep for `delay` before each ping completes
    pub fn set_ping_delay(&self, delay: Duration) {
        self.delays().ping = delay;
    }

    /// Snapshot of everything stored so far
    pub fn events(&self) -> Vec<Event> {
        self.lock().clone()
    }

    pub fn error_events(&self) -> Vec<ErrorEvent> {
        self.lock()
            .iter()
            .filter_map(|e| e.as_error().cloned())
            .collect()
    }

    pub fn metrics_events(&self) -> Vec<MetricsEvent> {
        self.lock()
            .iter()
            .filter_map(|e| e.as_metrics().cloned())
            .collect()
    }

    /// Events whose `request_id` matches
    pub fn events_for(&self, request_id: &str) -> Vec<Event> {
        self.lock()
            .iter()
            .filter(|e| e.request_id() == request_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Event>> {
        // A panic while holding the lock cannot leave the Vec half-written.
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn delays(&self) -> std::sync::MutexGuard<'_, Delays> {
        self.delays.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn insert_one(&self, event: &Event) -> Result<(), StoreError> {
        let delay = self.delays().insert;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("insert rejected".to_string()));
        }

        // Mirror the real store: the event must encode as a document.
        event.to_document()?;
        self.lock().push(event.clone());
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let delay = self.delays().ping;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.fail_pings.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("ping rejected".to_string()));
        }
        Ok(())
    }
}

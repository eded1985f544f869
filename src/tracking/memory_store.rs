//! In-memory store for tests and embedded use

use super::store::{EventStore, MessageStore, StoreError};
use super::types::{OpenEvent, TrackingMessage};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

/// Vec-backed implementation of both store traits
#[derive(Debug, Default)]
pub struct InMemoryStore {
    events: Mutex<Vec<OpenEvent>>,
    messages: Mutex<Vec<TrackingMessage>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn events(&self) -> Result<MutexGuard<'_, Vec<OpenEvent>>, StoreError> {
        self.events.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn messages(&self) -> Result<MutexGuard<'_, Vec<TrackingMessage>>, StoreError> {
        self.messages.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

/// Newest-first; ties keep the most recently appended first
fn newest_first<'a>(events: impl DoubleEndedIterator<Item = &'a OpenEvent>) -> Vec<OpenEvent> {
    let mut sorted: Vec<OpenEvent> = events.rev().cloned().collect();
    sorted.sort_by(|a, b| b.observed_at.cmp(&a.observed_at));
    sorted
}

#[async_trait]
impl EventStore for InMemoryStore {
    async fn append(&self, event: &OpenEvent) -> Result<(), StoreError> {
        self.events()?.push(event.clone());
        Ok(())
    }

    async fn list_by_message(&self, message_id: &str) -> Result<Vec<OpenEvent>, StoreError> {
        let events = self.events()?;
        Ok(newest_first(events.iter().filter(|e| e.message_id == message_id)))
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<OpenEvent>, StoreError> {
        let events = self.events()?;
        let mut recent = newest_first(events.iter());
        recent.truncate(limit);
        Ok(recent)
    }

    async fn delete_by_message(&self, message_id: &str) -> Result<usize, StoreError> {
        let mut events = self.events()?;
        let before = events.len();
        events.retain(|e| e.message_id != message_id);
        Ok(before - events.len())
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    async fn insert_message(&self, message: &TrackingMessage) -> Result<(), StoreError> {
        let mut messages = self.messages()?;
        if messages.iter().any(|m| m.id == message.id) {
            return Err(StoreError::Database(format!(
                "Duplicate tracking id: {}",
                message.id
            )));
        }
        messages.push(message.clone());
        Ok(())
    }

    async fn get_message(&self, id: &str) -> Result<Option<TrackingMessage>, StoreError> {
        Ok(self.messages()?.iter().find(|m| m.id == id).cloned())
    }

    async fn list_messages(&self) -> Result<Vec<TrackingMessage>, StoreError> {
        let messages = self.messages()?;
        let mut sorted: Vec<TrackingMessage> = messages.iter().rev().cloned().collect();
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sorted)
    }

    async fn delete_message(&self, id: &str) -> Result<bool, StoreError> {
        let mut messages = self.messages()?;
        let before = messages.len();
        messages.retain(|m| m.id != id);
        Ok(messages.len() < before)
    }
}

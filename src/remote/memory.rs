//! In-process backend for tests and demos.
//!
//! Implements both external seams over a shared table: persistence calls
//! mutate the table and every confirmed mutation is echoed to all live
//! subscriptions for the affected image, the same shape a database change
//! feed delivers. Failure injection lets tests exercise the rollback paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::color::random_color;
use crate::model::{Annotation, AnnotationId, AnnotationStatus, ConfirmState, Geometry, ImageId};
use crate::remote::{
    ChangeFeed, PersistError, PersistenceService, RemoteChange, Subscription,
};

#[derive(Default)]
struct BackendState {
    rows: HashMap<ImageId, Vec<Annotation>>,
    subscribers: HashMap<ImageId, Vec<(u64, mpsc::UnboundedSender<RemoteChange>)>>,
    sub_seq: u64,
    subscribes: u64,
    unsubscribes: u64,
}

impl BackendState {
    fn broadcast(&mut self, image_id: &ImageId, change: RemoteChange) {
        if let Some(senders) = self.subscribers.get_mut(image_id) {
            senders.retain(|(_, tx)| tx.send(change.clone()).is_ok());
        }
    }

    fn find_row(&mut self, id: &str) -> Option<(ImageId, &mut Annotation)> {
        for (image_id, rows) in &mut self.rows {
            if let Some(row) = rows.iter_mut().find(|a| a.id == id) {
                return Some((image_id.clone(), row));
            }
        }
        None
    }
}

/// Shared in-memory table plus change-feed hub.
pub struct InMemoryBackend {
    state: Arc<Mutex<BackendState>>,
    next_id: AtomicU64,
    fail_remaining: AtomicU64,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BackendState::default())),
            next_id: AtomicU64::new(1),
            fail_remaining: AtomicU64::new(0),
        }
    }

    /// Make the next `n` persistence requests fail.
    pub fn fail_next_requests(&self, n: u64) {
        self.fail_remaining.store(n, Ordering::SeqCst);
    }

    /// Snapshot of the stored annotations for an image.
    pub fn annotations(&self, image_id: &ImageId) -> Vec<Annotation> {
        let state = self.state.lock().unwrap();
        state.rows.get(image_id).cloned().unwrap_or_default()
    }

    /// Number of live subscriptions for an image.
    pub fn active_subscriptions(&self, image_id: &ImageId) -> usize {
        let state = self.state.lock().unwrap();
        state
            .subscribers
            .get(image_id)
            .map(|s| s.len())
            .unwrap_or(0)
    }

    /// Total subscribe calls observed.
    pub fn subscribes(&self) -> u64 {
        self.state.lock().unwrap().subscribes
    }

    /// Total unsubscribes observed.
    pub fn unsubscribes(&self) -> u64 {
        self.state.lock().unwrap().unsubscribes
    }

    fn take_failure(&self, op: &str) -> Result<(), PersistError> {
        let mut remaining = self.fail_remaining.load(Ordering::SeqCst);
        while remaining > 0 {
            match self.fail_remaining.compare_exchange(
                remaining,
                remaining - 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return Err(PersistError::new(format!("injected {op} failure"))),
                Err(observed) => remaining = observed,
            }
        }
        Ok(())
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistenceService for InMemoryBackend {
    async fn create(
        &self,
        image_id: &ImageId,
        class_name: &str,
        geometry: Geometry,
    ) -> Result<Annotation, PersistError> {
        self.take_failure("create")?;

        let id: AnnotationId = format!("ann-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let annotation = Annotation {
            id,
            geometry,
            class_name: class_name.to_string(),
            color: random_color().to_string(),
            status: AnnotationStatus::Draft,
            confirm: ConfirmState::Confirmed,
        };

        let mut state = self.state.lock().unwrap();
        state
            .rows
            .entry(image_id.clone())
            .or_default()
            .push(annotation.clone());
        state.broadcast(image_id, RemoteChange::insert(&annotation));

        Ok(annotation)
    }

    async fn update(&self, id: &AnnotationId, geometry: Geometry) -> Result<(), PersistError> {
        self.take_failure("update")?;

        let mut state = self.state.lock().unwrap();
        let Some((image_id, row)) = state.find_row(id) else {
            return Err(PersistError::new(format!("unknown annotation {id}")));
        };

        row.geometry = geometry;
        let change = RemoteChange::update(row);
        state.broadcast(&image_id, change);

        Ok(())
    }

    async fn delete(&self, id: &AnnotationId) -> Result<(), PersistError> {
        self.take_failure("delete")?;

        let mut state = self.state.lock().unwrap();
        let Some((image_id, _)) = state.find_row(id) else {
            return Err(PersistError::new(format!("unknown annotation {id}")));
        };

        if let Some(rows) = state.rows.get_mut(&image_id) {
            rows.retain(|a| a.id != *id);
        }
        state.broadcast(&image_id, RemoteChange::delete(id.clone()));

        Ok(())
    }
}

impl ChangeFeed for InMemoryBackend {
    fn subscribe(&self, image_id: &ImageId) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();

        let token = {
            let mut state = self.state.lock().unwrap();
            state.sub_seq += 1;
            state.subscribes += 1;
            let token = state.sub_seq;
            state
                .subscribers
                .entry(image_id.clone())
                .or_default()
                .push((token, tx));
            token
        };

        let state = Arc::clone(&self.state);
        let image = image_id.clone();
        Subscription::new(image_id.clone(), rx, move || {
            let mut state = state.lock().unwrap();
            if let Some(senders) = state.subscribers.get_mut(&image) {
                senders.retain(|(t, _)| *t != token);
            }
            state.unsubscribes += 1;
        })
    }
}

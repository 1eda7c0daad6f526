//! Reconciliation of the remote change feed with the local store.
//!
//! The reconciler owns at most one live [`Subscription`] at a time, bound
//! to the active image. Switching images replaces the subscription: the
//! previous one is torn down exactly once (its drop carries the
//! unsubscribe) and exactly one new subscription is opened. There is no
//! reconnection or backoff: a feed that stops delivering degrades to
//! stale-but-functional local editing until the next image change.

use std::sync::Arc;

use crate::model::ImageId;
use crate::remote::{ChangeFeed, RemoteChange, Subscription};

/// Holds the active image's change-feed subscription and drains it.
pub struct SyncReconciler {
    feed: Arc<dyn ChangeFeed>,
    subscription: Option<Subscription>,
}

impl SyncReconciler {
    pub fn new(feed: Arc<dyn ChangeFeed>) -> Self {
        Self {
            feed,
            subscription: None,
        }
    }

    /// The image currently being watched, if any.
    pub fn watching(&self) -> Option<&ImageId> {
        self.subscription.as_ref().map(|s| s.image_id())
    }

    /// Re-point the reconciler at a new active image.
    ///
    /// The previous subscription (if any) is dropped, which unsubscribes
    /// it; then one subscription for `image_id` is opened. Events still
    /// queued on the old subscription die with it; they belong to a store
    /// that no longer exists.
    pub fn watch(&mut self, image_id: &ImageId) {
        // Tear the old subscription down before opening the new one
        self.subscription = None;
        log::info!("watching change feed for image {image_id}");
        self.subscription = Some(self.feed.subscribe(image_id));
    }

    /// Tear down the current subscription without opening a new one.
    pub fn stop(&mut self) {
        if self.subscription.take().is_some() {
            log::info!("change feed watch stopped");
        }
    }

    /// Drain the changes that have arrived since the last poll.
    ///
    /// Non-blocking; events are returned in arrival order. Returns nothing
    /// when no image is being watched or the feed has gone quiet.
    pub fn poll(&mut self) -> Vec<RemoteChange> {
        match &mut self.subscription {
            Some(subscription) => subscription.poll(),
            None => Vec::new(),
        }
    }
}

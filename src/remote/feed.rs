//! Change-feed subscriptions, scoped to one image.

use tokio::sync::mpsc;

use crate::model::ImageId;
use crate::remote::RemoteChange;

/// Live subscription to one image's change feed.
///
/// The subscription owns its unsubscribe duty: dropping it detaches from
/// the feed exactly once. Replacing the subscription when the active image
/// changes is therefore a plain assignment.
pub struct Subscription {
    image_id: ImageId,
    receiver: mpsc::UnboundedReceiver<RemoteChange>,
    on_unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap a receiver with an unsubscribe callback invoked on drop.
    pub fn new(
        image_id: ImageId,
        receiver: mpsc::UnboundedReceiver<RemoteChange>,
        on_unsubscribe: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            image_id,
            receiver,
            on_unsubscribe: Some(Box::new(on_unsubscribe)),
        }
    }

    /// The image this subscription is scoped to.
    pub fn image_id(&self) -> &ImageId {
        &self.image_id
    }

    /// Receive the next change, waiting if none is pending.
    ///
    /// Returns `None` once the feed has dropped its sending side; the
    /// subscription then silently delivers nothing until replaced.
    pub async fn recv(&mut self) -> Option<RemoteChange> {
        self.receiver.recv().await
    }

    /// Drain changes that are already pending, without waiting.
    pub fn poll(&mut self) -> Vec<RemoteChange> {
        let mut pending = Vec::new();
        while let Ok(change) = self.receiver.try_recv() {
            pending.push(change);
        }
        pending
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.on_unsubscribe.take() {
            log::debug!("unsubscribing change feed for image {}", self.image_id);
            unsubscribe();
        }
    }
}

/// Push channel of remote mutations.
///
/// One subscription covers one image; events for other images are never
/// delivered on it.
pub trait ChangeFeed: Send + Sync {
    fn subscribe(&self, image_id: &ImageId) -> Subscription;
}

//! Notifications produced for presentation and read-only consumers.

use tokio::sync::broadcast;
use tracing::trace;

use crate::identity::FileIdentity;

/// Buffered notifications per subscriber before it starts lagging.
pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
	/// Decoration of one file, or of every file when `None`, is stale.
	DecorationChanged(Option<FileIdentity>),
	/// The set of known generated files changed; the read-only allow-list
	/// should be pushed again.
	GeneratedSetChanged,
}

/// Broadcast fan-out for [`Notification`]s.
#[derive(Debug, Clone)]
pub struct Notifier {
	tx: broadcast::Sender<Notification>,
}

impl Default for Notifier {
	fn default() -> Self {
		Self::new(DEFAULT_CAPACITY)
	}
}

impl Notifier {
	pub fn new(capacity: usize) -> Self {
		let (tx, _) = broadcast::channel(capacity.max(1));
		Self { tx }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
		self.tx.subscribe()
	}

	/// Sends to every current subscriber. Having none is not an error.
	pub fn send(&self, notification: Notification) {
		if self.tx.send(notification).is_err() {
			trace!("notification dropped: no subscribers");
		}
	}
}

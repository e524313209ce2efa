//! Broadcast channel for lifecycle events.

use tokio::sync::broadcast;
use trade_types::LifecycleEvent;

/// Fan-out of [`LifecycleEvent`]s to any number of subscribers.
///
/// Slow subscribers lag and lose the oldest events rather than holding up
/// transitions.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<LifecycleEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity.max(1));
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event; errors only when nobody is subscribed.
	pub fn publish(
		&self,
		event: LifecycleEvent,
	) -> Result<usize, broadcast::error::SendError<LifecycleEvent>> {
		self.sender.send(event)
	}
}

//! Host event dispatch.
//!
//! Translates configuration, workspace and file lifecycle events into engine
//! calls, answers decoration queries, and keeps a host read-only allow-list in
//! step with the generated set.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::ClassificationEngine;
use crate::error::SinkError;
use crate::identity::{FileIdentity, WorkspaceRoots};
use crate::notify::Notification;
use crate::rules::RuleSet;
use crate::settings::Settings;

/// Tooltip attached to every generated-file decoration.
pub const DECORATION_TOOLTIP: &str = "Generated file";

/// Inbound host notifications.
#[derive(Debug, Clone)]
pub enum HostEvent {
	/// The `generatedFiles` settings section changed.
	ConfigurationChanged(Settings),
	/// The set of project roots changed.
	WorkspaceFoldersChanged(WorkspaceRoots),
	FileChanged(FileIdentity),
	FileCreated(FileIdentity),
	FileDeleted(FileIdentity),
	/// A different file became visible, or none.
	ActiveViewChanged(Option<FileIdentity>),
	DocumentSaved(FileIdentity),
}

/// Host-side receiver of the read-only allow-list.
#[async_trait]
pub trait ReadOnlySink: Send + Sync {
	/// Replaces the host allow-list with `paths`.
	async fn sync(&self, paths: Vec<String>) -> Result<(), SinkError>;
}

/// Presentation data for a generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDecoration {
	pub badge: String,
	pub color: Option<String>,
	pub tooltip: String,
}

/// Routes host events into a shared [`ClassificationEngine`].
pub struct ChangeCoordinator {
	engine: Arc<ClassificationEngine>,
	sink: Option<Arc<dyn ReadOnlySink>>,
	auto_sync: bool,
}

impl ChangeCoordinator {
	pub fn new(engine: Arc<ClassificationEngine>) -> Self {
		Self {
			engine,
			sink: None,
			auto_sync: false,
		}
	}

	/// Attaches a read-only sink and enables automatic syncing.
	#[must_use]
	pub fn with_read_only_sink(mut self, sink: Arc<dyn ReadOnlySink>) -> Self {
		self.sink = Some(sink);
		self.auto_sync = true;
		self
	}

	/// Whether [`Self::run`] pushes the allow-list after each generated-set
	/// change. Has no effect without a sink.
	#[must_use]
	pub fn with_auto_sync(mut self, auto_sync: bool) -> Self {
		self.auto_sync = auto_sync;
		self
	}

	pub fn engine(&self) -> &Arc<ClassificationEngine> {
		&self.engine
	}

	pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
		self.engine.subscribe()
	}

	/// Applies one host event.
	pub async fn handle(&self, event: HostEvent) {
		match event {
			HostEvent::ConfigurationChanged(settings) => {
				let rules = RuleSet::from_settings(&settings);
				info!(warnings = rules.warnings().len(), "generated-file rules changed");
				self.engine.reload(rules);
			}
			HostEvent::WorkspaceFoldersChanged(roots) => {
				debug!(roots = ?roots, "workspace roots changed");
				self.engine.set_roots(roots);
			}
			HostEvent::FileChanged(identity) | HostEvent::FileCreated(identity) => {
				self.engine.invalidate(&identity);
				self.engine.classify(&identity).await;
			}
			HostEvent::FileDeleted(identity) | HostEvent::DocumentSaved(identity) => {
				self.engine.invalidate(&identity);
			}
			HostEvent::ActiveViewChanged(Some(identity)) => {
				self.engine.classify(&identity).await;
			}
			HostEvent::ActiveViewChanged(None) => {}
		}
	}

	/// Decoration for `identity`, or `None` when it is not generated.
	pub async fn decoration(&self, identity: &FileIdentity) -> Option<FileDecoration> {
		if !self.engine.classify(identity).await {
			return None;
		}
		let rules = self.engine.rules();
		let style = rules.decoration();
		Some(FileDecoration {
			badge: style.badge.clone(),
			color: style.color.clone(),
			tooltip: DECORATION_TOOLTIP.to_owned(),
		})
	}

	/// Pushes the current generated set to the sink.
	///
	/// Returns the number of paths pushed; `0` without a sink.
	pub async fn sync_read_only(&self) -> Result<usize, SinkError> {
		let Some(sink) = &self.sink else {
			return Ok(0);
		};
		let paths = self.engine.enumerate_generated();
		let count = paths.len();
		sink.sync(paths).await?;
		debug!(count, "read-only allow-list synced");
		Ok(count)
	}

	/// Processes `events` until `cancel` fires or every sender is dropped.
	///
	/// With auto-sync enabled, bursts of generated-set changes are coalesced
	/// into one sync.
	pub async fn run(&self, mut events: mpsc::Receiver<HostEvent>, cancel: CancellationToken) {
		let mut notifications = self.engine.subscribe();
		let syncing = self.auto_sync && self.sink.is_some();

		loop {
			tokio::select! {
				biased;
				_ = cancel.cancelled() => break,
				notification = notifications.recv(), if syncing => match notification {
					Ok(Notification::GeneratedSetChanged) => {
						drain_pending(&mut notifications);
						self.auto_sync().await;
					}
					Ok(Notification::DecorationChanged(_)) => {}
					Err(RecvError::Lagged(skipped)) => {
						debug!(skipped, "notification receiver lagged; resyncing");
						self.auto_sync().await;
					}
					Err(RecvError::Closed) => break,
				},
				event = events.recv() => {
					let Some(event) = event else {
						break;
					};
					self.handle(event).await;
				}
			}
		}
		debug!("change coordinator stopped");
	}

	async fn auto_sync(&self) {
		if let Err(error) = self.sync_read_only().await {
			warn!(%error, "automatic read-only sync failed");
		}
	}
}

/// Discards queued notifications; one sync covers all of them.
fn drain_pending(notifications: &mut broadcast::Receiver<Notification>) {
	while let Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) = notifications.try_recv() {}
}

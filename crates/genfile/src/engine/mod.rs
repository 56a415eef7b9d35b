//! Classification engine.
//!
//! # Role
//!
//! Decision authority for "is this file generated". Owns the rules, the
//! project roots and the verdict cache, and is the only writer of all three.
//!
//! # Invariants
//!
//! - Exclusion is evaluated before the cache and always wins.
//! - A step whose rule collection is empty is skipped: no oracle query without
//!   keys, no scan without patterns.
//! - Swapping rules or roots clears the cache under the same lock that
//!   publishes the new value, and verdicts computed under the previous
//!   generation are discarded instead of stored.
//! - Classification never fails; every lower-level error reads as "no match".

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::cache::ClassificationCache;
use crate::identity::{FileIdentity, WorkspaceRoots};
use crate::notify::{Notification, Notifier};
use crate::oracle::{GitAttributes, MetadataOracle};
use crate::rules::RuleSet;
use crate::scanner::ContentScanner;
use crate::source::ContentSources;

/// The single rule that decided a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchReason {
	/// An exclusion pattern forced a negative verdict.
	Excluded { pattern: String },
	/// An attribute was recorded with a truthy value.
	Attribute { name: String, value: String },
	/// A content pattern matched the scanned prefix.
	Content { pattern: String },
}

/// Uncached verdict with its deciding rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
	pub generated: bool,
	pub reason: Option<MatchReason>,
}

impl Verdict {
	fn generated(reason: MatchReason) -> Self {
		Self {
			generated: true,
			reason: Some(reason),
		}
	}

	fn excluded(pattern: &str) -> Self {
		Self {
			generated: false,
			reason: Some(MatchReason::Excluded {
				pattern: pattern.to_owned(),
			}),
		}
	}

	fn authored() -> Self {
		Self {
			generated: false,
			reason: None,
		}
	}
}

/// Layered, cached generated-file classifier.
pub struct ClassificationEngine {
	rules: ArcSwap<RuleSet>,
	roots: ArcSwap<WorkspaceRoots>,
	cache: Mutex<ClassificationCache>,
	oracle: Arc<dyn MetadataOracle>,
	scanner: ContentScanner,
	notifier: Notifier,
}

impl ClassificationEngine {
	/// Creates an engine using `git check-attr` and direct file reads.
	pub fn new(rules: RuleSet, roots: WorkspaceRoots) -> Self {
		Self {
			rules: ArcSwap::from_pointee(rules),
			roots: ArcSwap::from_pointee(roots),
			cache: Mutex::new(ClassificationCache::new()),
			oracle: Arc::new(GitAttributes::new()),
			scanner: ContentScanner::default(),
			notifier: Notifier::default(),
		}
	}

	#[must_use]
	pub fn with_oracle(mut self, oracle: Arc<dyn MetadataOracle>) -> Self {
		self.oracle = oracle;
		self
	}

	#[must_use]
	pub fn with_sources(mut self, sources: ContentSources) -> Self {
		self.scanner = ContentScanner::new(sources);
		self
	}

	#[must_use]
	pub fn with_notifier(mut self, notifier: Notifier) -> Self {
		self.notifier = notifier;
		self
	}

	/// Current rules.
	pub fn rules(&self) -> Arc<RuleSet> {
		self.rules.load_full()
	}

	/// Current project roots.
	pub fn roots(&self) -> Arc<WorkspaceRoots> {
		self.roots.load_full()
	}

	pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
		self.notifier.subscribe()
	}

	/// Cached verdict for `identity`, without computing one.
	pub fn cached(&self, identity: &FileIdentity) -> Option<bool> {
		self.cache.lock().get(identity)
	}

	/// Returns whether `identity` is generated.
	///
	/// Runs at most one attribute query and one content scan, and none at all
	/// on a cache hit.
	pub async fn classify(&self, identity: &FileIdentity) -> bool {
		let (rules, generation, cached) = {
			let cache = self.cache.lock();
			(self.rules.load_full(), cache.generation(), cache.get(identity))
		};

		if let Some(pattern) = self.exclusion(&rules, identity) {
			trace!(%identity, %pattern, "excluded");
			return false;
		}

		if let Some(generated) = cached {
			return generated;
		}

		let verdict = self.evaluate(&rules, identity).await;
		debug!(%identity, generated = verdict.generated, reason = ?verdict.reason, "classified");
		self.record(identity, verdict.generated, generation);
		verdict.generated
	}

	/// Computes a verdict and its deciding rule without reading or writing the
	/// cache.
	pub async fn explain(&self, identity: &FileIdentity) -> Verdict {
		let rules = self.rules.load_full();
		if let Some(pattern) = self.exclusion(&rules, identity) {
			return Verdict::excluded(&pattern);
		}
		self.evaluate(&rules, identity).await
	}

	/// Drops the cached verdict for `identity`.
	///
	/// Dropping a `true` verdict changes the generated set and is announced.
	pub fn invalidate(&self, identity: &FileIdentity) -> Option<bool> {
		let previous = self.cache.lock().invalidate(identity);
		if previous == Some(true) {
			self.notifier.send(Notification::DecorationChanged(Some(identity.clone())));
			self.notifier.send(Notification::GeneratedSetChanged);
		}
		previous
	}

	/// Drops every cached verdict.
	pub fn invalidate_all(&self) {
		let dropped = self.cache.lock().invalidate_all();
		self.announce_reset(dropped);
	}

	/// Publishes new rules and clears the cache in one step.
	pub fn reload(&self, rules: RuleSet) {
		let dropped = {
			let mut cache = self.cache.lock();
			self.rules.store(Arc::new(rules));
			cache.invalidate_all()
		};
		debug!(dropped, "rules reloaded");
		self.announce_reset(dropped);
	}

	/// Replaces the project roots. Root-relative exclusion results may differ,
	/// so the cache is cleared as well.
	pub fn set_roots(&self, roots: WorkspaceRoots) {
		let dropped = {
			let mut cache = self.cache.lock();
			self.roots.store(Arc::new(roots));
			cache.invalidate_all()
		};
		self.announce_reset(dropped);
	}

	/// Paths of every file currently cached as generated.
	pub fn enumerate_generated(&self) -> Vec<String> {
		let roots = self.roots.load();
		self.cache.lock().enumerate_generated(&roots)
	}

	fn announce_reset(&self, dropped_generated: usize) {
		self.notifier.send(Notification::DecorationChanged(None));
		if dropped_generated > 0 {
			self.notifier.send(Notification::GeneratedSetChanged);
		}
	}

	fn exclusion(&self, rules: &RuleSet, identity: &FileIdentity) -> Option<String> {
		if rules.exclusions().is_empty() {
			return None;
		}
		let path = self.roots.load().display_path(identity);
		rules.excluded_by(&path).map(|pattern| pattern.as_str().to_owned())
	}

	fn record(&self, identity: &FileIdentity, generated: bool, generation: u64) {
		let Some(previous) = self.cache.lock().insert_if_current(identity.clone(), generated, generation) else {
			trace!(%identity, "discarding verdict from previous rule generation");
			return;
		};

		if generated {
			self.notifier.send(Notification::DecorationChanged(Some(identity.clone())));
			if previous != Some(true) {
				self.notifier.send(Notification::GeneratedSetChanged);
			}
		} else if previous == Some(true) {
			self.notifier.send(Notification::DecorationChanged(Some(identity.clone())));
			self.notifier.send(Notification::GeneratedSetChanged);
		}
	}

	async fn evaluate(&self, rules: &RuleSet, identity: &FileIdentity) -> Verdict {
		if let Some(reason) = self.check_metadata(rules, identity).await {
			return Verdict::generated(reason);
		}
		if let Some(reason) = self.check_content(rules, identity).await {
			return Verdict::generated(reason);
		}
		Verdict::authored()
	}

	async fn check_metadata(&self, rules: &RuleSet, identity: &FileIdentity) -> Option<MatchReason> {
		let keys = rules.metadata_keys();
		if keys.is_empty() {
			return None;
		}

		let path = identity.to_file_path()?;
		let cwd = self.query_dir(&path)?;
		let keys: Vec<String> = keys.iter().cloned().collect();

		self.oracle
			.query(&path, &cwd, &keys)
			.await
			.into_iter()
			.find(|attribute| attribute.is_truthy() && rules.metadata_keys().contains(&attribute.name))
			.map(|attribute| MatchReason::Attribute {
				name: attribute.name,
				value: attribute.value,
			})
	}

	async fn check_content(&self, rules: &RuleSet, identity: &FileIdentity) -> Option<MatchReason> {
		let patterns = rules.content_patterns();
		if patterns.is_empty() {
			return None;
		}

		let text = self.scanner.scan(identity, rules.bounds()).await?;
		patterns.iter().find(|pattern| pattern.is_match(&text)).map(|pattern| MatchReason::Content {
			pattern: pattern.as_str().to_owned(),
		})
	}

	/// Working directory for attribute queries: the containing root, else the
	/// file's own directory.
	fn query_dir(&self, path: &Path) -> Option<PathBuf> {
		let roots = self.roots.load();
		roots.containing(path).or_else(|| path.parent()).map(Path::to_path_buf)
	}
}

//! Memoized verdicts keyed by file identity.
//!
//! # Invariants
//!
//! - A verdict computed under one rule generation is never stored after
//!   [`ClassificationCache::invalidate_all`] has moved to the next; see
//!   [`ClassificationCache::insert_if_current`].
//! - Iteration follows insertion order until an entry is removed.

use indexmap::IndexMap;

use crate::identity::{FileIdentity, WorkspaceRoots};

/// Identity → "is generated" map with point and bulk invalidation.
#[derive(Debug, Default)]
pub struct ClassificationCache {
	entries: IndexMap<FileIdentity, bool>,
	generation: u64,
}

impl ClassificationCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn contains(&self, identity: &FileIdentity) -> bool {
		self.entries.contains_key(identity)
	}

	pub fn get(&self, identity: &FileIdentity) -> Option<bool> {
		self.entries.get(identity).copied()
	}

	/// Stores a verdict, returning the one it replaced.
	pub fn insert(&mut self, identity: FileIdentity, generated: bool) -> Option<bool> {
		self.entries.insert(identity, generated)
	}

	/// Stores a verdict only if no bulk invalidation happened since
	/// `generation` was read.
	///
	/// Returns `None` when the verdict was discarded as stale, otherwise the
	/// replaced value.
	pub fn insert_if_current(&mut self, identity: FileIdentity, generated: bool, generation: u64) -> Option<Option<bool>> {
		(self.generation == generation).then(|| self.insert(identity, generated))
	}

	/// Drops one verdict so the next query recomputes it.
	pub fn invalidate(&mut self, identity: &FileIdentity) -> Option<bool> {
		self.entries.swap_remove(identity)
	}

	/// Drops every verdict and advances the generation.
	///
	/// Returns how many dropped verdicts were `true`.
	pub fn invalidate_all(&mut self) -> usize {
		let generated = self.entries.values().filter(|generated| **generated).count();
		self.entries.clear();
		self.generation = self.generation.wrapping_add(1);
		generated
	}

	pub fn generation(&self) -> u64 {
		self.generation
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Identities currently cached as generated.
	pub fn generated(&self) -> impl Iterator<Item = &FileIdentity> {
		self.entries.iter().filter(|(_, generated)| **generated).map(|(identity, _)| identity)
	}

	/// Generated files as root-relative paths, or absolute paths outside every
	/// root. Feeds the read-only allow-list.
	pub fn enumerate_generated(&self, roots: &WorkspaceRoots) -> Vec<String> {
		self.generated().map(|identity| roots.display_path(identity)).collect()
	}
}

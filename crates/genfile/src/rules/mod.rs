//! Immutable classification rules.
//!
//! A [`RuleSet`] is built once from raw [`Settings`] and never mutated. A
//! configuration change builds a new instance which the engine swaps in whole,
//! so readers see either the old rules or the new ones.
//!
//! Construction never fails. Malformed entries are dropped, wrongly typed
//! bounds fall back to their defaults, and each problem is recorded as a
//! [`RuleWarning`] and logged.

mod wildcard;

use indexmap::IndexSet;
use regex::Regex;
use serde_json::Value;
use tracing::warn;
pub use wildcard::ExclusionPattern;

use crate::settings::{self, DecorationStyle, Settings, value_kind};

/// Byte bound applied when `maxSearchChars` is absent or invalid.
pub const DEFAULT_MAX_SCAN_BYTES: usize = 2048;
/// Line bound applied when `maxSearchLines` is absent or invalid.
pub const DEFAULT_MAX_SCAN_LINES: usize = 5;

/// Limits for one content scan. Zero disables the corresponding bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanBounds {
	pub max_bytes: usize,
	pub max_lines: usize,
}

impl ScanBounds {
	/// No byte or line limit.
	pub const UNBOUNDED: Self = Self { max_bytes: 0, max_lines: 0 };
}

impl Default for ScanBounds {
	fn default() -> Self {
		Self {
			max_bytes: DEFAULT_MAX_SCAN_BYTES,
			max_lines: DEFAULT_MAX_SCAN_LINES,
		}
	}
}

/// Non-fatal problem found while building a [`RuleSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleWarning {
	/// A pattern failed to compile and was dropped.
	InvalidPattern {
		key: &'static str,
		pattern: String,
		error: String,
	},
	/// A key held a value of the wrong type; its default applies.
	InvalidType {
		key: &'static str,
		expected: &'static str,
		got: &'static str,
	},
	/// One element of a list was not a string and was skipped.
	InvalidEntry {
		key: &'static str,
		index: usize,
		got: &'static str,
	},
}

impl std::fmt::Display for RuleWarning {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			RuleWarning::InvalidPattern { key, pattern, error } => {
				write!(f, "{key}: ignoring invalid pattern {pattern:?}: {error}")
			}
			RuleWarning::InvalidType { key, expected, got } => {
				write!(f, "{key}: expected {expected}, got {got}; using default")
			}
			RuleWarning::InvalidEntry { key, index, got } => {
				write!(f, "{key}[{index}]: expected string, got {got}; entry skipped")
			}
		}
	}
}

/// Loaded, validated classification rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
	exclusions: Vec<ExclusionPattern>,
	metadata_keys: IndexSet<String>,
	content_patterns: Vec<Regex>,
	bounds: ScanBounds,
	decoration: DecorationStyle,
	warnings: Vec<RuleWarning>,
}

impl RuleSet {
	/// Builds rules from the `generatedFiles` settings section.
	pub fn from_settings(settings: &Settings) -> Self {
		let mut warnings = Vec::new();

		let exclusions = string_list(settings, settings::EXCLUDE_PATTERNS, &mut warnings)
			.into_iter()
			.filter_map(|pattern| match ExclusionPattern::new(&pattern) {
				Ok(compiled) => Some(compiled),
				Err(error) => {
					warnings.push(RuleWarning::InvalidPattern {
						key: settings::EXCLUDE_PATTERNS,
						pattern,
						error: error.to_string(),
					});
					None
				}
			})
			.collect();

		let metadata_keys = string_list(settings, settings::GIT_ATTRIBUTES, &mut warnings)
			.into_iter()
			.map(|key| key.trim().to_owned())
			.filter(|key| !key.is_empty())
			.collect();

		let content_patterns = string_list(settings, settings::REGEX_PATTERNS, &mut warnings)
			.into_iter()
			.filter_map(|pattern| match Regex::new(&pattern) {
				Ok(regex) => Some(regex),
				Err(error) => {
					warnings.push(RuleWarning::InvalidPattern {
						key: settings::REGEX_PATTERNS,
						pattern,
						error: error.to_string(),
					});
					None
				}
			})
			.collect();

		let bounds = ScanBounds {
			max_bytes: bound(settings, settings::MAX_SEARCH_CHARS, DEFAULT_MAX_SCAN_BYTES, &mut warnings),
			max_lines: bound(settings, settings::MAX_SEARCH_LINES, DEFAULT_MAX_SCAN_LINES, &mut warnings),
		};

		for warning in &warnings {
			warn!(%warning, "generated-file rules");
		}

		Self {
			exclusions,
			metadata_keys,
			content_patterns,
			bounds,
			decoration: settings.decoration_style(),
			warnings,
		}
	}

	/// Exclusion patterns in configuration order.
	pub fn exclusions(&self) -> &[ExclusionPattern] {
		&self.exclusions
	}

	/// Attribute names queried per file.
	pub fn metadata_keys(&self) -> &IndexSet<String> {
		&self.metadata_keys
	}

	/// Content regexes in configuration order.
	pub fn content_patterns(&self) -> &[Regex] {
		&self.content_patterns
	}

	pub fn bounds(&self) -> ScanBounds {
		self.bounds
	}

	pub fn decoration(&self) -> &DecorationStyle {
		&self.decoration
	}

	/// Diagnostics collected while building these rules.
	pub fn warnings(&self) -> &[RuleWarning] {
		&self.warnings
	}

	/// Returns the first exclusion pattern matching `path`.
	pub fn excluded_by(&self, path: &str) -> Option<&ExclusionPattern> {
		self.exclusions.iter().find(|pattern| pattern.matches(path))
	}

	/// True when no step could ever report a file as generated.
	pub fn is_inert(&self) -> bool {
		self.metadata_keys.is_empty() && self.content_patterns.is_empty()
	}
}

fn string_list(settings: &Settings, key: &'static str, warnings: &mut Vec<RuleWarning>) -> Vec<String> {
	match settings.get(key) {
		None | Some(Value::Null) => Vec::new(),
		Some(Value::Array(items)) => items
			.iter()
			.enumerate()
			.filter_map(|(index, item)| match item {
				Value::String(text) => Some(text.clone()),
				other => {
					warnings.push(RuleWarning::InvalidEntry {
						key,
						index,
						got: value_kind(other),
					});
					None
				}
			})
			.collect(),
		Some(other) => {
			warnings.push(RuleWarning::InvalidType {
				key,
				expected: "array of strings",
				got: value_kind(other),
			});
			Vec::new()
		}
	}
}

fn bound(settings: &Settings, key: &'static str, default: usize, warnings: &mut Vec<RuleWarning>) -> usize {
	let Some(value) = settings.get(key) else {
		return default;
	};
	match value.as_u64() {
		Some(n) => usize::try_from(n).unwrap_or(usize::MAX),
		None if value.is_null() => default,
		None => {
			warnings.push(RuleWarning::InvalidType {
				key,
				expected: "non-negative integer",
				got: value_kind(value),
			});
			default
		}
	}
}

#[cfg(test)]
mod tests;

//! Raw configuration values for generated-file detection.
//!
//! Settings live under the `generatedFiles` namespace of a JSON settings
//! document. Both layouts found in editor settings files are accepted:
//!
//! ```json
//! {
//!     "generatedFiles": { "regexPatterns": ["@generated"] },
//!     "generatedFiles.maxSearchLines": 10
//! }
//! ```
//!
//! Flat dotted keys override the same key in the nested object. Values are kept
//! unvalidated; [`crate::RuleSet::from_settings`] decides what is usable.

use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, SettingsError};

/// Namespace every recognized key lives under.
pub const NAMESPACE: &str = "generatedFiles";

/// Content regular expressions.
pub const REGEX_PATTERNS: &str = "regexPatterns";
/// Attribute names queried through the metadata oracle.
pub const GIT_ATTRIBUTES: &str = "gitAttributes";
/// Wildcard exclusion list.
pub const EXCLUDE_PATTERNS: &str = "excludePatterns";
/// Byte bound for content scans.
pub const MAX_SEARCH_CHARS: &str = "maxSearchChars";
/// Line bound for content scans.
pub const MAX_SEARCH_LINES: &str = "maxSearchLines";
/// Decoration badge text.
pub const BADGE: &str = "badge";
/// Decoration color identifier.
pub const COLOR: &str = "color";

/// Badge used when none is configured.
pub const DEFAULT_BADGE: &str = "G";

/// Unvalidated key/value pairs of the `generatedFiles` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
	values: Map<String, Value>,
}

impl Settings {
	/// Creates an empty section; every rule falls back to its default.
	pub fn new() -> Self {
		Self::default()
	}

	/// Extracts the `generatedFiles` section from a whole settings document.
	pub fn from_document(document: Value) -> Result<Self> {
		let Value::Object(document) = document else {
			return Err(SettingsError::NotAnObject(value_kind(&document)));
		};

		let mut values = match document.get(NAMESPACE) {
			Some(Value::Object(section)) => section.clone(),
			_ => Map::new(),
		};

		let prefix = format!("{NAMESPACE}.");
		for (key, value) in document {
			if let Some(name) = key.strip_prefix(&prefix) {
				values.insert(name.to_owned(), value);
			}
		}

		Ok(Self { values })
	}

	/// Parses a JSON settings document.
	pub fn parse(input: &str) -> Result<Self> {
		Self::from_document(serde_json::from_str(input)?)
	}

	/// Loads a JSON settings document from disk.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|error| SettingsError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::parse(&content)
	}

	/// Sets one key of the section.
	pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
		self.values.insert(key.to_owned(), value.into());
		self
	}

	/// Returns the raw value stored under `key`.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.values.get(key)
	}

	/// Presentation settings passed through to the decoration collaborator.
	pub fn decoration_style(&self) -> DecorationStyle {
		let badge = self
			.get(BADGE)
			.and_then(Value::as_str)
			.filter(|badge| !badge.is_empty())
			.unwrap_or(DEFAULT_BADGE)
			.to_owned();
		let color = self.get(COLOR).and_then(Value::as_str).filter(|color| !color.is_empty()).map(str::to_owned);
		DecorationStyle { badge, color }
	}
}

/// Badge and color shown on generated files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecorationStyle {
	pub badge: String,
	pub color: Option<String>,
}

impl Default for DecorationStyle {
	fn default() -> Self {
		Self {
			badge: DEFAULT_BADGE.to_owned(),
			color: None,
		}
	}
}

/// Human-readable JSON type name for diagnostics.
pub(crate) fn value_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

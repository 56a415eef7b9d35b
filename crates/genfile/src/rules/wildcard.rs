//! Wildcard exclusion patterns.
//!
//! Deliberately simpler than glob: `*` matches any run of characters (path
//! separators included), `?` matches exactly one character, everything else is
//! literal. The whole path must match.

use regex::Regex;

/// One compiled exclusion pattern.
#[derive(Debug, Clone)]
pub struct ExclusionPattern {
	source: String,
	regex: Regex,
}

impl ExclusionPattern {
	/// Compiles a wildcard pattern.
	pub fn new(pattern: &str) -> Result<Self, regex::Error> {
		let regex = Regex::new(&wildcard_to_regex(pattern))?;
		Ok(Self {
			source: pattern.to_owned(),
			regex,
		})
	}

	/// The pattern as written in configuration.
	pub fn as_str(&self) -> &str {
		&self.source
	}

	/// Tests a root-relative (or absolute) path with `/` separators.
	pub fn matches(&self, path: &str) -> bool {
		self.regex.is_match(path)
	}
}

fn wildcard_to_regex(pattern: &str) -> String {
	let mut translated = String::with_capacity(pattern.len() * 2 + 2);
	translated.push('^');
	let mut utf8 = [0u8; 4];
	for ch in pattern.chars() {
		match ch {
			'*' => translated.push_str(".*"),
			'?' => translated.push('.'),
			_ => translated.push_str(&regex::escape(ch.encode_utf8(&mut utf8))),
		}
	}
	translated.push('$');
	translated
}

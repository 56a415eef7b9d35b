use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::settings::{EXCLUDE_PATTERNS, GIT_ATTRIBUTES, MAX_SEARCH_CHARS, MAX_SEARCH_LINES, REGEX_PATTERNS};

#[test]
fn empty_settings_use_default_bounds() {
	let rules = RuleSet::from_settings(&Settings::new());
	assert_eq!(rules.bounds(), ScanBounds::default());
	assert!(rules.is_inert());
	assert!(rules.exclusions().is_empty());
	assert!(rules.warnings().is_empty());
}

#[test]
fn invalid_regex_is_dropped_without_affecting_others() {
	let settings = Settings::new().with(REGEX_PATTERNS, json!(["@generated", "(unclosed", "DO NOT EDIT"]));
	let rules = RuleSet::from_settings(&settings);

	let kept: Vec<&str> = rules.content_patterns().iter().map(Regex::as_str).collect();
	assert_eq!(kept, vec!["@generated", "DO NOT EDIT"]);
	assert_eq!(rules.warnings().len(), 1);
	assert!(matches!(
		&rules.warnings()[0],
		RuleWarning::InvalidPattern { key: REGEX_PATTERNS, pattern, .. } if pattern == "(unclosed"
	));
}

#[test]
fn non_string_entries_are_skipped() {
	let settings = Settings::new().with(GIT_ATTRIBUTES, json!(["linguist-generated", 3, null, "generated"]));
	let rules = RuleSet::from_settings(&settings);

	let keys: Vec<&str> = rules.metadata_keys().iter().map(String::as_str).collect();
	assert_eq!(keys, vec!["linguist-generated", "generated"]);
	assert_eq!(
		rules.warnings(),
		&[
			RuleWarning::InvalidEntry {
				key: GIT_ATTRIBUTES,
				index: 1,
				got: "number"
			},
			RuleWarning::InvalidEntry {
				key: GIT_ATTRIBUTES,
				index: 2,
				got: "null"
			},
		]
	);
}

#[test]
fn metadata_keys_are_deduplicated_and_trimmed() {
	let settings = Settings::new().with(GIT_ATTRIBUTES, json!(["generated", " generated ", "", "vendored"]));
	let rules = RuleSet::from_settings(&settings);
	let keys: Vec<&str> = rules.metadata_keys().iter().map(String::as_str).collect();
	assert_eq!(keys, vec!["generated", "vendored"]);
}

#[test]
fn list_with_wrong_type_falls_back_to_empty() {
	let settings = Settings::new().with(EXCLUDE_PATTERNS, "*.lock");
	let rules = RuleSet::from_settings(&settings);
	assert!(rules.exclusions().is_empty());
	assert_eq!(
		rules.warnings(),
		&[RuleWarning::InvalidType {
			key: EXCLUDE_PATTERNS,
			expected: "array of strings",
			got: "string"
		}]
	);
}

#[test]
fn bounds_accept_zero_as_unbounded() {
	let settings = Settings::new().with(MAX_SEARCH_CHARS, 0).with(MAX_SEARCH_LINES, 0);
	assert_eq!(RuleSet::from_settings(&settings).bounds(), ScanBounds::UNBOUNDED);
}

#[test]
fn wrongly_typed_bounds_use_defaults() {
	let settings = Settings::new()
		.with(MAX_SEARCH_CHARS, "4096")
		.with(MAX_SEARCH_LINES, -2)
		.with(REGEX_PATTERNS, json!(["x"]));
	let rules = RuleSet::from_settings(&settings);
	assert_eq!(rules.bounds(), ScanBounds::default());
	assert_eq!(rules.warnings().len(), 2);
}

#[test]
fn explicit_bounds_are_kept() {
	let settings = Settings::new().with(MAX_SEARCH_CHARS, 1024).with(MAX_SEARCH_LINES, 2);
	assert_eq!(
		RuleSet::from_settings(&settings).bounds(),
		ScanBounds {
			max_bytes: 1024,
			max_lines: 2
		}
	);
}

#[test]
fn first_matching_exclusion_is_reported() {
	let settings = Settings::new().with(EXCLUDE_PATTERNS, json!(["*.md", "docs/*", "*.test.ts"]));
	let rules = RuleSet::from_settings(&settings);

	assert_eq!(rules.excluded_by("docs/readme.md").map(ExclusionPattern::as_str), Some("*.md"));
	assert_eq!(rules.excluded_by("gen.test.ts").map(ExclusionPattern::as_str), Some("*.test.ts"));
	assert!(rules.excluded_by("src/gen.ts").is_none());
}

#[test]
fn warnings_render_readably() {
	let warning = RuleWarning::InvalidEntry {
		key: REGEX_PATTERNS,
		index: 0,
		got: "object",
	};
	assert_eq!(warning.to_string(), "regexPatterns[0]: expected string, got object; entry skipped");
}

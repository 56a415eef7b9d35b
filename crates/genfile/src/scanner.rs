//! Bounded content scans.
//!
//! The byte bound is applied first, on the raw read. The decoded text is then
//! cut to the line bound, which may leave a partial last line from the byte
//! window in place.

use tracing::{debug, trace};

use crate::identity::FileIdentity;
use crate::rules::ScanBounds;
use crate::source::ContentSources;

/// Produces the text prefix that content patterns are tested against.
#[derive(Clone, Default)]
pub struct ContentScanner {
	sources: ContentSources,
}

impl ContentScanner {
	pub fn new(sources: ContentSources) -> Self {
		Self { sources }
	}

	/// Reads and decodes the leading part of `identity`.
	///
	/// Returns `None` when no source serves the scheme or the read fails.
	pub async fn scan(&self, identity: &FileIdentity, bounds: ScanBounds) -> Option<String> {
		let Some(source) = self.sources.select(identity) else {
			trace!(%identity, "no content source for scheme");
			return None;
		};

		let max_bytes = (bounds.max_bytes > 0).then_some(bounds.max_bytes);
		let bytes = match source.read_prefix(identity, max_bytes).await {
			Ok(bytes) => bytes,
			Err(error) => {
				debug!(%identity, %error, "content scan failed");
				return None;
			}
		};

		Some(truncate_lines(&String::from_utf8_lossy(&bytes), bounds.max_lines))
	}
}

/// Keeps the first `max_lines` lines of `text`.
///
/// Text within the bound is returned unchanged, line endings included. When
/// lines are cut, the separator ending the last kept line is dropped as well.
/// `0` returns the text unchanged.
pub fn truncate_lines(text: &str, max_lines: usize) -> String {
	if max_lines == 0 {
		return text.to_owned();
	}

	let mut lines = text.split_inclusive('\n');
	let kept: String = lines.by_ref().take(max_lines).collect();
	if lines.next().is_none() {
		return kept;
	}

	let kept = kept.strip_suffix('\n').unwrap_or(&kept);
	kept.strip_suffix('\r').unwrap_or(kept).to_owned()
}

#[cfg(test)]
mod tests {
	use std::io;
	use std::sync::Arc;

	use async_trait::async_trait;

	use super::*;
	use crate::source::PayloadReader;

	struct Payload(Vec<u8>);

	#[async_trait]
	impl PayloadReader for Payload {
		async fn read(&self, _identity: &FileIdentity) -> io::Result<Vec<u8>> {
			Ok(self.0.clone())
		}
	}

	fn bounds(max_bytes: usize, max_lines: usize) -> ScanBounds {
		ScanBounds { max_bytes, max_lines }
	}

	#[test]
	fn line_truncation() {
		assert_eq!(truncate_lines("a\nb\nc", 2), "a\nb");
		assert_eq!(truncate_lines("a\r\nb\r\nc", 2), "a\r\nb");
		assert_eq!(truncate_lines("a\nb\n\nd", 3), "a\nb\n");
		assert_eq!(truncate_lines("a\nb", 5), "a\nb");
		assert_eq!(truncate_lines("a\nb\nc", 0), "a\nb\nc");
		assert_eq!(truncate_lines("", 3), "");
	}

	#[test]
	fn text_within_line_bound_is_untouched() {
		assert_eq!(truncate_lines("a\nb\n", 5), "a\nb\n");
		assert_eq!(truncate_lines("a\nb\n", 2), "a\nb\n");
		assert_eq!(truncate_lines("// @generated\r\n", 5), "// @generated\r\n");
		assert_eq!(truncate_lines("a\r\nb\r\n", 2), "a\r\nb\r\n");
	}

	#[tokio::test]
	async fn byte_bound_then_line_bound() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("gen.ts");
		std::fs::write(&path, "line one\nline two\nline three\n").unwrap();
		let identity = FileIdentity::from_path(&path).unwrap();
		let scanner = ContentScanner::default();

		// Byte window ends inside line two; the partial line is kept.
		assert_eq!(scanner.scan(&identity, bounds(13, 5)).await.as_deref(), Some("line one\nline"));
		// Byte window covers everything; the line bound still applies.
		assert_eq!(scanner.scan(&identity, bounds(4096, 2)).await.as_deref(), Some("line one\nline two"));
		assert_eq!(
			scanner.scan(&identity, ScanBounds::UNBOUNDED).await.as_deref(),
			Some("line one\nline two\nline three\n")
		);
	}

	#[tokio::test]
	async fn invalid_utf8_is_replaced() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("blob.bin");
		std::fs::write(&path, b"\xff\xfe@generated\n").unwrap();
		let identity = FileIdentity::from_path(&path).unwrap();

		let text = ContentScanner::default().scan(&identity, bounds(0, 1)).await.unwrap();
		assert!(text.ends_with("@generated\n"));
		assert!(text.starts_with('\u{FFFD}'));
	}

	#[tokio::test]
	async fn unreadable_file_is_absent() {
		let dir = tempfile::tempdir().unwrap();
		let identity = FileIdentity::from_path(dir.path().join("missing.ts")).unwrap();
		assert_eq!(ContentScanner::default().scan(&identity, ScanBounds::default()).await, None);
	}

	#[tokio::test]
	async fn virtual_scheme_honors_same_bounds() {
		let sources = ContentSources::new().with_payload_reader(Arc::new(Payload(b"a\nb\nc\nd".to_vec())));
		let scanner = ContentScanner::new(sources);
		let identity: FileIdentity = "untitled:Untitled-1".parse().unwrap();

		assert_eq!(scanner.scan(&identity, bounds(5, 0)).await.as_deref(), Some("a\nb\nc"));
		assert_eq!(scanner.scan(&identity, bounds(0, 2)).await.as_deref(), Some("a\nb"));
	}

	#[tokio::test]
	async fn virtual_scheme_without_reader_is_absent() {
		let identity: FileIdentity = "untitled:Untitled-1".parse().unwrap();
		assert_eq!(ContentScanner::default().scan(&identity, ScanBounds::default()).await, None);
	}
}

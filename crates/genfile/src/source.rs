//! Readable content sources.
//!
//! The scanner reads through one capability, [`ContentSource`], with two
//! implementations picked by identity scheme:
//!
//! - [`FileHandleSource`] opens `file:` identities and reads only the prefix it
//!   needs.
//! - [`PayloadSource`] wraps a host [`PayloadReader`] for virtual schemes; the
//!   whole payload is fetched and then cut to the same bound.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;

use crate::identity::FileIdentity;

/// Reads the leading bytes of a file.
#[async_trait]
pub trait ContentSource: Send + Sync {
	/// Returns at most `max_bytes` leading bytes, or everything when `None`.
	async fn read_prefix(&self, identity: &FileIdentity, max_bytes: Option<usize>) -> io::Result<Vec<u8>>;
}

/// Generic whole-payload read offered by the host for non-`file:` schemes.
#[async_trait]
pub trait PayloadReader: Send + Sync {
	async fn read(&self, identity: &FileIdentity) -> io::Result<Vec<u8>>;
}

/// Direct file-handle reads for `file:` identities.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileHandleSource;

#[async_trait]
impl ContentSource for FileHandleSource {
	async fn read_prefix(&self, identity: &FileIdentity, max_bytes: Option<usize>) -> io::Result<Vec<u8>> {
		let path = identity
			.to_file_path()
			.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, format!("not a file identity: {identity}")))?;

		let Some(limit) = max_bytes else {
			return tokio::fs::read(&path).await;
		};

		// The handle is released when `file` drops, on every path out of here.
		let file = tokio::fs::File::open(&path).await?;
		let mut buf = Vec::with_capacity(limit.min(64 * 1024));
		file.take(limit as u64).read_to_end(&mut buf).await?;
		Ok(buf)
	}
}

/// Adapts a [`PayloadReader`] to the [`ContentSource`] bound semantics.
#[derive(Clone)]
pub struct PayloadSource {
	reader: Arc<dyn PayloadReader>,
}

impl PayloadSource {
	pub fn new(reader: Arc<dyn PayloadReader>) -> Self {
		Self { reader }
	}
}

#[async_trait]
impl ContentSource for PayloadSource {
	async fn read_prefix(&self, identity: &FileIdentity, max_bytes: Option<usize>) -> io::Result<Vec<u8>> {
		let mut payload = self.reader.read(identity).await?;
		if let Some(limit) = max_bytes {
			payload.truncate(limit);
		}
		Ok(payload)
	}
}

/// Scheme-based selection between the file and payload capabilities.
#[derive(Clone)]
pub struct ContentSources {
	file: Arc<dyn ContentSource>,
	other: Option<Arc<dyn ContentSource>>,
}

impl Default for ContentSources {
	fn default() -> Self {
		Self::new()
	}
}

impl ContentSources {
	/// File-handle reads only; virtual schemes are unreadable until a payload
	/// reader is attached.
	pub fn new() -> Self {
		Self {
			file: Arc::new(FileHandleSource),
			other: None,
		}
	}

	/// Serves non-`file:` schemes through `reader`.
	#[must_use]
	pub fn with_payload_reader(mut self, reader: Arc<dyn PayloadReader>) -> Self {
		self.other = Some(Arc::new(PayloadSource::new(reader)));
		self
	}

	/// Replaces the `file:` capability.
	#[must_use]
	pub fn with_file_source(mut self, source: Arc<dyn ContentSource>) -> Self {
		self.file = source;
		self
	}

	/// Capability responsible for `identity`, if any.
	pub fn select(&self, identity: &FileIdentity) -> Option<&dyn ContentSource> {
		if identity.is_file() { Some(self.file.as_ref()) } else { self.other.as_deref() }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct FixedPayload(&'static [u8]);

	#[async_trait]
	impl PayloadReader for FixedPayload {
		async fn read(&self, _identity: &FileIdentity) -> io::Result<Vec<u8>> {
			Ok(self.0.to_vec())
		}
	}

	fn write_temp(content: &[u8]) -> (tempfile::TempDir, FileIdentity) {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("data.txt");
		std::fs::write(&path, content).unwrap();
		let identity = FileIdentity::from_path(&path).unwrap();
		(dir, identity)
	}

	#[tokio::test]
	async fn file_source_reads_at_most_limit() {
		let (_dir, identity) = write_temp(&[b'x'; 10_000]);
		let bytes = FileHandleSource.read_prefix(&identity, Some(100)).await.unwrap();
		assert_eq!(bytes.len(), 100);
	}

	#[tokio::test]
	async fn file_source_uses_actual_length_for_short_files() {
		let (_dir, identity) = write_temp(b"short");
		let bytes = FileHandleSource.read_prefix(&identity, Some(4096)).await.unwrap();
		assert_eq!(bytes, b"short");
	}

	#[tokio::test]
	async fn file_source_reads_whole_file_without_limit() {
		let (_dir, identity) = write_temp(&[b'y'; 5000]);
		let bytes = FileHandleSource.read_prefix(&identity, None).await.unwrap();
		assert_eq!(bytes.len(), 5000);
	}

	#[tokio::test]
	async fn missing_file_is_an_error() {
		let dir = tempfile::tempdir().unwrap();
		let identity = FileIdentity::from_path(dir.path().join("gone.txt")).unwrap();
		let err = FileHandleSource.read_prefix(&identity, Some(10)).await.unwrap_err();
		assert_eq!(err.kind(), io::ErrorKind::NotFound);
	}

	#[tokio::test]
	async fn payload_source_applies_byte_bound() {
		let source = PayloadSource::new(Arc::new(FixedPayload(b"0123456789")));
		let identity: FileIdentity = "vscode-remote://host/a.ts".parse().unwrap();
		assert_eq!(source.read_prefix(&identity, Some(4)).await.unwrap(), b"0123");
		assert_eq!(source.read_prefix(&identity, None).await.unwrap(), b"0123456789");
	}

	#[test]
	fn selection_follows_scheme() {
		let remote: FileIdentity = "untitled:Untitled-1".parse().unwrap();
		assert!(ContentSources::new().select(&remote).is_none());

		let sources = ContentSources::new().with_payload_reader(Arc::new(FixedPayload(b"")));
		assert!(sources.select(&remote).is_some());
	}
}

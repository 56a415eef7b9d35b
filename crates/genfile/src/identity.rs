//! File identities and project roots.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use url::Url;

/// Canonical key for one file: its location plus addressing scheme.
///
/// Two identities are equal exactly when their URL serializations are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FileIdentity(Url);

impl FileIdentity {
	/// Identity for an absolute filesystem path.
	///
	/// Returns `None` for relative paths.
	pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
		Url::from_file_path(path.as_ref()).ok().map(Self)
	}

	pub fn from_url(url: Url) -> Self {
		Self(url)
	}

	pub fn url(&self) -> &Url {
		&self.0
	}

	/// Canonical string form.
	pub fn as_str(&self) -> &str {
		self.0.as_str()
	}

	pub fn scheme(&self) -> &str {
		self.0.scheme()
	}

	/// True for `file:` identities, the only ones attribute queries accept.
	pub fn is_file(&self) -> bool {
		self.0.scheme() == "file"
	}

	/// Filesystem path for `file:` identities.
	pub fn to_file_path(&self) -> Option<PathBuf> {
		if self.is_file() { self.0.to_file_path().ok() } else { None }
	}
}

impl fmt::Display for FileIdentity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for FileIdentity {
	type Err = url::ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Url::parse(s).map(Self)
	}
}

/// Project roots used to relativize paths and to scope attribute queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceRoots {
	roots: Vec<PathBuf>,
}

impl WorkspaceRoots {
	pub fn new<I, P>(roots: I) -> Self
	where
		I: IntoIterator<Item = P>,
		P: Into<PathBuf>,
	{
		Self {
			roots: roots.into_iter().map(Into::into).collect(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.roots.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Path> {
		self.roots.iter().map(PathBuf::as_path)
	}

	/// Innermost root containing `path`, compared component-wise.
	pub fn containing(&self, path: &Path) -> Option<&Path> {
		self.roots
			.iter()
			.filter(|root| path.starts_with(root))
			.max_by_key(|root| root.components().count())
			.map(PathBuf::as_path)
	}

	/// Path used for exclusion matching and allow-list output.
	///
	/// `file:` identities resolve to a `/`-separated path relative to their
	/// containing root, or to their absolute path when no root contains them.
	/// Other schemes resolve to the URL path component.
	pub fn display_path(&self, identity: &FileIdentity) -> String {
		let Some(path) = identity.to_file_path() else {
			return identity.url().path().to_owned();
		};

		match self.containing(&path).and_then(|root| path.strip_prefix(root).ok()) {
			Some(relative) => slash_joined(relative),
			None => path.to_string_lossy().into_owned(),
		}
	}
}

fn slash_joined(path: &Path) -> String {
	path.components()
		.map(|component| component.as_os_str().to_string_lossy())
		.collect::<Vec<_>>()
		.join("/")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[cfg(unix)]
	#[test]
	fn file_identity_round_trips_path() {
		let identity = FileIdentity::from_path("/work/src/gen.ts").unwrap();
		assert_eq!(identity.as_str(), "file:///work/src/gen.ts");
		assert!(identity.is_file());
		assert_eq!(identity.to_file_path(), Some(PathBuf::from("/work/src/gen.ts")));
	}

	#[test]
	fn relative_paths_have_no_identity() {
		assert!(FileIdentity::from_path("src/gen.ts").is_none());
	}

	#[test]
	fn virtual_identity_has_no_file_path() {
		let identity: FileIdentity = "git:/work/gen.ts?ref=HEAD".parse().unwrap();
		assert!(!identity.is_file());
		assert_eq!(identity.to_file_path(), None);
		assert_eq!(WorkspaceRoots::default().display_path(&identity), "/work/gen.ts");
	}

	#[test]
	fn equality_follows_canonical_form() {
		let a: FileIdentity = "file:///work/a.ts".parse().unwrap();
		let b: FileIdentity = "FILE:///work/a.ts".parse().unwrap();
		let c: FileIdentity = "file:///work/b.ts".parse().unwrap();
		assert_eq!(a, b);
		assert_ne!(a, c);
	}

	#[cfg(unix)]
	#[test]
	fn innermost_root_wins() {
		let roots = WorkspaceRoots::new(["/work", "/work/packages/app", "/other"]);
		assert_eq!(roots.containing(Path::new("/work/packages/app/src/x.ts")), Some(Path::new("/work/packages/app")));
		assert_eq!(roots.containing(Path::new("/work/readme.md")), Some(Path::new("/work")));
		assert_eq!(roots.containing(Path::new("/workspace/x.ts")), None);
	}

	#[cfg(unix)]
	#[test]
	fn display_path_is_root_relative_or_absolute() {
		let roots = WorkspaceRoots::new(["/work"]);
		let inside = FileIdentity::from_path("/work/src/gen.ts").unwrap();
		let outside = FileIdentity::from_path("/elsewhere/gen.ts").unwrap();
		assert_eq!(roots.display_path(&inside), "src/gen.ts");
		assert_eq!(roots.display_path(&outside), "/elsewhere/gen.ts");
	}
}

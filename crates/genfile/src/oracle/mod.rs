//! Per-path attribute lookup.
//!
//! The default oracle shells out to `git check-attr`, which resolves
//! `.gitattributes` (and `info/attributes`) the same way git itself does.
//! Queries run with the project root as working directory and a hard timeout;
//! every failure is absorbed here and reported as "no attributes".

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::error::OracleError;

/// Wall-clock budget for one attribute query.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// One `path: attribute: value` triple reported by the attribute store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
	pub path: String,
	pub name: String,
	pub value: String,
}

impl Attribute {
	/// `set` and `true` count as truthy; `unset`, `unspecified` and every other
	/// value do not.
	pub fn is_truthy(&self) -> bool {
		is_truthy(&self.value)
	}
}

pub fn is_truthy(value: &str) -> bool {
	matches!(value, "set" | "true")
}

/// Source of recorded per-path attributes.
#[async_trait]
pub trait MetadataOracle: Send + Sync {
	/// Looks up `keys` for `path`, with `cwd` as the working context.
	///
	/// Never called with empty `keys`. Failures yield an empty list.
	async fn query(&self, path: &Path, cwd: &Path, keys: &[String]) -> Vec<Attribute>;
}

/// [`MetadataOracle`] backed by `git check-attr`.
#[derive(Debug, Clone)]
pub struct GitAttributes {
	program: PathBuf,
	timeout: Duration,
}

impl Default for GitAttributes {
	fn default() -> Self {
		Self::new()
	}
}

impl GitAttributes {
	pub fn new() -> Self {
		Self {
			program: PathBuf::from("git"),
			timeout: DEFAULT_TIMEOUT,
		}
	}

	/// Uses a specific git executable instead of the one on `PATH`.
	#[must_use]
	pub fn program(mut self, program: impl Into<PathBuf>) -> Self {
		self.program = program.into();
		self
	}

	#[must_use]
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	async fn run(&self, path: &Path, cwd: &Path, keys: &[String]) -> Result<String, OracleError> {
		let mut cmd = Command::new(&self.program);
		cmd.arg("check-attr")
			.args(keys)
			.arg("--")
			.arg(path)
			.current_dir(cwd)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true);

		let child = cmd.spawn().map_err(|error| OracleError::Spawn {
			program: self.program.display().to_string(),
			error,
		})?;

		// Dropping the pending future drops the child, which kills it.
		let output = tokio::time::timeout(self.timeout, child.wait_with_output())
			.await
			.map_err(|_| OracleError::Timeout(self.timeout))??;

		if !output.status.success() {
			return Err(OracleError::Exit {
				status: output.status,
				stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
			});
		}

		Ok(String::from_utf8_lossy(&output.stdout).into_owned())
	}
}

#[async_trait]
impl MetadataOracle for GitAttributes {
	async fn query(&self, path: &Path, cwd: &Path, keys: &[String]) -> Vec<Attribute> {
		if keys.is_empty() {
			return Vec::new();
		}

		match self.run(path, cwd, keys).await {
			Ok(stdout) => {
				let attributes = parse_check_attr(&stdout);
				trace!(path = %path.display(), count = attributes.len(), "check-attr");
				attributes
			}
			Err(error) => {
				debug!(path = %path.display(), cwd = %cwd.display(), %error, "check-attr failed");
				Vec::new()
			}
		}
	}
}

/// Parses `git check-attr` output.
///
/// Fields are split from the right so paths containing `": "` survive. Lines
/// with fewer than three fields are skipped.
pub fn parse_check_attr(stdout: &str) -> Vec<Attribute> {
	stdout.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<Attribute> {
	let mut fields = line.rsplitn(3, ": ");
	let value = fields.next()?.trim_end();
	let name = fields.next()?;
	let path = fields.next()?;
	Some(Attribute {
		path: path.to_owned(),
		name: name.to_owned(),
		value: value.to_owned(),
	})
}

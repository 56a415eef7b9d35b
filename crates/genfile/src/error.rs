//! Error types for settings loading, attribute queries and host sinks.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when reading a settings document.
#[derive(Debug, Error)]
pub enum SettingsError {
	/// Error reading a settings file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// The document is not valid JSON.
	#[error("settings parse error: {0}")]
	Json(#[from] serde_json::Error),

	/// The document parsed, but its top level is not an object.
	#[error("settings document must be an object, got {0}")]
	NotAnObject(&'static str),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Failure of one attribute-store invocation.
///
/// Never reaches the engine: [`crate::GitAttributes`] logs it and reports
/// "no attributes".
#[derive(Debug, Error)]
pub enum OracleError {
	/// The attribute tool could not be started.
	#[error("failed to spawn {program}: {error}")]
	Spawn {
		/// Program that was executed.
		program: String,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// The query exceeded its wall-clock budget and was killed.
	#[error("attribute query timed out after {0:?}")]
	Timeout(Duration),

	/// The tool ran but reported failure.
	#[error("attribute query exited with {status}: {stderr}")]
	Exit {
		/// Exit status of the child.
		status: ExitStatus,
		/// Captured standard error, trimmed.
		stderr: String,
	},

	/// Waiting on the child failed.
	#[error("I/O error collecting attribute query output: {0}")]
	Io(#[from] std::io::Error),
}

/// Failure reported by a host read-only sink.
#[derive(Debug, Error)]
#[error("read-only sync failed: {0}")]
pub struct SinkError(pub String);

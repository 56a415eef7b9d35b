//! Generated-file classifier command line.
//!
//! `list` walks the project roots and prints every generated file, in the same
//! form pushed to a read-only allow-list. `check` explains the verdict for
//! individual paths.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ignore::WalkBuilder;
use serde::Serialize;
use tracing::{debug, info, warn};
use xeno_genfile::{ClassificationEngine, FileIdentity, MatchReason, RuleSet, Settings, Verdict, WorkspaceRoots};

/// Generated-file classifier command line arguments.
#[derive(Parser, Debug)]
#[command(name = "xeno-genfile")]
#[command(about = "Classify files as generated or hand-authored")]
struct Args {
	/// Project root; repeat for multi-root workspaces. Defaults to the current
	/// directory.
	#[arg(long = "root", value_name = "PATH", global = true)]
	roots: Vec<PathBuf>,

	/// JSON settings document containing a `generatedFiles` section
	#[arg(long, value_name = "PATH", global = true)]
	settings: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long, global = true)]
	verbose: bool,

	/// Print JSON instead of text
	#[arg(long, global = true)]
	json: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Walk the roots and list every generated file
	List,
	/// Explain the verdict for each path
	Check {
		#[arg(required = true, value_name = "PATH")]
		paths: Vec<PathBuf>,
	},
}

/// One `check` result.
#[derive(Debug, Serialize)]
struct Report {
	path: String,
	#[serde(flatten)]
	verdict: Verdict,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
	let args = Args::parse();

	setup_tracing(args.verbose);

	let cwd = std::env::current_dir().context("failed to resolve current directory")?;
	let settings = match &args.settings {
		Some(path) => Settings::load(path).with_context(|| format!("failed to load settings from {}", path.display()))?,
		None => Settings::new(),
	};
	let rules = RuleSet::from_settings(&settings);
	let roots = resolve_roots(&args.roots, &cwd);
	debug!(roots = ?roots, "resolved project roots");

	let engine = ClassificationEngine::new(rules, WorkspaceRoots::new(roots.iter().cloned()));

	match args.command {
		Command::List => {
			let files = collect_files(&roots);
			info!(count = files.len(), "classifying files");
			for path in files {
				let Some(identity) = FileIdentity::from_path(&path) else {
					warn!(path = %path.display(), "cannot express path as a file URL");
					continue;
				};
				engine.classify(&identity).await;
			}

			let generated = engine.enumerate_generated();
			if args.json {
				println!("{}", serde_json::to_string_pretty(&generated)?);
			} else {
				for path in generated {
					println!("{path}");
				}
			}
		}
		Command::Check { paths } => {
			let mut reports = Vec::with_capacity(paths.len());
			for path in paths {
				let absolute = absolutize(&path, &cwd);
				let identity = FileIdentity::from_path(&absolute)
					.with_context(|| format!("cannot express {} as a file URL", absolute.display()))?;
				reports.push(Report {
					path: path.display().to_string(),
					verdict: engine.explain(&identity).await,
				});
			}

			if args.json {
				println!("{}", serde_json::to_string_pretty(&reports)?);
			} else {
				for report in &reports {
					println!("{}", render_report(report));
				}
			}
		}
	}

	Ok(())
}

/// Absolute roots, defaulting to `cwd`.
fn resolve_roots(roots: &[PathBuf], cwd: &Path) -> Vec<PathBuf> {
	if roots.is_empty() {
		return vec![cwd.to_path_buf()];
	}
	roots.iter().map(|root| absolutize(root, cwd)).collect()
}

/// Joins `path` onto `cwd` and folds `.` and `..` lexically, so paths given
/// relative to the shell still fall under the roots they name.
fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
	let mut absolute = PathBuf::new();
	for component in cwd.join(path).components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				if matches!(absolute.components().next_back(), Some(Component::Normal(_))) {
					absolute.pop();
				}
			}
			other => absolute.push(other),
		}
	}
	absolute
}

/// Regular files under `roots`, honouring ignore files.
fn collect_files(roots: &[PathBuf]) -> Vec<PathBuf> {
	let mut files = Vec::new();
	for root in roots {
		let walker = WalkBuilder::new(root).standard_filters(true).follow_links(false).build();
		for entry in walker {
			let entry = match entry {
				Ok(entry) => entry,
				Err(err) => {
					warn!(error = %err, "walk entry error");
					continue;
				}
			};
			if entry.file_type().is_some_and(|file_type| file_type.is_file()) {
				files.push(entry.into_path());
			}
		}
	}
	files
}

fn render_report(report: &Report) -> String {
	let status = if report.verdict.generated { "generated" } else { "not generated" };
	match &report.verdict.reason {
		None => format!("{}: {status}", report.path),
		Some(MatchReason::Excluded { pattern }) => format!("{}: {status} (excluded by `{pattern}`)", report.path),
		Some(MatchReason::Attribute { name, value }) => format!("{}: {status} (attribute {name}={value})", report.path),
		Some(MatchReason::Content { pattern }) => format!("{}: {status} (content matches `{pattern}`)", report.path),
	}
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_env("XENO_LOG")
		.or_else(|_| EnvFilter::try_from_default_env())
		.unwrap_or_else(|_| {
			if verbose {
				EnvFilter::new("xeno_genfile=trace,debug")
			} else {
				EnvFilter::new("warn")
			}
		});

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(verbose)
		.init();
}

#[cfg(test)]
mod tests {
	use std::fs;

	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn roots_default_to_cwd() {
		let cwd = PathBuf::from("/work");
		assert_eq!(resolve_roots(&[], &cwd), vec![PathBuf::from("/work")]);
		assert_eq!(
			resolve_roots(&[PathBuf::from("api"), PathBuf::from("/other")], &cwd),
			vec![PathBuf::from("/work/api"), PathBuf::from("/other")]
		);
	}

	#[cfg(unix)]
	#[test]
	fn relative_segments_fold_into_roots() {
		let cwd = PathBuf::from("/work/api");
		assert_eq!(absolutize(Path::new("../repo/gen.ts"), &cwd), PathBuf::from("/work/repo/gen.ts"));
		assert_eq!(absolutize(Path::new("./src/../gen.ts"), &cwd), PathBuf::from("/work/api/gen.ts"));
		assert_eq!(absolutize(Path::new("/../../etc"), &cwd), PathBuf::from("/etc"));
		assert_eq!(resolve_roots(&[PathBuf::from("..")], &cwd), vec![PathBuf::from("/work")]);

		let roots = WorkspaceRoots::new(resolve_roots(&[PathBuf::from("../repo")], &cwd));
		let identity = FileIdentity::from_path(absolutize(Path::new("../repo/src/gen.ts"), &cwd)).unwrap();
		assert_eq!(roots.display_path(&identity), "src/gen.ts");
	}

	#[test]
	fn walk_honours_gitignore() {
		let dir = tempfile::tempdir().expect("create tempdir");
		let root = dir.path();
		fs::create_dir(root.join(".git")).expect("create .git");
		fs::write(root.join(".gitignore"), "target/\n").expect("write .gitignore");
		fs::create_dir_all(root.join("src")).expect("create src");
		fs::create_dir_all(root.join("target")).expect("create target");
		fs::write(root.join("src/gen.ts"), "// @generated\n").expect("write gen.ts");
		fs::write(root.join("target/out.ts"), "// @generated\n").expect("write out.ts");

		let files = collect_files(&[root.to_path_buf()]);
		assert_eq!(files, vec![root.join("src/gen.ts")]);
	}

	#[test]
	fn report_lines_name_the_deciding_rule() {
		let report = |generated, reason| Report {
			path: "src/gen.ts".to_owned(),
			verdict: Verdict { generated, reason },
		};

		assert_eq!(render_report(&report(false, None)), "src/gen.ts: not generated");
		assert_eq!(
			render_report(&report(
				true,
				Some(MatchReason::Attribute {
					name: "generated".to_owned(),
					value: "set".to_owned()
				})
			)),
			"src/gen.ts: generated (attribute generated=set)"
		);
		assert_eq!(
			render_report(&report(false, Some(MatchReason::Excluded { pattern: "*.ts".to_owned() }))),
			"src/gen.ts: not generated (excluded by `*.ts`)"
		);
		assert_eq!(
			render_report(&report(true, Some(MatchReason::Content { pattern: "@generated".to_owned() }))),
			"src/gen.ts: generated (content matches `@generated`)"
		);
	}

	#[test]
	fn json_report_flattens_verdict() {
		let report = Report {
			path: "gen.ts".to_owned(),
			verdict: Verdict {
				generated: true,
				reason: Some(MatchReason::Content {
					pattern: "@generated".to_owned(),
				}),
			},
		};
		assert_eq!(
			serde_json::to_value(&report).unwrap(),
			serde_json::json!({
				"path": "gen.ts",
				"generated": true,
				"reason": { "kind": "content", "pattern": "@generated" }
			})
		);
	}
}

#![cfg_attr(test, allow(unused_crate_dependencies))]
//! Generated-file classification.
//!
//! Decides whether a file is machine-produced ("generated") or hand-authored,
//! and keeps that verdict current while files and configuration change.
//!
//! # Decision procedure
//!
//! ```text
//! FileIdentity
//!      │
//!      ▼
//! exclusion patterns ──match──▶ false
//!      │
//!      ▼
//! ClassificationCache ──hit──▶ cached verdict
//!      │
//!      ▼
//! MetadataOracle (git check-attr) ──truthy──▶ true
//!      │
//!      ▼
//! ContentScanner (bounded read + regex) ──match──▶ true
//!      │
//!      ▼
//!    false
//! ```
//!
//! Every step whose rule collection is empty is skipped outright. Lower-level
//! failures (process errors, unreadable files) count as "no match"; classification
//! itself never fails.
//!
//! # Components
//!
//! - [`RuleSet`]: immutable rules built from raw [`Settings`].
//! - [`MetadataOracle`]: attribute lookup, [`GitAttributes`] by default.
//! - [`ContentScanner`]: bounded prefix read through a [`ContentSource`].
//! - [`ClassificationEngine`]: precedence, caching and notifications.
//! - [`ChangeCoordinator`]: maps host events onto engine entry points.

pub mod cache;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod identity;
pub mod notify;
pub mod oracle;
pub mod rules;
pub mod scanner;
pub mod settings;
pub mod source;

pub use cache::ClassificationCache;
pub use coordinator::{ChangeCoordinator, FileDecoration, HostEvent, ReadOnlySink};
pub use engine::{ClassificationEngine, MatchReason, Verdict};
pub use error::{OracleError, SettingsError, SinkError};
pub use identity::{FileIdentity, WorkspaceRoots};
pub use notify::{Notification, Notifier};
pub use oracle::{Attribute, GitAttributes, MetadataOracle};
pub use rules::{ExclusionPattern, RuleSet, RuleWarning, ScanBounds};
pub use scanner::ContentScanner;
pub use settings::{DecorationStyle, Settings};
pub use source::{ContentSource, ContentSources, FileHandleSource, PayloadReader, PayloadSource};

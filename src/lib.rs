//! Sessions - local, file-based session memory for AI-assisted development
//!
//! Every working session leaves a markdown file with YAML frontmatter: what
//! it set out to do, which files it touched, how it relates to earlier
//! sessions. Longer write-ups live next to it as artifacts. Nothing but the
//! filesystem is involved, so the history is diffable and reviewable like
//! any other source file.
//!
//! # Layout
//!
//! | Layout | Session file | Artifacts |
//! |--------|--------------|-----------|
//! | `sharded` | `sessions/YYYY-MM/<id>.md` | `artifacts/YYYY-MM/<id>/<file>` |
//! | `flat` | `<id>.md` | `<id>/<file>` |
//!
//! Paths are relative to `.sessions/`. Keys are `<id>` for a session and
//! `<id>/<file>` for an artifact; [`KeyResolver`] maps between the two.
//!
//! # Quick Start
//!
//! ```no_run
//! use sessions::{KeyResolver, Layout, SessionStore};
//!
//! let store = SessionStore::new(KeyResolver::new(".sessions", Layout::Sharded));
//! let report = store.scan().unwrap();
//! for session in &report.sessions {
//!     println!("{}  {}", session.session_id, session.summary_line());
//! }
//! for warning in &report.warnings {
//!     eprintln!("{}", warning);
//! }
//! ```

pub mod codec;
pub mod commands;
pub mod config;
pub mod error;
pub mod frontmatter;
pub mod git;
pub mod init;
pub mod keys;
pub mod linking;
pub mod model;
pub mod query;
pub mod root;
pub mod store;

pub use config::Config;
pub use error::{Result, SessionsError};
pub use keys::{Key, KeyResolver, Layout};
pub use model::{Artifact, ArtifactRef, ArtifactStatus, FileAction, FileChange, Session};
pub use query::{QueryFilter, QueryMatch};
pub use store::{ScanReport, ScanWarning, SessionStore};

//! Command handlers
//!
//! Each handler takes the [`Workspace`] it operates on, its own options
//! struct and the writer for normal output. Piped stdin is read once by the
//! binary and passed in as `Option<String>`. Handlers return an [`Outcome`]
//! so the binary can tell "found nothing" apart from success.

use std::fmt;
use std::path::PathBuf;

use colored::Colorize;

use crate::config::Config;
use crate::error::{Result, SessionsError};
use crate::keys::KeyResolver;
use crate::root::Location;
use crate::store::{ScanReport, SessionStore};

pub mod artifact;
pub mod check;
pub mod context;
pub mod edit;
pub mod link;
pub mod list;
pub mod new;
pub mod query;
pub mod status;
pub mod validate;

/// How a command finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// Ran correctly but had nothing to show
    Empty,
}

/// An initialized sessions directory and its settings
#[derive(Debug, Clone)]
pub struct Workspace {
    pub project_root: PathBuf,
    pub sessions_dir: PathBuf,
    pub config: Config,
    pub store: SessionStore,
}

impl Workspace {
    /// Open an existing sessions directory, loading its config
    pub fn open(location: &Location) -> Result<Self> {
        if !location.sessions_dir.is_dir() {
            return Err(SessionsError::NotInitialized(location.sessions_dir.clone()));
        }
        let config = Config::load(&location.sessions_dir)?;
        let store = SessionStore::new(KeyResolver::new(&location.sessions_dir, config.layout));
        Ok(Self {
            project_root: location.project_root.clone(),
            sessions_dir: location.sessions_dir.clone(),
            config,
            store,
        })
    }

    /// Scan all sessions, reporting skipped files on stderr
    pub fn scan(&self) -> Result<ScanReport> {
        let report = self.store.scan()?;
        report.warnings.iter().for_each(print_warning);
        Ok(report)
    }
}

/// Print a non-fatal problem to stderr
pub fn print_warning(message: impl fmt::Display) {
    eprintln!("{} {}", "warning:".yellow().bold(), message);
}

/// Split a comma-separated tag list, dropping blanks
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Ordered union of two tag lists, first list first, without duplicates
pub fn merge_tags(first: &[String], second: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(first.len() + second.len());
    for tag in first.iter().chain(second) {
        if !merged.contains(tag) {
            merged.push(tag.clone());
        }
    }
    merged
}

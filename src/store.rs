//! Session store: scanning and persisting records under one sessions directory
//!
//! Bulk scans tolerate bad files. A record that fails to parse, or a shard
//! directory that cannot be read, becomes a [`ScanWarning`] and the scan
//! carries on. Single-record reads and writes fail hard instead.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::codec;
use crate::error::{Result, SessionsError};
use crate::keys::{KeyResolver, Layout};
use crate::model::{Artifact, ArtifactRef, Session};

/// A file or directory skipped during a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skipping {}: {}", self.path.display(), self.message)
    }
}

/// Result of a scan: every readable session, newest first, plus what was skipped
#[derive(Debug, Default)]
pub struct ScanReport {
    pub sessions: Vec<Session>,
    pub warnings: Vec<ScanWarning>,
}

impl ScanReport {
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn find(&self, session_id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.session_id == session_id)
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    resolver: KeyResolver,
}

impl SessionStore {
    pub fn new(resolver: KeyResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &KeyResolver {
        &self.resolver
    }

    /// Load every session, sorted by id descending (string order)
    pub fn scan(&self) -> Result<ScanReport> {
        let mut report = ScanReport::default();

        for path in self.session_files(&mut report.warnings)? {
            match codec::read::<Session>(&path) {
                Ok(mut session) => {
                    if session.session_id.is_empty() {
                        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                            session.session_id = stem.to_string();
                        }
                    }
                    report.sessions.push(session);
                }
                Err(e) => report.warnings.push(ScanWarning {
                    path: path.clone(),
                    message: parse_message(e),
                }),
            }
        }

        report
            .sessions
            .sort_by(|a, b| b.session_id.cmp(&a.session_id));
        debug!(
            sessions = report.sessions.len(),
            skipped = report.warnings.len(),
            "scanned {}",
            self.resolver.root().display()
        );
        Ok(report)
    }

    /// The lexicographically greatest session id on disk, without parsing files
    pub fn most_recent_session_id(&self) -> Result<String> {
        let mut ignored = Vec::new();
        self.session_files(&mut ignored)?
            .iter()
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()))
            .max()
            .map(|s| s.to_string())
            .ok_or(SessionsError::NoSessions)
    }

    pub fn session_path(&self, session_id: &str) -> PathBuf {
        self.resolver.session_path(session_id)
    }

    pub fn session_exists(&self, session_id: &str) -> bool {
        self.session_path(session_id).is_file()
    }

    /// Read a session by id. A file without `session_id` takes the requested id.
    pub fn read_session(&self, session_id: &str) -> Result<Session> {
        let path = self.session_path(session_id);
        if !path.is_file() {
            return Err(SessionsError::SessionNotFound(path));
        }
        let mut session: Session = codec::read(&path)?;
        if session.session_id.is_empty() {
            session.session_id = session_id.to_string();
        }
        Ok(session)
    }

    /// Write a session to its resolved path, replacing any existing file
    pub fn write_session(&self, session: &Session) -> Result<PathBuf> {
        if session.session_id.is_empty() {
            return Err(SessionsError::InvalidKey(String::new()));
        }
        let path = self.session_path(&session.session_id);
        ensure_parent(&path)?;
        codec::write(&path, session)?;
        debug!("wrote session {}", path.display());
        Ok(path)
    }

    /// Write a new session, refusing to replace an existing one
    pub fn create_session(&self, session: &Session) -> Result<PathBuf> {
        let path = self.session_path(&session.session_id);
        if path.exists() {
            return Err(SessionsError::AlreadyExists(path));
        }
        self.write_session(session)
    }

    pub fn artifact_path(&self, session_id: &str, file: &str) -> PathBuf {
        self.resolver.artifact_path(session_id, file)
    }

    pub fn read_artifact(&self, session_id: &str, file: &str) -> Result<Artifact> {
        codec::read(&self.artifact_path(session_id, file))
    }

    pub fn write_artifact(&self, session_id: &str, file: &str, artifact: &Artifact) -> Result<PathBuf> {
        let path = self.artifact_path(session_id, file);
        ensure_parent(&path)?;
        codec::write(&path, artifact)?;
        debug!("wrote artifact {}", path.display());
        Ok(path)
    }

    /// Write an artifact and record it in its session's artifact list.
    ///
    /// The session must already exist. A reference with the same filename is
    /// replaced rather than duplicated.
    pub fn attach_artifact(
        &self,
        session_id: &str,
        file: &str,
        artifact: &Artifact,
    ) -> Result<PathBuf> {
        let mut session = self.read_session(session_id)?;
        let path = self.write_artifact(session_id, file, artifact)?;

        session.upsert_artifact_ref(ArtifactRef {
            path: file.to_string(),
            kind: artifact.kind.clone(),
            summary: artifact.summary.clone(),
        });
        self.write_session(&session)?;
        Ok(path)
    }

    /// Every `*.md` file that can hold a session under the current layout
    fn session_files(&self, warnings: &mut Vec<ScanWarning>) -> Result<Vec<PathBuf>> {
        let root = self.resolver.sessions_root();
        let entries = match read_dir_sorted(&root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SessionsError::io(&root, e)),
        };

        let mut files = Vec::new();
        for entry in entries {
            if entry.is_dir() {
                // Flat layout: subdirectories hold artifacts, not sessions
                if self.resolver.layout() == Layout::Flat {
                    continue;
                }
                match read_dir_sorted(&entry) {
                    Ok(shard) => files.extend(shard.into_iter().filter(|p| is_markdown(p))),
                    Err(e) => warnings.push(ScanWarning {
                        path: entry,
                        message: e.to_string(),
                    }),
                }
            } else if is_markdown(&entry) {
                // Sharded layout: legacy sessions live directly under sessions/
                files.push(entry);
            }
        }
        Ok(files)
    }
}

fn parse_message(e: SessionsError) -> String {
    match e {
        SessionsError::Parse { message, .. } => message,
        other => other.to_string(),
    }
}

fn is_markdown(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == "md")
}

fn read_dir_sorted(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut paths = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect::<Vec<_>>();
    paths.sort();
    Ok(paths)
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.exists() => {
            fs::create_dir_all(parent).map_err(|e| SessionsError::io(parent, e))
        }
        _ => Ok(()),
    }
}

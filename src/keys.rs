//! Keys and the directory layout they resolve to
//!
//! A key is a bare session id (`1740422423`) or a session id and an artifact
//! filename (`1740422423/scanner-notes.md`).
//!
//! | Layout    | Session                               | Artifact                                       |
//! |-----------|---------------------------------------|------------------------------------------------|
//! | `flat`    | `<root>/<id>.md`                      | `<root>/<id>/<file>`                           |
//! | `sharded` | `<root>/sessions/<YYYY-MM>/<id>.md`   | `<root>/artifacts/<YYYY-MM>/<id>/<file>`       |
//!
//! In the sharded layout `YYYY-MM` comes from reading the id as Unix seconds
//! in UTC. Ids that are not integers (pre-migration data) resolve without the
//! year-month directory. Resolution never touches the filesystem.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Result, SessionsError};

const SESSIONS_SUBDIR: &str = "sessions";
const ARTIFACTS_SUBDIR: &str = "artifacts";

/// Split a key into `(session_id, artifact_file, is_artifact)`
pub fn parse_key(key: &str) -> (&str, &str, bool) {
    match key.split_once('/') {
        Some((session_id, file)) => (session_id, file, true),
        None => (key, "", false),
    }
}

pub fn format_session_key(session_id: &str) -> String {
    session_id.to_string()
}

pub fn format_artifact_key(session_id: &str, file: &str) -> String {
    format!("{}/{}", session_id, file)
}

/// Parsed form of a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Session(String),
    Artifact { session_id: String, file: String },
}

impl Key {
    /// Parse a key, rejecting empty parts
    pub fn parse(key: &str) -> Result<Self> {
        let (session_id, file, is_artifact) = parse_key(key);
        if session_id.is_empty() || (is_artifact && file.is_empty()) {
            return Err(SessionsError::InvalidKey(key.to_string()));
        }
        Ok(if is_artifact {
            Key::Artifact {
                session_id: session_id.to_string(),
                file: file.to_string(),
            }
        } else {
            Key::Session(session_id.to_string())
        })
    }

    pub fn session_id(&self) -> &str {
        match self {
            Key::Session(id) => id,
            Key::Artifact { session_id, .. } => session_id,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Session(id) => f.write_str(id),
            Key::Artifact { session_id, file } => write!(f, "{}/{}", session_id, file),
        }
    }
}

/// Convert an epoch-seconds id into its `YYYY-MM` shard (UTC)
pub fn epoch_to_year_month(id: &str) -> Option<String> {
    let secs: i64 = id.parse().ok()?;
    DateTime::from_timestamp(secs, 0).map(|t| t.format("%Y-%m").to_string())
}

/// Directory layout policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Flat,
    #[default]
    Sharded,
}

impl Layout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::Flat => "flat",
            Layout::Sharded => "sharded",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "flat" => Ok(Layout::Flat),
            "sharded" => Ok(Layout::Sharded),
            other => Err(format!("unknown layout '{}' (expected flat or sharded)", other)),
        }
    }
}

/// Maps keys to paths under one sessions directory
#[derive(Debug, Clone)]
pub struct KeyResolver {
    root: PathBuf,
    layout: Layout,
}

impl KeyResolver {
    pub fn new(root: impl Into<PathBuf>, layout: Layout) -> Self {
        Self {
            root: root.into(),
            layout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Directory whose entries (or shard subdirectories) hold session files
    pub fn sessions_root(&self) -> PathBuf {
        match self.layout {
            Layout::Flat => self.root.clone(),
            Layout::Sharded => self.root.join(SESSIONS_SUBDIR),
        }
    }

    pub fn session_path(&self, session_id: &str) -> PathBuf {
        let file = format!("{}.md", session_id);
        match self.layout {
            Layout::Flat => self.root.join(file),
            Layout::Sharded => match epoch_to_year_month(session_id) {
                Some(ym) => self.root.join(SESSIONS_SUBDIR).join(ym).join(file),
                None => self.root.join(SESSIONS_SUBDIR).join(file),
            },
        }
    }

    pub fn artifact_dir(&self, session_id: &str) -> PathBuf {
        match self.layout {
            Layout::Flat => self.root.join(session_id),
            Layout::Sharded => match epoch_to_year_month(session_id) {
                Some(ym) => self.root.join(ARTIFACTS_SUBDIR).join(ym).join(session_id),
                None => self.root.join(ARTIFACTS_SUBDIR).join(session_id),
            },
        }
    }

    pub fn artifact_path(&self, session_id: &str, file: &str) -> PathBuf {
        self.artifact_dir(session_id).join(file)
    }

    /// Resolve any key string to its file path
    pub fn resolve(&self, key: &str) -> PathBuf {
        match parse_key(key) {
            (session_id, file, true) => self.artifact_path(session_id, file),
            (session_id, _, false) => self.session_path(session_id),
        }
    }

    pub fn resolve_key(&self, key: &Key) -> PathBuf {
        match key {
            Key::Session(id) => self.session_path(id),
            Key::Artifact { session_id, file } => self.artifact_path(session_id, file),
        }
    }

    /// Map a path under the sessions directory back to its key
    pub fn key_for_path(&self, path: &Path) -> Option<Key> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<&str> = rel
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()?;

        let key = match (self.layout, parts.as_slice()) {
            (Layout::Flat, [file]) => Key::Session(file.strip_suffix(".md")?.to_string()),
            (Layout::Flat, [id, file]) => Key::Artifact {
                session_id: id.to_string(),
                file: file.to_string(),
            },
            (Layout::Sharded, [SESSIONS_SUBDIR, file]) => {
                Key::Session(file.strip_suffix(".md")?.to_string())
            }
            (Layout::Sharded, [SESSIONS_SUBDIR, _ym, file]) => {
                Key::Session(file.strip_suffix(".md")?.to_string())
            }
            (Layout::Sharded, [ARTIFACTS_SUBDIR, id, file]) => Key::Artifact {
                session_id: id.to_string(),
                file: file.to_string(),
            },
            (Layout::Sharded, [ARTIFACTS_SUBDIR, _ym, id, file]) => Key::Artifact {
                session_id: id.to_string(),
                file: file.to_string(),
            },
            _ => return None,
        };

        // Only accept paths the forward mapping would produce
        if self.resolve_key(&key) == path {
            Some(key)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key("1740422423"), ("1740422423", "", false));
        assert_eq!(
            parse_key("1740422423/scanner-notes.md"),
            ("1740422423", "scanner-notes.md", true)
        );
    }

    #[test]
    fn test_key_parse_rejects_empty_parts() {
        assert!(Key::parse("").is_err());
        assert!(Key::parse("/a.md").is_err());
        assert!(Key::parse("123/").is_err());
        assert_eq!(
            Key::parse("123/a.md").unwrap(),
            Key::Artifact {
                session_id: "123".to_string(),
                file: "a.md".to_string()
            }
        );
    }

    #[test]
    fn test_epoch_to_year_month() {
        assert_eq!(epoch_to_year_month("1771969857").as_deref(), Some("2026-02"));
        assert_eq!(epoch_to_year_month("0").as_deref(), Some("1970-01"));
        assert_eq!(epoch_to_year_month("legacy-session"), None);
        assert_eq!(epoch_to_year_month("2025-01-15_10-30"), None);
    }

    #[test]
    fn test_sharded_resolution() {
        let r = KeyResolver::new("/p/.sessions", Layout::Sharded);
        assert_eq!(
            r.resolve("1771969857"),
            PathBuf::from("/p/.sessions/sessions/2026-02/1771969857.md")
        );
        assert_eq!(
            r.resolve("1771969857/notes.md"),
            PathBuf::from("/p/.sessions/artifacts/2026-02/1771969857/notes.md")
        );
    }

    #[test]
    fn test_sharded_legacy_fallback() {
        let r = KeyResolver::new("/p/.sessions", Layout::Sharded);
        assert_eq!(
            r.resolve("old-id"),
            PathBuf::from("/p/.sessions/sessions/old-id.md")
        );
        assert_eq!(
            r.resolve("old-id/notes.md"),
            PathBuf::from("/p/.sessions/artifacts/old-id/notes.md")
        );
    }

    #[test]
    fn test_flat_resolution() {
        let r = KeyResolver::new("/p/.sessions", Layout::Flat);
        assert_eq!(
            r.resolve("1771969857"),
            PathBuf::from("/p/.sessions/1771969857.md")
        );
        assert_eq!(
            r.resolve("1771969857/notes.md"),
            PathBuf::from("/p/.sessions/1771969857/notes.md")
        );
        assert_eq!(r.sessions_root(), PathBuf::from("/p/.sessions"));
    }

    #[test]
    fn test_key_for_path_round_trip() {
        for layout in [Layout::Flat, Layout::Sharded] {
            let r = KeyResolver::new("/p/.sessions", layout);
            for key in ["1771969857", "1771969857/notes.md", "legacy", "legacy/x.md"] {
                let parsed = Key::parse(key).unwrap();
                let path = r.resolve(key);
                assert_eq!(r.key_for_path(&path), Some(parsed), "{} {}", layout, key);
            }
        }
    }

    #[test]
    fn test_key_for_path_rejects_foreign_paths() {
        let r = KeyResolver::new("/p/.sessions", Layout::Sharded);
        assert_eq!(r.key_for_path(Path::new("/elsewhere/1.md")), None);
        // Right shape, wrong shard
        assert_eq!(
            r.key_for_path(Path::new("/p/.sessions/sessions/1999-01/1771969857.md")),
            None
        );
    }

    #[test]
    fn test_layout_from_str() {
        assert_eq!("flat".parse::<Layout>().unwrap(), Layout::Flat);
        assert_eq!("sharded".parse::<Layout>().unwrap(), Layout::Sharded);
        assert!("nested".parse::<Layout>().is_err());
    }

    proptest! {
        #[test]
        fn prop_parse_key_without_slash(k in "[^/]{0,20}") {
            prop_assert_eq!(parse_key(&k), (k.as_str(), "", false));
        }

        #[test]
        fn prop_parse_key_with_one_slash(a in "[^/]{0,12}", b in "[^/]{0,12}") {
            let key = format!("{}/{}", a, b);
            prop_assert_eq!(parse_key(&key), (a.as_str(), b.as_str(), true));
        }
    }
}

//! `sessions edit <key>`: change fields of one session or artifact

use std::io::Write;

use super::{merge_tags, Outcome, Workspace};
use crate::codec;
use crate::error::{Result, SessionsError};
use crate::keys::Key;
use crate::model::{Artifact, ArtifactStatus, MAX_SUMMARY_LENGTH};

#[derive(Debug, Clone, Default)]
pub struct EditOptions {
    pub key: String,
    pub summary: Option<String>,
    /// Sessions only
    pub add_tags: Vec<String>,
    /// Artifacts only
    pub title: Option<String>,
    pub status: Option<String>,
    pub supersedes: Option<String>,
}

impl EditOptions {
    fn has_artifact_fields(&self) -> bool {
        self.title.is_some() || self.status.is_some() || self.supersedes.is_some()
    }

    fn is_empty(&self) -> bool {
        self.summary.is_none() && self.add_tags.is_empty() && !self.has_artifact_fields()
    }
}

pub fn run(ws: &Workspace, opts: &EditOptions, out: &mut impl Write) -> Result<Outcome> {
    if opts.is_empty() {
        return Err(SessionsError::ConflictingFlags(
            "no fields specified; use --summary, --add-tag, --title, --status or --supersedes"
                .to_string(),
        ));
    }
    if let Some(summary) = &opts.summary {
        let len = summary.chars().count();
        if len > MAX_SUMMARY_LENGTH {
            return Err(SessionsError::SummaryTooLong {
                max: MAX_SUMMARY_LENGTH,
                len,
            });
        }
    }

    let key = Key::parse(&opts.key)?;
    match &key {
        Key::Session(id) => {
            if opts.has_artifact_fields() {
                return Err(SessionsError::ConflictingFlags(format!(
                    "--title/--status/--supersedes only apply to artifact keys, {} is a session",
                    key
                )));
            }
            let mut session = ws.store.read_session(id)?;
            if let Some(summary) = &opts.summary {
                session.summary = summary.clone();
            }
            session.tags = merge_tags(&session.tags, &opts.add_tags);
            ws.store.write_session(&session)?;
        }
        Key::Artifact { session_id, file } => {
            if !opts.add_tags.is_empty() {
                return Err(SessionsError::ConflictingFlags(format!(
                    "--add-tag only applies to session keys, {} is an artifact",
                    key
                )));
            }
            let path = ws.store.artifact_path(session_id, file);
            let mut artifact: Artifact = codec::read(&path)?;
            if let Some(summary) = &opts.summary {
                artifact.summary = summary.clone();
            }
            if let Some(title) = &opts.title {
                artifact.title = title.clone();
            }
            if let Some(status) = &opts.status {
                artifact.status = ArtifactStatus::parse(status);
            }
            if let Some(supersedes) = &opts.supersedes {
                artifact.supersedes = supersedes.clone();
            }
            codec::write(&path, &artifact)?;
        }
    }

    writeln!(out, "Updated {}", key)?;
    Ok(Outcome::Done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{output, session, workspace};
    use crate::keys::Layout;

    fn setup() -> (tempfile::TempDir, Workspace) {
        let (dir, ws) = workspace(Layout::Sharded);
        ws.store
            .write_session(&session("1771969857", "old", &["cli"]))
            .unwrap();
        ws.store
            .attach_artifact(
                "1771969857",
                "notes.md",
                &Artifact {
                    title: "Notes".to_string(),
                    kind: "decision".to_string(),
                    status: ArtifactStatus::Draft,
                    ..Default::default()
                },
            )
            .unwrap();
        (dir, ws)
    }

    #[test]
    fn test_edit_session_summary_and_tags() {
        let (_dir, ws) = setup();
        let opts = EditOptions {
            key: "1771969857".to_string(),
            summary: Some("New summary".to_string()),
            add_tags: vec!["cli".to_string(), "parser".to_string()],
            ..Default::default()
        };
        let mut out = Vec::new();
        run(&ws, &opts, &mut out).unwrap();
        assert_eq!(output(out), "Updated 1771969857\n");

        let s = ws.store.read_session("1771969857").unwrap();
        assert_eq!(s.summary, "New summary");
        assert_eq!(s.tags, vec!["cli", "parser"]);
        assert_eq!(s.artifacts.len(), 1);
    }

    #[test]
    fn test_edit_artifact_fields() {
        let (_dir, ws) = setup();
        let opts = EditOptions {
            key: "1771969857/notes.md".to_string(),
            summary: Some("Decided".to_string()),
            status: Some("superseded".to_string()),
            supersedes: Some("1771000000/old.md".to_string()),
            ..Default::default()
        };
        run(&ws, &opts, &mut Vec::new()).unwrap();

        let a = ws.store.read_artifact("1771969857", "notes.md").unwrap();
        assert_eq!(a.summary, "Decided");
        assert_eq!(a.status, ArtifactStatus::Superseded);
        assert_eq!(a.supersedes, "1771000000/old.md");
        assert_eq!(a.title, "Notes");
    }

    #[test]
    fn test_edit_requires_a_field() {
        let (_dir, ws) = setup();
        let opts = EditOptions {
            key: "1771969857".to_string(),
            ..Default::default()
        };
        assert!(run(&ws, &opts, &mut Vec::new()).is_err());
    }

    #[test]
    fn test_edit_summary_too_long() {
        let (_dir, ws) = setup();
        let opts = EditOptions {
            key: "1771969857".to_string(),
            summary: Some("y".repeat(151)),
            ..Default::default()
        };
        assert!(matches!(
            run(&ws, &opts, &mut Vec::new()),
            Err(SessionsError::SummaryTooLong { .. })
        ));
        assert_eq!(ws.store.read_session("1771969857").unwrap().summary, "old");
    }

    #[test]
    fn test_edit_mismatched_flags() {
        let (_dir, ws) = setup();
        let opts = EditOptions {
            key: "1771969857".to_string(),
            status: Some("accepted".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            run(&ws, &opts, &mut Vec::new()),
            Err(SessionsError::ConflictingFlags(_))
        ));

        let opts = EditOptions {
            key: "1771969857/notes.md".to_string(),
            add_tags: vec!["x".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            run(&ws, &opts, &mut Vec::new()),
            Err(SessionsError::ConflictingFlags(_))
        ));
    }

    #[test]
    fn test_edit_missing_targets() {
        let (_dir, ws) = setup();
        let opts = EditOptions {
            key: "1700000000".to_string(),
            summary: Some("x".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            run(&ws, &opts, &mut Vec::new()),
            Err(SessionsError::SessionNotFound(_))
        ));

        let opts = EditOptions {
            key: "1771969857/missing.md".to_string(),
            summary: Some("x".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            run(&ws, &opts, &mut Vec::new()),
            Err(SessionsError::Io { .. })
        ));
    }
}

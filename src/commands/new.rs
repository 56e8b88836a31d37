//! `sessions new`: create a session record
//!
//! Three modes. Without input it prints a heredoc template to fill in and
//! writes nothing. With piped input it parses the document and writes it.
//! With `--empty` it writes a stub straight away.

use std::io::Write;

use chrono::{DateTime, FixedOffset};
use tracing::{debug, warn};

use super::{merge_tags, Outcome, Workspace};
use crate::codec;
use crate::error::{Result, SessionsError};
use crate::git;
use crate::model::{FileChange, Session, MAX_SUMMARY_LENGTH};

pub const DEFAULT_BODY: &str = "## Key Decisions

- Decision 1 and rationale.

## Open Questions

- Anything unresolved that future sessions should be aware of.";

#[derive(Debug, Clone)]
pub struct NewOptions {
    pub tags: Vec<String>,
    pub empty: bool,
    /// Fill changed files from `git diff --name-status <rev>`
    pub diff: Option<String>,
    pub now: DateTime<FixedOffset>,
}

pub fn run(
    ws: &Workspace,
    opts: &NewOptions,
    input: Option<&str>,
    out: &mut impl Write,
) -> Result<Outcome> {
    if opts.empty {
        let mut session = system_session(opts.now, opts.tags.clone());
        session.body = DEFAULT_BODY.to_string();
        if opts.diff.is_some() {
            session.files_changed = changed_files(ws, opts)?;
        }
        let path = ws.store.create_session(&session)?;
        writeln!(out, "{}", path.display())?;
        return Ok(Outcome::Done);
    }

    match input {
        Some(text) => {
            let written = codec::parse_session(text)?;
            let len = written.summary.trim().chars().count();
            if len > MAX_SUMMARY_LENGTH {
                return Err(SessionsError::SummaryTooLong {
                    max: MAX_SUMMARY_LENGTH,
                    len,
                });
            }

            let mut session = system_session(opts.now, merge_tags(&opts.tags, &written.tags));
            session.summary = written.summary;
            session.files_changed = written.files_changed;
            session.body = written.body;
            if session.files_changed.is_empty() && opts.diff.is_some() {
                session.files_changed = changed_files(ws, opts)?;
            }

            let path = ws.store.create_session(&session)?;
            writeln!(out, "{}", path.display())?;
        }
        None => {
            let files = changed_files(ws, opts)?;
            write!(out, "{}", heredoc_template(&opts.tags, &files))?;
        }
    }
    Ok(Outcome::Done)
}

/// A session with the fields the CLI owns filled in
fn system_session(now: DateTime<FixedOffset>, tags: Vec<String>) -> Session {
    Session {
        timestamp: now,
        session_id: now.timestamp().to_string(),
        tags,
        ..Default::default()
    }
}

/// Files to pre-fill. `--diff` failures are errors, `git status` failures are not.
fn changed_files(ws: &Workspace, opts: &NewOptions) -> Result<Vec<FileChange>> {
    if let Some(rev) = &opts.diff {
        return git::diff_files(&ws.project_root, rev);
    }
    if !ws.config.git.enabled {
        debug!("git disabled in config; leaving files_changed empty");
        return Ok(Vec::new());
    }
    Ok(git::status_files(&ws.project_root).unwrap_or_else(|e| {
        warn!("{}; leaving files_changed empty", e);
        Vec::new()
    }))
}

/// The command line to paste back, with a document to fill in
pub fn heredoc_template(tags: &[String], files: &[FileChange]) -> String {
    let mut b = String::new();
    b.push_str("Run the following command with an updated HEREDOC.\n\n");
    b.push_str("sessions new <<SESS\n");
    b.push_str("---\n");
    b.push_str("summary: \"\"\n");

    if tags.is_empty() {
        b.push_str("tags: []\n");
    } else {
        b.push_str("tags:\n");
        for tag in tags {
            b.push_str(&format!("  - {}\n", tag));
        }
    }

    if files.is_empty() {
        b.push_str("files_changed: []\n");
    } else {
        b.push_str("files_changed:\n");
        for f in files {
            b.push_str(&format!("  - path: {}\n", f.path));
            b.push_str(&format!("    action: {}\n", f.action));
            b.push_str(&format!("    summary: {}\n", f.summary));
        }
    }

    b.push_str("---\n\n");
    b.push_str(DEFAULT_BODY);
    b.push('\n');
    b.push_str("SESS\n");
    b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{output, workspace};
    use crate::keys::Layout;
    use crate::model::FileAction;

    fn opts(now: &str) -> NewOptions {
        NewOptions {
            tags: Vec::new(),
            empty: false,
            diff: None,
            now: DateTime::parse_from_rfc3339(now).unwrap(),
        }
    }

    #[test]
    fn test_template_without_tags_or_files() {
        let t = heredoc_template(&[], &[]);
        assert!(t.starts_with("Run the following command with an updated HEREDOC.\n\nsessions new <<SESS\n---\n"));
        assert!(t.contains("summary: \"\"\ntags: []\nfiles_changed: []\n---\n\n## Key Decisions"));
        assert!(t.ends_with("aware of.\nSESS\n"));
    }

    #[test]
    fn test_template_document_parses() {
        let files = vec![FileChange {
            path: "src/main.rs".to_string(),
            action: FileAction::Modified,
            summary: "TODO".to_string(),
        }];
        let t = heredoc_template(&["cli".to_string()], &files);
        assert!(t.contains("tags:\n  - cli\n"));
        assert!(t.contains(
            "files_changed:\n  - path: src/main.rs\n    action: modified\n    summary: TODO\n---\n"
        ));

        let doc = t
            .split_once("<<SESS\n")
            .and_then(|(_, rest)| rest.strip_suffix("SESS\n"))
            .unwrap();
        let s = codec::parse_session(doc).unwrap();
        assert_eq!(s.tags, vec!["cli"]);
        assert_eq!(s.files_changed, files);
        assert_eq!(s.body, DEFAULT_BODY);
    }

    #[test]
    fn test_stdin_mode_sets_system_fields() {
        let (_dir, ws) = workspace(Layout::Sharded);
        let mut o = opts("2026-02-24T13:50:57-08:00");
        o.tags = vec!["cli".to_string()];
        let input = "---\nsession_id: \"999\"\nsummary: Wired up the parser\ntags: [parser, cli]\nrelated_sessions: [\"1\"]\nfiles_changed:\n  - path: src/a.rs\n    action: added\n    summary: New\n---\n\nBody text\n";

        let mut out = Vec::new();
        run(&ws, &o, Some(input), &mut out).unwrap();
        assert!(output(out).trim_end().ends_with("sessions/2026-02/1771969857.md"));

        let s = ws.store.read_session("1771969857").unwrap();
        assert_eq!(s.session_id, "1771969857");
        assert_eq!(s.summary, "Wired up the parser");
        assert_eq!(s.tags, vec!["cli", "parser"]);
        assert!(s.related_sessions.is_empty());
        assert_eq!(s.files_changed[0].action, FileAction::Added);
        assert_eq!(s.body, "Body text");
        assert_eq!(s.timestamp.offset().local_minus_utc(), -8 * 3600);
    }

    #[test]
    fn test_stdin_summary_too_long() {
        let (_dir, ws) = workspace(Layout::Sharded);
        let input = format!("---\nsummary: {}\n---\n", "x".repeat(151));
        let err = run(&ws, &opts("2026-02-24T13:50:57-08:00"), Some(&input), &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, SessionsError::SummaryTooLong { len: 151, .. }));
    }

    #[test]
    fn test_stdin_malformed_is_error() {
        let (_dir, ws) = workspace(Layout::Sharded);
        let err = run(
            &ws,
            &opts("2026-02-24T13:50:57-08:00"),
            Some("summary: no delimiters"),
            &mut Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, SessionsError::MalformedDocument(_)));
    }

    #[test]
    fn test_empty_mode_writes_stub_once() {
        let (_dir, ws) = workspace(Layout::Flat);
        let mut o = opts("2026-02-24T13:50:57-08:00");
        o.empty = true;
        o.tags = vec!["stub".to_string()];

        run(&ws, &o, None, &mut Vec::new()).unwrap();
        let s = ws.store.read_session("1771969857").unwrap();
        assert_eq!(s.summary, "");
        assert_eq!(s.tags, vec!["stub"]);
        assert_eq!(s.body, DEFAULT_BODY);

        let err = run(&ws, &o, None, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, SessionsError::AlreadyExists(_)));
    }

    #[test]
    fn test_template_mode_writes_nothing() {
        let (_dir, mut ws) = workspace(Layout::Sharded);
        ws.config.git.enabled = false;
        let mut out = Vec::new();
        run(&ws, &opts("2026-02-24T13:50:57-08:00"), None, &mut out).unwrap();
        assert!(output(out).contains("files_changed: []"));
        assert!(ws.store.scan().unwrap().is_empty());
    }

    #[test]
    fn test_diff_outside_repository_is_error() {
        let (_dir, ws) = workspace(Layout::Sharded);
        let mut o = opts("2026-02-24T13:50:57-08:00");
        o.diff = Some("HEAD".to_string());
        assert!(matches!(
            run(&ws, &o, None, &mut Vec::new()),
            Err(SessionsError::Git(_))
        ));
    }
}

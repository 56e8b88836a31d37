//! `sessions validate [keys...]`: every summary present and short enough

use std::fmt;
use std::io::Write;

use super::{Outcome, Workspace};
use crate::codec;
use crate::error::{Result, SessionsError};
use crate::keys::{format_artifact_key, format_session_key, Key};
use crate::model::{check_summary, Artifact, Session, SummaryIssue, MAX_SUMMARY_LENGTH};

#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    /// Keys to check; everything when empty
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    Summary(SummaryIssue),
    Unreadable,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::Summary(issue) => f.write_str(issue.as_str()),
            Reason::Unreadable => f.write_str("unreadable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub key: String,
    pub reason: Reason,
}

pub fn run(ws: &Workspace, opts: &ValidateOptions, out: &mut impl Write) -> Result<Outcome> {
    let issues = if opts.keys.is_empty() {
        validate_all(ws)?
    } else {
        opts.keys
            .iter()
            .filter_map(|key| validate_key(ws, key))
            .collect()
    };

    if issues.is_empty() {
        writeln!(out, "All valid.")?;
        return Ok(Outcome::Done);
    }

    writeln!(out, "PROBLEM")?;
    writeln!(out, "Invalid Summary")?;
    writeln!(out)?;
    writeln!(out, "AFFECTED KEYS")?;
    for issue in &issues {
        writeln!(out, "- {} ({})", issue.key, issue.reason)?;
    }
    writeln!(out)?;
    writeln!(out, "FIX")?;
    writeln!(
        out,
        "sessions edit <KEY> --summary \"<SUMMARY_LTE_{}_CHARS>\"",
        MAX_SUMMARY_LENGTH
    )?;
    Err(SessionsError::ValidationFailed(issues.len()))
}

fn summary_issue(key: String, summary: &str) -> Option<Issue> {
    check_summary(summary).map(|issue| Issue {
        key,
        reason: Reason::Summary(issue),
    })
}

fn validate_all(ws: &Workspace) -> Result<Vec<Issue>> {
    let report = ws.scan()?;
    let mut issues = Vec::new();
    for session in &report.sessions {
        issues.extend(summary_issue(
            format_session_key(&session.session_id),
            &session.summary,
        ));
        for art_ref in &session.artifacts {
            let key = format_artifact_key(&session.session_id, &art_ref.path);
            match ws.store.read_artifact(&session.session_id, &art_ref.path) {
                Ok(artifact) => issues.extend(summary_issue(key, &artifact.summary)),
                Err(_) => issues.push(Issue {
                    key,
                    reason: Reason::Unreadable,
                }),
            }
        }
    }
    Ok(issues)
}

fn validate_key(ws: &Workspace, raw: &str) -> Option<Issue> {
    let unreadable = || Issue {
        key: raw.to_string(),
        reason: Reason::Unreadable,
    };
    let Ok(key) = Key::parse(raw) else {
        return Some(unreadable());
    };
    let path = ws.store.resolver().resolve_key(&key);
    let summary = match key {
        Key::Session(_) => codec::read::<Session>(&path).map(|s| s.summary),
        Key::Artifact { .. } => codec::read::<Artifact>(&path).map(|a| a.summary),
    };
    match summary {
        Ok(summary) => summary_issue(raw.to_string(), &summary),
        Err(_) => Some(unreadable()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{output, session, workspace};
    use crate::keys::Layout;

    #[test]
    fn test_all_valid() {
        let (_dir, ws) = workspace(Layout::Sharded);
        ws.store
            .write_session(&session("1771969857", "Fine", &[]))
            .unwrap();
        let mut out = Vec::new();
        assert_eq!(
            run(&ws, &ValidateOptions::default(), &mut out).unwrap(),
            Outcome::Done
        );
        assert_eq!(output(out), "All valid.\n");
    }

    #[test]
    fn test_reports_every_problem() {
        let (_dir, ws) = workspace(Layout::Sharded);
        ws.store.write_session(&session("1771969857", "", &[])).unwrap();
        ws.store
            .write_session(&session("1771800000", &"z".repeat(151), &[]))
            .unwrap();
        ws.store
            .attach_artifact("1771800000", "gone.md", &Artifact::default())
            .unwrap();
        std::fs::remove_file(ws.store.artifact_path("1771800000", "gone.md")).unwrap();

        let mut out = Vec::new();
        let err = run(&ws, &ValidateOptions::default(), &mut out).unwrap_err();
        assert!(matches!(err, SessionsError::ValidationFailed(3)));
        assert_eq!(
            output(out),
            "PROBLEM\nInvalid Summary\n\nAFFECTED KEYS\n\
             - 1771969857 (missing)\n\
             - 1771800000 (too long)\n\
             - 1771800000/gone.md (unreadable)\n\n\
             FIX\nsessions edit <KEY> --summary \"<SUMMARY_LTE_150_CHARS>\"\n"
        );
    }

    #[test]
    fn test_explicit_keys() {
        let (_dir, ws) = workspace(Layout::Sharded);
        ws.store
            .write_session(&session("1771969857", "Fine", &[]))
            .unwrap();
        ws.store
            .attach_artifact("1771969857", "a.md", &Artifact::default())
            .unwrap();

        let opts = ValidateOptions {
            keys: vec!["1771969857".to_string()],
        };
        assert!(run(&ws, &opts, &mut Vec::new()).is_ok());

        let opts = ValidateOptions {
            keys: vec![
                "1771969857/a.md".to_string(),
                "1700000000".to_string(),
            ],
        };
        let mut out = Vec::new();
        assert!(matches!(
            run(&ws, &opts, &mut out),
            Err(SessionsError::ValidationFailed(2))
        ));
        let text = output(out);
        assert!(text.contains("- 1771969857/a.md (missing)\n"));
        assert!(text.contains("- 1700000000 (unreadable)\n"));
    }
}

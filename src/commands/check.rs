//! `sessions check`: find artifact references that disagree with their files
//!
//! A session's reference repeats the artifact's `type` and `summary`. Nothing
//! keeps the copies in sync, so this reports where they differ and where the
//! referenced file is gone. It never writes.

use std::fmt;
use std::io::Write;

use super::{Outcome, Workspace};
use crate::error::{Result, SessionsError};
use crate::keys::format_artifact_key;
use crate::model::{Artifact, ArtifactRef};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drift {
    Missing { error: String },
    Type { reference: String, artifact: String },
    Summary { reference: String, artifact: String },
}

impl fmt::Display for Drift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Drift::Missing { error } => write!(f, "unreadable ({})", error),
            Drift::Type {
                reference,
                artifact,
            } => write!(f, "type {:?} in session, {:?} in artifact", reference, artifact),
            Drift::Summary {
                reference,
                artifact,
            } => write!(
                f,
                "summary {:?} in session, {:?} in artifact",
                reference, artifact
            ),
        }
    }
}

/// Differences between one reference and the artifact it points at
pub fn compare(art_ref: &ArtifactRef, artifact: &Artifact) -> Vec<Drift> {
    let mut drift = Vec::new();
    if art_ref.kind != artifact.kind {
        drift.push(Drift::Type {
            reference: art_ref.kind.clone(),
            artifact: artifact.kind.clone(),
        });
    }
    if art_ref.summary.trim() != artifact.summary.trim() {
        drift.push(Drift::Summary {
            reference: art_ref.summary.clone(),
            artifact: artifact.summary.clone(),
        });
    }
    drift
}

pub fn run(ws: &Workspace, out: &mut impl Write) -> Result<Outcome> {
    let report = ws.scan()?;

    let mut found = Vec::new();
    for session in &report.sessions {
        for art_ref in &session.artifacts {
            let key = format_artifact_key(&session.session_id, &art_ref.path);
            match ws.store.read_artifact(&session.session_id, &art_ref.path) {
                Ok(artifact) => found.extend(
                    compare(art_ref, &artifact)
                        .into_iter()
                        .map(|d| (key.clone(), d)),
                ),
                Err(e) => found.push((
                    key,
                    Drift::Missing {
                        error: e.to_string(),
                    },
                )),
            }
        }
    }

    if found.is_empty() {
        writeln!(out, "No drift.")?;
        return Ok(Outcome::Done);
    }
    for (key, drift) in &found {
        writeln!(out, "{}: {}", key, drift)?;
    }
    Err(SessionsError::DriftDetected(found.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::commands::testing::{output, session, workspace};
    use crate::keys::Layout;

    #[test]
    fn test_no_drift() {
        let (_dir, ws) = workspace(Layout::Sharded);
        ws.store.write_session(&session("1771969857", "s", &[])).unwrap();
        ws.store
            .attach_artifact(
                "1771969857",
                "a.md",
                &Artifact {
                    kind: "analysis".to_string(),
                    summary: "Same".to_string(),
                    ..Default::default()
                },
            )
            .unwrap();
        let mut out = Vec::new();
        assert_eq!(run(&ws, &mut out).unwrap(), Outcome::Done);
        assert_eq!(output(out), "No drift.\n");
    }

    #[test]
    fn test_reports_drift_without_writing() {
        let (_dir, ws) = workspace(Layout::Sharded);
        ws.store.write_session(&session("1771969857", "s", &[])).unwrap();
        ws.store
            .attach_artifact(
                "1771969857",
                "a.md",
                &Artifact {
                    kind: "analysis".to_string(),
                    summary: "Old".to_string(),
                    ..Default::default()
                },
            )
            .unwrap();
        ws.store
            .attach_artifact("1771969857", "gone.md", &Artifact::default())
            .unwrap();

        // Edit the artifact file directly so the reference goes stale
        let path = ws.store.artifact_path("1771969857", "a.md");
        let mut a: Artifact = codec::read(&path).unwrap();
        a.kind = "decision".to_string();
        a.summary = "New".to_string();
        codec::write(&path, &a).unwrap();
        std::fs::remove_file(ws.store.artifact_path("1771969857", "gone.md")).unwrap();
        let before = std::fs::read_to_string(ws.store.session_path("1771969857")).unwrap();

        let mut out = Vec::new();
        let err = run(&ws, &mut out).unwrap_err();
        assert!(matches!(err, SessionsError::DriftDetected(3)));
        let text = output(out);
        assert!(text.contains("1771969857/a.md: type \"analysis\" in session, \"decision\" in artifact\n"));
        assert!(text.contains("1771969857/a.md: summary \"Old\" in session, \"New\" in artifact\n"));
        assert!(text.contains("1771969857/gone.md: unreadable"));

        let after = std::fs::read_to_string(ws.store.session_path("1771969857")).unwrap();
        assert_eq!(before, after);
    }
}

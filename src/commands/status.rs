//! `sessions status`: artifact lifecycle overview
//!
//! ```text
//! + accepted    decided and current
//! ~ draft       still being written
//! ! superseded  replaced by a newer artifact
//! x deprecated  no longer applies
//! ? anything else
//! ```

use std::io::Write;

use super::{print_warning, Outcome, Workspace};
use crate::error::Result;
use crate::keys::format_artifact_key;
use crate::model::{Artifact, ArtifactRef};

#[derive(Debug, Clone, Default)]
pub struct StatusOptions {
    /// Only references of this type
    pub kind: Option<String>,
    /// Only superseded or deprecated artifacts
    pub stale: bool,
}

pub fn run(ws: &Workspace, opts: &StatusOptions, out: &mut impl Write) -> Result<Outcome> {
    let report = ws.scan()?;

    let mut found = false;
    for session in &report.sessions {
        for art_ref in &session.artifacts {
            if opts.kind.as_ref().is_some_and(|k| &art_ref.kind != k) {
                continue;
            }
            let artifact = match ws.store.read_artifact(&session.session_id, &art_ref.path) {
                Ok(a) => a,
                Err(e) => {
                    print_warning(format_args!(
                        "could not load {}: {}",
                        format_artifact_key(&session.session_id, &art_ref.path),
                        e
                    ));
                    continue;
                }
            };
            if opts.stale && !artifact.status.is_stale() {
                continue;
            }

            found = true;
            writeln!(
                out,
                "{}",
                format_line(&session.session_id, art_ref, &artifact)
            )?;
        }
    }

    if !found {
        writeln!(out, "No matching artifacts found.")?;
        return Ok(Outcome::Empty);
    }
    Ok(Outcome::Done)
}

fn format_line(session_id: &str, art_ref: &ArtifactRef, artifact: &Artifact) -> String {
    let mut line = format!(
        "{} {}  {}  [{}]",
        artifact.status.indicator(),
        artifact.status,
        format_artifact_key(session_id, &art_ref.path),
        art_ref.kind
    );
    if !artifact.title.is_empty() {
        line.push_str(&format!("  {}", artifact.title));
    }
    if !artifact.supersedes.is_empty() {
        line.push_str(&format!("  (supersedes: {})", artifact.supersedes));
    }
    line
}

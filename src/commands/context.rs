//! `sessions context <file>...`: everything recorded about a file
//!
//! For each file, the sessions that changed it (newest first) with the
//! change summary, tags and artifacts. `--deep` inlines artifact bodies.

use std::io::Write;

use clap::ValueEnum;
use serde::Serialize;

use super::{Outcome, Workspace};
use crate::error::Result;
use crate::model::{timestamp, Artifact, ArtifactRef, FileChange, Session};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ContextFormat {
    #[default]
    Markdown,
    Json,
}

#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    pub files: Vec<String>,
    pub deep: bool,
    pub format: ContextFormat,
}

/// A session's entry for one file
struct Hit<'a> {
    session: &'a Session,
    change: &'a FileChange,
    artifacts: Vec<(&'a ArtifactRef, Option<Artifact>)>,
}

fn hits<'a>(ws: &Workspace, sessions: &'a [Session], file: &str) -> Vec<Hit<'a>> {
    sessions
        .iter()
        .filter_map(|session| {
            let change = session.files_changed.iter().find(|f| f.path == file)?;
            let artifacts = session
                .artifacts
                .iter()
                .map(|r| {
                    let loaded = ws.store.read_artifact(&session.session_id, &r.path).ok();
                    (r, loaded)
                })
                .collect();
            Some(Hit {
                session,
                change,
                artifacts,
            })
        })
        .collect()
}

pub fn run(ws: &Workspace, opts: &ContextOptions, out: &mut impl Write) -> Result<Outcome> {
    let report = ws.scan()?;
    let per_file: Vec<(&str, Vec<Hit<'_>>)> = opts
        .files
        .iter()
        .map(|file| (file.as_str(), hits(ws, &report.sessions, file)))
        .collect();

    match opts.format {
        ContextFormat::Markdown => render_markdown(&per_file, opts.deep, out)?,
        ContextFormat::Json => render_json(&per_file, opts.deep, out)?,
    }

    if per_file.iter().all(|(_, hits)| hits.is_empty()) {
        Ok(Outcome::Empty)
    } else {
        Ok(Outcome::Done)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn render_markdown(per_file: &[(&str, Vec<Hit<'_>>)], deep: bool, out: &mut impl Write) -> Result<()> {
    for (file, hits) in per_file {
        writeln!(out, "# Context: {}\n", file)?;
        if hits.is_empty() {
            writeln!(out, "No sessions found for {}\n", file)?;
            continue;
        }

        for hit in hits {
            let summary = match hit.session.summary.trim() {
                "" => "(no summary)",
                s => s,
            };
            writeln!(out, "## {} - {}", hit.session.session_id, summary)?;
            writeln!(out, "- **Action:** {}", hit.change.action)?;
            writeln!(out, "- **Change:** {}", hit.change.summary)?;
            if !hit.session.tags.is_empty() {
                writeln!(out, "- **Tags:** {}", hit.session.tags.join(", "))?;
            }

            for (art_ref, artifact) in &hit.artifacts {
                let status = artifact
                    .as_ref()
                    .map(|a| a.status.as_str())
                    .filter(|s| !s.is_empty())
                    .map(|s| format!(" ({})", s))
                    .unwrap_or_default();
                writeln!(
                    out,
                    "- **{}:** {}{}",
                    capitalize(&art_ref.kind),
                    art_ref.path,
                    status
                )?;
                if let Some(a) = artifact.as_ref().filter(|a| deep && !a.body.is_empty()) {
                    writeln!(out, "\n### {}\n\n{}\n", a.title, a.body)?;
                }
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonFile<'a> {
    file: &'a str,
    sessions: Vec<JsonSession<'a>>,
}

#[derive(Serialize)]
struct JsonSession<'a> {
    session_id: &'a str,
    timestamp: String,
    summary: &'a str,
    file_action: &'a str,
    file_summary: &'a str,
    tags: &'a [String],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    artifacts: Vec<JsonArtifact<'a>>,
}

#[derive(Serialize)]
struct JsonArtifact<'a> {
    path: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    status: String,
    summary: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
}

fn render_json(per_file: &[(&str, Vec<Hit<'_>>)], deep: bool, out: &mut impl Write) -> Result<()> {
    let files: Vec<JsonFile<'_>> = per_file
        .iter()
        .map(|(file, hits)| JsonFile {
            file: *file,
            sessions: hits
                .iter()
                .map(|hit| JsonSession {
                    session_id: &hit.session.session_id,
                    timestamp: timestamp::format(&hit.session.timestamp),
                    summary: &hit.session.summary,
                    file_action: hit.change.action.as_str(),
                    file_summary: &hit.change.summary,
                    tags: &hit.session.tags,
                    artifacts: hit
                        .artifacts
                        .iter()
                        .map(|(r, a)| JsonArtifact {
                            path: &r.path,
                            kind: &r.kind,
                            status: a
                                .as_ref()
                                .map(|a| a.status.to_string())
                                .unwrap_or_default(),
                            summary: &r.summary,
                            body: a
                                .as_ref()
                                .filter(|_| deep)
                                .map(|a| a.body.clone()),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    if let [single] = files.as_slice() {
        serde_json::to_writer_pretty(&mut *out, single)?;
    } else {
        serde_json::to_writer_pretty(&mut *out, &files)?;
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{output, session, workspace};
    use crate::keys::Layout;
    use crate::model::{ArtifactStatus, FileAction};

    fn setup() -> (tempfile::TempDir, Workspace) {
        let (dir, ws) = workspace(Layout::Sharded);
        let mut s = session("1771969857", "Reworked scanning", &["parser"]);
        s.files_changed.push(FileChange {
            path: "src/scan.rs".to_string(),
            action: FileAction::Modified,
            summary: "Skip corrupt files".to_string(),
        });
        ws.store.write_session(&s).unwrap();
        ws.store
            .attach_artifact(
                "1771969857",
                "why-skip.md",
                &Artifact {
                    title: "Why Skip".to_string(),
                    kind: "decision".to_string(),
                    status: ArtifactStatus::Accepted,
                    body: "Availability first.".to_string(),
                    ..Default::default()
                },
            )
            .unwrap();
        ws.store
            .write_session(&session("1771800000", "Unrelated", &[]))
            .unwrap();
        (dir, ws)
    }

    #[test]
    fn test_markdown() {
        let (_dir, ws) = setup();
        let opts = ContextOptions {
            files: vec!["src/scan.rs".to_string()],
            deep: false,
            format: ContextFormat::Markdown,
        };
        let mut out = Vec::new();
        assert_eq!(run(&ws, &opts, &mut out).unwrap(), Outcome::Done);
        assert_eq!(
            output(out),
            "# Context: src/scan.rs\n\n\
             ## 1771969857 - Reworked scanning\n\
             - **Action:** modified\n\
             - **Change:** Skip corrupt files\n\
             - **Tags:** parser\n\
             - **Decision:** why-skip.md (accepted)\n\n"
        );
    }

    #[test]
    fn test_markdown_deep_inlines_bodies() {
        let (_dir, ws) = setup();
        let opts = ContextOptions {
            files: vec!["src/scan.rs".to_string()],
            deep: true,
            format: ContextFormat::Markdown,
        };
        let mut out = Vec::new();
        run(&ws, &opts, &mut out).unwrap();
        assert!(output(out).contains("\n### Why Skip\n\nAvailability first.\n"));
    }

    #[test]
    fn test_unknown_file_is_empty() {
        let (_dir, ws) = setup();
        let opts = ContextOptions {
            files: vec!["nope.rs".to_string()],
            deep: false,
            format: ContextFormat::Markdown,
        };
        let mut out = Vec::new();
        assert_eq!(run(&ws, &opts, &mut out).unwrap(), Outcome::Empty);
        assert!(output(out).contains("No sessions found for nope.rs"));
    }

    #[test]
    fn test_json_single_and_multiple() {
        let (_dir, ws) = setup();
        let opts = ContextOptions {
            files: vec!["src/scan.rs".to_string()],
            deep: false,
            format: ContextFormat::Json,
        };
        let mut out = Vec::new();
        run(&ws, &opts, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["file"], "src/scan.rs");
        let s = &value["sessions"][0];
        assert_eq!(s["session_id"], "1771969857");
        assert_eq!(s["file_action"], "modified");
        assert_eq!(s["artifacts"][0]["status"], "accepted");
        assert!(s["artifacts"][0].get("body").is_none());

        let opts = ContextOptions {
            files: vec!["src/scan.rs".to_string(), "other.rs".to_string()],
            deep: true,
            format: ContextFormat::Json,
        };
        let mut out = Vec::new();
        run(&ws, &opts, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(
            value[0]["sessions"][0]["artifacts"][0]["body"],
            "Availability first."
        );
        assert_eq!(value[1]["sessions"].as_array().unwrap().len(), 0);
    }
}

//! `sessions artifact`: attach a deep-dive document to a session
//!
//! ```text
//! sessions artifact foo              print a heredoc template, write nothing
//! sessions artifact foo <<ART        read the document from stdin
//! sessions artifact foo --import f   body from f, f is kept
//! sessions artifact foo --ingest f   body from f, f is deleted after writing
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{Outcome, Workspace};
use crate::codec;
use crate::error::{Result, SessionsError};
use crate::model::{Artifact, ArtifactStatus};

pub const DEFAULT_BODY: &str = "Content goes here.";

#[derive(Debug, Clone, Default)]
pub struct ArtifactOptions {
    pub name: String,
    /// Target session; the most recent one when absent
    pub session: Option<String>,
    /// Explicit `--type`, which wins over any type in the input
    pub kind: Option<String>,
    pub import: Option<PathBuf>,
    pub ingest: Option<PathBuf>,
}

pub fn run(
    ws: &Workspace,
    opts: &ArtifactOptions,
    input: Option<&str>,
    out: &mut impl Write,
) -> Result<Outcome> {
    let source = match (&opts.import, &opts.ingest) {
        (Some(_), Some(_)) => {
            return Err(SessionsError::ConflictingFlags(
                "--import and --ingest are mutually exclusive".to_string(),
            ))
        }
        (Some(path), None) | (None, Some(path)) => Some(path.as_path()),
        (None, None) => None,
    };

    // Read the source before touching anything else
    let source_body = source
        .map(|path| fs::read_to_string(path).map_err(|e| SessionsError::io(path, e)))
        .transpose()?;

    let session_id = match &opts.session {
        Some(id) => id.clone(),
        None => ws.store.most_recent_session_id()?,
    };
    let file = ensure_md(&opts.name);
    let kind = opts
        .kind
        .clone()
        .unwrap_or_else(|| ws.config.artifacts.default_type.clone());

    let artifact = match (source_body, input) {
        (Some(body), input) => {
            let mut artifact = match input {
                Some(text) => codec::parse_artifact(text)?,
                None => Artifact {
                    title: title_from_name(&file),
                    kind: kind.clone(),
                    status: ArtifactStatus::Draft,
                    ..Default::default()
                },
            };
            artifact.body = body.trim().to_string();
            artifact
        }
        (None, Some(text)) => codec::parse_artifact(text)?,
        (None, None) => {
            write!(
                out,
                "{}",
                heredoc_template(&file, &session_id, &kind, &title_from_name(&file))
            )?;
            return Ok(Outcome::Done);
        }
    };

    let artifact = apply_type(artifact, opts.kind.as_deref(), &kind);
    let path = ws.store.attach_artifact(&session_id, &file, &artifact)?;

    if let Some(ingested) = opts.ingest.as_deref() {
        remove_source(ingested)?;
    }
    writeln!(out, "{}", path.display())?;
    Ok(Outcome::Done)
}

fn apply_type(mut artifact: Artifact, explicit: Option<&str>, default: &str) -> Artifact {
    if let Some(kind) = explicit {
        artifact.kind = kind.to_string();
    } else if artifact.kind.trim().is_empty() {
        artifact.kind = default.to_string();
    }
    artifact
}

fn remove_source(path: &Path) -> Result<()> {
    fs::remove_file(path).map_err(|e| SessionsError::io(path, e))
}

/// The command line to paste back, with a document to fill in
pub fn heredoc_template(file: &str, session_id: &str, kind: &str, title: &str) -> String {
    let name = file.strip_suffix(".md").unwrap_or(file);
    format!(
        "Run the following command with an updated HEREDOC.\n\n\
         sessions artifact {name} --session {session_id} <<ART\n\
         ---\n\
         title: {title}\n\
         type: {kind}\n\
         summary: \"\"\n\
         status: draft\n\
         supersedes: \"\"\n\
         ---\n\n\
         {DEFAULT_BODY}\n\
         ART\n"
    )
}

/// `"sessions-new-design.md"` becomes `"Sessions New Design"`
pub fn title_from_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name);
    let base = base.strip_suffix(".md").unwrap_or(base);
    title_case(&base.replace('-', " "))
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c.is_whitespace();
    }
    out
}

pub fn ensure_md(name: &str) -> String {
    if name.ends_with(".md") {
        name.to_string()
    } else {
        format!("{}.md", name)
    }
}

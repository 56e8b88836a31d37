//! `sessions list`: one line per session, newest first

use std::io::Write;

use super::{Outcome, Workspace};
use crate::error::Result;
use crate::model::Session;

#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub tag: Option<String>,
    /// Add file and artifact counts
    pub verbose: bool,
}

pub fn run(ws: &Workspace, opts: &ListOptions, out: &mut impl Write) -> Result<Outcome> {
    let report = ws.scan()?;
    if report.is_empty() {
        writeln!(out, "No sessions found.")?;
        return Ok(Outcome::Empty);
    }

    let mut shown = 0;
    for session in report
        .sessions
        .iter()
        .filter(|s| match &opts.tag {
            Some(tag) => s.has_tag(tag),
            None => true,
        })
    {
        writeln!(out, "{}", format_line(session, opts.verbose))?;
        shown += 1;
    }

    if shown == 0 {
        writeln!(out, "No matching sessions found.")?;
        return Ok(Outcome::Empty);
    }
    Ok(Outcome::Done)
}

fn format_line(session: &Session, verbose: bool) -> String {
    let summary = match session.summary.trim() {
        "" => "(no summary)",
        s => s,
    };
    let mut line = format!("{}  {}", session.session_id, summary);
    if verbose {
        line.push_str(&format!(
            "  [files: {}, artifacts: {}]",
            session.files_changed.len(),
            session.artifacts.len()
        ));
    }
    if !session.tags.is_empty() {
        line.push_str(&format!("  [{}]", session.tags.join(", ")));
    }
    line
}

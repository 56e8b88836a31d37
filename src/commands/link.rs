//! `sessions link`: maintain related_sessions

use std::io::Write;

use super::{print_warning, Outcome, Workspace};
use crate::error::{Result, SessionsError};
use crate::linking;

#[derive(Debug, Clone, Default)]
pub struct LinkOptions {
    /// Link every pair of sessions sharing a changed file
    pub auto: bool,
    pub sessions: Vec<String>,
}

pub fn run(ws: &Workspace, opts: &LinkOptions, out: &mut impl Write) -> Result<Outcome> {
    if opts.auto {
        if !opts.sessions.is_empty() {
            return Err(SessionsError::ConflictingFlags(
                "--auto does not take session IDs".to_string(),
            ));
        }
        let mut sessions = ws.scan()?.sessions;
        let report = linking::auto_link(&ws.store, &mut sessions);
        for (path, err) in &report.failures {
            print_warning(format_args!("failed to update {}: {}", path.display(), err));
        }
        writeln!(out, "Auto-linked {} sessions", report.updated.len())?;
        return Ok(Outcome::Done);
    }

    let [a, b] = opts.sessions.as_slice() else {
        return Err(SessionsError::ConflictingFlags(
            "provide exactly two session IDs, or use --auto".to_string(),
        ));
    };
    if linking::link_pair(&ws.store, a, b)? {
        writeln!(out, "Linked {} <-> {}", a, b)?;
    } else {
        writeln!(out, "Already linked {} <-> {}", a, b)?;
    }
    Ok(Outcome::Done)
}

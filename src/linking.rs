//! Related-session links
//!
//! Links are stored on both sides. Adding an existing link is a no-op, so
//! running either operation twice leaves the files unchanged.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use tracing::debug;

use crate::error::{Result, SessionsError};
use crate::model::Session;
use crate::store::SessionStore;

/// Link two sessions to each other. Returns true if either file changed.
pub fn link_pair(store: &SessionStore, a: &str, b: &str) -> Result<bool> {
    if a == b {
        return Err(SessionsError::InvalidKey(format!(
            "{} (cannot link a session to itself)",
            a
        )));
    }
    let mut first = store.read_session(a)?;
    let mut second = store.read_session(b)?;

    let first_changed = first.add_related(b);
    let second_changed = second.add_related(a);

    if first_changed {
        store.write_session(&first)?;
    }
    if second_changed {
        store.write_session(&second)?;
    }
    Ok(first_changed || second_changed)
}

/// Add links between every pair of sessions that changed a common path.
/// Returns the indices of the sessions whose related list grew.
pub fn link_shared_files(sessions: &mut [Session]) -> Vec<usize> {
    let mut by_path: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, session) in sessions.iter().enumerate() {
        let paths: BTreeSet<&str> = session
            .files_changed
            .iter()
            .map(|f| f.path.as_str())
            .collect();
        for path in paths {
            by_path.entry(path).or_default().push(idx);
        }
    }

    let mut pairs: BTreeSet<(usize, usize)> = BTreeSet::new();
    for indices in by_path.values() {
        for (i, &a) in indices.iter().enumerate() {
            for &b in &indices[i + 1..] {
                pairs.insert((a, b));
                pairs.insert((b, a));
            }
        }
    }

    let mut changed = BTreeSet::new();
    for (a, b) in pairs {
        let other = sessions[b].session_id.clone();
        if sessions[a].add_related(&other) {
            changed.insert(a);
        }
    }
    changed.into_iter().collect()
}

#[derive(Debug, Default)]
pub struct AutoLinkReport {
    pub updated: Vec<String>,
    /// Sessions whose file could not be rewritten
    pub failures: Vec<(PathBuf, SessionsError)>,
}

/// Scan, link sessions sharing a changed file, and write the ones that changed
pub fn auto_link(store: &SessionStore, sessions: &mut [Session]) -> AutoLinkReport {
    let mut report = AutoLinkReport::default();
    for idx in link_shared_files(sessions) {
        let session = &sessions[idx];
        match store.write_session(session) {
            Ok(path) => {
                debug!("linked {}", path.display());
                report.updated.push(session.session_id.clone());
            }
            Err(e) => report
                .failures
                .push((store.session_path(&session.session_id), e)),
        }
    }
    report
}

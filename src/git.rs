//! Git glue: which files changed in the working tree
//!
//! Shells out to the `git` binary. Callers decide whether a failure is fatal.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::{Result, SessionsError};
use crate::model::{FileAction, FileChange};

/// Placeholder summary for files pre-filled into a template
pub const PLACEHOLDER_SUMMARY: &str = "TODO";

fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
    debug!("git {}", args.join(" "));
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| SessionsError::Git(format!("running git {}: {}", args.join(" "), e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SessionsError::Git(format!(
            "git {} failed: {}",
            args.join(" "),
            stderr.trim()
        )));
    }
    String::from_utf8(output.stdout)
        .map_err(|e| SessionsError::Git(format!("git {}: non-UTF-8 output: {}", args.join(" "), e)))
}

/// Files reported by `git status --porcelain`
pub fn status_files(dir: &Path) -> Result<Vec<FileChange>> {
    run_git(dir, &["status", "--porcelain"]).map(|out| parse_status_porcelain(&out))
}

/// Files reported by `git diff --name-status <rev>`
pub fn diff_files(dir: &Path, rev: &str) -> Result<Vec<FileChange>> {
    run_git(dir, &["diff", "--name-status", rev]).map(|out| parse_name_status(&out))
}

/// Parse `XY PATH` / `XY OLD -> NEW` lines
pub fn parse_status_porcelain(output: &str) -> Vec<FileChange> {
    output
        .lines()
        .filter(|line| line.len() >= 4)
        .filter_map(|line| {
            let xy = line.get(..2)?;
            let mut path = line.get(2..)?.trim();
            if path.is_empty() {
                return None;
            }

            let action = if xy == "??" {
                FileAction::Added
            } else if xy.contains('D') {
                FileAction::Deleted
            } else if xy.contains('A') {
                FileAction::Added
            } else if xy.contains('R') {
                if let Some((_, new)) = path.split_once(" -> ") {
                    path = new;
                }
                FileAction::Renamed
            } else {
                FileAction::Modified
            };

            Some(change(path, action))
        })
        .collect()
}

/// Parse tab-separated `STATUS\tPATH` / `R100\tOLD\tNEW` lines
pub fn parse_name_status(output: &str) -> Vec<FileChange> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split('\t');
            let status = fields.next()?.trim();
            let paths: Vec<&str> = fields.filter(|f| !f.is_empty()).collect();
            // Renames and copies list the new path last
            let path = *paths.last()?;

            let action = match status.chars().next()? {
                'A' | 'C' => FileAction::Added,
                'D' => FileAction::Deleted,
                'R' => FileAction::Renamed,
                _ => FileAction::Modified,
            };
            Some(change(path, action))
        })
        .collect()
}

fn change(path: &str, action: FileAction) -> FileChange {
    FileChange {
        path: path.to_string(),
        action,
        summary: PLACEHOLDER_SUMMARY.to_string(),
    }
}

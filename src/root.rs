//! Locating the project and its `.sessions/` directory
//!
//! The project root is the nearest ancestor of the working directory holding
//! `.git/` or `.sessions/`. Setting `SESSIONS_DIR` skips the search and names
//! the sessions directory directly.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{Result, SessionsError};

pub const SESSIONS_DIR_NAME: &str = ".sessions";
pub const SESSIONS_DIR_ENV: &str = "SESSIONS_DIR";

/// Where a command should operate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Directory git commands run in
    pub project_root: PathBuf,
    pub sessions_dir: PathBuf,
}

/// Walk up from `start` looking for `.git/` or `.sessions/`
pub fn find_project_root_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").is_dir() || dir.join(SESSIONS_DIR_NAME).is_dir())
        .map(Path::to_path_buf)
}

/// Resolve the location from an optional `SESSIONS_DIR` value and a working
/// directory. Without either a marker or an override, the working directory
/// is used so `init` has somewhere to create `.sessions/`.
pub fn locate_from(env_override: Option<OsString>, cwd: &Path) -> Location {
    if let Some(dir) = env_override.filter(|d| !d.is_empty()) {
        let sessions_dir = PathBuf::from(dir);
        let sessions_dir = if sessions_dir.is_absolute() {
            sessions_dir
        } else {
            cwd.join(sessions_dir)
        };
        let project_root = sessions_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.to_path_buf());
        return Location {
            project_root,
            sessions_dir,
        };
    }

    let project_root = find_project_root_from(cwd).unwrap_or_else(|| cwd.to_path_buf());
    Location {
        sessions_dir: project_root.join(SESSIONS_DIR_NAME),
        project_root,
    }
}

/// Resolve the location for this process
pub fn locate() -> Result<Location> {
    let cwd = env::current_dir().map_err(|e| SessionsError::io(".", e))?;
    Ok(locate_from(env::var_os(SESSIONS_DIR_ENV), &cwd))
}

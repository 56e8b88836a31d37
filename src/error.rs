//! Error type shared by the library and the CLI

use std::path::PathBuf;

/// Everything that can go wrong while reading, writing or querying sessions
#[derive(Debug, thiserror::Error)]
pub enum SessionsError {
    #[error(".sessions/ directory not found at {}; run 'sessions init' first", .0.display())]
    NotInitialized(PathBuf),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Frontmatter delimiters missing or unterminated
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// A document that failed to parse, tagged with where it came from
    #[error("parsing {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid frontmatter YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid key {0:?}")]
    InvalidKey(String),

    #[error("invalid date {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("summary exceeds {max} characters ({len} given)")]
    SummaryTooLong { max: usize, len: usize },

    #[error("session file not found: {}", .0.display())]
    SessionNotFound(PathBuf),

    #[error("no sessions found; create one with 'sessions new'")]
    NoSessions,

    #[error("session already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("{0}")]
    ConflictingFlags(String),

    #[error("git: {0}")]
    Git(String),

    #[error("config {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("validation failed with {0} issue(s)")]
    ValidationFailed(usize),

    #[error("artifact drift detected in {0} reference(s)")]
    DriftDetected(usize),

    #[error("JSON output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("writing output: {0}")]
    Output(#[source] std::io::Error),
}

impl SessionsError {
    /// Attach a path to an I/O error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SessionsError::Io {
            path: path.into(),
            source,
        }
    }

    /// Re-tag an in-memory parse failure with the file it came from
    pub fn at_path(self, path: impl Into<PathBuf>) -> Self {
        match self {
            SessionsError::MalformedDocument(message) => SessionsError::Parse {
                path: path.into(),
                message,
            },
            SessionsError::Yaml(e) => SessionsError::Parse {
                path: path.into(),
                message: e.to_string(),
            },
            other => other,
        }
    }
}

impl From<std::io::Error> for SessionsError {
    fn from(e: std::io::Error) -> Self {
        SessionsError::Output(e)
    }
}

pub type Result<T> = std::result::Result<T, SessionsError>;

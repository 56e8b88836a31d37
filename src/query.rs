//! Query/filter engine over scanned sessions
//!
//! Every criterion is optional and they are ANDed. Matches keep scan order
//! (newest first) and record which files, tags and artifacts satisfied the
//! filter so they can be shown next to the result.

use std::io::Write;

use chrono::{DateTime, Days, FixedOffset, NaiveDate, Utc};
use glob::Pattern;
use serde::Serialize;

use crate::error::{Result, SessionsError};
use crate::model::Session;

/// Parse a `YYYY-MM-DD` literal
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| SessionsError::InvalidDate(s.to_string()))
}

#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    /// Glob over changed-file paths; exact match if the glob does not compile
    pub file: Option<String>,
    pub tag: Option<String>,
    /// Exact match on an artifact reference's `type`
    pub artifact_type: Option<String>,
    /// Inclusive, from the start of this UTC day
    pub after: Option<NaiveDate>,
    /// Inclusive, through the end of this UTC day
    pub before: Option<NaiveDate>,
    /// Case-insensitive substring of the body, else of a file summary
    pub search: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryMatch<'a> {
    pub session: &'a Session,
    pub matched_files: Vec<String>,
    pub matched_tags: Vec<String>,
    pub matched_docs: Vec<String>,
}

enum FileMatcher<'a> {
    Glob(Pattern),
    Exact(&'a str),
}

impl FileMatcher<'_> {
    fn new(pattern: &str) -> FileMatcher<'_> {
        match Pattern::new(pattern) {
            Ok(p) => FileMatcher::Glob(p),
            Err(_) => FileMatcher::Exact(pattern),
        }
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            FileMatcher::Glob(p) => p.matches(path),
            FileMatcher::Exact(s) => *s == path,
        }
    }
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Run the filter over sessions in scan order
pub fn run<'a>(sessions: &'a [Session], filter: &QueryFilter) -> Vec<QueryMatch<'a>> {
    let file_matcher = filter.file.as_deref().map(FileMatcher::new);
    let after = filter.after.map(day_start);
    let before = filter
        .before
        .and_then(|d| d.checked_add_days(Days::new(1)))
        .map(day_start);
    let search = filter.search.as_ref().map(|s| s.to_lowercase());

    let mut matches: Vec<QueryMatch<'a>> = sessions
        .iter()
        .filter_map(|s| {
            match_session(
                s,
                filter,
                file_matcher.as_ref(),
                after,
                before,
                search.as_deref(),
            )
        })
        .collect();

    if let Some(limit) = filter.limit.filter(|l| *l > 0) {
        matches.truncate(limit);
    }
    matches
}

fn match_session<'a>(
    session: &'a Session,
    filter: &QueryFilter,
    file_matcher: Option<&FileMatcher<'_>>,
    after: Option<DateTime<Utc>>,
    before: Option<DateTime<Utc>>,
    search: Option<&str>,
) -> Option<QueryMatch<'a>> {
    let mut m = QueryMatch {
        session,
        matched_files: Vec::new(),
        matched_tags: Vec::new(),
        matched_docs: Vec::new(),
    };

    if let Some(matcher) = file_matcher {
        m.matched_files = session
            .files_changed
            .iter()
            .filter(|f| matcher.matches(&f.path))
            .map(|f| f.path.clone())
            .collect();
        if m.matched_files.is_empty() {
            return None;
        }
    }

    if let Some(tag) = &filter.tag {
        if !session.has_tag(tag) {
            return None;
        }
        m.matched_tags.push(tag.clone());
    }

    if let Some(kind) = &filter.artifact_type {
        m.matched_docs = session
            .artifacts
            .iter()
            .filter(|a| &a.kind == kind)
            .map(|a| a.path.clone())
            .collect();
        if m.matched_docs.is_empty() {
            return None;
        }
    }

    let ts: DateTime<FixedOffset> = session.timestamp;
    if after.is_some_and(|after| ts < after) {
        return None;
    }
    if before.is_some_and(|before| ts >= before) {
        return None;
    }

    if let Some(needle) = search {
        let in_body = session.body.to_lowercase().contains(needle);
        let in_files = || {
            session
                .files_changed
                .iter()
                .any(|f| f.summary.to_lowercase().contains(needle))
        };
        if !in_body && !in_files() {
            return None;
        }
    }

    Some(m)
}

/// One line per match: `ID  SUMMARY  [files: ..; tags: ..; docs: ..]`
pub fn render_text(matches: &[QueryMatch<'_>], out: &mut impl Write) -> Result<()> {
    for m in matches {
        let mut line = format!("{}  {}", m.session.session_id, m.session.summary_line());

        let mut extras = Vec::new();
        if !m.matched_files.is_empty() {
            extras.push(format!("files: {}", m.matched_files.join(", ")));
        }
        if !m.matched_tags.is_empty() {
            extras.push(format!("tags: {}", m.matched_tags.join(", ")));
        }
        if !m.matched_docs.is_empty() {
            extras.push(format!("docs: {}", m.matched_docs.join(", ")));
        }
        if !extras.is_empty() {
            line.push_str(&format!("  [{}]", extras.join("; ")));
        }
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct JsonMatch<'a> {
    session_id: &'a str,
    summary: String,
    tags: &'a [String],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    matched_files: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    matched_docs: Vec<String>,
}

/// Pretty-printed JSON array of matches
pub fn render_json(matches: &[QueryMatch<'_>], out: &mut impl Write) -> Result<()> {
    let rows: Vec<JsonMatch<'_>> = matches
        .iter()
        .map(|m| JsonMatch {
            session_id: &m.session.session_id,
            summary: m.session.summary_line(),
            tags: &m.session.tags,
            matched_files: m.matched_files.clone(),
            matched_docs: m.matched_docs.clone(),
        })
        .collect();
    serde_json::to_writer_pretty(&mut *out, &rows)?;
    writeln!(out)?;
    Ok(())
}

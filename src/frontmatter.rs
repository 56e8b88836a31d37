//! Frontmatter splitting and document assembly
//!
//! A record document is a YAML block between two `---` lines followed by a
//! markdown body:
//!
//! ```text
//! ---
//! summary: Fixed the scanner
//! tags: [parser]
//! ---
//!
//! ## Key Decisions
//! ```
//!
//! The splitter knows nothing about YAML. Any line starting with `---` after
//! the opening delimiter closes the block, so bodies and YAML values must not
//! contain a standalone `---` line.

use crate::error::{Result, SessionsError};

const DELIMITER: &str = "---";

/// Split a document into its raw YAML block and its trimmed body
pub fn split(content: &str) -> Result<(&str, &str)> {
    let content = content.trim();
    let Some(rest) = content.strip_prefix(DELIMITER) else {
        return Err(SessionsError::MalformedDocument(
            "file does not start with frontmatter delimiter '---'".to_string(),
        ));
    };
    let rest = skip_line_ending(rest);

    let Some(idx) = rest.find("\n---") else {
        return Err(SessionsError::MalformedDocument(
            "no closing frontmatter delimiter '---' found".to_string(),
        ));
    };

    let yaml = &rest[..idx];
    let body = skip_line_ending(&rest[idx + 4..]);
    Ok((yaml, body.trim()))
}

/// Assemble a document from serialized YAML and a body
///
/// `yaml` is expected to end with a newline, as `serde_yaml` output does.
pub fn join(yaml: &str, body: &str) -> String {
    let mut doc = String::with_capacity(yaml.len() + body.len() + 12);
    doc.push_str(DELIMITER);
    doc.push('\n');
    doc.push_str(yaml);
    if !yaml.ends_with('\n') {
        doc.push('\n');
    }
    doc.push_str(DELIMITER);
    doc.push_str("\n\n");
    doc.push_str(body.trim());
    doc.push('\n');
    doc
}

fn skip_line_ending(s: &str) -> &str {
    s.strip_prefix("\r\n")
        .or_else(|| s.strip_prefix('\n'))
        .unwrap_or(s)
}

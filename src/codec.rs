//! Record codec: typed records to and from frontmatter documents
//!
//! `serialize(parse(x))` re-parses to a record equal to `parse(x)`. Body
//! whitespace is normalized and YAML key order is not preserved.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, SessionsError};
use crate::frontmatter;
use crate::model::{Artifact, Session};

/// Records that live in a frontmatter document and carry a separate body
pub trait Document: Serialize + DeserializeOwned {
    fn body(&self) -> &str;
    fn set_body(&mut self, body: String);
}

impl Document for Session {
    fn body(&self) -> &str {
        &self.body
    }

    fn set_body(&mut self, body: String) {
        self.body = body;
    }
}

impl Document for Artifact {
    fn body(&self) -> &str {
        &self.body
    }

    fn set_body(&mut self, body: String) {
        self.body = body;
    }
}

/// Parse a record from raw document text
pub fn parse<T: Document>(content: &str) -> Result<T> {
    let (yaml, body) = frontmatter::split(content)?;
    let mut record: T = if yaml.trim().is_empty() {
        // An empty block is a mapping with no keys, not a YAML null
        serde_yaml::from_str("{}")?
    } else {
        serde_yaml::from_str(yaml)?
    };
    record.set_body(body.to_string());
    Ok(record)
}

/// Render a record as a full document
pub fn serialize<T: Document>(record: &T) -> Result<String> {
    let yaml = serde_yaml::to_string(record)?;
    Ok(frontmatter::join(&yaml, record.body()))
}

pub fn parse_session(content: &str) -> Result<Session> {
    parse(content)
}

pub fn parse_artifact(content: &str) -> Result<Artifact> {
    parse(content)
}

/// Read and parse a record, naming the file in any error
pub fn read<T: Document>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| SessionsError::io(path, e))?;
    parse(&content).map_err(|e| e.at_path(path))
}

/// Serialize a record and write it to `path`, replacing any existing file
pub fn write<T: Document>(path: &Path, record: &T) -> Result<()> {
    let content = serialize(record).map_err(|e| e.at_path(path))?;
    fs::write(path, content).map_err(|e| SessionsError::io(path, e))
}

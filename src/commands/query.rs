//! `sessions query`: filter sessions and print matches as text or JSON

use std::io::Write;

use clap::ValueEnum;

use super::{Outcome, Workspace};
use crate::error::Result;
use crate::query::{self, QueryFilter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum QueryFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub filter: QueryFilter,
    pub format: QueryFormat,
}

pub fn run(ws: &Workspace, opts: &QueryOptions, out: &mut impl Write) -> Result<Outcome> {
    let report = ws.scan()?;
    let matches = query::run(&report.sessions, &opts.filter);

    if matches.is_empty() {
        writeln!(out, "No matching sessions found.")?;
        return Ok(Outcome::Empty);
    }

    match opts.format {
        QueryFormat::Text => query::render_text(&matches, out)?,
        QueryFormat::Json => query::render_json(&matches, out)?,
    }
    Ok(Outcome::Done)
}

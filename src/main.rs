use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;
use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::prelude::*;

use sessions::commands::{
    self, artifact::ArtifactOptions, context::ContextFormat, context::ContextOptions,
    edit::EditOptions, link::LinkOptions, list::ListOptions, new::NewOptions,
    query::QueryFormat, query::QueryOptions, status::StatusOptions,
    validate::ValidateOptions, Outcome, Workspace,
};
use sessions::query::{parse_date, QueryFilter};
use sessions::{init, root, Layout, Result, SessionsError};

#[derive(Parser, Debug)]
#[command(name = "sessions")]
#[command(author, version, about = "Session memory for AI-assisted development")]
#[command(
    long_about = "Record what each working session did, attach deep-dive artifacts, \
    link related sessions and query the history. Everything lives as markdown \
    with YAML frontmatter under .sessions/."
)]
struct Cli {
    /// Show debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the .sessions/ directory in the project root
    Init {
        /// Directory layout for session and artifact files
        #[arg(long, default_value_t = Layout::Sharded)]
        layout: Layout,
    },

    /// Record a session (prints a template unless stdin or --empty is given)
    New {
        /// Comma-separated tags
        #[arg(short, long)]
        tags: Option<String>,

        /// Write a stub session without waiting for content
        #[arg(long)]
        empty: bool,

        /// Fill changed files from `git diff --name-status <REV>`
        #[arg(long, value_name = "REV", num_args = 0..=1, default_missing_value = "HEAD")]
        diff: Option<String>,
    },

    /// Attach an artifact to a session
    Artifact {
        /// File name of the artifact (.md is appended if missing)
        name: String,

        /// Target session ID (defaults to the most recent)
        #[arg(short, long)]
        session: Option<String>,

        /// Artifact type, e.g. analysis, decision, investigation
        #[arg(short = 't', long = "type")]
        kind: Option<String>,

        /// Take the body from this file
        #[arg(long, value_name = "FILE")]
        import: Option<PathBuf>,

        /// Take the body from this file, then delete it
        #[arg(long, value_name = "FILE")]
        ingest: Option<PathBuf>,
    },

    /// Change fields of a session or artifact
    Edit {
        /// SESSION_ID or SESSION_ID/FILE
        key: String,

        /// New summary
        #[arg(long)]
        summary: Option<String>,

        /// Tag to add to a session (repeatable, comma-separated)
        #[arg(long = "add-tag", value_name = "TAG")]
        add_tag: Vec<String>,

        /// New artifact title
        #[arg(long)]
        title: Option<String>,

        /// New artifact status (draft, accepted, superseded, deprecated)
        #[arg(long)]
        status: Option<String>,

        /// Key of the artifact this one replaces
        #[arg(long)]
        supersedes: Option<String>,
    },

    /// Link two sessions, or every pair sharing a changed file
    Link {
        /// The two session IDs to link
        sessions: Vec<String>,

        /// Link all sessions that changed the same file
        #[arg(long)]
        auto: bool,
    },

    /// List sessions, newest first (--verbose adds file and artifact counts)
    List {
        /// Only sessions with this tag
        #[arg(long)]
        tag: Option<String>,
    },

    /// Search sessions
    Query {
        /// Changed-file path or glob
        #[arg(short, long)]
        file: Option<String>,

        /// Session tag
        #[arg(long)]
        tag: Option<String>,

        /// Artifact type
        #[arg(long = "type", alias = "doc-type", value_name = "TYPE")]
        artifact_type: Option<String>,

        /// Sessions on or after this day (YYYY-MM-DD)
        #[arg(long)]
        after: Option<String>,

        /// Sessions on or before this day (YYYY-MM-DD)
        #[arg(long)]
        before: Option<String>,

        /// Case-insensitive text in the body or change summaries
        #[arg(short, long)]
        search: Option<String>,

        /// Maximum number of results (0 for no limit)
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Output format
        #[arg(long, value_enum, default_value_t = QueryFormat::Text)]
        format: QueryFormat,
    },

    /// Show artifact lifecycle status
    Status {
        /// Only artifacts of this type
        #[arg(long = "type", alias = "artifact-type", value_name = "TYPE")]
        kind: Option<String>,

        /// Only superseded or deprecated artifacts
        #[arg(long)]
        stale: bool,
    },

    /// Check that summaries are present and short enough
    Validate {
        /// Keys to check (all sessions and artifacts when omitted)
        keys: Vec<String>,
    },

    /// Show every session that touched the given files
    Context {
        /// File paths as recorded in files_changed
        #[arg(required = true)]
        files: Vec<String>,

        /// Include artifact bodies
        #[arg(long)]
        deep: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = ContextFormat::Markdown)]
        format: ContextFormat,
    },

    /// Report artifact references that disagree with their files
    Check,

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Diagnostics go to stderr so stdout stays clean for JSON output
fn init_tracing(verbose: bool) {
    let default = if verbose { "sessions=debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .without_time()
                .with_target(false),
        )
        .init();
}

/// Piped stdin, or None for a terminal or blank input
fn read_stdin() -> Result<Option<String>> {
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    let mut input = String::new();
    stdin
        .read_to_string(&mut input)
        .map_err(|e| SessionsError::io("<stdin>", e))?;
    if input.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(input))
    }
}

fn open_workspace() -> Result<Workspace> {
    let location = root::locate()?;
    tracing::debug!(sessions_dir = %location.sessions_dir.display(), "opening workspace");
    Workspace::open(&location)
}

fn run(cli: Cli, out: &mut impl Write) -> Result<Outcome> {
    match cli.command {
        Command::Init { layout } => {
            let location = root::locate()?;
            init::init_sessions(&location.sessions_dir, layout, out)?;
            Ok(Outcome::Done)
        }

        Command::New { tags, empty, diff } => {
            let ws = open_workspace()?;
            let input = if empty { None } else { read_stdin()? };
            let opts = NewOptions {
                tags: tags.as_deref().map(commands::parse_tags).unwrap_or_default(),
                empty,
                diff,
                now: chrono::Local::now().fixed_offset(),
            };
            commands::new::run(&ws, &opts, input.as_deref(), out)
        }

        Command::Artifact {
            name,
            session,
            kind,
            import,
            ingest,
        } => {
            let ws = open_workspace()?;
            let input = read_stdin()?;
            let opts = ArtifactOptions {
                name,
                session,
                kind,
                import,
                ingest,
            };
            commands::artifact::run(&ws, &opts, input.as_deref(), out)
        }

        Command::Edit {
            key,
            summary,
            add_tag,
            title,
            status,
            supersedes,
        } => {
            let ws = open_workspace()?;
            let opts = EditOptions {
                key,
                summary,
                add_tags: add_tag.iter().flat_map(|t| commands::parse_tags(t)).collect(),
                title,
                status,
                supersedes,
            };
            commands::edit::run(&ws, &opts, out)
        }

        Command::Link { sessions, auto } => {
            let ws = open_workspace()?;
            commands::link::run(&ws, &LinkOptions { auto, sessions }, out)
        }

        Command::List { tag } => {
            let ws = open_workspace()?;
            let opts = ListOptions {
                tag,
                verbose: cli.verbose,
            };
            commands::list::run(&ws, &opts, out)
        }

        Command::Query {
            file,
            tag,
            artifact_type,
            after,
            before,
            search,
            limit,
            format,
        } => {
            // Bad dates are input errors even before the directory is checked
            let after = after.as_deref().map(parse_date).transpose()?;
            let before = before.as_deref().map(parse_date).transpose()?;
            let ws = open_workspace()?;
            let opts = QueryOptions {
                filter: QueryFilter {
                    file,
                    tag,
                    artifact_type,
                    after,
                    before,
                    search,
                    limit,
                },
                format,
            };
            commands::query::run(&ws, &opts, out)
        }

        Command::Status { kind, stale } => {
            let ws = open_workspace()?;
            commands::status::run(&ws, &StatusOptions { kind, stale }, out)
        }

        Command::Validate { keys } => {
            let ws = open_workspace()?;
            commands::validate::run(&ws, &ValidateOptions { keys }, out)
        }

        Command::Context {
            files,
            deep,
            format,
        } => {
            let ws = open_workspace()?;
            let opts = ContextOptions {
                files,
                deep,
                format,
            };
            commands::context::run(&ws, &opts, out)
        }

        Command::Check => {
            let ws = open_workspace()?;
            commands::check::run(&ws, out)
        }

        Command::Completion { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "sessions", out);
            Ok(Outcome::Done)
        }
    }
}

fn main() {
    // Exit code 2 means "nothing found", so usage errors exit 1 like other errors
    let cli = Cli::try_parse().unwrap_or_else(|e| {
        let _ = e.print();
        std::process::exit(if e.use_stderr() { 1 } else { 0 });
    });
    init_tracing(cli.verbose);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = run(cli, &mut out);
    let _ = out.flush();

    match result {
        Ok(Outcome::Done) => {}
        Ok(Outcome::Empty) => std::process::exit(2),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

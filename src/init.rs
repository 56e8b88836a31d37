//! Project initialization
//!
//! `sessions init` creates the `.sessions/` directory and its layout

use colored::Colorize;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::config::{Config, CONFIG_FILE};
use crate::error::{Result, SessionsError};
use crate::keys::Layout;

/// Create a sessions directory with the given layout.
/// Returns false if it already existed, in which case nothing is touched.
pub fn init_sessions(sessions_dir: &Path, layout: Layout, out: &mut impl Write) -> Result<bool> {
    if sessions_dir.is_dir() {
        writeln!(
            out,
            "{} already exists at {}",
            ".sessions/".cyan(),
            sessions_dir.display()
        )?;
        return Ok(false);
    }

    writeln!(out, "\n{}\n", "Initializing sessions".bold())?;

    create_dir_if_missing(sessions_dir, out)?;
    if layout == Layout::Sharded {
        create_dir_if_missing(&sessions_dir.join("sessions"), out)?;
        create_dir_if_missing(&sessions_dir.join("artifacts"), out)?;
    }
    write_file_if_missing(&sessions_dir.join(".gitkeep"), "", ".gitkeep", out)?;
    write_file_if_missing(
        &sessions_dir.join(CONFIG_FILE),
        &Config::template(layout),
        CONFIG_FILE,
        out,
    )?;

    writeln!(
        out,
        "\n{} ({} layout) at {}",
        "Sessions initialized!".green().bold(),
        layout,
        sessions_dir.display()
    )?;
    writeln!(out, "\nNext steps:")?;
    writeln!(out, "  1. Run {} to print a session template", "sessions new".cyan())?;
    writeln!(
        out,
        "  2. Run {} to attach a deep-dive document",
        "sessions artifact <name>".cyan()
    )?;
    Ok(true)
}

fn create_dir_if_missing(path: &Path, out: &mut impl Write) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| SessionsError::io(path, e))?;
        writeln!(out, "   {} {}", "Creating".green(), path.display())?;
    }
    Ok(())
}

fn write_file_if_missing(
    path: &Path,
    content: &str,
    display_name: &str,
    out: &mut impl Write,
) -> Result<()> {
    if path.exists() {
        writeln!(
            out,
            "   {} {} (already exists)",
            "Skipping".yellow(),
            display_name
        )?;
    } else {
        fs::write(path, content).map_err(|e| SessionsError::io(path, e))?;
        writeln!(out, "   {} {}", "Creating".green(), display_name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_sharded() {
        let dir = TempDir::new().unwrap();
        let sessions_dir = dir.path().join(".sessions");
        let mut out = Vec::new();

        assert!(init_sessions(&sessions_dir, Layout::Sharded, &mut out).unwrap());
        assert!(sessions_dir.join("sessions").is_dir());
        assert!(sessions_dir.join("artifacts").is_dir());
        assert!(sessions_dir.join(".gitkeep").is_file());
        assert_eq!(Config::load(&sessions_dir).unwrap().layout, Layout::Sharded);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Creating"));
        assert!(text.contains("config.toml"));
    }

    #[test]
    fn test_init_flat_has_no_subdirectories() {
        let dir = TempDir::new().unwrap();
        let sessions_dir = dir.path().join(".sessions");
        init_sessions(&sessions_dir, Layout::Flat, &mut Vec::new()).unwrap();
        assert!(!sessions_dir.join("sessions").exists());
        assert_eq!(Config::load(&sessions_dir).unwrap().layout, Layout::Flat);
    }

    #[test]
    fn test_init_is_noop_when_present() {
        let dir = TempDir::new().unwrap();
        let sessions_dir = dir.path().join(".sessions");
        init_sessions(&sessions_dir, Layout::Sharded, &mut Vec::new()).unwrap();
        fs::write(sessions_dir.join(CONFIG_FILE), "layout = \"flat\"\n").unwrap();

        let mut out = Vec::new();
        assert!(!init_sessions(&sessions_dir, Layout::Sharded, &mut out).unwrap());
        assert!(String::from_utf8(out).unwrap().contains("already exists"));
        assert_eq!(Config::load(&sessions_dir).unwrap().layout, Layout::Flat);
    }
}

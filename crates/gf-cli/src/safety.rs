//! Guards run before the fill engine is allowed to write.

use std::io::{BufRead, Write};
use std::process::Command;

use anyhow::{Context, Result};

use crate::error::PreflightError;

/// Fails if any of `processes` is running.
///
/// Lookups use `pgrep -x`. When `pgrep` cannot be run the check is skipped
/// with a warning rather than blocking the tool on systems without it.
pub fn check_writers(processes: &[String]) -> Result<(), PreflightError> {
    for process in processes {
        match running_pids(process) {
            Ok(pids) if pids.is_empty() => {
                tracing::debug!(%process, "writer not running");
            }
            Ok(pids) => {
                return Err(PreflightError::ConflictingWriter {
                    process: process.clone(),
                    pids: pids.join(", "),
                });
            }
            Err(e) => {
                tracing::warn!(%process, error = %e, "could not check for running process");
            }
        }
    }
    Ok(())
}

/// Returns the pids of processes named exactly `name`.
fn running_pids(name: &str) -> std::io::Result<Vec<String>> {
    let output = Command::new("pgrep").arg("-x").arg(name).output()?;

    // pgrep exits 1 when nothing matched
    match output.status.code() {
        Some(0) => Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()),
        Some(1) => Ok(Vec::new()),
        _ => Err(std::io::Error::other(format!(
            "pgrep failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ))),
    }
}

/// Shows `summary` and asks the operator to go ahead.
///
/// Only `y` or `yes` (any case) counts as consent; end of input declines.
pub fn confirm<R: BufRead, W: Write>(reader: &mut R, writer: &mut W, summary: &str) -> Result<bool> {
    write!(writer, "{summary}")?;
    writeln!(
        writer,
        "Warning: events are rewritten one at a time, not in a single transaction."
    )?;
    writeln!(
        writer,
        "An interrupted run leaves earlier edits in place. Back up the database first."
    )?;
    write!(writer, "Proceed? [y/N] ")?;
    writer.flush()?;

    let mut answer = String::new();
    reader
        .read_line(&mut answer)
        .context("failed to read confirmation")?;

    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(input: &str) -> (bool, String) {
        let mut reader = input.as_bytes();
        let mut output = Vec::new();
        let answer = confirm(&mut reader, &mut output, "Database: aw.db\n").unwrap();
        (answer, String::from_utf8(output).unwrap())
    }

    #[test]
    fn accepts_yes_in_any_case() {
        assert!(ask("y\n").0);
        assert!(ask("YES\n").0);
        assert!(ask("  Yes  \n").0);
    }

    #[test]
    fn anything_else_declines() {
        assert!(!ask("n\n").0);
        assert!(!ask("\n").0);
        assert!(!ask("yep\n").0);
        assert!(!ask("").0);
    }

    #[test]
    fn prompt_shows_summary_and_warning() {
        let (_, output) = ask("n\n");
        assert!(output.starts_with("Database: aw.db\n"));
        assert!(output.contains("not in a single transaction"));
        assert!(output.ends_with("Proceed? [y/N] "));
    }

    #[test]
    fn no_processes_means_nothing_to_check() {
        assert!(check_writers(&[]).is_ok());
    }

    #[test]
    fn absent_process_passes() {
        let names = ["gapfill-test-no-such-process".to_string()];
        assert!(check_writers(&names).is_ok());
    }

    #[test]
    fn running_writer_blocks_the_fill() {
        // Without pgrep the check degrades to a warning; nothing to assert.
        if Command::new("pgrep").arg("-V").output().is_err() {
            return;
        }
        let mut child = Command::new("sleep").arg("5").spawn().unwrap();

        let result = check_writers(&["sleep".to_string()]);

        child.kill().unwrap();
        child.wait().unwrap();
        match result {
            Err(PreflightError::ConflictingWriter { process, pids }) => {
                assert_eq!(process, "sleep");
                assert!(pids.contains(&child.id().to_string()), "pids: {pids}");
            }
            other => panic!("expected a conflicting writer, got {other:?}"),
        }
    }
}

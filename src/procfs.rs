//! Process listing from the `/proc` pseudo-filesystem.

use anyhow::{Context, Result, anyhow};
use std::fs;
use std::io::Write;
use std::path::Path;

/// One row of the `ps` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: String,
    /// Command name as it appears in `stat`, parentheses included.
    pub comm: String,
    pub ppid: i64,
    pub priority: i64,
}

/// Fields following `(comm)` in a `stat` record: state, ppid, ten skipped
/// fields, then the value shown in the PRIORITY column.
const PPID_FIELD: usize = 1;
const PRIORITY_FIELD: usize = 12;

/// Parse the contents of `/proc/<pid>/stat`.
///
/// The command name may contain spaces and parentheses, so the record is split
/// after the last `)`.
pub fn parse_stat(pid: &str, record: &str) -> Result<ProcessInfo> {
    let open = record
        .find('(')
        .ok_or_else(|| anyhow!("missing command name"))?;
    let close = record
        .rfind(')')
        .filter(|&close| close > open)
        .ok_or_else(|| anyhow!("unterminated command name"))?;
    let comm = &record[open..=close];
    let rest: Vec<&str> = record[close + 1..].split_whitespace().collect();

    let field = |index: usize, what: &str| -> Result<i64> {
        rest.get(index)
            .ok_or_else(|| anyhow!("missing {what} field"))?
            .parse()
            .with_context(|| format!("bad {what} field"))
    };

    Ok(ProcessInfo {
        pid: pid.to_string(),
        comm: comm.to_string(),
        ppid: field(PPID_FIELD, "ppid")?,
        priority: field(PRIORITY_FIELD, "priority")?,
    })
}

/// Header line matching [`format_row`].
pub fn header() -> String {
    format!("{:<10} {:<6} {:<6} {:<6}", "PID", "CMD", "PPID", "PRIORITY")
}

pub fn format_row(info: &ProcessInfo) -> String {
    format!(
        "{:<10} {:<6} {:<6} {:<6}",
        info.pid, info.comm, info.ppid, info.priority
    )
}

/// Scan every numeric directory under `root` (normally `/proc`).
///
/// Entries that vanish or cannot be parsed between listing and reading are skipped.
pub fn list_processes(root: &Path) -> Result<Vec<ProcessInfo>> {
    let entries =
        fs::read_dir(root).with_context(|| format!("ps: {}", root.display()))?;
    let mut processes = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(pid) = name.to_str() else { continue };
        if pid.is_empty() || !pid.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        let stat_path = entry.path().join("stat");
        let parsed = fs::read_to_string(&stat_path)
            .map_err(anyhow::Error::from)
            .and_then(|record| parse_stat(pid, &record));
        match parsed {
            Ok(info) => processes.push(info),
            Err(e) => tracing::warn!(path = %stat_path.display(), "skipping process: {e:#}"),
        }
    }
    Ok(processes)
}

/// Write the header and one row per process found under `root`.
pub fn print_processes(root: &Path, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{}", header())?;
    for info in list_processes(root)? {
        writeln!(out, "{}", format_row(&info))?;
    }
    Ok(())
}

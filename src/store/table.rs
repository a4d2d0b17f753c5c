//! File-as-table operations generic over the record kinds.
//!
//! Every operation opens, fully reads or writes, and closes its file
//! within the call. There is no locking and the merge-upsert rewrite is
//! not atomic: a crash mid-rewrite can truncate the table. Acceptable for
//! a single interactive client only.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::warn;

use super::csv::parse_line;
use super::record::{Record, Row};
use super::StoreError;

/// Insert `record` unless a row with the same key already exists.
///
/// Creates the parent directory and the file (header first) as needed.
/// A duplicate key is a silent no-op, not an error, so re-collection of
/// the same repository is idempotent.
pub fn append_if_absent<R: Record>(path: &Path, record: &R) -> Result<(), StoreError> {
    ensure_parent_dir(path)?;

    if !path.exists() {
        fs::write(path, format!("{}\n{}\n", R::HEADER, record.to_row()))?;
        return Ok(());
    }

    let existing = scan_all::<R>(path)?;
    if existing.iter().any(|row| row.key() == record.key()) {
        return Ok(());
    }

    let mut file = OpenOptions::new().append(true).open(path)?;
    writeln!(file, "{}", record.to_row())?;
    Ok(())
}

/// Update the row matching `incoming`'s key via `merge`, or insert it,
/// then rewrite the whole table. Unlike [`append_if_absent`] this lets
/// rows accumulate state across collection runs (used for users, whose
/// PR counts sum and profile counters never regress).
pub fn merge_upsert<R: Record>(
    path: &Path,
    incoming: R,
    merge: impl Fn(&mut R, &R),
) -> Result<(), StoreError> {
    ensure_parent_dir(path)?;

    if !path.exists() {
        fs::write(path, format!("{}\n{}\n", R::HEADER, incoming.to_row()))?;
        return Ok(());
    }

    let mut rows = scan_all::<R>(path)?;
    match rows.iter_mut().find(|row| row.key() == incoming.key()) {
        Some(existing) => merge(existing, &incoming),
        None => rows.push(incoming),
    }

    let mut contents = String::from(R::HEADER);
    contents.push('\n');
    for row in &rows {
        contents.push_str(&row.to_row());
        contents.push('\n');
    }
    fs::write(path, contents)?;
    Ok(())
}

/// Decode every data row of the table. A missing file is an empty table.
/// A row whose field count disagrees with the header (typically the
/// remnant of a partial write) is logged and skipped; the scan continues.
pub fn scan_all<R: Record>(path: &Path) -> Result<Vec<R>, StoreError> {
    if !path.is_file() {
        return Ok(Vec::new());
    }

    let contents = fs::read_to_string(path)?;
    let mut lines = contents.lines();
    let header: Vec<String> = match lines.next() {
        Some(line) => parse_line(line),
        None => return Ok(Vec::new()),
    };

    let mut records = Vec::new();
    for (index, line) in lines.enumerate() {
        if line.is_empty() {
            continue;
        }
        let fields = parse_line(line);
        if fields.len() != header.len() {
            warn!(
                path = %path.display(),
                row = index + 2,
                expected = header.len(),
                found = fields.len(),
                "skipping malformed row"
            );
            continue;
        }
        records.push(R::from_row(&Row::new(&header, &fields)));
    }

    Ok(records)
}

fn ensure_parent_dir(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

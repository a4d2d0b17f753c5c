//! Table locations under the configured data directory, including the
//! per-repository pull-request tables.

use std::fs;
use std::path::{Path, PathBuf};

/// Repository table, one row per collected repository.
pub const REPOSITORIES_TABLE: &str = "projects.csv";
/// User table, one row per pull-request author.
pub const USERS_TABLE: &str = "users.csv";
/// Directory holding one pull-request table per repository.
pub const PULL_REQUESTS_DIR: &str = "projects";

/// Table file for one repository's pull requests:
/// `<base>/projects/<owner>-<name>.csv`.
///
/// Known limitation: when the owner or name itself contains `-`, the file
/// name is ambiguous and [`enumerate_pull_request_tables`] will split it
/// incorrectly. Deliberately left as-is rather than silently rewritten.
pub fn pull_request_table(base: &Path, owner: &str, name: &str) -> PathBuf {
    base.join(PULL_REQUESTS_DIR)
        .join(format!("{}-{}.csv", owner, name))
}

/// Every per-repository pull-request table under `base`, as
/// `(owner, name, path)`. The stem splits on the first `-` (see the
/// caveat on [`pull_request_table`]). Files without a `-` in the stem or
/// without a `.csv` extension are ignored. A missing directory yields an
/// empty listing.
pub fn enumerate_pull_request_tables(base: &Path) -> Vec<(String, String, PathBuf)> {
    let dir = base.join(PULL_REQUESTS_DIR);
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut tables = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("csv") {
            continue;
        }
        let stem = match path.file_stem().and_then(|stem| stem.to_str()) {
            Some(stem) => stem,
            None => continue,
        };
        if let Some((owner, name)) = stem.split_once('-') {
            tables.push((owner.to_string(), name.to_string(), path.clone()));
        }
    }

    tables.sort_by(|a, b| a.2.cmp(&b.2));
    tables
}

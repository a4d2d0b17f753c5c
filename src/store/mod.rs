//! CSV-backed persistence for collected GitHub data.
//!
//! Three flat tables under a configured base directory: `projects.csv`
//! (repositories, append-if-absent by `owner/name`), one
//! `projects/<owner>-<name>.csv` per repository (pull requests,
//! append-if-absent by number), and `users.csv` (merge-upsert by login).
//!
//! [`Store`] is the absorbing boundary: every I/O failure is logged and
//! turned into an empty result or a no-op, because a missing or corrupt
//! table must behave like an empty one and never block analysis of the
//! rest of the dataset.

pub mod csv;
pub mod paths;
pub mod record;
pub mod table;

pub use record::Record;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::model::{PullRequest, Repository, User};
use crate::stats::{self, RepositorySummary};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle over the data directory holding all three tables. Paths are
/// explicit; nothing is resolved against the ambient working directory.
#[derive(Debug, Clone)]
pub struct Store {
    base_dir: PathBuf,
}

impl Store {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Store {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn repositories_table(&self) -> PathBuf {
        self.base_dir.join(paths::REPOSITORIES_TABLE)
    }

    fn users_table(&self) -> PathBuf {
        self.base_dir.join(paths::USERS_TABLE)
    }

    fn pull_requests_table(&self, owner: &str, name: &str) -> PathBuf {
        paths::pull_request_table(&self.base_dir, owner, name)
    }

    /// Append the repository row unless `owner/name` was already
    /// collected. Re-saving an existing repository is a silent no-op.
    pub fn save_repository(&self, repo: &Repository) {
        let path = self.repositories_table();
        if let Err(err) = table::append_if_absent(&path, repo) {
            warn!(path = %path.display(), error = %err, "failed to save repository");
        }
    }

    /// Append each pull request to the repository's table, skipping
    /// numbers already present.
    pub fn save_pull_requests(&self, owner: &str, name: &str, prs: &[PullRequest]) {
        let path = self.pull_requests_table(owner, name);
        for pr in prs {
            if let Err(err) = table::append_if_absent(&path, pr) {
                warn!(
                    path = %path.display(),
                    number = pr.number,
                    error = %err,
                    "failed to save pull request"
                );
            }
        }
    }

    /// Merge-upsert each user into the user table: PR counts sum across
    /// runs, profile counters keep their maximum.
    pub fn save_users(&self, users: &[User]) {
        let path = self.users_table();
        for user in users {
            if let Err(err) = table::merge_upsert(&path, user.clone(), User::merge_from) {
                warn!(
                    path = %path.display(),
                    login = %user.login,
                    error = %err,
                    "failed to save user"
                );
            }
        }
    }

    pub fn load_repositories(&self) -> Vec<Repository> {
        self.scan(&self.repositories_table())
    }

    pub fn load_pull_requests(&self, owner: &str, name: &str) -> Vec<PullRequest> {
        self.scan(&self.pull_requests_table(owner, name))
    }

    /// Pull requests from every per-repository table, each paired with
    /// its `owner/name` key.
    pub fn load_all_pull_requests(&self) -> Vec<(String, PullRequest)> {
        let mut all = Vec::new();
        for (owner, name, path) in paths::enumerate_pull_request_tables(&self.base_dir) {
            let key = format!("{}/{}", owner, name);
            for pr in self.scan::<PullRequest>(&path) {
                all.push((key.clone(), pr));
            }
        }
        all
    }

    pub fn load_users(&self) -> Vec<User> {
        self.scan(&self.users_table())
    }

    /// Summary statistics over one repository's pull-request table.
    pub fn repository_summary(&self, owner: &str, name: &str) -> RepositorySummary {
        stats::summarize(&self.load_pull_requests(owner, name))
    }

    fn scan<R: Record>(&self, path: &Path) -> Vec<R> {
        match table::scan_all(path) {
            Ok(records) => records,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read table");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_store(test: &str) -> Store {
        let dir = std::env::temp_dir().join(format!(
            "repo_analyzer_store_{}_{}",
            test,
            std::process::id()
        ));
        fs::remove_dir_all(&dir).ok();
        Store::new(dir)
    }

    fn sample_pr(number: u64, state: &str, user: &str, created_at: &str) -> PullRequest {
        PullRequest {
            number,
            title: format!("PR {}", number),
            state: state.to_string(),
            created_at: created_at.to_string(),
            user: user.to_string(),
            ..PullRequest::default()
        }
    }

    #[test]
    fn test_empty_store_loads_nothing() {
        let store = scratch_store("empty");
        assert!(store.load_repositories().is_empty());
        assert!(store.load_users().is_empty());
        assert!(store.load_pull_requests("acme", "widget").is_empty());
        assert!(store.load_all_pull_requests().is_empty());
    }

    #[test]
    fn test_save_and_reload_repository() {
        let store = scratch_store("repo_cycle");
        let repo = Repository {
            name: "widget".to_string(),
            owner: "acme".to_string(),
            description: "A widget".to_string(),
            date_of_collection: "2024-03-01".to_string(),
            stars: 5,
            ..Repository::default()
        };

        store.save_repository(&repo);
        store.save_repository(&repo); // idempotent

        let loaded = store.load_repositories();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].full_name(), "acme/widget");
        assert_eq!(loaded[0].stars, 5);

        fs::remove_dir_all(store.base_dir()).ok();
    }

    #[test]
    fn test_load_all_pull_requests_keys_by_repo() {
        let store = scratch_store("all_prs");
        store.save_pull_requests(
            "acme",
            "widget",
            &[sample_pr(1, "open", "alice", "2024-01-15T00:00:00Z")],
        );
        store.save_pull_requests(
            "acme",
            "gadget",
            &[
                sample_pr(1, "closed", "bob", "2024-01-10T00:00:00Z"),
                sample_pr(2, "open", "bob", "2024-02-01T00:00:00Z"),
            ],
        );

        let all = store.load_all_pull_requests();
        assert_eq!(all.len(), 3);
        assert_eq!(all.iter().filter(|(key, _)| key == "acme/gadget").count(), 2);
        assert_eq!(all.iter().filter(|(key, _)| key == "acme/widget").count(), 1);

        fs::remove_dir_all(store.base_dir()).ok();
    }

    #[test]
    fn test_users_merge_across_saves() {
        let store = scratch_store("users_merge");
        store.save_users(&[User::new("alice", 3)]);
        let mut again = User::new("alice", 2);
        again.num_followers = 12;
        store.save_users(&[again, User::new("bob", 1)]);

        let mut users = store.load_users();
        users.sort_by(|a, b| a.login.cmp(&b.login));
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].num_pull_requests, 5);
        assert_eq!(users[0].num_followers, 12);
        assert_eq!(users[1].login, "bob");

        fs::remove_dir_all(store.base_dir()).ok();
    }

    #[test]
    fn test_repository_summary_scenario() {
        let store = scratch_store("summary");
        store.save_pull_requests(
            "acme",
            "widget",
            &[
                sample_pr(1, "open", "", "2024-01-15T00:00:00Z"),
                sample_pr(2, "closed", "alice", "2024-01-10T00:00:00Z"),
                sample_pr(3, "open", "alice", "2024-02-01T00:00:00Z"),
            ],
        );

        let summary = store.repository_summary("acme", "widget");
        assert_eq!(summary.open_prs, 2);
        assert_eq!(summary.closed_prs, 1);
        assert_eq!(summary.num_users, 1);
        assert_eq!(summary.oldest_pr_date.as_deref(), Some("2024-01-10"));

        fs::remove_dir_all(store.base_dir()).ok();
    }
}

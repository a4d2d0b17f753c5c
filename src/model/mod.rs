//! Entity types for collected GitHub data: repositories, pull requests,
//! users, and the license value embedded in a repository.

use std::fmt;

/// A repository license. No independent lifecycle: always embedded in a
/// [`Repository`], immutable once constructed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct License {
    /// Identifier of the license template (e.g., "mit"). May be empty.
    pub key: String,
    /// Display name. Empty means "no license".
    pub name: String,
    /// Link to the license text, when the API provides one.
    pub url: String,
}

impl fmt::Display for License {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "No License")
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// A GitHub user observed among pull-request authors.
///
/// `num_pull_requests` accumulates across collection runs; the remaining
/// counters come from the profile scraper and only ever move forward
/// (see the merge policy in the user table's upsert path).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    /// Login name, unique key within the user table.
    pub login: String,
    pub num_pull_requests: u32,
    pub num_repos: u32,
    pub num_followers: u32,
    pub num_following: u32,
    pub num_contributions: u32,
}

impl User {
    pub fn new(login: impl Into<String>, num_pull_requests: u32) -> Self {
        User {
            login: login.into(),
            num_pull_requests,
            ..User::default()
        }
    }

    /// Fold an incoming observation of the same user into this one.
    /// PR counts accumulate across runs touching different repositories;
    /// scraped profile counters treat older values as possibly stale and
    /// never regress.
    pub fn merge_from(&mut self, incoming: &User) {
        self.num_pull_requests += incoming.num_pull_requests;
        self.num_repos = self.num_repos.max(incoming.num_repos);
        self.num_followers = self.num_followers.max(incoming.num_followers);
        self.num_following = self.num_following.max(incoming.num_following);
        self.num_contributions = self.num_contributions.max(incoming.num_contributions);
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} PRs)", self.login, self.num_pull_requests)
    }
}

/// A pull request collected for one repository.
///
/// `number` is unique only within the owning repository's table. Entries
/// are immutable after write; re-collection skips duplicates by number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    /// Free text; may contain quotes and newlines in the API payload and
    /// must round-trip through the row escaping.
    pub body: String,
    /// `open` or `closed`. No `merged` distinction.
    pub state: String,
    /// ISO-8601 date-time string.
    pub created_at: String,
    /// ISO-8601 date-time string; absent while the PR is open.
    pub closed_at: Option<String>,
    /// Author login. Weak reference to a [`User`]; not enforced.
    pub user: String,
    pub commits: u32,
    pub additions: u32,
    pub deletions: u32,
    pub changed_files: u32,
    /// Free-form association tag from the API (e.g., "CONTRIBUTOR").
    pub author_association: String,
}

impl fmt::Display for PullRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}: {} ({})", self.number, self.title, self.state)
    }
}

/// A collected repository, keyed by `owner/name`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Repository {
    pub name: String,
    pub owner: String,
    pub description: String,
    pub homepage: String,
    pub license: License,
    pub forks: u32,
    pub watchers: u32,
    pub stars: u32,
    /// YYYY-MM-DD, set when the repository is first collected and not
    /// updated on re-save.
    pub date_of_collection: String,
    /// Pull requests gathered during the current collection run. Never
    /// persisted with the repository row; PR tables are separate files.
    pub pull_requests: Vec<PullRequest>,
}

impl Repository {
    /// The `owner/name` key used for dedup in the repository table.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let desc = if self.description.is_empty() {
            "No description".to_string()
        } else if self.description.len() > 50 {
            let cut = self
                .description
                .char_indices()
                .nth(50)
                .map(|(i, _)| i)
                .unwrap_or(self.description.len());
            format!("{}...", &self.description[..cut])
        } else {
            self.description.clone()
        };
        write!(f, "{}/{}: {} ({} stars)", self.owner, self.name, desc, self.stars)
    }
}

/// Distinct pull-request authors with their PR counts, in first-seen order.
/// Entries with an empty author login are skipped.
pub fn pull_request_authors(prs: &[PullRequest]) -> Vec<User> {
    let mut users: Vec<User> = Vec::new();
    for pr in prs {
        if pr.user.is_empty() {
            continue;
        }
        match users.iter_mut().find(|u| u.login == pr.user) {
            Some(user) => user.num_pull_requests += 1,
            None => users.push(User::new(pr.user.clone(), 1)),
        }
    }
    users
}

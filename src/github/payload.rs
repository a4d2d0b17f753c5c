//! Deserialization targets for GitHub REST API responses and their
//! conversion into the entity types.
//!
//! Every field defaults: the API omits or nulls fields freely and a
//! partial payload must still decode into a usable entity.

use serde::Deserialize;

use crate::model::{License, PullRequest, Repository};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountPayload {
    #[serde(default)]
    pub login: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LicensePayload {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// `GET /repos/{owner}/{name}` response, trimmed to the fields we keep.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepositoryPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub owner: Option<AccountPayload>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub license: Option<LicensePayload>,
    #[serde(default)]
    pub forks_count: u32,
    #[serde(default)]
    pub watchers_count: u32,
    #[serde(default)]
    pub stargazers_count: u32,
}

impl RepositoryPayload {
    pub fn into_repository(self, date_of_collection: String) -> Repository {
        let license = self
            .license
            .map(|license| License {
                key: license.key,
                name: license.name,
                url: license.url.unwrap_or_default(),
            })
            .unwrap_or_default();

        Repository {
            name: self.name,
            owner: self.owner.map(|owner| owner.login).unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            homepage: self.homepage.unwrap_or_default(),
            license,
            forks: self.forks_count,
            watchers: self.watchers_count,
            stars: self.stargazers_count,
            date_of_collection,
            pull_requests: Vec::new(),
        }
    }
}

/// `GET /search/issues` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchIssuesPayload {
    #[serde(default)]
    pub items: Vec<IssuePayload>,
}

/// One item of the issue search (a pull request, given the `is:pr`
/// qualifier). Carries no diff counters; those come from the detail
/// endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssuePayload {
    #[serde(default)]
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub closed_at: Option<String>,
    #[serde(default)]
    pub user: Option<AccountPayload>,
    #[serde(default)]
    pub author_association: String,
}

/// `GET /repos/{owner}/{name}/pulls/{number}` response, trimmed to the
/// diff counters the search payload lacks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullDetailPayload {
    #[serde(default)]
    pub commits: u32,
    #[serde(default)]
    pub additions: u32,
    #[serde(default)]
    pub deletions: u32,
    #[serde(default)]
    pub changed_files: u32,
    #[serde(default)]
    pub author_association: Option<String>,
}

impl IssuePayload {
    /// Merge the search payload with the optional detail payload. A
    /// missing detail payload degrades the counters to zero rather than
    /// failing the pull request.
    pub fn into_pull_request(self, details: Option<PullDetailPayload>) -> PullRequest {
        let mut pr = PullRequest {
            number: self.number,
            title: self.title,
            body: self.body.unwrap_or_default(),
            state: self.state,
            created_at: self.created_at,
            closed_at: self.closed_at,
            user: self.user.map(|user| user.login).unwrap_or_default(),
            author_association: self.author_association,
            ..PullRequest::default()
        };

        if let Some(details) = details {
            pr.commits = details.commits;
            pr.additions = details.additions;
            pr.deletions = details.deletions;
            pr.changed_files = details.changed_files;
            if let Some(association) = details.author_association {
                pr.author_association = association;
            }
        }

        pr
    }
}

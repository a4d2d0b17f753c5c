//! Scraper for GitHub profile pages.
//!
//! The profile counters (repositories, followers, following, yearly
//! contributions) are not all available through the REST API without
//! extra calls, so they are pulled out of the profile HTML directly:
//! locate a stable marker (the `?tab=...` anchors, the "contributions"
//! heading) and read the first number near it. Any failure degrades to
//! zeros — a profile that cannot be scraped must not abort collection.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument, warn};

use crate::model::User;

const BASE_URL: &str = "https://github.com";
/// Browser User-Agent; the profile page serves a stripped variant to
/// unknown clients.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/91.0.4472.124 Safari/537.36";
/// How far past a marker to look for its counter.
const MARKER_WINDOW: usize = 400;

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d[\d,.]*[km]?").unwrap());
static CONTRIBUTIONS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([\d,]+)\s+contributions?").unwrap());

/// Counters scraped from one profile page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileStats {
    pub num_repos: u32,
    pub num_followers: u32,
    pub num_following: u32,
    pub num_contributions: u32,
}

pub struct ProfileScraper {
    http: reqwest::Client,
}

impl Default for ProfileScraper {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileScraper {
    pub fn new() -> Self {
        ProfileScraper {
            http: reqwest::Client::new(),
        }
    }

    /// Scrape one user's profile. Fetch or parse failures log a warning
    /// and yield all-zero stats.
    #[instrument(skip(self))]
    pub async fn scrape(&self, login: &str) -> ProfileStats {
        let url = format!("{}/{}", BASE_URL, login);
        let html = match self.fetch(&url).await {
            Ok(html) => html,
            Err(err) => {
                warn!(login, error = %err, "failed to fetch profile page");
                return ProfileStats::default();
            }
        };

        let stats = extract_stats(&html);
        debug!(?stats, "scraped profile");
        stats
    }

    /// Scrape every user's profile and fill in their counters in place.
    pub async fn enrich_users(&self, users: &mut [User]) {
        for user in users {
            let stats = self.scrape(&user.login).await;
            user.num_repos = stats.num_repos;
            user.num_followers = stats.num_followers;
            user.num_following = stats.num_following;
            user.num_contributions = stats.num_contributions;
        }
    }

    async fn fetch(&self, url: &str) -> Result<String, reqwest::Error> {
        self.http
            .get(url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

fn extract_stats(html: &str) -> ProfileStats {
    ProfileStats {
        num_repos: stat_near(html, "?tab=repositories"),
        num_followers: stat_near(html, "?tab=followers"),
        num_following: stat_near(html, "?tab=following"),
        num_contributions: extract_contributions(html),
    }
}

/// First number within a fixed window after the marker, or 0.
fn stat_near(html: &str, marker: &str) -> u32 {
    let start = match html.find(marker) {
        Some(index) => index + marker.len(),
        None => return 0,
    };
    let end = (start + MARKER_WINDOW).min(html.len());
    let window = match html.get(start..end) {
        Some(window) => window,
        None => return 0,
    };
    NUMBER_RE
        .find(window)
        .map(|m| parse_number(m.as_str()))
        .unwrap_or(0)
}

fn extract_contributions(html: &str) -> u32 {
    CONTRIBUTIONS_RE
        .captures(html)
        .map(|caps| parse_number(&caps[1]))
        .unwrap_or(0)
}

/// Parse a display count, handling comma grouping and the abbreviated
/// `1.2k` / `3m` forms the profile page uses for large numbers.
fn parse_number(text: &str) -> u32 {
    let text = text.trim().to_ascii_lowercase();
    if text.is_empty() {
        return 0;
    }

    let (digits, multiplier) = if let Some(stripped) = text.strip_suffix('k') {
        (stripped, 1_000.0)
    } else if let Some(stripped) = text.strip_suffix('m') {
        (stripped, 1_000_000.0)
    } else {
        (text.as_str(), 1.0)
    };

    digits
        .replace(',', "")
        .parse::<f64>()
        .map(|value| (value * multiplier) as u32)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PROFILE: &str = r#"
        <nav>
          <a href="/alice?tab=repositories">Repositories
            <span class="Counter">128</span></a>
          <a href="/alice?tab=followers">
            <span class="text-bold">1.2k</span> followers</a>
          <a href="/alice?tab=following">
            <span class="text-bold">87</span> following</a>
        </nav>
        <h2 class="f4 text-normal mb-2">
          2,381 contributions in the last year
        </h2>
    "#;

    #[test]
    fn test_parse_number_simple() {
        assert_eq!(parse_number("100"), 100);
        assert_eq!(parse_number(" 42 "), 42);
        assert_eq!(parse_number("2,381"), 2381);
    }

    #[test]
    fn test_parse_number_with_k_suffix() {
        assert_eq!(parse_number("1.2k"), 1200);
        assert_eq!(parse_number("3k"), 3000);
    }

    #[test]
    fn test_parse_number_with_m_suffix() {
        assert_eq!(parse_number("1.5m"), 1_500_000);
    }

    #[test]
    fn test_parse_number_invalid() {
        assert_eq!(parse_number(""), 0);
        assert_eq!(parse_number("abc"), 0);
        assert_eq!(parse_number("k"), 0);
    }

    #[test]
    fn test_extract_stats_from_profile() {
        let stats = extract_stats(SAMPLE_PROFILE);
        assert_eq!(stats.num_repos, 128);
        assert_eq!(stats.num_followers, 1200);
        assert_eq!(stats.num_following, 87);
        assert_eq!(stats.num_contributions, 2381);
    }

    #[test]
    fn test_extract_stats_missing_markers() {
        let stats = extract_stats("<html><body>nothing here</body></html>");
        assert_eq!(stats, ProfileStats::default());
    }

    #[test]
    fn test_contributions_case_insensitive() {
        assert_eq!(extract_contributions("57 Contributions in 2024"), 57);
        assert_eq!(extract_contributions("1 contribution"), 1);
    }
}

//! Derived statistics over loaded tables: per-repository summaries and
//! Pearson correlation matrices. Nothing here persists anything.

use std::collections::HashSet;
use std::fmt;

use crate::model::{PullRequest, User};

/// Summary statistics for one repository's pull requests.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RepositorySummary {
    pub open_prs: usize,
    pub closed_prs: usize,
    /// Distinct non-empty author logins.
    pub num_users: usize,
    /// Lexicographically smallest YYYY-MM-DD prefix of `created_at`
    /// (lexicographic order is chronological for ISO-8601 dates).
    pub oldest_pr_date: Option<String>,
}

pub fn summarize(prs: &[PullRequest]) -> RepositorySummary {
    let open_prs = prs.iter().filter(|pr| pr.state == "open").count();
    let closed_prs = prs.iter().filter(|pr| pr.state == "closed").count();

    let num_users = prs
        .iter()
        .filter(|pr| !pr.user.is_empty())
        .map(|pr| pr.user.as_str())
        .collect::<HashSet<_>>()
        .len();

    let oldest_pr_date = prs
        .iter()
        .filter(|pr| !pr.created_at.is_empty())
        .map(|pr| date_prefix(&pr.created_at))
        .min()
        .map(str::to_string);

    RepositorySummary {
        open_prs,
        closed_prs,
        num_users,
        oldest_pr_date,
    }
}

fn date_prefix(created_at: &str) -> &str {
    created_at.get(..10).unwrap_or(created_at)
}

/// Pairwise Pearson correlations between a set of named numeric columns.
/// Cells are NaN when either column is constant (zero variance).
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    labels: Vec<&'static str>,
    cells: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[&'static str] {
        &self.labels
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.cells[row][col]
    }
}

impl fmt::Display for CorrelationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .labels
            .iter()
            .map(|label| label.len())
            .max()
            .unwrap_or(0)
            .max(6);

        write!(f, "{:width$}", "", width = width + 1)?;
        for label in &self.labels {
            write!(f, " {:>width$}", label, width = width)?;
        }
        writeln!(f)?;

        for (i, row) in self.cells.iter().enumerate() {
            write!(f, "{:<width$}", self.labels[i], width = width + 1)?;
            for value in row {
                if value.is_nan() {
                    write!(f, " {:>width$}", "", width = width)?;
                } else {
                    write!(f, " {:>width$.3}", value, width = width)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Correlations between the five user counters. Empty input yields an
/// empty matrix.
pub fn user_correlation(users: &[User]) -> CorrelationMatrix {
    if users.is_empty() {
        return CorrelationMatrix {
            labels: Vec::new(),
            cells: Vec::new(),
        };
    }
    let columns = vec![
        users.iter().map(|u| f64::from(u.num_pull_requests)).collect(),
        users.iter().map(|u| f64::from(u.num_repos)).collect(),
        users.iter().map(|u| f64::from(u.num_followers)).collect(),
        users.iter().map(|u| f64::from(u.num_following)).collect(),
        users.iter().map(|u| f64::from(u.num_contributions)).collect(),
    ];
    correlate(
        vec![
            "num_pull_requests",
            "num_repos",
            "num_followers",
            "num_following",
            "num_contributions",
        ],
        columns,
    )
}

/// Correlations between the numeric pull-request columns.
pub fn pr_correlation(prs: &[PullRequest]) -> CorrelationMatrix {
    if prs.is_empty() {
        return CorrelationMatrix {
            labels: Vec::new(),
            cells: Vec::new(),
        };
    }
    let columns = vec![
        prs.iter().map(|pr| f64::from(pr.commits)).collect(),
        prs.iter().map(|pr| f64::from(pr.additions)).collect(),
        prs.iter().map(|pr| f64::from(pr.deletions)).collect(),
        prs.iter().map(|pr| f64::from(pr.changed_files)).collect(),
    ];
    correlate(
        vec!["commits", "additions", "deletions", "changed_files"],
        columns,
    )
}

fn correlate(labels: Vec<&'static str>, columns: Vec<Vec<f64>>) -> CorrelationMatrix {
    let n = labels.len();
    let mut cells = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        for j in 0..n {
            cells[i][j] = pearson(&columns[i], &columns[j]);
        }
    }
    CorrelationMatrix { labels, cells }
}

fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len() as f64;
    if n < 2.0 {
        return f64::NAN;
    }
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denominator = (var_x * var_y).sqrt();
    if denominator == 0.0 {
        f64::NAN
    } else {
        covariance / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pr(state: &str, created_at: &str, user: &str) -> PullRequest {
        PullRequest {
            state: state.to_string(),
            created_at: created_at.to_string(),
            user: user.to_string(),
            ..PullRequest::default()
        }
    }

    #[test]
    fn test_summarize_counts_and_oldest_date() {
        let prs = vec![
            pr("open", "2024-01-15", ""),
            pr("closed", "2024-01-10", "alice"),
            pr("open", "2024-02-01", "alice"),
        ];
        let summary = summarize(&prs);
        assert_eq!(summary.open_prs, 2);
        assert_eq!(summary.closed_prs, 1);
        assert_eq!(summary.num_users, 1);
        assert_eq!(summary.oldest_pr_date.as_deref(), Some("2024-01-10"));
    }

    #[test]
    fn test_summarize_empty_input() {
        let summary = summarize(&[]);
        assert_eq!(summary, RepositorySummary::default());
        assert!(summary.oldest_pr_date.is_none());
    }

    #[test]
    fn test_summarize_ignores_unknown_states() {
        let prs = vec![pr("merged", "2024-01-01", "bob")];
        let summary = summarize(&prs);
        assert_eq!(summary.open_prs, 0);
        assert_eq!(summary.closed_prs, 0);
        assert_eq!(summary.num_users, 1);
    }

    #[test]
    fn test_summarize_truncates_datetime_to_date() {
        let prs = vec![pr("open", "2024-01-10T08:30:00Z", "bob")];
        let summary = summarize(&prs);
        assert_eq!(summary.oldest_pr_date.as_deref(), Some("2024-01-10"));
    }

    #[test]
    fn test_pearson_perfect_correlation() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&xs, &ys) - 1.0).abs() < 1e-9);

        let inverse = [8.0, 6.0, 4.0, 2.0];
        assert!((pearson(&xs, &inverse) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pearson_constant_column_is_nan() {
        let xs = [5.0, 5.0, 5.0];
        let ys = [1.0, 2.0, 3.0];
        assert!(pearson(&xs, &ys).is_nan());
    }

    #[test]
    fn test_pr_correlation_diagonal_is_one() {
        let prs: Vec<PullRequest> = (1..=4)
            .map(|i| PullRequest {
                number: i,
                commits: i as u32,
                additions: (i * 10) as u32,
                deletions: (5 - i) as u32,
                changed_files: (i * 2) as u32,
                ..PullRequest::default()
            })
            .collect();
        let matrix = pr_correlation(&prs);
        assert_eq!(matrix.labels().len(), 4);
        for i in 0..4 {
            assert!((matrix.get(i, i) - 1.0).abs() < 1e-9);
        }
        // additions grow with commits, deletions shrink.
        assert!(matrix.get(0, 1) > 0.99);
        assert!(matrix.get(0, 2) < -0.99);
    }

    #[test]
    fn test_user_correlation_empty() {
        assert!(user_correlation(&[]).is_empty());
    }

    #[test]
    fn test_matrix_display_blanks_nan() {
        let users = vec![User::new("alice", 1), User::new("bob", 2)];
        let matrix = user_correlation(&users);
        // num_repos is constant zero, so its row renders without numbers.
        let rendered = matrix.to_string();
        assert!(rendered.contains("num_pull_requests"));
        assert!(!rendered.contains("NaN"));
    }
}

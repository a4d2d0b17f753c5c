mod config;
mod github;
mod model;
mod scraper;
mod stats;
mod store;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::{info, info_span};
use tracing_subscriber::EnvFilter;

use github::GitHubClient;
use scraper::ProfileScraper;
use store::Store;

/// Repo Analyzer — collects GitHub repository, pull-request, and user
/// data into flat CSV tables and derives summary statistics and
/// correlation matrices from them.
#[derive(Parser, Debug)]
#[command(name = "repo-analyzer", version, about)]
struct Cli {
    /// Base directory for the data files (overrides the config file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect a repository: metadata, pull requests, and author profiles
    Collect {
        /// Repository owner (user or organization)
        owner: String,
        /// Repository name
        name: String,
        /// Skip scraping author profile pages
        #[arg(long)]
        no_scrape: bool,
    },
    /// List all collected repositories
    Repos,
    /// List the collected pull requests of one repository
    Prs { owner: String, name: String },
    /// Show summary statistics for one repository
    Summary { owner: String, name: String },
    /// List all collected users
    Users,
    /// Correlation matrix over the user counters
    UserCorrelation,
    /// Correlation matrix over one repository's pull-request counters
    PrCorrelation { owner: String, name: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data_dir());
    let store = Store::new(data_dir);

    match cli.command {
        Command::Collect {
            owner,
            name,
            no_scrape,
        } => collect(&store, &config, &owner, &name, no_scrape).await?,
        Command::Repos => list_repositories(&store),
        Command::Prs { owner, name } => list_pull_requests(&store, &owner, &name),
        Command::Summary { owner, name } => show_summary(&store, &owner, &name),
        Command::Users => list_users(&store),
        Command::UserCorrelation => show_user_correlation(&store),
        Command::PrCorrelation { owner, name } => show_pr_correlation(&store, &owner, &name),
    }

    Ok(())
}

async fn collect(
    store: &Store,
    config: &config::Config,
    owner: &str,
    name: &str,
    no_scrape: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let _span = info_span!("collect", owner = %owner, name = %name).entered();

    if config.github_token().is_none() {
        eprintln!(
            "{}",
            "Note: set GITHUB_TOKEN for higher API rate limits.".yellow()
        );
    }

    println!("Collecting data for {}/{}...", owner, name);
    let client = GitHubClient::new(config);
    let mut collected = github::collect(&client, owner, name).await?;
    info!(
        pull_requests = collected.pull_requests.len(),
        users = collected.users.len(),
        "collection fetched"
    );
    println!("Found: {}", collected.repository);
    println!("Found {} pull requests.", collected.pull_requests.len());

    if !no_scrape && !collected.users.is_empty() {
        println!(
            "Scraping profile data for {} users...",
            collected.users.len()
        );
        ProfileScraper::new().enrich_users(&mut collected.users).await;
    }

    store.save_repository(&collected.repository);
    store.save_pull_requests(owner, name, &collected.pull_requests);
    store.save_users(&collected.users);

    println!(
        "{} Collected data for {}/{}",
        "✓".green().bold(),
        owner,
        name
    );
    println!(
        "  - Repository info: {}",
        store.base_dir().join(store::paths::REPOSITORIES_TABLE).display()
    );
    println!(
        "  - Pull requests:   {}",
        store::paths::pull_request_table(store.base_dir(), owner, name).display()
    );
    println!(
        "  - User data:       {}",
        store.base_dir().join(store::paths::USERS_TABLE).display()
    );
    Ok(())
}

fn list_repositories(store: &Store) {
    let repos = store.load_repositories();
    if repos.is_empty() {
        println!("No repositories have been collected yet.");
        return;
    }

    println!("Found {} repository/repositories:\n", repos.len());
    for (i, repo) in repos.iter().enumerate() {
        println!("  {}. {}", i + 1, repo);
        println!("     License: {}", repo.license);
        println!("     Forks: {} | Watchers: {}", repo.forks, repo.watchers);
        println!("     Collected: {}\n", repo.date_of_collection);
    }
}

fn list_pull_requests(store: &Store, owner: &str, name: &str) {
    let prs = store.load_pull_requests(owner, name);
    if prs.is_empty() {
        println!("No pull requests found for {}/{}.", owner, name);
        return;
    }

    println!("Pull requests for {}/{}:", owner, name);
    println!(
        "{:<6} {:<8} {:<20} {:<40}",
        "#".bold(),
        "State".bold(),
        "User".bold(),
        "Title".bold()
    );
    println!("{}", "-".repeat(76));
    for pr in &prs {
        println!(
            "{:<6} {:<8} {:<20} {:<40}",
            pr.number,
            colorize_state(&pr.state),
            truncate(&pr.user, 20),
            truncate(&pr.title, 40)
        );
    }
    println!("\nTotal: {} pull requests", prs.len());
}

fn show_summary(store: &Store, owner: &str, name: &str) {
    let summary = store.repository_summary(owner, name);
    println!("Summary for {}/{}:", owner, name);
    println!("{}", "-".repeat(40));
    println!(
        "  Open pull requests:   {}",
        summary.open_prs.to_string().green()
    );
    println!(
        "  Closed pull requests: {}",
        summary.closed_prs.to_string().red()
    );
    println!(
        "  Total pull requests:  {}",
        summary.open_prs + summary.closed_prs
    );
    println!("  Number of users:      {}", summary.num_users);
    println!(
        "  Oldest PR date:       {}",
        summary.oldest_pr_date.as_deref().unwrap_or("N/A")
    );
}

fn list_users(store: &Store) {
    let users = store.load_users();
    if users.is_empty() {
        println!("No users have been collected yet.");
        return;
    }

    println!(
        "{:<20} {:>6} {:>7} {:>10} {:>10} {:>14}",
        "Login".bold(),
        "PRs".bold(),
        "Repos".bold(),
        "Followers".bold(),
        "Following".bold(),
        "Contributions".bold()
    );
    for user in &users {
        println!(
            "{:<20} {:>6} {:>7} {:>10} {:>10} {:>14}",
            truncate(&user.login, 20),
            user.num_pull_requests,
            user.num_repos,
            user.num_followers,
            user.num_following,
            user.num_contributions
        );
    }
}

fn show_user_correlation(store: &Store) {
    let users = store.load_users();
    let matrix = stats::user_correlation(&users);
    if matrix.is_empty() {
        println!("No user data available for correlation analysis.");
        return;
    }
    println!("{}", "User statistics correlation:".bold());
    print!("{}", matrix);
}

fn show_pr_correlation(store: &Store, owner: &str, name: &str) {
    let prs = store.load_pull_requests(owner, name);
    let matrix = stats::pr_correlation(&prs);
    if matrix.is_empty() {
        println!(
            "No pull request data available for {}/{}.",
            owner, name
        );
        return;
    }
    println!("{}", format!("Pull request correlation for {}/{}:", owner, name).bold());
    print!("{}", matrix);
}

fn colorize_state(state: &str) -> colored::ColoredString {
    match state {
        "open" => state.green(),
        "closed" => state.red(),
        _ => state.normal(),
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut)
}

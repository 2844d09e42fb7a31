use crate::client::{GithubApi, GithubClient};
use crate::commits::{commit_count_or_zero, histogram_from_commits};
use crate::config::{ClientConfig, DEFAULT_API_URL, DEFAULT_HISTORY_PAGES, DEFAULT_REPOS_PER_PAGE};
use crate::heatmap::{repository_heatmap, HeatmapView};
use crate::logging::setup_logging;
use crate::output;
use crate::session::{Explorer, SearchOutcome};
use crate::timeline::{build_timeline, TimelineView};
use crate::util::{current_year, parse_year};
use anyhow::{Context, Result};
use clap::builder::NonEmptyStringValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::warn;

#[derive(Parser)]
#[command(name = "ghmap")]
#[command(about = "Explore GitHub profiles: repositories, commit counts, creation timelines and heatmaps")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL, help = "GitHub REST API base URL")]
    pub api_url: String,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, help = "Token sent as a bearer credential")]
    pub token: Option<String>,

    #[arg(long, value_parser = humantime::parse_duration, default_value = "10s", help = "Per-request timeout (e.g. 10s, 1m)")]
    pub timeout: Duration,

    #[arg(long, default_value_t = DEFAULT_REPOS_PER_PAGE, help = "Number of most recently updated repositories to fetch")]
    pub per_page: u32,

    #[arg(long, default_value_t = DEFAULT_HISTORY_PAGES, help = "Maximum pages of commit history walked by --history")]
    pub max_history_pages: u32,

    #[arg(long, help = "Hide the commit counting progress bar")]
    pub no_progress: bool,

    #[arg(short, long, action = ArgAction::Count, global = true, help = "Increase log verbosity")]
    pub verbose: u8,

    #[arg(short, long, global = true, help = "Silence all logging")]
    pub quiet: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl CommonArgs {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new()
            .with_api_url(self.api_url.clone())
            .with_token(self.token.clone())
            .with_timeout(self.timeout)
            .with_repos_per_page(self.per_page)
            .with_max_history_pages(self.max_history_pages)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a profile and its repositories with commit counts
    User {
        #[arg(value_parser = NonEmptyStringValueParser::new(), help = "GitHub login")]
        login: String,

        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output as NDJSON")]
        ndjson: bool,
    },
    /// Show repositories created per month of a year
    Timeline {
        #[arg(value_parser = NonEmptyStringValueParser::new(), help = "GitHub login")]
        login: String,

        #[arg(long, value_parser = parse_year, help = "Year to show (defaults to current or latest year with repositories)")]
        year: Option<i32>,

        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Show a calendar heatmap of a repository's commits
    Heatmap {
        #[arg(value_parser = NonEmptyStringValueParser::new(), help = "GitHub login")]
        login: String,

        #[arg(value_parser = NonEmptyStringValueParser::new(), help = "Repository name")]
        repo: String,

        #[arg(long, value_parser = parse_year, help = "Year to show (clamped to the repository's lifetime)")]
        year: Option<i32>,

        #[arg(long, help = "Fetch real commit history instead of the placeholder pattern")]
        history: bool,

        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Read logins from stdin, one search per line; newer searches supersede older ones.
    /// A `:reset` line clears the current result and drops searches still in flight.
    Interactive,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        setup_logging(self.common.verbose, self.common.quiet, self.common.log_json);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")?;
        runtime.block_on(self.run())
    }

    async fn run(self) -> Result<()> {
        let client = GithubClient::new(self.common.client_config())
            .context("Failed to build HTTP client")?;

        match self.command {
            Commands::User { login, json, ndjson } => {
                let show_progress = !(json || ndjson || self.common.no_progress);
                exec_user(Explorer::new(client).with_progress(show_progress), &login, json, ndjson).await
            }
            Commands::Timeline { login, year, json } => {
                exec_timeline(&Explorer::new(client), &login, year, json).await
            }
            Commands::Heatmap { login, repo, year, history, json } => {
                exec_heatmap(&client, &login, &repo, year, history, json).await
            }
            Commands::Interactive => exec_interactive(Explorer::new(client)).await,
        }
    }
}

async fn exec_user<A: GithubApi>(explorer: Explorer<A>, login: &str, json: bool, ndjson: bool) -> Result<()> {
    let snapshot = match explorer.search(login).await {
        SearchOutcome::Applied(snapshot) => snapshot,
        SearchOutcome::Stale { login } => anyhow::bail!("Search for {login} was superseded"),
    };

    if let Some(failure) = snapshot.failure {
        anyhow::bail!(failure.user_message());
    }
    let profile = snapshot
        .profile
        .context("Search finished without a profile")?;

    if json {
        output::output_user_json(&profile, &snapshot.repositories)
    } else if ndjson {
        output::output_user_ndjson(&snapshot.repositories)
    } else {
        output::output_user(&profile, &snapshot.repositories)
    }
}

async fn exec_timeline<A: GithubApi>(explorer: &Explorer<A>, login: &str, year: Option<i32>, json: bool) -> Result<()> {
    let (profile, repos) = explorer
        .profile_and_repos(login)
        .await
        .map_err(|failure| anyhow::anyhow!(failure.user_message()))?;

    let timeline = match year {
        Some(year) => build_timeline(&repos, year),
        None => TimelineView::new(&repos, current_year()).timeline(),
    };

    if json {
        output::output_timeline_json(&profile.login, &timeline)
    } else {
        output::output_timeline(&timeline)
    }
}

async fn exec_heatmap<A: GithubApi>(
    api: &A,
    login: &str,
    repo_name: &str,
    year: Option<i32>,
    history: bool,
    json: bool,
) -> Result<()> {
    let repo = api.repository(login, repo_name).await.map_err(|err| {
        if err.is_not_found() {
            anyhow::anyhow!("Repository {login}/{repo_name} not found")
        } else {
            anyhow::Error::new(err).context("Failed to fetch repository")
        }
    })?;

    let commits = commit_count_or_zero(&repo.name, api.commit_page(login, &repo.name).await);
    let mut repo = repo.with_commit_count(commits);

    if history {
        let fetched = api.commit_history(login, &repo.name).await;
        match fetched {
            Ok(entries) => repo = repo.with_histogram(histogram_from_commits(&entries)),
            Err(err) => warn!(repo = %repo.name, "failed to fetch commit history: {err}"),
        }
    }

    let mut view = HeatmapView::for_repository(&repo, current_year());
    if let Some(year) = year {
        view.select_clamped(year);
    }
    let grid = repository_heatmap(&repo, view.year()).context("Failed to build heatmap grid")?;

    if json {
        output::output_heatmap_json(login, &repo, view.bounds(), &grid)
    } else {
        output::output_heatmap(&repo, view.bounds(), &grid)
    }
}

const RESET_COMMAND: &str = ":reset";

async fn exec_interactive<A: GithubApi + 'static>(explorer: Explorer<A>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut searches = JoinSet::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else { break };
                let login = line.trim().to_string();
                if login.is_empty() {
                    continue;
                }
                if login == RESET_COMMAND {
                    explorer.reset();
                    println!("{}", output::reset_notice());
                    continue;
                }
                // Taken here so the generation follows input order, not task scheduling.
                let ticket = explorer.begin();
                let explorer = explorer.clone();
                searches.spawn(async move { explorer.search_with(ticket, &login).await });
            }
            Some(done) = searches.join_next(), if !searches.is_empty() => {
                report(done);
            }
        }
    }

    while let Some(done) = searches.join_next().await {
        report(done);
    }
    Ok(())
}

fn report(done: std::result::Result<SearchOutcome, tokio::task::JoinError>) {
    match done {
        Ok(SearchOutcome::Applied(snapshot)) => println!("{}", output::snapshot_summary(&snapshot)),
        Ok(SearchOutcome::Stale { .. }) => {}
        Err(err) => warn!("search task failed: {err}"),
    }
}

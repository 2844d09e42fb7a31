use crate::heatmap::{HeatmapGrid, LEVEL_THRESHOLDS};
use crate::model::{
    HeatmapOutput, Profile, Repository, TimelineOutput, UserOutput, SCHEMA_VERSION,
};
use crate::session::SearchSnapshot;
use crate::timeline::Timeline;
use anyhow::Result;
use chrono::Utc;
use console::style;

const PENDING: &str = "…";

pub fn user_output(profile: &Profile, repositories: &[Repository]) -> UserOutput {
    UserOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        profile: profile.clone(),
        repositories: repositories.to_vec(),
    }
}

pub fn output_user_json(profile: &Profile, repositories: &[Repository]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&user_output(profile, repositories))?);
    Ok(())
}

pub fn output_user_ndjson(repositories: &[Repository]) -> Result<()> {
    for repo in repositories {
        println!("{}", serde_json::to_string(repo)?);
    }
    Ok(())
}

pub fn output_user(profile: &Profile, repositories: &[Repository]) -> Result<()> {
    println!(
        "{} {}",
        style(profile.display_name()).bold(),
        style(format!("@{}", profile.login)).dim()
    );
    if let Some(bio) = profile.bio.as_deref().filter(|b| !b.is_empty()) {
        println!("{bio}");
    }
    if let Some(location) = profile.location.as_deref().filter(|l| !l.is_empty()) {
        println!("Location: {}", location);
    }
    println!(
        "Followers: {}  Following: {}  Repositories: {}  Joined: {}",
        style(profile.followers).cyan(),
        style(profile.following).cyan(),
        style(profile.public_repos).cyan(),
        style(profile.created_at.format("%Y-%m-%d")).dim()
    );
    println!("{}", profile.html_url);

    if repositories.is_empty() {
        println!("\nNo repositories to display");
        return Ok(());
    }

    println!();
    println!(
        "{:<32} {:<14} {:>6} {:>6} {:>8} {:>11}",
        style("Repository").bold(),
        style("Language").bold(),
        style("Stars").bold(),
        style("Forks").bold(),
        style("Commits").bold(),
        style("Updated").bold()
    );
    println!("{}", "─".repeat(82));
    for repo in repositories {
        let commits = if repo.is_pending() {
            style(PENDING.to_string()).dim()
        } else {
            style(repo.commit_count.to_string()).green()
        };
        println!(
            "{:<32} {:<14} {:>6} {:>6} {:>8} {:>11}",
            truncate(&repo.name, 32),
            truncate(repo.language.as_deref().unwrap_or("-"), 14),
            repo.stargazers_count,
            repo.forks_count,
            commits,
            repo.updated_at.format("%Y-%m-%d")
        );
        if let Some(desc) = repo.description.as_deref().filter(|d| !d.is_empty()) {
            println!("  {}", style(truncate(desc, 78)).dim());
        }
    }
    Ok(())
}

pub fn timeline_output(login: &str, timeline: &Timeline) -> TimelineOutput {
    TimelineOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        login: login.to_string(),
        timeline: timeline.clone(),
    }
}

pub fn output_timeline_json(login: &str, timeline: &Timeline) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&timeline_output(login, timeline))?);
    Ok(())
}

pub fn output_timeline(timeline: &Timeline) -> Result<()> {
    let noun = if timeline.total == 1 { "repository" } else { "repositories" };
    println!("{}", style("Repository Timeline").bold());
    println!(
        "{} {} created in {}",
        timeline.total,
        noun,
        style(timeline.year).cyan()
    );
    println!("{}", "─".repeat(50));

    let max = timeline.busiest_month().max(1);
    for month in &timeline.months {
        let width = (month.count * 20).div_ceil(max);
        let bar = "█".repeat(width);
        let mut names: Vec<&str> = month.repositories.iter().take(3).map(String::as_str).collect();
        let extra = month.repositories.len().saturating_sub(3);
        let more = if extra > 0 { format!(" +{extra} more") } else { String::new() };
        if names.is_empty() {
            names.push("");
        }
        println!(
            "{} {:<20} {:>3} {}{}",
            month.name,
            style(bar).blue(),
            month.count,
            style(names.join(", ")).dim(),
            style(more).dim()
        );
    }

    let nav = |year: Option<i32>| year.map(|y| y.to_string()).unwrap_or_else(|| "-".into());
    println!(
        "\n◄ {}  {}  {} ►",
        nav(timeline.previous_year),
        style(timeline.year).bold(),
        nav(timeline.next_year)
    );
    if timeline.years.len() > 1 {
        let years: Vec<String> = timeline.years.iter().map(|y| y.to_string()).collect();
        println!("Years: {}", years.join(" "));
    }
    Ok(())
}

pub fn heatmap_output(
    login: &str,
    repo: &Repository,
    bounds: (i32, i32),
    grid: &HeatmapGrid,
) -> HeatmapOutput {
    HeatmapOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        login: login.to_string(),
        repository: repo.name.clone(),
        commit_count: repo.commit_count,
        min_year: bounds.0,
        max_year: bounds.1,
        grid: grid.clone(),
    }
}

pub fn output_heatmap_json(
    login: &str,
    repo: &Repository,
    bounds: (i32, i32),
    grid: &HeatmapGrid,
) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(&heatmap_output(login, repo, bounds, grid))?
    );
    Ok(())
}

fn level_glyph(level: u8) -> console::StyledObject<&'static str> {
    match level {
        0 => style("·").black().bright(),
        1 => style("▪").blue().dim(),
        2 => style("▪").blue(),
        3 => style("■").blue().bright(),
        _ => style("■").cyan().bright(),
    }
}

pub fn output_heatmap(repo: &Repository, bounds: (i32, i32), grid: &HeatmapGrid) -> Result<()> {
    let commits = if repo.is_pending() {
        PENDING.to_string()
    } else {
        repo.commit_count.to_string()
    };
    println!(
        "{} {} {}",
        style("Commit Activity Heatmap").bold(),
        style(&repo.name).cyan(),
        style(format!("({commits} commits)")).dim()
    );
    println!("{}", "─".repeat(grid.weeks.len().max(50)));

    const DAY_LABELS: [&str; 7] = ["Sun", "   ", "Tue", "   ", "Thu", "   ", "Sat"];
    for (day, label) in DAY_LABELS.iter().enumerate() {
        let row: String = grid
            .weeks
            .iter()
            .map(|week| match week[day] {
                Some(cell) => level_glyph(cell.level).to_string(),
                None => " ".to_string(),
            })
            .collect();
        println!("{label} {row}");
    }

    println!(
        "\n{} {}  total {}{}",
        style("Year").bold(),
        grid.year,
        grid.total,
        if grid.synthetic {
            style(" (placeholder pattern, no per-day history)").dim().to_string()
        } else {
            String::new()
        }
    );
    println!(
        "Range: {} - {}  ◄ {} ►",
        bounds.0,
        bounds.1,
        if grid.year > bounds.0 && grid.year < bounds.1 {
            "both"
        } else if grid.year > bounds.0 {
            "previous"
        } else if grid.year < bounds.1 {
            "next"
        } else {
            "none"
        }
    );

    println!("\n{}", style("Legend").bold());
    let mut lower = 0;
    for (level, upper) in LEVEL_THRESHOLDS.iter().enumerate() {
        let label = if level == 0 {
            "0".to_string()
        } else {
            format!("{}-{}", lower + 1, upper)
        };
        println!("  {} {}", level_glyph(level as u8), label);
        lower = *upper;
    }
    println!("  {} {}+", level_glyph(LEVEL_THRESHOLDS.len() as u8), lower + 1);
    Ok(())
}

/// One-line summary used by the interactive loop.
pub fn snapshot_summary(snapshot: &SearchSnapshot) -> String {
    match (&snapshot.profile, &snapshot.failure) {
        (_, Some(failure)) => format!(
            "{} {}: {}",
            style("✗").red(),
            snapshot.login,
            failure.user_message()
        ),
        (Some(profile), None) => {
            let commits: u64 = snapshot.repositories.iter().map(|r| r.commit_count).sum();
            let pending = snapshot.repositories.iter().filter(|r| r.is_pending()).count();
            format!(
                "{} {} ({}) repos: {} commits: {} pending: {}",
                style("✓").green(),
                profile.login,
                profile.display_name(),
                snapshot.repositories.len(),
                commits,
                pending
            )
        }
        (None, None) => format!("{}: no result", snapshot.login),
    }
}

pub fn reset_notice() -> String {
    format!("{} cleared", style("↺").yellow())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

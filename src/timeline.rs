use crate::model::Repository;
use crate::util::{month_name, year_of};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthBucket {
    /// 1-based calendar month.
    pub month: u32,
    pub name: String,
    pub count: usize,
    pub repositories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearBucket {
    pub year: i32,
    pub total: usize,
    pub months: Vec<MonthBucket>,
}

/// Creation timeline for one selected year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    pub year: i32,
    pub total: usize,
    pub months: Vec<MonthBucket>,
    pub years: Vec<i32>,
    pub previous_year: Option<i32>,
    pub next_year: Option<i32>,
}

impl Timeline {
    pub fn can_go_previous(&self) -> bool {
        self.previous_year.is_some()
    }

    pub fn can_go_next(&self) -> bool {
        self.next_year.is_some()
    }

    pub fn busiest_month(&self) -> usize {
        self.months.iter().map(|m| m.count).max().unwrap_or(0)
    }
}

/// Ascending distinct creation years.
pub fn distinct_years(repos: &[Repository]) -> Vec<i32> {
    repos
        .iter()
        .map(|r| year_of(&r.created_at))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// The current year when it has repositories, else the most recent year that does.
pub fn default_year(years: &[i32], current_year: i32) -> i32 {
    if years.contains(&current_year) {
        current_year
    } else {
        years.last().copied().unwrap_or(current_year)
    }
}

/// Bucket the repositories created in `year` by month. All twelve months are
/// present even when empty.
pub fn bucket_year(repos: &[Repository], year: i32) -> YearBucket {
    let mut months: Vec<MonthBucket> = (1..=12)
        .map(|month| MonthBucket {
            month,
            name: month_name(month).to_string(),
            count: 0,
            repositories: Vec::new(),
        })
        .collect();

    for repo in repos.iter().filter(|r| year_of(&r.created_at) == year) {
        let bucket = &mut months[repo.created_at.month0() as usize];
        bucket.count += 1;
        bucket.repositories.push(repo.name.clone());
    }

    let total = months.iter().map(|m| m.count).sum();
    YearBucket { year, total, months }
}

fn year_before(years: &[i32], year: i32) -> Option<i32> {
    years.iter().rev().find(|&&y| y < year).copied()
}

fn year_after(years: &[i32], year: i32) -> Option<i32> {
    years.iter().find(|&&y| y > year).copied()
}

/// Timeline for any `year`, with the nearest years that have repositories
/// on either side.
pub fn build_timeline(repos: &[Repository], year: i32) -> Timeline {
    let years = distinct_years(repos);
    let YearBucket { year, total, months } = bucket_year(repos, year);
    Timeline {
        year,
        total,
        months,
        previous_year: year_before(&years, year),
        next_year: year_after(&years, year),
        years,
    }
}

/// Year selection over a fixed repository snapshot. Moves only between
/// years that have repositories.
pub struct TimelineView<'a> {
    repos: &'a [Repository],
    years: Vec<i32>,
    selected: i32,
}

impl<'a> TimelineView<'a> {
    pub fn new(repos: &'a [Repository], current_year: i32) -> Self {
        let years = distinct_years(repos);
        let selected = default_year(&years, current_year);
        Self {
            repos,
            years,
            selected,
        }
    }

    pub fn selected(&self) -> i32 {
        self.selected
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn go_previous(&mut self) -> bool {
        match year_before(&self.years, self.selected) {
            Some(year) => {
                self.selected = year;
                true
            }
            None => false,
        }
    }

    pub fn go_next(&mut self) -> bool {
        match year_after(&self.years, self.selected) {
            Some(year) => {
                self.selected = year;
                true
            }
            None => false,
        }
    }

    pub fn timeline(&self) -> Timeline {
        build_timeline(self.repos, self.selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn repo(name: &str, year: i32, month: u32) -> Repository {
        let created = Utc.with_ymd_and_hms(year, month, 15, 12, 0, 0).unwrap();
        Repository {
            id: 0,
            name: name.to_string(),
            description: None,
            html_url: String::new(),
            language: None,
            stargazers_count: 0,
            forks_count: 0,
            watchers_count: 0,
            created_at: created,
            updated_at: created,
            commit_count: 0,
            commits_by_date: None,
        }
    }

    fn sample() -> Vec<Repository> {
        vec![
            repo("a", 2023, 1),
            repo("b", 2023, 1),
            repo("c", 2023, 3),
            repo("d", 2022, 12),
        ]
    }

    #[test]
    fn buckets_by_month_for_selected_year() {
        let repos = sample();
        let y2023 = bucket_year(&repos, 2023);
        let counts: Vec<usize> = y2023.months.iter().map(|m| m.count).collect();
        assert_eq!(counts, vec![2, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(y2023.total, 3);
        assert_eq!(y2023.months[0].repositories, vec!["a", "b"]);

        assert_eq!(bucket_year(&repos, 2022).total, 1);
    }

    #[test]
    fn empty_year_keeps_twelve_slots() {
        let bucket = bucket_year(&sample(), 2019);
        assert_eq!(bucket.months.len(), 12);
        assert_eq!(bucket.total, 0);
        assert_eq!(bucket.months[11].name, "Dec");
    }

    #[test]
    fn default_year_prefers_current_then_latest() {
        assert_eq!(default_year(&[2022, 2023], 2023), 2023);
        assert_eq!(default_year(&[2022, 2023], 2025), 2023);
        assert_eq!(default_year(&[], 2025), 2025);
    }

    #[test]
    fn navigation_stays_within_present_years() {
        let repos = sample();
        let mut view = TimelineView::new(&repos, 2025);
        assert_eq!(view.selected(), 2023);
        assert_eq!(view.years(), &[2022, 2023]);

        assert!(!view.go_next());
        assert!(view.go_previous());
        assert_eq!(view.selected(), 2022);
        assert!(!view.go_previous());

        let timeline = view.timeline();
        assert!(!timeline.can_go_previous());
        assert_eq!(timeline.next_year, Some(2023));
        assert_eq!(timeline.total, 1);
    }

    #[test]
    fn absent_year_renders_empty_with_neighbours() {
        let timeline = build_timeline(&sample(), 2020);
        assert_eq!(timeline.total, 0);
        assert_eq!(timeline.months.len(), 12);
        assert_eq!(timeline.previous_year, None);
        assert_eq!(timeline.next_year, Some(2022));
    }
}

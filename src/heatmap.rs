use crate::error::Result;
use crate::model::{CommitDateHistogram, Repository};
use crate::util::{first_day_of_year, last_day_of_year, year_of};
use chrono::{Datelike, Days, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Upper bounds of intensity levels 0 through 3; anything above is level 4.
pub const LEVEL_THRESHOLDS: [u32; 4] = [0, 2, 5, 10];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub count: u32,
    pub level: u8,
}

/// Calendar grid of weeks (columns) by weekday (rows, Sunday first).
/// Padding cells before January 1 and after December 31 are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapGrid {
    pub year: i32,
    /// True when the counts are the seeded placeholder, not real history.
    pub synthetic: bool,
    pub total: u64,
    pub weeks: Vec<[Option<DayCell>; 7]>,
}

impl HeatmapGrid {
    pub fn days(&self) -> impl Iterator<Item = &DayCell> {
        self.weeks.iter().flat_map(|w| w.iter().flatten())
    }

    pub fn cell(&self, date: NaiveDate) -> Option<&DayCell> {
        self.days().find(|c| c.date == date)
    }
}

pub enum ActivitySource<'a> {
    Histogram(&'a CommitDateHistogram),
    /// Placeholder distribution for repositories without per-day data.
    Synthetic {
        commits: u64,
        created: NaiveDate,
        updated: NaiveDate,
    },
}

pub fn intensity_level(count: u32) -> u8 {
    LEVEL_THRESHOLDS
        .iter()
        .position(|&upper| count <= upper)
        .unwrap_or(LEVEL_THRESHOLDS.len()) as u8
}

/// Seeded stand-in for per-day commit counts.
///
/// This is a visual placeholder only, not an estimate. The generator is
/// seeded with the total commit count and walks the year's days in order,
/// so the same repository always renders the same pattern. Days outside
/// the repository's lifetime stay at zero. On a lifetime day, with
/// `avg = commits / lifetime_days`, a draw above 0.7 yields
/// `floor(avg * (1 + 2 * r))`, a draw above 0.4 yields `floor(avg * r)`,
/// and anything else zero. Values are capped at `max(1, commits / 10)`.
struct Placeholder {
    rng: StdRng,
    commits: u64,
    avg: f64,
    cap: u32,
    created: NaiveDate,
    updated: NaiveDate,
}

impl Placeholder {
    fn new(commits: u64, created: NaiveDate, updated: NaiveDate) -> Self {
        let updated = updated.max(created);
        let lifetime = (updated - created).num_days() + 1;
        Self {
            rng: StdRng::seed_from_u64(commits),
            commits,
            avg: commits as f64 / lifetime as f64,
            cap: u32::try_from((commits / 10).max(1)).unwrap_or(u32::MAX),
            created,
            updated,
        }
    }

    fn next(&mut self, date: NaiveDate) -> u32 {
        let draw: f64 = self.rng.gen();
        let spread: f64 = self.rng.gen();

        if self.commits == 0 || date < self.created || date > self.updated {
            return 0;
        }

        let value = if draw > 0.7 {
            (self.avg * (1.0 + 2.0 * spread)).floor()
        } else if draw > 0.4 {
            (self.avg * spread).floor()
        } else {
            0.0
        };
        (value as u32).min(self.cap)
    }
}

pub fn build_grid(year: i32, source: &ActivitySource<'_>) -> Result<HeatmapGrid> {
    let first = first_day_of_year(year)?;
    let last = last_day_of_year(year)?;

    let lead = u64::from(first.weekday().num_days_from_sunday());
    let trail = 6 - u64::from(last.weekday().num_days_from_sunday());
    let start = first - Days::new(lead);
    let end = last + Days::new(trail);

    let mut placeholder = match source {
        ActivitySource::Synthetic {
            commits,
            created,
            updated,
        } => Some(Placeholder::new(*commits, *created, *updated)),
        ActivitySource::Histogram(_) => None,
    };

    let mut weeks = Vec::new();
    let mut week: [Option<DayCell>; 7] = [None; 7];
    let mut total = 0u64;

    for (offset, date) in start.iter_days().take_while(|d| *d <= end).enumerate() {
        let slot = offset % 7;
        week[slot] = if date.year() == year {
            let count = match (source, placeholder.as_mut()) {
                (ActivitySource::Histogram(hist), _) => hist.get(&date).copied().unwrap_or(0),
                (_, Some(p)) => p.next(date),
                _ => 0,
            };
            total += u64::from(count);
            Some(DayCell {
                date,
                count,
                level: intensity_level(count),
            })
        } else {
            None
        };

        if slot == 6 {
            weeks.push(week);
            week = [None; 7];
        }
    }

    Ok(HeatmapGrid {
        year,
        synthetic: placeholder.is_some(),
        total,
        weeks,
    })
}

/// Grid for one repository, using its real histogram when it has one.
pub fn repository_heatmap(repo: &Repository, year: i32) -> Result<HeatmapGrid> {
    match &repo.commits_by_date {
        Some(hist) => build_grid(year, &ActivitySource::Histogram(hist)),
        None => build_grid(
            year,
            &ActivitySource::Synthetic {
                commits: repo.commit_count,
                created: repo.created_at.date_naive(),
                updated: repo.updated_at.date_naive(),
            },
        ),
    }
}

/// Year selection bounded by the repository's creation year and the current year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatmapView {
    min_year: i32,
    max_year: i32,
    year: i32,
}

impl HeatmapView {
    pub fn new(created_year: i32, current_year: i32) -> Self {
        let min_year = created_year.min(current_year);
        Self {
            min_year,
            max_year: current_year,
            year: current_year,
        }
    }

    pub fn for_repository(repo: &Repository, current_year: i32) -> Self {
        Self::new(year_of(&repo.created_at), current_year)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn bounds(&self) -> (i32, i32) {
        (self.min_year, self.max_year)
    }

    pub fn can_go_previous(&self) -> bool {
        self.year > self.min_year
    }

    pub fn can_go_next(&self) -> bool {
        self.year < self.max_year
    }

    pub fn go_previous(&mut self) -> bool {
        if self.can_go_previous() {
            self.year -= 1;
            true
        } else {
            false
        }
    }

    pub fn go_next(&mut self) -> bool {
        if self.can_go_next() {
            self.year += 1;
            true
        } else {
            false
        }
    }

    /// Select the bound nearest to `year`.
    pub fn select_clamped(&mut self, year: i32) -> i32 {
        self.year = year.clamp(self.min_year, self.max_year);
        self.year
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn levels_follow_thresholds() {
        let levels: Vec<u8> = [0, 1, 2, 3, 5, 6, 10, 11, 400]
            .into_iter()
            .map(intensity_level)
            .collect();
        assert_eq!(levels, vec![0, 1, 1, 2, 2, 3, 3, 4, 4]);
    }

    #[test]
    fn grid_is_padded_to_sunday() {
        let empty = CommitDateHistogram::new();

        // 2023-01-01 is a Sunday.
        let g2023 = build_grid(2023, &ActivitySource::Histogram(&empty)).unwrap();
        assert_eq!(g2023.weeks[0][0].map(|c| c.date), Some(date(2023, 1, 1)));

        // 2024-01-01 is a Monday; 2024 is a leap year.
        let g2024 = build_grid(2024, &ActivitySource::Histogram(&empty)).unwrap();
        assert!(g2024.weeks[0][0].is_none());
        assert_eq!(g2024.weeks[0][1].map(|c| c.date), Some(date(2024, 1, 1)));
        assert_eq!(g2024.weeks.len(), 53);
        assert_eq!(g2024.days().count(), 366);
        assert!(!g2024.synthetic);
    }

    #[test]
    fn histogram_counts_are_used_verbatim() {
        let mut hist = CommitDateHistogram::new();
        hist.insert(date(2024, 3, 1), 4);
        hist.insert(date(2024, 7, 4), 12);
        hist.insert(date(2023, 12, 31), 9);

        let grid = build_grid(2024, &ActivitySource::Histogram(&hist)).unwrap();
        assert_eq!(grid.total, 16);
        assert_eq!(grid.cell(date(2024, 3, 1)).map(|c| (c.count, c.level)), Some((4, 2)));
        assert_eq!(grid.cell(date(2024, 7, 4)).map(|c| c.level), Some(4));
        assert_eq!(grid.cell(date(2024, 3, 2)).map(|c| c.count), Some(0));
    }

    #[test]
    fn placeholder_is_deterministic_and_bounded() {
        let source = ActivitySource::Synthetic {
            commits: 120,
            created: date(2024, 2, 1),
            updated: date(2024, 9, 30),
        };
        let a = build_grid(2024, &source).unwrap();
        let b = build_grid(2024, &source).unwrap();
        assert_eq!(a, b);
        assert!(a.synthetic);
        assert!(a.days().all(|c| c.count <= 12));
        assert!(a
            .days()
            .filter(|c| c.date < date(2024, 2, 1) || c.date > date(2024, 9, 30))
            .all(|c| c.count == 0));
        assert!(a.total > 0);
    }

    #[test]
    fn zero_commits_render_empty() {
        let source = ActivitySource::Synthetic {
            commits: 0,
            created: date(2020, 1, 1),
            updated: date(2024, 1, 1),
        };
        let grid = build_grid(2022, &source).unwrap();
        assert_eq!(grid.total, 0);
        assert!(grid.days().all(|c| c.level == 0));
    }

    #[test]
    fn sparse_lifetime_rounds_down_to_empty_days() {
        // Under one commit per day on average every band floors to zero.
        let source = ActivitySource::Synthetic {
            commits: 10,
            created: date(2023, 1, 1),
            updated: date(2023, 12, 31),
        };
        let grid = build_grid(2023, &source).unwrap();
        assert!(grid.synthetic);
        assert_eq!(grid.total, 0);
        assert!(grid.days().all(|c| c.count == 0));
    }

    #[test]
    fn navigation_is_bounded() {
        let mut view = HeatmapView::new(2021, 2023);
        assert_eq!(view.year(), 2023);
        assert!(!view.go_next());
        assert_eq!(view.year(), 2023);

        assert!(view.go_previous());
        assert!(view.go_previous());
        assert_eq!(view.year(), 2021);
        assert!(!view.go_previous());
        assert_eq!(view.year(), 2021);

        assert_eq!(view.select_clamped(1999), 2021);
        assert_eq!(view.select_clamped(2050), 2023);
    }
}

use crate::error::{GhmapError, Result};
use crate::model::{CommitDateHistogram, CommitEntry, CommitPage};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

static LINK_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<([^>]*)>\s*;\s*rel="([a-z]+)""#).expect("link pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountSource {
    /// Page number of the `rel="last"` link.
    LastPage,
    /// The last link used a page size other than one, count is an upper bound.
    LastPageScaled,
    /// No last link, the entries in the body were counted.
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommitCount {
    pub count: u64,
    pub source: CountSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastLink {
    pub page: u64,
    pub per_page: Option<u64>,
}

fn link_target<'a>(header: &'a str, rel: &str) -> Option<&'a str> {
    LINK_ENTRY
        .captures_iter(header)
        .find(|caps| &caps[2] == rel)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn query_param(url: &str, key: &str) -> Option<u64> {
    let (_, query) = url.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .and_then(|(_, v)| v.parse().ok())
}

/// Locate the `rel="last"` entry of a Link header and read its page number.
pub fn parse_last_link(header: &str) -> Option<LastLink> {
    let url = link_target(header, "last")?;
    let page = query_param(url, "page")?;
    Some(LastLink {
        page,
        per_page: query_param(url, "per_page"),
    })
}

pub fn parse_next_link(header: &str) -> Option<String> {
    link_target(header, "next").map(str::to_string)
}

/// Derive a repository's total commit count from one page of its history
/// requested with `per_page=1`.
pub fn extract_commit_count(page: &CommitPage) -> Result<CommitCount> {
    if !page.is_success() {
        return Err(GhmapError::Api {
            status: page.status,
            url: page.url.clone(),
        });
    }

    if let Some(last) = page.link.as_deref().and_then(parse_last_link) {
        return Ok(match last.per_page {
            None | Some(1) => CommitCount {
                count: last.page,
                source: CountSource::LastPage,
            },
            Some(per_page) => {
                warn!(
                    url = %page.url,
                    per_page,
                    "last page link does not use one commit per page; count is an upper bound"
                );
                CommitCount {
                    count: last.page.saturating_mul(per_page),
                    source: CountSource::LastPageScaled,
                }
            }
        });
    }

    let entries: Vec<serde_json::Value> = serde_json::from_str(&page.body)?;
    Ok(CommitCount {
        count: entries.len() as u64,
        source: CountSource::Body,
    })
}

/// Never fails: any fetch or extraction error is logged and becomes zero.
pub fn commit_count_or_zero(repo: &str, page: Result<CommitPage>) -> u64 {
    match page.and_then(|p| extract_commit_count(&p)) {
        Ok(count) => {
            debug!(repo, count = count.count, source = ?count.source, "derived commit count");
            count.count
        }
        Err(err) => {
            warn!(repo, "failed to derive commit count: {err}");
            0
        }
    }
}

pub fn histogram_from_commits(entries: &[CommitEntry]) -> CommitDateHistogram {
    let mut histogram = CommitDateHistogram::new();
    for entry in entries {
        if let Some(date) = entry.date() {
            *histogram.entry(date.date_naive()).or_insert(0) += 1;
        }
    }
    histogram
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    const LINK_7: &str = r#"<https://api.github.com/repositories/1/commits?per_page=1&page=2>; rel="next", <https://api.github.com/repositories/1/commits?per_page=1&page=7>; rel="last""#;

    fn page(status: u16, link: Option<&str>, body: &str) -> CommitPage {
        CommitPage {
            url: "https://api.github.com/repos/octo/demo/commits?per_page=1".into(),
            status,
            link: link.map(str::to_string),
            body: body.to_string(),
        }
    }

    #[test]
    fn last_page_seven_gives_seven_commits() {
        let count = extract_commit_count(&page(200, Some(LINK_7), "[{}]")).unwrap();
        assert_eq!(count, CommitCount { count: 7, source: CountSource::LastPage });
    }

    #[test]
    fn no_link_counts_body_entries() {
        let count = extract_commit_count(&page(200, None, r#"[{"sha":"abc"}]"#)).unwrap();
        assert_eq!(count, CommitCount { count: 1, source: CountSource::Body });

        let empty = extract_commit_count(&page(200, None, "[]")).unwrap();
        assert_eq!(empty.count, 0);
    }

    #[test]
    fn link_without_last_falls_back_to_body() {
        let first_page = r#"<https://api.github.com/repositories/1/commits?per_page=1&page=1>; rel="first""#;
        let count = extract_commit_count(&page(200, Some(first_page), "[{}]")).unwrap();
        assert_eq!(count.source, CountSource::Body);
        assert_eq!(count.count, 1);
    }

    #[test]
    fn larger_page_size_is_scaled() {
        let link = r#"<https://api.github.com/repositories/1/commits?page=3&per_page=30>; rel="last""#;
        let count = extract_commit_count(&page(200, Some(link), "[]")).unwrap();
        assert_eq!(count, CommitCount { count: 90, source: CountSource::LastPageScaled });
    }

    #[test]
    fn failures_become_zero() {
        assert_eq!(commit_count_or_zero("demo", Ok(page(409, None, "{}"))), 0);
        assert_eq!(commit_count_or_zero("demo", Ok(page(200, None, "not json"))), 0);
        assert_eq!(
            commit_count_or_zero("demo", Err(GhmapError::Other("connection reset".into()))),
            0
        );
        assert_eq!(commit_count_or_zero("demo", Ok(page(200, Some(LINK_7), ""))), 7);
    }

    #[test]
    fn next_link_is_extracted() {
        assert_eq!(
            parse_next_link(LINK_7).as_deref(),
            Some("https://api.github.com/repositories/1/commits?per_page=1&page=2")
        );
        assert_eq!(parse_next_link(r#"<x?page=1>; rel="prev""#), None);
    }

    #[test]
    fn histogram_groups_by_day() {
        let entries: Vec<CommitEntry> = serde_json::from_str(
            r#"[
                {"sha":"a","commit":{"author":{"name":"o","email":null,"date":"2024-02-01T08:00:00Z"},"committer":null,"message":"one"}},
                {"sha":"b","commit":{"author":{"name":"o","email":null,"date":"2024-02-01T23:59:00Z"},"committer":null,"message":"two"}},
                {"sha":"c","commit":{"author":null,"committer":{"name":"o","email":null,"date":"2024-02-03T01:00:00Z"},"message":"three"}}
            ]"#,
        )
        .unwrap();

        let hist = histogram_from_commits(&entries);
        assert_eq!(hist.len(), 2);
        assert_eq!(hist[&NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()], 2);
        assert_eq!(hist[&NaiveDate::from_ymd_opt(2024, 2, 3).unwrap()], 1);
    }
}

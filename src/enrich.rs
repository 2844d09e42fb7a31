use crate::client::GithubApi;
use crate::commits::commit_count_or_zero;
use crate::model::Repository;
use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;

pub fn commit_progress(len: usize, show_progress: bool) -> Option<ProgressBar> {
    if !show_progress || len == 0 {
        return None;
    }
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.set_message("Counting commits...");
    Some(pb)
}

/// Attach a commit count to every repository.
///
/// One future per repository runs concurrently; each writes into the slot
/// reserved for its input index, so the result has the input's length and
/// order no matter which fetch finishes first. Slots start at zero.
/// `count` receives the repository name.
pub async fn enrich_with<F, Fut>(
    repos: Vec<Repository>,
    progress: Option<&ProgressBar>,
    count: F,
) -> Vec<Repository>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = u64>,
{
    let mut slots = vec![0u64; repos.len()];

    let mut pending: FuturesUnordered<_> = repos
        .iter()
        .enumerate()
        .map(|(idx, repo)| {
            let fut = count(repo.name.clone());
            async move { (idx, fut.await) }
        })
        .collect();

    while let Some((idx, commits)) = pending.next().await {
        slots[idx] = commits;
        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    repos
        .into_iter()
        .zip(slots)
        .map(|(repo, commits)| repo.with_commit_count(commits))
        .collect()
}

/// Fetch one commit page per repository and derive its count. A failed
/// repository gets zero and never affects its siblings.
pub async fn enrich_repositories<A: GithubApi>(
    api: &A,
    owner: &str,
    repos: Vec<Repository>,
    progress: Option<&ProgressBar>,
) -> Vec<Repository> {
    enrich_with(repos, progress, |name| async move {
        let page = api.commit_page(owner, &name).await;
        commit_count_or_zero(&name, page)
    })
    .await
}

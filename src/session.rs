use crate::client::GithubApi;
use crate::enrich::{commit_progress, enrich_repositories};
use crate::error::SearchFailure;
use crate::model::{Profile, Repository};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Identifies one search. Only the ticket of the newest search may publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
}

impl SearchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Generation-counted slot holding the result of the most recent search.
pub struct SearchSession<T> {
    generation: AtomicU64,
    current: Mutex<Option<T>>,
}

impl<T: Clone> SearchSession<T> {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            current: Mutex::new(None),
        }
    }

    /// Start a new search, making every earlier ticket stale.
    pub fn begin(&self) -> SearchTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        SearchTicket { generation }
    }

    pub fn is_current(&self, ticket: &SearchTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.generation
    }

    /// Store `value` if `ticket` is still the newest search. Returns whether it was applied.
    pub fn publish(&self, ticket: SearchTicket, value: T) -> bool {
        let mut slot = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if !self.is_current(&ticket) {
            return false;
        }
        *slot = Some(value);
        true
    }

    pub fn current(&self) -> Option<T> {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

impl<T: Clone> Default for SearchSession<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything fetched for one login.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSnapshot {
    pub login: String,
    pub profile: Option<Profile>,
    pub repositories: Vec<Repository>,
    pub failure: Option<SearchFailure>,
}

impl SearchSnapshot {
    fn failed(login: &str, failure: SearchFailure) -> Self {
        Self {
            login: login.to_string(),
            profile: None,
            repositories: Vec::new(),
            failure: Some(failure),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Applied(SearchSnapshot),
    /// A newer search started before this one finished; its result was dropped.
    Stale { login: String },
}

pub struct Explorer<A> {
    api: Arc<A>,
    session: Arc<SearchSession<SearchSnapshot>>,
    show_progress: bool,
}

impl<A> Clone for Explorer<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            session: Arc::clone(&self.session),
            show_progress: self.show_progress,
        }
    }
}

impl<A: GithubApi> Explorer<A> {
    pub fn new(api: A) -> Self {
        Self {
            api: Arc::new(api),
            session: Arc::new(SearchSession::new()),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Profile, then repositories. A failed repository list becomes empty.
    pub async fn profile_and_repos(
        &self,
        login: &str,
    ) -> std::result::Result<(Profile, Vec<Repository>), SearchFailure> {
        let login = login.trim();
        if login.is_empty() {
            return Err(SearchFailure::NotFound(String::new()));
        }

        let profile = match self.api.user(login).await {
            Ok(profile) => profile,
            Err(err) => {
                info!(login, "profile lookup failed: {err}");
                return Err(SearchFailure::from_profile_error(login, &err));
            }
        };

        let repos = match self.api.repos(login).await {
            Ok(repos) => repos,
            Err(err) => {
                warn!(login, "failed to fetch repositories: {err}");
                Vec::new()
            }
        };
        debug!(login, count = repos.len(), "fetched repositories");

        Ok((profile, repos))
    }

    /// The full pipeline: profile, repositories, then one commit page per
    /// repository. Only profile failures are reported; a failed commit page
    /// becomes a zero count.
    pub async fn fetch(&self, login: &str) -> SearchSnapshot {
        let (profile, repos) = match self.profile_and_repos(login).await {
            Ok(found) => found,
            Err(failure) => return SearchSnapshot::failed(login.trim(), failure),
        };

        let progress = commit_progress(repos.len(), self.show_progress);
        let repositories =
            enrich_repositories(self.api.as_ref(), &profile.login, repos, progress.as_ref()).await;

        SearchSnapshot {
            login: login.trim().to_string(),
            profile: Some(profile),
            repositories,
            failure: None,
        }
    }

    /// Reserve the next generation. Every ticket issued earlier becomes stale.
    pub fn begin(&self) -> SearchTicket {
        self.session.begin()
    }

    /// Run a search and apply its result unless a newer search has been
    /// issued meanwhile. The ticket is taken when this is called, not when
    /// the returned future is first polled.
    pub fn search<'a>(&'a self, login: &'a str) -> impl Future<Output = SearchOutcome> + 'a {
        let ticket = self.begin();
        self.search_with(ticket, login)
    }

    /// Like [`Explorer::search`] with a ticket taken beforehand, for searches
    /// handed to a spawned task.
    pub async fn search_with(&self, ticket: SearchTicket, login: &str) -> SearchOutcome {
        let snapshot = self.fetch(login).await;

        if self.session.publish(ticket, snapshot.clone()) {
            info!(login, generation = ticket.generation(), "applied search result");
            SearchOutcome::Applied(snapshot)
        } else {
            info!(login, generation = ticket.generation(), "discarded stale search result");
            SearchOutcome::Stale {
                login: snapshot.login,
            }
        }
    }

    pub fn current(&self) -> Option<SearchSnapshot> {
        self.session.current()
    }

    pub fn reset(&self) {
        self.session.clear();
    }
}

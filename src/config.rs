use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_REPOS_PER_PAGE: u32 = 12;
pub const DEFAULT_HISTORY_PAGES: u32 = 10;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
    pub user_agent: String,
    pub repos_per_page: u32,
    /// Upper bound on pages walked when collecting real commit history.
    pub max_history_pages: u32,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("ghmap/", env!("CARGO_PKG_VERSION")).to_string(),
            repos_per_page: DEFAULT_REPOS_PER_PAGE,
            max_history_pages: DEFAULT_HISTORY_PAGES,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_repos_per_page(mut self, per_page: u32) -> Self {
        self.repos_per_page = per_page.clamp(1, 100);
        self
    }

    pub fn with_max_history_pages(mut self, pages: u32) -> Self {
        self.max_history_pages = pages.max(1);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

use crate::commits::parse_next_link;
use crate::config::ClientConfig;
use crate::error::{GhmapError, Result};
use crate::model::{CommitEntry, CommitPage, Profile, Repository};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::future::Future;
use tracing::debug;

/// The slice of the GitHub REST API the explorer consumes.
pub trait GithubApi: Send + Sync {
    /// `GET /users/{login}`
    fn user(&self, login: &str) -> impl Future<Output = Result<Profile>> + Send;

    /// `GET /users/{login}/repos?sort=updated&per_page=N`
    fn repos(&self, login: &str) -> impl Future<Output = Result<Vec<Repository>>> + Send;

    /// `GET /repos/{owner}/{repo}`
    fn repository(&self, owner: &str, repo: &str)
        -> impl Future<Output = Result<Repository>> + Send;

    /// `GET /repos/{owner}/{repo}/commits?per_page=1`, returned raw so the
    /// pagination metadata can be read.
    fn commit_page(&self, owner: &str, repo: &str)
        -> impl Future<Output = Result<CommitPage>> + Send;

    /// Walks `GET /repos/{owner}/{repo}/commits?per_page=100` up to the page cap.
    fn commit_history(
        &self,
        owner: &str,
        repo: &str,
    ) -> impl Future<Output = Result<Vec<CommitEntry>>> + Send;
}

#[derive(Clone)]
pub struct GithubClient {
    http: Client,
    config: ClientConfig,
}

/// Creates a preconfigured HTTP client with required headers.
fn build_client(config: &ClientConfig) -> Result<Client> {
    let mut headers = HeaderMap::new();
    let agent = HeaderValue::from_str(&config.user_agent)
        .map_err(|e| GhmapError::Parse(format!("Invalid user agent: {e}")))?;
    headers.insert(USER_AGENT, agent);
    headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

    if let Some(token) = config.token.as_deref() {
        let mut val = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| GhmapError::Parse(format!("Invalid token value: {e}")))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
    }

    Ok(Client::builder()
        .default_headers(headers)
        .timeout(config.timeout)
        .build()?)
}

impl GithubClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = build_client(&config)?;
        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(%url, "GET");
        let response = self.http.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(GhmapError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(GhmapError::Api {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl GithubApi for GithubClient {
    async fn user(&self, login: &str) -> Result<Profile> {
        let url = self.url(&format!("/users/{}", encode_segment(login)));
        self.get_json(&url).await
    }

    async fn repos(&self, login: &str) -> Result<Vec<Repository>> {
        let url = self.url(&format!(
            "/users/{}/repos?sort=updated&per_page={}",
            encode_segment(login),
            self.config.repos_per_page
        ));
        self.get_json(&url).await
    }

    async fn repository(&self, owner: &str, repo: &str) -> Result<Repository> {
        let url = self.url(&format!(
            "/repos/{}/{}",
            encode_segment(owner),
            encode_segment(repo)
        ));
        self.get_json(&url).await
    }

    async fn commit_page(&self, owner: &str, repo: &str) -> Result<CommitPage> {
        let url = self.url(&format!(
            "/repos/{}/{}/commits?per_page=1",
            encode_segment(owner),
            encode_segment(repo)
        ));
        debug!(%url, "GET");

        let response = self.http.get(&url).send().await?;
        let status = response.status().as_u16();
        let link = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        Ok(CommitPage {
            url,
            status,
            link,
            body,
        })
    }

    async fn commit_history(&self, owner: &str, repo: &str) -> Result<Vec<CommitEntry>> {
        let mut next = Some(self.url(&format!(
            "/repos/{}/{}/commits?per_page=100",
            encode_segment(owner),
            encode_segment(repo)
        )));
        let mut entries = Vec::new();
        let mut pages = 0;

        while let Some(url) = next.take() {
            if pages >= self.config.max_history_pages {
                debug!(owner, repo, pages, "history page cap reached");
                break;
            }
            debug!(%url, "GET");
            let response = self.http.get(&url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(GhmapError::Api {
                    status: status.as_u16(),
                    url,
                });
            }
            next = response
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_next_link);
            let body = response.text().await?;
            let page: Vec<CommitEntry> = serde_json::from_str(&body)?;
            entries.extend(page);
            pages += 1;
        }

        Ok(entries)
    }
}

/// Percent-encoding for a single path segment.
fn encode_segment(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() || "-._~".contains(c) => c.to_string(),
            c => {
                let mut buf = [0u8; 4];
                c.encode_utf8(&mut buf)
                    .bytes()
                    .map(|b| format!("%{b:02X}"))
                    .collect()
            }
        })
        .collect()
}

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GhmapError>;

#[derive(Error, Debug)]
pub enum GhmapError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("GitHub API error ({status}) for {url}")]
    Api { status: u16, url: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Other: {0}")]
    Other(String),
}

impl GhmapError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GhmapError::NotFound(_) | GhmapError::Api { status: 404, .. })
    }
}

/// The two profile failure classes that are shown to the person searching.
/// Repository-list and commit failures never become a `SearchFailure`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchFailure {
    #[error("User not found")]
    NotFound(String),
    #[error("Failed to fetch user data")]
    Unavailable(String),
}

impl SearchFailure {
    pub fn from_profile_error(login: &str, err: &GhmapError) -> Self {
        if err.is_not_found() {
            SearchFailure::NotFound(login.to_string())
        } else {
            SearchFailure::Unavailable(err.to_string())
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            SearchFailure::NotFound(_) => "User not found",
            SearchFailure::Unavailable(_) => "Failed to fetch user data",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinct_from_other_failures() {
        let missing = GhmapError::Api { status: 404, url: "u".into() };
        let broken = GhmapError::Api { status: 502, url: "u".into() };

        assert_eq!(
            SearchFailure::from_profile_error("ghost", &missing),
            SearchFailure::NotFound("ghost".into())
        );
        let other = SearchFailure::from_profile_error("ghost", &broken);
        assert_eq!(other.user_message(), "Failed to fetch user data");
    }
}

//! Explore GitHub profiles: fetch a user and their repositories, derive
//! per-repository commit counts from pagination metadata, bucket
//! repositories by creation month, and lay out contribution heatmaps.

pub mod cli;
pub mod client;
pub mod commits;
pub mod config;
pub mod enrich;
pub mod error;
pub mod heatmap;
pub mod logging;
pub mod model;
pub mod output;
pub mod session;
pub mod timeline;
pub mod util;

pub use client::{GithubApi, GithubClient};
pub use config::ClientConfig;
pub use error::{GhmapError, Result, SearchFailure};
pub use session::{Explorer, SearchOutcome, SearchSnapshot};

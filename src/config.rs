use std::env;
use std::path::Path;
use std::time::Duration;

use log::warn;

use crate::error::{Flux2Error, Result};
use crate::types::Model;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.bfl.ai/v1";

/// The placeholder value shipped in documentation. Treated as "no key set".
const KEY_PLACEHOLDER: &str = "<your_bfl_api_key_here>";

const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
const DEFAULT_WAIT_BUDGET_SECS: u64 = 600;

/// Configuration for the FLUX.2 client.
///
/// Loaded from the process environment ([`Flux2Config::from_env`]), from an
/// env file plus the environment ([`Flux2Config::from_env_file`]), or built
/// with the `with_*` setters. Variables already exported always win over
/// file values.
///
/// | variable | meaning | default |
/// |---|---|---|
/// | `BFL_API_KEY` | API key (required for live calls) | — |
/// | `BFL_BASE_URL` | API base URL | `https://api.bfl.ai/v1` |
/// | `BFL_MODEL` | default model slug | `flux-2-pro` |
/// | `BFL_POLL_INTERVAL_MS` | poll interval in milliseconds | `1000` |
/// | `BFL_TIMEOUT_SECS` | total wait budget in seconds | `600` |
#[derive(Debug, Clone)]
pub struct Flux2Config {
    /// API key. `None` until configured; live calls fail with
    /// [`Flux2Error::MissingApiKey`].
    pub api_key: Option<String>,
    /// Base URL the model slug is appended to.
    pub base_url: String,
    /// Default model for requests that do not pick one.
    pub model: Model,
    /// Delay between polls of the status endpoint.
    pub poll_interval: Duration,
    /// Total time to wait for a job before giving up.
    pub wait_budget: Duration,
}

impl Default for Flux2Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: Model::Pro,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            wait_budget: Duration::from_secs(DEFAULT_WAIT_BUDGET_SECS),
        }
    }
}

impl Flux2Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        match env::var("BFL_API_KEY") {
            Ok(key) if key.trim() == KEY_PLACEHOLDER => {
                warn!(
                    "BFL_API_KEY is still the placeholder value. \
                     Replace it with a real key from https://api.bfl.ai."
                );
            }
            Ok(key) if !key.trim().is_empty() => config.api_key = Some(key),
            _ => {}
        }

        if let Ok(url) = env::var("BFL_BASE_URL") {
            if !url.trim().is_empty() {
                config.base_url = url.trim_end_matches('/').to_string();
            }
        }

        if let Ok(slug) = env::var("BFL_MODEL") {
            match Model::from_slug(&slug) {
                Some(model) => config.model = model,
                None => warn!("BFL_MODEL '{}' is not a known model slug, using {}", slug, config.model),
            }
        }

        if let Some(ms) = parse_env_u64("BFL_POLL_INTERVAL_MS") {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_env_u64("BFL_TIMEOUT_SECS") {
            config.wait_budget = Duration::from_secs(secs);
        }

        config
    }

    /// Load a `.env`-style file, then read the environment.
    ///
    /// `dotenvy` never overrides variables that are already exported, so the
    /// environment always wins over file values. A missing file is logged
    /// and otherwise ignored.
    pub fn from_env_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if let Err(e) = dotenvy::from_path(path) {
            warn!("Could not load env file {}: {}", path.display(), e);
        }
        Self::from_env()
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the API base URL. Trailing slashes are stripped.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the default model.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Set the delay between status polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the total time to wait for a job result.
    pub fn with_wait_budget(mut self, budget: Duration) -> Self {
        self.wait_budget = budget;
        self
    }

    /// Return the API key, or [`Flux2Error::MissingApiKey`] when unset.
    pub fn require_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or(Flux2Error::MissingApiKey)
    }
}

fn parse_env_u64(name: &str) -> Option<u64> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("{} '{}' is not a number, using default", name, raw);
            None
        }
    }
}

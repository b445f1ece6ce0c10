/// Blocking HTTP client with an on-disk response cache and retry/backoff.
///
/// Forecast responses change at most hourly, so a fresh cached body is
/// returned without touching the network. On a miss the request is sent,
/// retried on transport errors and on 500/502/504 with exponential
/// backoff, and a successful body is written back to the cache.
///
/// Cache layout: one JSON file per URL under the cache directory, named by
/// the SHA-256 of the URL. Each file records the URL, fetch time and body.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::HttpConfig;
use crate::ingest::open_meteo::api_error_reason;
use crate::logging::DataSource;
use crate::model::ForecastError;

const USER_AGENT: &str = concat!("geoalerta_service/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

/// How many times to retry and how long to wait between attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub retries: u32,
    /// Seconds; the n-th retry waits `backoff_factor * 2^(n-1)`.
    pub backoff_factor: f64,
    /// HTTP statuses worth retrying.
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 5,
            backoff_factor: 0.2,
            retry_statuses: vec![500, 502, 504],
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based).
    pub fn delay(&self, retry: u32) -> std::time::Duration {
        if retry == 0 {
            return std::time::Duration::ZERO;
        }
        let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
        let secs = self.backoff_factor * 2f64.powi(exponent);
        std::time::Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(std::time::Duration::MAX)
    }

    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }
}

// ---------------------------------------------------------------------------
// Response cache
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    url: String,
    fetched_at: DateTime<Utc>,
    body: String,
}

/// File-backed cache of response bodies keyed by URL.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
    expire_after: Duration,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>, expire_after: Duration) -> Self {
        Self {
            dir: dir.into(),
            expire_after,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        self.dir.join(format!("{:x}.json", digest))
    }

    /// Returns the cached body for `url` if it was fetched within the
    /// expiry window as of `now`.
    ///
    /// Unreadable or corrupt entries are treated as misses.
    pub fn get(&self, url: &str, now: DateTime<Utc>) -> Option<String> {
        let path = self.path_for(url);
        let contents = fs::read_to_string(&path).ok()?;

        let entry: CacheEntry = match serde_json::from_str(&contents) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(source = DataSource::Cache.as_str(), path = %path.display(), "ignoring corrupt cache entry: {}", e);
                return None;
            }
        };

        if entry.url != url || now - entry.fetched_at > self.expire_after {
            return None;
        }

        Some(entry.body)
    }

    /// Stores `body` for `url`, stamped with `now`.
    pub fn put(&self, url: &str, body: &str, now: DateTime<Utc>) -> Result<(), ForecastError> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            ForecastError::Cache(format!("Failed to create {}: {}", self.dir.display(), e))
        })?;

        let entry = CacheEntry {
            url: url.to_string(),
            fetched_at: now,
            body: body.to_string(),
        };
        let serialized = serde_json::to_string(&entry)
            .map_err(|e| ForecastError::Cache(format!("Failed to serialize entry: {}", e)))?;

        let path = self.path_for(url);
        fs::write(&path, serialized)
            .map_err(|e| ForecastError::Cache(format!("Failed to write {}: {}", path.display(), e)))
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP GET with caching and retries.
pub struct CachedClient {
    http: reqwest::blocking::Client,
    cache: Option<ResponseCache>,
    retry: RetryPolicy,
}

impl CachedClient {
    pub fn new(
        http: reqwest::blocking::Client,
        cache: Option<ResponseCache>,
        retry: RetryPolicy,
    ) -> Self {
        Self { http, cache, retry }
    }

    /// Builds a client from the `[http]` configuration section.
    pub fn from_config(config: &HttpConfig) -> Result<Self, ForecastError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ForecastError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        let cache = if config.cache_enabled {
            let expire_after = i64::try_from(config.cache_expire_seconds)
                .ok()
                .and_then(Duration::try_seconds)
                .ok_or_else(|| {
                    ForecastError::Cache(format!(
                        "cache_expire_seconds out of range: {}",
                        config.cache_expire_seconds
                    ))
                })?;
            Some(ResponseCache::new(&config.cache_dir, expire_after))
        } else {
            None
        };

        let retry = RetryPolicy {
            retries: config.retries,
            backoff_factor: config.backoff_factor,
            ..RetryPolicy::default()
        };

        Ok(Self::new(http, cache, retry))
    }

    /// Fetches `url` as text, from cache when fresh.
    pub fn get_text(&self, url: &str) -> Result<String, ForecastError> {
        if let Some(cache) = &self.cache {
            if let Some(body) = cache.get(url, Utc::now()) {
                tracing::debug!(source = DataSource::Cache.as_str(), "cache hit for {}", url);
                return Ok(body);
            }
        }

        let body = self.fetch_with_retries(url)?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(url, &body, Utc::now()) {
                tracing::warn!(source = DataSource::Cache.as_str(), "{}", e);
            }
        }

        Ok(body)
    }

    fn fetch_with_retries(&self, url: &str) -> Result<String, ForecastError> {
        let mut attempt: u32 = 0;

        loop {
            let retries_left = attempt < self.retry.retries;

            match self.http.get(url).header("Accept", "application/json").send() {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .text()
                            .map_err(|e| ForecastError::Transport(format!("Failed to read body: {}", e)));
                    }

                    if !(retries_left && self.retry.should_retry_status(status.as_u16())) {
                        return Err(non_success_error(status.as_u16(), response));
                    }

                    tracing::warn!(source = DataSource::OpenMeteo.as_str(), "HTTP {} (attempt {}), retrying", status.as_u16(), attempt + 1);
                }
                Err(e) => {
                    if !retries_left {
                        return Err(ForecastError::Transport(e.to_string()));
                    }
                    tracing::warn!(source = DataSource::OpenMeteo.as_str(), "request failed (attempt {}): {}, retrying", attempt + 1, e);
                }
            }

            attempt += 1;
            std::thread::sleep(self.retry.delay(attempt));
        }
    }
}

/// Maps a non-2xx response to an error, preferring the API's own reason.
fn non_success_error(status: u16, response: reqwest::blocking::Response) -> ForecastError {
    response
        .text()
        .ok()
        .and_then(|body| serde_json::from_str::<serde_json::Value>(&body).ok())
        .and_then(|value| api_error_reason(&value))
        .map(ForecastError::Api)
        .unwrap_or(ForecastError::Http(status))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

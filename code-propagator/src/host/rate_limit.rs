//! Rate limiting utilities for the GitHub API.
//!
//! Calls are preceded by a rate-limit check; when a bucket is nearly empty
//! the caller sleeps until it resets.

use octocrab::Octocrab;
use std::time::Duration;
use tracing::{info, warn};

/// Maximum time to wait for rate limit reset (1 hour).
const MAX_WAIT_SECS: u64 = 3600;

/// Minimum remaining requests before proactively waiting.
const MIN_REMAINING_THRESHOLD: u32 = 5;

/// Rate limit bucket a call draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiResource {
    /// Issues, pull requests, repositories.
    Core,
    /// Commit and issue search.
    Search,
}

/// Rate limit information for a specific resource.
#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    /// Requests remaining in the current window.
    pub remaining: u32,

    /// Unix timestamp when the rate limit resets.
    pub reset: u64,

    /// Total requests allowed per window.
    pub limit: u32,
}

/// Checks the current rate limit status of `resource`.
///
/// # Errors
///
/// Returns an error if the rate limit API call fails.
pub async fn check_rate_limit(
    octocrab: &Octocrab,
    resource: ApiResource,
) -> Result<RateLimitInfo, octocrab::Error> {
    let rate_limit = octocrab.ratelimit().get().await?;
    let bucket = match resource {
        ApiResource::Core => &rate_limit.resources.core,
        ApiResource::Search => &rate_limit.resources.search,
    };

    Ok(RateLimitInfo {
        remaining: bucket.remaining as u32,
        reset: bucket.reset,
        limit: bucket.limit as u32,
    })
}

/// Computes how long to wait before the next call, if at all.
fn wait_duration(info: &RateLimitInfo, now: u64) -> Option<Duration> {
    if info.remaining >= MIN_REMAINING_THRESHOLD || info.reset <= now {
        return None;
    }

    let wait_secs = info.reset - now;
    if wait_secs > MAX_WAIT_SECS {
        warn!(
            wait_secs,
            max_wait = MAX_WAIT_SECS,
            "Rate limit reset too far in future, capping wait time"
        );
    }
    Some(Duration::from_secs(wait_secs.min(MAX_WAIT_SECS)))
}

/// Waits if the rate limit is low, returning true if we waited.
pub async fn wait_if_needed(info: &RateLimitInfo) -> bool {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let Some(wait) = wait_duration(info, now) else {
        return false;
    };

    info!(
        remaining = info.remaining,
        wait_secs = wait.as_secs(),
        "Rate limit low, waiting for reset"
    );
    tokio::time::sleep(wait).await;
    true
}

/// Ensures sufficient rate limit before calling into `resource`.
///
/// # Errors
///
/// Returns an error if the rate limit check fails.
pub async fn ensure_rate_limit(
    octocrab: &Octocrab,
    resource: ApiResource,
) -> Result<(), octocrab::Error> {
    let info = check_rate_limit(octocrab, resource).await?;
    wait_if_needed(&info).await;
    Ok(())
}

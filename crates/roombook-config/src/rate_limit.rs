//! Per-IP rate limiting built on `tower_governor`.
//!
//! Two buckets exist: a general one for the whole API and a stricter one for
//! the `/api/auth` namespace, where login and reset endpoints are the usual
//! brute-force targets.
//!
//! - `RATE_LIMIT_GENERAL_PER_SECOND` (default 2)
//! - `RATE_LIMIT_GENERAL_BURST_SIZE` (default 30)
//! - `RATE_LIMIT_AUTH_PER_SECOND` (default 10)
//! - `RATE_LIMIT_AUTH_BURST_SIZE` (default 5)
//!
//! Clients are keyed by `x-forwarded-for` / `x-real-ip` / `forwarded`
//! headers, falling back to the peer address, so the limiter keeps working
//! behind a reverse proxy.

use governor::middleware::NoOpMiddleware;
use tower_governor::governor::{GovernorConfig, GovernorConfigBuilder};
use tower_governor::key_extractor::SmartIpKeyExtractor;

use crate::env_or;

pub type IpGovernorConfig = GovernorConfig<SmartIpKeyExtractor, NoOpMiddleware>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub general_per_second: u64,
    pub general_burst_size: u32,
    pub auth_per_second: u64,
    pub auth_burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            general_per_second: 2,
            general_burst_size: 30,
            auth_per_second: 10,
            auth_burst_size: 5,
        }
    }
}

impl RateLimitConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            general_per_second: env_or("RATE_LIMIT_GENERAL_PER_SECOND", defaults.general_per_second),
            general_burst_size: env_or("RATE_LIMIT_GENERAL_BURST_SIZE", defaults.general_burst_size),
            auth_per_second: env_or("RATE_LIMIT_AUTH_PER_SECOND", defaults.auth_per_second),
            auth_burst_size: env_or("RATE_LIMIT_AUTH_BURST_SIZE", defaults.auth_burst_size),
        }
    }

    /// # Panics
    ///
    /// Panics if either value is zero; governor rejects an empty bucket.
    #[must_use]
    pub fn general_governor_config(&self) -> IpGovernorConfig {
        build(self.general_per_second, self.general_burst_size)
            .expect("Failed to build general rate limiter config")
    }

    /// # Panics
    ///
    /// Panics if either value is zero.
    #[must_use]
    pub fn auth_governor_config(&self) -> IpGovernorConfig {
        build(self.auth_per_second, self.auth_burst_size)
            .expect("Failed to build auth rate limiter config")
    }
}

fn build(per_second: u64, burst_size: u32) -> Option<IpGovernorConfig> {
    GovernorConfigBuilder::default()
        .per_second(per_second)
        .burst_size(burst_size)
        .key_extractor(SmartIpKeyExtractor)
        .finish()
}

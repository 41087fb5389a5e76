//! Session profile generation
//!
//! A [`SessionProfile`] is the request identity and timing envelope handed to
//! the retrieval tool for exactly one call. The generator picks the browser
//! identity at random and attaches a fixed header template, so consecutive
//! calls look like different, ordinary browsers rather than one client
//! hammering the service.

use crate::config::ConfigError;
use crate::random::RandomSource;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Minimum number of identities the pool must contain.
pub const MIN_IDENTITY_POOL: usize = 5;

/// Browser identities rotated between calls.
pub const DEFAULT_IDENTITIES: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Header template attached to every profile.
pub const DEFAULT_HEADERS: [(&str, &str); 10] = [
    ("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    ("Accept-Language", "en-US,en;q=0.5"),
    ("Accept-Encoding", "gzip, deflate"),
    ("DNT", "1"),
    ("Connection", "keep-alive"),
    ("Upgrade-Insecure-Requests", "1"),
    ("Sec-Fetch-Dest", "document"),
    ("Sec-Fetch-Mode", "navigate"),
    ("Sec-Fetch-Site", "none"),
    ("Sec-Fetch-User", "?1"),
];

/// Referer presented with every request.
pub const DEFAULT_REFERER: &str = "https://www.youtube.com/";

/// Network timeout per socket operation.
pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_secs(30);

/// Attempts the retrieval tool makes before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Retries per media fragment.
pub const DEFAULT_FRAGMENT_RETRIES: u32 = 10;

/// Country presented when bypassing geographic restrictions.
pub const DEFAULT_GEO_BYPASS_COUNTRY: &str = "US";

/// Maximum sustained transfer rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RateCeiling(u64);

impl RateCeiling {
    /// One mebibyte per second.
    pub const MIB_PER_SEC: Self = Self(1024 * 1024);

    /// Discovery ceiling: metadata-only calls can be more permissive.
    pub const DISCOVERY: Self = Self(4 * 1024 * 1024);

    /// Download ceiling: keeps transferred volume unremarkable.
    pub const DOWNLOAD: Self = Self(1024 * 1024);

    /// Ceiling of `bytes` per second.
    pub const fn bytes_per_sec(bytes: u64) -> Self {
        Self(bytes)
    }

    /// Raw bytes-per-second value.
    pub const fn as_bytes_per_sec(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RateCeiling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mib = self.0 as f64 / (1024.0 * 1024.0);
        if mib >= 1.0 {
            write!(f, "{mib:.1} MiB/s")
        } else {
            write!(f, "{:.0} KiB/s", self.0 as f64 / 1024.0)
        }
    }
}

/// Delay schedule between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// Same delay before every retry
    Fixed(Duration),
    /// `initial * 2^(attempt-1)`, capped at `max`
    Exponential {
        /// Delay before the first retry
        initial: Duration,
        /// Upper bound for any single delay
        max: Duration,
    },
}

impl BackoffStrategy {
    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Exponential { initial, max } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                initial.saturating_mul(factor).min(max)
            }
        }
    }
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::Exponential {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(30),
        }
    }
}

/// Retry behaviour the retrieval tool is configured with.
///
/// The scheduler never retries on its own; it hands this policy to the
/// collaborator and reports whatever comes back once attempts are exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay schedule between attempts
    pub backoff: BackoffStrategy,
}

impl RetryPolicy {
    /// Number of retries after the first attempt.
    pub fn retries(&self) -> u32 {
        self.max_attempts.saturating_sub(1)
    }

    /// Worst-case time spent waiting between attempts.
    pub fn total_backoff(&self) -> Duration {
        (1..=self.retries())
            .map(|attempt| self.backoff.delay_for(attempt))
            .sum()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: BackoffStrategy::default(),
        }
    }
}

/// Request identity and timing envelope for one call.
///
/// Profiles are immutable once generated and are never reused across calls.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionProfile {
    identity: String,
    referer: String,
    headers: Vec<(String, String)>,
    socket_timeout: Duration,
    retry: RetryPolicy,
    fragment_retries: u32,
    geo_bypass: bool,
    geo_bypass_country: Option<String>,
    force_ipv4: bool,
    discovery_ceiling: RateCeiling,
    download_ceiling: RateCeiling,
}

impl SessionProfile {
    /// Browser identity (user agent).
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Referer header value.
    pub fn referer(&self) -> &str {
        &self.referer
    }

    /// Header template in presentation order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Look up a header by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Network timeout.
    pub fn socket_timeout(&self) -> Duration {
        self.socket_timeout
    }

    /// Retry policy for the collaborator.
    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Retries per media fragment.
    pub fn fragment_retries(&self) -> u32 {
        self.fragment_retries
    }

    /// Whether geographic restrictions should be bypassed.
    pub fn geo_bypass(&self) -> bool {
        self.geo_bypass
    }

    /// Country to present when bypassing geographic restrictions.
    pub fn geo_bypass_country(&self) -> Option<&str> {
        self.geo_bypass_country.as_deref()
    }

    /// Whether connections are forced over IPv4.
    pub fn force_ipv4(&self) -> bool {
        self.force_ipv4
    }

    /// Ceiling for metadata discovery calls.
    pub fn discovery_ceiling(&self) -> RateCeiling {
        self.discovery_ceiling
    }

    /// Ceiling for media downloads.
    pub fn download_ceiling(&self) -> RateCeiling {
        self.download_ceiling
    }
}

/// Options recognised by [`SessionProfileGenerator`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileConfig {
    /// Identity pool; one entry is drawn per profile
    pub identities: Vec<String>,
    /// Referer header value
    pub referer: String,
    /// Header template
    pub headers: Vec<(String, String)>,
    /// Network timeout
    pub socket_timeout: Duration,
    /// Collaborator retry policy
    pub retry: RetryPolicy,
    /// Retries per media fragment
    pub fragment_retries: u32,
    /// Bypass geographic restrictions
    pub geo_bypass: bool,
    /// Country for geo bypass
    pub geo_bypass_country: String,
    /// Force IPv4 connections
    pub force_ipv4: bool,
    /// Ceiling for discovery calls
    pub discovery_ceiling: RateCeiling,
    /// Ceiling for downloads
    pub download_ceiling: RateCeiling,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            identities: DEFAULT_IDENTITIES.iter().map(|s| s.to_string()).collect(),
            referer: DEFAULT_REFERER.to_string(),
            headers: DEFAULT_HEADERS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            socket_timeout: DEFAULT_SOCKET_TIMEOUT,
            retry: RetryPolicy::default(),
            fragment_retries: DEFAULT_FRAGMENT_RETRIES,
            geo_bypass: true,
            geo_bypass_country: DEFAULT_GEO_BYPASS_COUNTRY.to_string(),
            force_ipv4: true,
            discovery_ceiling: RateCeiling::DISCOVERY,
            download_ceiling: RateCeiling::DOWNLOAD,
        }
    }
}

impl ProfileConfig {
    /// Check the options can produce usable profiles.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pool: Vec<_> = self.identities.iter().filter(|s| !s.trim().is_empty()).collect();
        if pool.len() < MIN_IDENTITY_POOL {
            return Err(ConfigError::IdentityPoolTooSmall {
                required: MIN_IDENTITY_POOL,
                actual: pool.len(),
            });
        }

        if self.download_ceiling.as_bytes_per_sec() == 0
            || self.discovery_ceiling.as_bytes_per_sec() == 0
        {
            return Err(ConfigError::InvalidRateCeiling(
                "ceilings must be greater than zero".to_string(),
            ));
        }
        if self.download_ceiling > self.discovery_ceiling {
            return Err(ConfigError::InvalidRateCeiling(format!(
                "download ceiling ({}) exceeds discovery ceiling ({})",
                self.download_ceiling, self.discovery_ceiling
            )));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidRetryPolicy(
                "at least one attempt is required".to_string(),
            ));
        }

        if self.socket_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "socket_timeout",
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.geo_bypass && self.geo_bypass_country.len() != 2 {
            return Err(ConfigError::InvalidValue {
                field: "geo_bypass_country",
                reason: format!("expected a two-letter country code, got {:?}", self.geo_bypass_country),
            });
        }

        Ok(())
    }
}

/// Produces a fresh [`SessionProfile`] per call.
#[derive(Debug, Clone)]
pub struct SessionProfileGenerator {
    config: ProfileConfig,
    rng: RandomSource,
}

impl SessionProfileGenerator {
    /// Validate `config` and build a generator drawing from `rng`.
    pub fn new(mut config: ProfileConfig, rng: RandomSource) -> Result<Self, ConfigError> {
        config.validate()?;
        config.identities.retain(|identity| !identity.trim().is_empty());
        Ok(Self { config, rng })
    }

    /// Generate a profile. Each call draws a new identity independently.
    pub fn generate(&self) -> SessionProfile {
        let pool = &self.config.identities;
        let index = self.rng.index(pool.len()).unwrap_or(0);
        debug!(identity_index = index, "Generated session profile");

        SessionProfile {
            identity: pool[index].clone(),
            referer: self.config.referer.clone(),
            headers: self.config.headers.clone(),
            socket_timeout: self.config.socket_timeout,
            retry: self.config.retry,
            fragment_retries: self.config.fragment_retries,
            geo_bypass: self.config.geo_bypass,
            geo_bypass_country: self
                .config
                .geo_bypass
                .then(|| self.config.geo_bypass_country.clone()),
            force_ipv4: self.config.force_ipv4,
            discovery_ceiling: self.config.discovery_ceiling,
            download_ceiling: self.config.download_ceiling,
        }
    }
}

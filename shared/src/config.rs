use tracing::warn;

pub struct Config {
    pub host: String,
    pub http_port: u16,
    /// Lifetime of one session-chain link, in seconds.
    pub session_ttl_secs: u64,
    /// Interval between background reaper runs, in seconds.
    pub cleanup_interval_secs: u64,
    /// Maximum keys the reaper drops per run.
    pub max_cleanup_batch: usize,
    /// Request-body ceiling, checked before any decryption attempt.
    pub max_body_bytes: usize,
}

impl Config {
    const DEFAULT_HTTP_PORT: u16 = 8080;
    const DEFAULT_SESSION_TTL_SECS: u64 = 120;
    const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 60;
    const DEFAULT_MAX_CLEANUP_BATCH: usize = 1000;
    const DEFAULT_MAX_BODY_BYTES: usize = 3 * 1024 * 1024;

    pub fn from_env() -> Self {
        Self {
            host: std::env::var("PARLOR_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env_parsed("PARLOR_HTTP_PORT", Self::DEFAULT_HTTP_PORT),
            session_ttl_secs: env_parsed("PARLOR_SESSION_TTL_SECS", Self::DEFAULT_SESSION_TTL_SECS),
            cleanup_interval_secs: env_parsed(
                "PARLOR_CLEANUP_INTERVAL_SECS",
                Self::DEFAULT_CLEANUP_INTERVAL_SECS,
            ),
            max_cleanup_batch: env_parsed(
                "PARLOR_MAX_CLEANUP_BATCH",
                Self::DEFAULT_MAX_CLEANUP_BATCH,
            ),
            max_body_bytes: env_parsed("PARLOR_MAX_BODY_BYTES", Self::DEFAULT_MAX_BODY_BYTES),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            http_port: Self::DEFAULT_HTTP_PORT,
            session_ttl_secs: Self::DEFAULT_SESSION_TTL_SECS,
            cleanup_interval_secs: Self::DEFAULT_CLEANUP_INTERVAL_SECS,
            max_cleanup_batch: Self::DEFAULT_MAX_CLEANUP_BATCH,
            max_body_bytes: Self::DEFAULT_MAX_BODY_BYTES,
        }
    }
}

fn env_parsed<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.parse::<T>().unwrap_or_else(|_| {
            warn!("{} is not a valid value, falling back to default", name);
            default
        }),
        Err(_) => default,
    }
}

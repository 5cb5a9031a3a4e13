//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

use panreel_models::DEFAULT_DURATION_SECS;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second, per client IP
    pub rate_limit_rps: u32,
    /// Upper bound on a single render, FFmpeg included
    pub request_timeout: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Renders allowed to run at once
    pub max_concurrent_renders: usize,
    /// Duration used when the request does not name one
    pub default_duration_secs: u32,
    /// Largest duration a request may ask for
    pub max_duration_secs: u32,
    /// Parent of the per-request scratch directories
    pub scratch_dir: PathBuf,
    /// Expose Prometheus metrics at /metrics
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            request_timeout: Duration::from_secs(120),
            max_body_size: 20 * 1024 * 1024, // 20MB
            environment: "development".to_string(),
            max_concurrent_renders: default_concurrency(),
            default_duration_secs: DEFAULT_DURATION_SECS as u32,
            max_duration_secs: 60,
            scratch_dir: default_scratch_dir(),
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: env_parse("RATE_LIMIT_RPS").unwrap_or(defaults.rate_limit_rps),
            request_timeout: env_parse("REQUEST_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            max_concurrent_renders: env_parse("MAX_CONCURRENT_RENDERS")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_concurrent_renders),
            default_duration_secs: env_parse("DEFAULT_DURATION")
                .filter(|n: &u32| *n > 0)
                .unwrap_or(defaults.default_duration_secs),
            max_duration_secs: env_parse("MAX_DURATION")
                .filter(|n: &u32| *n > 0)
                .unwrap_or(defaults.max_duration_secs),
            scratch_dir: std::env::var("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.scratch_dir),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
        }
    }

    /// Production hides internal error details and defaults to JSON logs.
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("panreel")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.default_duration_secs, 3);
        assert_eq!(config.max_duration_secs, 60);
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert!(config.max_concurrent_renders >= 1);
        assert!(config.scratch_dir.ends_with("panreel"));
        assert!(!config.is_production());
    }

    #[test]
    fn test_is_production_ignores_case() {
        let config = ApiConfig {
            environment: "Production".to_string(),
            ..Default::default()
        };
        assert!(config.is_production());
    }
}

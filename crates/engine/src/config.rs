use std::str::FromStr;

use cfe_events::bus::DEFAULT_CAPACITY;

/// What to do when a superseded or cleared upload resolves successfully.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StaleUploadPolicy {
    /// Still report the late url to the host. The tracked upload state is
    /// left alone either way.
    #[default]
    Deliver,
    /// Drop the late url; only a diagnostic event is emitted.
    Discard,
}

impl FromStr for StaleUploadPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deliver" => Ok(Self::Deliver),
            "discard" => Ok(Self::Discard),
            other => Err(ConfigError::Invalid {
                var: "CFE_STALE_UPLOADS",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Engine configuration loaded from environment variables.
///
/// All fields have defaults; invalid values are logged and replaced by the
/// default rather than aborting.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Capacity of the diagnostic event bus (default: `1024`).
    pub event_capacity: usize,
    /// Cache definitions per section within a session (default: `true`).
    pub cache_definitions: bool,
    /// Handling of late upload completions (default: deliver).
    pub stale_uploads: StaleUploadPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_capacity: DEFAULT_CAPACITY,
            cache_definitions: true,
            stale_uploads: StaleUploadPolicy::Deliver,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default   |
    /// |-------------------------|-----------|
    /// | `CFE_EVENT_CAPACITY`    | `1024`    |
    /// | `CFE_CACHE_DEFINITIONS` | `true`    |
    /// | `CFE_STALE_UPLOADS`     | `deliver` |
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let event_capacity = parse_or_default(
            "CFE_EVENT_CAPACITY",
            lookup("CFE_EVENT_CAPACITY"),
            defaults.event_capacity,
            |raw| raw.trim().parse::<usize>().ok().filter(|n| *n > 0),
        );

        let cache_definitions = parse_or_default(
            "CFE_CACHE_DEFINITIONS",
            lookup("CFE_CACHE_DEFINITIONS"),
            defaults.cache_definitions,
            |raw| match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
        );

        let stale_uploads = parse_or_default(
            "CFE_STALE_UPLOADS",
            lookup("CFE_STALE_UPLOADS"),
            defaults.stale_uploads,
            |raw| raw.parse::<StaleUploadPolicy>().ok(),
        );

        Self {
            event_capacity,
            cache_definitions,
            stale_uploads,
        }
    }
}

fn parse_or_default<T: Copy + std::fmt::Debug>(
    var: &'static str,
    raw: Option<String>,
    default: T,
    parse: impl Fn(&str) -> Option<T>,
) -> T {
    let Some(raw) = raw else {
        return default;
    };
    match parse(&raw) {
        Some(value) => value,
        None => {
            let error = ConfigError::Invalid { var, value: raw };
            tracing::warn!(error = %error, default = ?default, "Using default configuration value");
            default
        }
    }
}

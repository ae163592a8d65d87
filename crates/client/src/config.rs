//! Client configuration, read from `AQUAROUTE_*` environment variables.

use std::time::Duration;

use aquaroute_core::UserId;
use aquaroute_observability::LogFormat;
use thiserror::Error;

pub const API_URL: &str = "AQUAROUTE_API_URL";
pub const API_PREFIX: &str = "AQUAROUTE_API_PREFIX";
pub const HTTP_TIMEOUT_SECS: &str = "AQUAROUTE_HTTP_TIMEOUT_SECS";
pub const CACHE_MAX_AGE_SECS: &str = "AQUAROUTE_CACHE_MAX_AGE_SECS";
pub const LOG_FORMAT: &str = "AQUAROUTE_LOG_FORMAT";
pub const TOKEN: &str = "AQUAROUTE_TOKEN";
pub const USER_ID: &str = "AQUAROUTE_USER_ID";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_prefix: String,
    pub http_timeout: Duration,
    /// `None` disables staleness expiry of cached reads.
    pub cache_max_age: Option<chrono::Duration>,
    pub log_format: LogFormat,
    pub token: Option<String>,
    pub user_id: Option<UserId>,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_url = get(API_URL).ok_or(ConfigError::Missing(API_URL))?;
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: API_URL,
                value: api_url,
            });
        }

        let api_prefix = get(API_PREFIX).unwrap_or_else(|| "restify".to_string());

        let http_timeout = match get(HTTP_TIMEOUT_SECS) {
            Some(raw) => Duration::from_secs(parse_secs(HTTP_TIMEOUT_SECS, &raw)?),
            None => Duration::from_secs(30),
        };

        let max_age_secs = match get(CACHE_MAX_AGE_SECS) {
            Some(raw) => parse_secs(CACHE_MAX_AGE_SECS, &raw)?,
            None => 300,
        };
        let cache_max_age = if max_age_secs == 0 {
            None
        } else {
            let invalid = || ConfigError::Invalid {
                key: CACHE_MAX_AGE_SECS,
                value: max_age_secs.to_string(),
            };
            let secs = i64::try_from(max_age_secs).map_err(|_| invalid())?;
            Some(chrono::Duration::try_seconds(secs).ok_or_else(invalid)?)
        };

        let log_format = match get(LOG_FORMAT) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: LOG_FORMAT,
                value: raw,
            })?,
            None => LogFormat::default(),
        };

        let user_id = match get(USER_ID) {
            Some(raw) => Some(raw.parse::<UserId>().map_err(|_| ConfigError::Invalid {
                key: USER_ID,
                value: raw,
            })?),
            None => None,
        };

        Ok(Self {
            api_url,
            api_prefix,
            http_timeout,
            cache_max_age,
            log_format,
            token: get(TOKEN),
            user_id,
        })
    }
}

fn parse_secs(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_url_is_set() {
        let cfg = config(&[(API_URL, "https://api.example.com")]).unwrap();
        assert_eq!(cfg.api_prefix, "restify");
        assert_eq!(cfg.http_timeout, Duration::from_secs(30));
        assert_eq!(cfg.cache_max_age, chrono::Duration::try_seconds(300));
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert!(cfg.token.is_none());
        assert!(cfg.user_id.is_none());
    }

    #[test]
    fn url_is_required() {
        assert_eq!(config(&[]).unwrap_err(), ConfigError::Missing(API_URL));
        assert_eq!(config(&[(API_URL, "   ")]).unwrap_err(), ConfigError::Missing(API_URL));
    }

    #[test]
    fn explicit_values_are_parsed() {
        let cfg = config(&[
            (API_URL, "http://localhost:8000"),
            (API_PREFIX, "api"),
            (HTTP_TIMEOUT_SECS, "5"),
            (CACHE_MAX_AGE_SECS, "0"),
            (LOG_FORMAT, "pretty"),
            (TOKEN, "abc"),
            (USER_ID, "\"7\""),
        ]);
        // quoted ids are not accepted from the environment
        assert!(matches!(cfg, Err(ConfigError::Invalid { key: USER_ID, .. })));

        let cfg = config(&[
            (API_URL, "http://localhost:8000"),
            (API_PREFIX, "api"),
            (HTTP_TIMEOUT_SECS, "5"),
            (CACHE_MAX_AGE_SECS, "0"),
            (LOG_FORMAT, "pretty"),
            (TOKEN, "abc"),
            (USER_ID, "7"),
        ])
        .unwrap();
        assert_eq!(cfg.api_prefix, "api");
        assert_eq!(cfg.http_timeout, Duration::from_secs(5));
        assert_eq!(cfg.cache_max_age, None);
        assert_eq!(cfg.log_format, LogFormat::Pretty);
        assert_eq!(cfg.token.as_deref(), Some("abc"));
        assert_eq!(cfg.user_id, Some(UserId::new(7)));
    }

    #[test]
    fn invalid_values_name_their_key() {
        for (key, value) in [
            (HTTP_TIMEOUT_SECS, "soon"),
            (CACHE_MAX_AGE_SECS, "-1"),
            (LOG_FORMAT, "xml"),
            (API_URL, "ftp://x"),
        ] {
            let mut pairs = vec![(API_URL, "http://localhost")];
            pairs.push((key, value));
            match config(&pairs) {
                Err(ConfigError::Invalid { key: k, value: v }) => {
                    assert_eq!(k, key);
                    assert_eq!(v, value);
                }
                other => panic!("expected invalid {key}, got {other:?}"),
            }
        }
    }
}

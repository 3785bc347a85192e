use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;

/// Whose pins `getPins` returns.
///
/// The service decides visibility; this only controls whether the client
/// scopes the list request to the signed-in user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PinVisibility {
    /// Everyone sees every pin. No `uid` is sent when listing.
    #[default]
    Shared,
    /// Listing sends `uid` so the service can scope the result.
    PerUser,
}

impl FromStr for PinVisibility {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shared" => Ok(Self::Shared),
            "per-user" | "per_user" | "peruser" => Ok(Self::PerUser),
            other => Err(ConfigError::Invalid {
                field: "pin_visibility",
                message: format!("expected `shared` or `per-user`, got `{other}`"),
            }),
        }
    }
}

/// What to do with a response that arrives after a newer request of the
/// same kind was issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StalePolicy {
    /// Only the response to the most recently issued request is applied.
    #[default]
    LatestIssued,
    /// Every response is applied as it lands; the last one to resolve wins.
    LastWriterWins,
}

impl FromStr for StalePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest-issued" | "latest_issued" => Ok(Self::LatestIssued),
            "last-writer-wins" | "last_writer_wins" => Ok(Self::LastWriterWins),
            other => Err(ConfigError::Invalid {
                field: "stale_policy",
                message: format!("expected `latest-issued` or `last-writer-wins`, got `{other}`"),
            }),
        }
    }
}

/// Client configuration, passed explicitly to whatever talks to the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the map service. Endpoint paths are joined onto it.
    pub base_url: Url,
    #[serde(default)]
    pub pin_visibility: PinVisibility,
    #[serde(default)]
    pub stale_policy: StalePolicy,
    /// Path of the clear endpoint, relative to `base_url`.
    #[serde(default = "default_clear_pins_path")]
    pub clear_pins_path: String,
    /// Per-request timeout. None leaves it to the transport.
    #[serde(default, rename = "request_timeout_ms", with = "millis")]
    pub request_timeout: Option<Duration>,
    /// Access token for the tile style, only needed by map widgets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_token: Option<String>,
}

fn default_clear_pins_path() -> String {
    ClientConfig::DEFAULT_CLEAR_PINS_PATH.to_string()
}

impl ClientConfig {
    pub const DEFAULT_CLEAR_PINS_PATH: &'static str = "clearPins";

    pub fn new(base_url: Url) -> Self {
        Self {
            base_url: with_trailing_slash(base_url),
            pin_visibility: PinVisibility::default(),
            stale_policy: StalePolicy::default(),
            clear_pins_path: default_clear_pins_path(),
            request_timeout: None,
            map_token: None,
        }
    }

    /// Parse a base URL string and build a default config around it.
    pub fn for_url(url: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(parse_url(url)?))
    }

    /// Load configuration from environment variables (and `.env`, if present).
    ///
    /// Required env vars:
    /// - `REDLINE_API_URL`: base URL of the map service
    ///
    /// Optional env vars:
    /// - `REDLINE_PIN_VISIBILITY`: `shared` (default) or `per-user`
    /// - `REDLINE_STALE_POLICY`: `latest-issued` (default) or `last-writer-wins`
    /// - `REDLINE_CLEAR_PINS_PATH`: path of the clear endpoint (default: clearPins)
    /// - `REDLINE_REQUEST_TIMEOUT_MS`: per-request timeout in milliseconds
    /// - `MAPBOX_TOKEN`: tile style access token
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = lookup("REDLINE_API_URL").ok_or(ConfigError::MissingEnv {
            var: "REDLINE_API_URL",
        })?;
        Self::for_url(&url)?.with_overrides(lookup)
    }

    /// Apply the optional environment variables on top of `self`.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(visibility) = lookup("REDLINE_PIN_VISIBILITY") {
            self.pin_visibility = visibility.parse()?;
        }
        if let Some(policy) = lookup("REDLINE_STALE_POLICY") {
            self.stale_policy = policy.parse()?;
        }
        if let Some(path) = lookup("REDLINE_CLEAR_PINS_PATH") {
            let path = path.trim().trim_start_matches('/');
            if path.is_empty() {
                return Err(ConfigError::Invalid {
                    field: "clear_pins_path",
                    message: "must not be empty".to_string(),
                });
            }
            self.clear_pins_path = path.to_string();
        }
        if let Some(timeout) = lookup("REDLINE_REQUEST_TIMEOUT_MS") {
            let ms: u64 = timeout.trim().parse().map_err(|_| ConfigError::Invalid {
                field: "request_timeout",
                message: format!("`{timeout}` is not a number of milliseconds"),
            })?;
            self.request_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(token) = lookup("MAPBOX_TOKEN").filter(|t| !t.trim().is_empty()) {
            self.map_token = Some(token);
        }
        Ok(self)
    }

    /// Load from a `.toml` or `.json` file, picked by extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&contents).map_err(|e| ConfigError::Invalid {
                field: "config_file",
                message: e.to_string(),
            })?,
            Some("json") => serde_json::from_str(&contents).map_err(|e| ConfigError::Invalid {
                field: "config_file",
                message: e.to_string(),
            })?,
            _ => {
                return Err(ConfigError::Invalid {
                    field: "config_file",
                    message: format!("unsupported file format: {}", path.display()),
                });
            }
        };
        Ok(Self {
            base_url: with_trailing_slash(config.base_url),
            ..config
        })
    }

    /// Fails fast when no tile token is configured.
    pub fn require_map_token(&self) -> Result<&str, ConfigError> {
        self.map_token.as_deref().ok_or(ConfigError::MissingEnv {
            var: "MAPBOX_TOKEN",
        })
    }
}

fn parse_url(url: &str) -> Result<Url, ConfigError> {
    Url::parse(url.trim()).map_err(|e| ConfigError::UrlParse {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// `Url::join` replaces the last segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}

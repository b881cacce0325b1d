//! Connection settings for a GeoServer instance.

use std::env;
use std::time::Duration;

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

pub const URL_VAR: &str = "GEOSERVER_URL";
pub const USERNAME_VAR: &str = "GEOSERVER_USERNAME";
pub const PASSWORD_VAR: &str = "GEOSERVER_PASSWORD";
pub const TIMEOUT_VAR: &str = "GEOSERVER_TIMEOUT_SECS";

/// Where GeoServer lives and how to authenticate against it.
///
/// `base_url` includes the servlet context, e.g.
/// `http://localhost:8080/geoserver`. A trailing `/` is ignored.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read settings from `GEOSERVER_URL`, `GEOSERVER_USERNAME`,
    /// `GEOSERVER_PASSWORD` and `GEOSERVER_TIMEOUT_SECS`.
    ///
    /// Returns `None` when `GEOSERVER_URL` is unset. Credentials default to
    /// GeoServer's stock `admin` / `geoserver`; an unparsable timeout falls
    /// back to `DEFAULT_TIMEOUT`.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let base_url = lookup(URL_VAR)?;
        let username = lookup(USERNAME_VAR).unwrap_or_else(|| "admin".to_string());
        let password = lookup(PASSWORD_VAR).unwrap_or_else(|| "geoserver".to_string());
        let timeout = lookup(TIMEOUT_VAR)
            .and_then(|secs| secs.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        Some(Self {
            base_url,
            username,
            password,
            timeout,
        })
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_url_yields_none() {
        assert!(ClientConfig::from_lookup(lookup(&[])).is_none());
    }

    #[test]
    fn defaults_fill_missing_values() {
        let config =
            ClientConfig::from_lookup(lookup(&[(URL_VAR, "http://gs:8080/geoserver")])).unwrap();
        assert_eq!(config.base_url, "http://gs:8080/geoserver");
        assert_eq!(config.username, "admin");
        assert_eq!(config.password, "geoserver");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn explicit_values_win() {
        let config = ClientConfig::from_lookup(lookup(&[
            (URL_VAR, "http://gs"),
            (USERNAME_VAR, "ops"),
            (PASSWORD_VAR, "hunter2"),
            (TIMEOUT_VAR, "5"),
        ]))
        .unwrap();
        assert_eq!(config.username, "ops");
        assert_eq!(config.password, "hunter2");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn bad_timeout_falls_back_to_default() {
        let config =
            ClientConfig::from_lookup(lookup(&[(URL_VAR, "http://gs"), (TIMEOUT_VAR, "soon")]))
                .unwrap();
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn debug_hides_password() {
        let config = ClientConfig::new("http://gs", "admin", "hunter2");
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}

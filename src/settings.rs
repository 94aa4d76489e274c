//! Client configuration.
//!
//! The settings document mirrors the configuration surface consumed from an
//! external settings loader: a `rest` sub-document for the HTTP transport
//! and an optional `memcached` sub-document that, when present, enables the
//! cache fast path. Settings are immutable once a [`crate::Client`] is
//! constructed; the currently-active host is owned by the failover cursor,
//! not by this document.

use serde::Deserialize;

use crate::error::{ClientError, Result};

/// Default REST port for the document store.
pub const DEFAULT_REST_PORT: u16 = 9200;

/// Default memcached port.
pub const DEFAULT_CACHE_PORT: u16 = 11211;

/// Top-level client settings.
///
/// `memcached` is opt-in: when absent every operation uses the REST
/// transport. [`CacheSettings::default`] points at `localhost:11211` for
/// the common local setup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Cache transport settings; `None` disables the cache fast path.
    pub memcached: Option<CacheSettings>,
    /// REST transport settings.
    pub rest: RestSettings,
}

/// Settings for the HTTP(S) REST transport.
///
/// Host configuration accepts four shapes: a singular `host` or `hostname`,
/// or a plural `hosts` or `hostnames` list. `hosts` entries may carry their
/// own port (`"10.0.0.1:9200"`); `hostnames` entries all share `port`.
/// Supplying both lists, or a singular together with a plural, is a
/// configuration error.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RestSettings {
    /// Single host, optionally `host:port`.
    pub host: Option<String>,
    /// Single hostname, combined with `port`.
    pub hostname: Option<String>,
    /// Host list for failover rotation; entries may carry their own port.
    pub hosts: Option<Vec<String>>,
    /// Hostname list for failover rotation; all entries share `port`.
    pub hostnames: Option<Vec<String>>,
    /// Port applied to hostname-style entries.
    pub port: u16,
    /// Use `https` instead of `http`.
    pub secure: bool,
    /// Default request timeout in milliseconds.
    pub timeout: Option<u64>,
}

impl Default for RestSettings {
    fn default() -> Self {
        RestSettings {
            host: None,
            hostname: None,
            hosts: None,
            hostnames: None,
            port: DEFAULT_REST_PORT,
            secure: false,
            timeout: None,
        }
    }
}

/// Settings for the memcached cache transport.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Single node, optionally `host:port`.
    pub host: Option<String>,
    /// Node list; entries may carry their own port.
    pub hosts: Option<Vec<String>>,
    /// Hostname list; all entries share `port`.
    pub hostnames: Option<Vec<String>>,
    /// Port applied to hostname-style entries.
    pub port: u16,
    /// Default request timeout in milliseconds.
    pub timeout: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            host: None,
            hosts: None,
            hostnames: None,
            port: DEFAULT_CACHE_PORT,
            timeout: None,
        }
    }
}

/// Append `default_port` when `host` carries no port of its own.
pub(crate) fn ensure_port(host: &str, default_port: u16) -> String {
    if host.contains(':') {
        host.to_string()
    } else {
        format!("{host}:{default_port}")
    }
}

fn validate_host_fields(
    section: &str,
    singular: &[&Option<String>],
    hosts: &Option<Vec<String>>,
    hostnames: &Option<Vec<String>>,
) -> Result<()> {
    if hosts.is_some() && hostnames.is_some() {
        return Err(ClientError::Config(format!(
            "{section}: `hosts` and `hostnames` are mutually exclusive"
        )));
    }
    let has_singular = singular.iter().any(|field| field.is_some());
    let has_plural = hosts.is_some() || hostnames.is_some();
    if has_singular && has_plural {
        return Err(ClientError::Config(format!(
            "{section}: singular and plural host fields are mutually exclusive"
        )));
    }
    for list in [hosts, hostnames].into_iter().filter_map(Option::as_ref) {
        if list.is_empty() {
            return Err(ClientError::Config(format!(
                "{section}: host list must not be empty"
            )));
        }
    }
    Ok(())
}

impl Settings {
    pub(crate) fn validate(&self) -> Result<()> {
        validate_host_fields(
            "rest",
            &[&self.rest.host, &self.rest.hostname],
            &self.rest.hosts,
            &self.rest.hostnames,
        )?;
        if let Some(cache) = &self.memcached {
            validate_host_fields("memcached", &[&cache.host], &cache.hosts, &cache.hostnames)?;
        }
        Ok(())
    }
}

impl RestSettings {
    /// Resolve the configured host information into an ordered list of
    /// `host:port` authorities for the failover cursor.
    pub(crate) fn authorities(&self) -> Vec<String> {
        if let Some(hosts) = &self.hosts {
            hosts.iter().map(|h| ensure_port(h, self.port)).collect()
        } else if let Some(hostnames) = &self.hostnames {
            hostnames
                .iter()
                .map(|h| format!("{h}:{}", self.port))
                .collect()
        } else if let Some(hostname) = &self.hostname {
            vec![format!("{hostname}:{}", self.port)]
        } else {
            let host = self.host.as_deref().unwrap_or("localhost");
            vec![ensure_port(host, self.port)]
        }
    }
}

impl CacheSettings {
    /// Resolve the configured node information into `host:port` authorities.
    pub(crate) fn authorities(&self) -> Vec<String> {
        if let Some(hosts) = &self.hosts {
            hosts.iter().map(|h| ensure_port(h, self.port)).collect()
        } else if let Some(hostnames) = &self.hostnames {
            hostnames
                .iter()
                .map(|h| format!("{h}:{}", self.port))
                .collect()
        } else {
            let host = self.host.as_deref().unwrap_or("localhost");
            vec![ensure_port(host, self.port)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_localhost() {
        let settings = Settings::default();
        assert!(settings.memcached.is_none());
        assert_eq!(settings.rest.authorities(), vec!["localhost:9200"]);
        assert_eq!(CacheSettings::default().authorities(), vec!["localhost:11211"]);
    }

    #[test]
    fn hostnames_share_the_configured_port() {
        let rest = RestSettings {
            hostnames: Some(vec!["a.example".to_string(), "b.example".to_string()]),
            port: 9201,
            ..Default::default()
        };
        assert_eq!(rest.authorities(), vec!["a.example:9201", "b.example:9201"]);
    }

    #[test]
    fn hosts_keep_their_own_ports() {
        let rest = RestSettings {
            hosts: Some(vec!["a:9200".to_string(), "b".to_string()]),
            ..Default::default()
        };
        assert_eq!(rest.authorities(), vec!["a:9200", "b:9200"]);
    }

    #[test]
    fn empty_host_list_is_rejected() {
        let settings = Settings {
            rest: RestSettings {
                hosts: Some(Vec::new()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn both_lists_are_rejected() {
        let settings = Settings {
            rest: RestSettings {
                hosts: Some(vec!["a".to_string()]),
                hostnames: Some(vec!["b".to_string()]),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn singular_and_plural_are_rejected() {
        let settings = Settings {
            rest: RestSettings {
                host: Some("a".to_string()),
                hosts: Some(vec!["b".to_string()]),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn cache_host_list_is_validated_too() {
        let settings = Settings {
            memcached: Some(CacheSettings {
                hosts: Some(Vec::new()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn deserializes_the_external_config_surface() {
        let settings: Settings = serde_json::from_str(
            r#"{
                "memcached": { "hostnames": ["cache-1", "cache-2"], "port": 11211 },
                "rest": { "hosts": ["es-1:9200", "es-2:9200"], "secure": true, "timeout": 5000 }
            }"#,
        )
        .unwrap();
        assert!(settings.validate().is_ok());
        assert!(settings.rest.secure);
        assert_eq!(settings.rest.timeout, Some(5000));
        let cache = settings.memcached.unwrap();
        assert_eq!(cache.authorities(), vec!["cache-1:11211", "cache-2:11211"]);
    }
}

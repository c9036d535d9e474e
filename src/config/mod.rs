//! Configuration module

use crate::dns::parse_resolver;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listen address (`:80` style accepted)
    pub http: String,

    /// DNS lookup and caching
    pub dns: DnsConfig,

    /// Where requests without `go-get=1` are redirected
    #[serde(rename = "redirect-base")]
    pub redirect_base: String,

    /// Log level
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration from file (async)
    pub async fn load_async<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        Self::from_str(&content)
    }

    /// Load from string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        self.dns.validate()?;

        if !self.redirect_base.starts_with("http://") && !self.redirect_base.starts_with("https://")
        {
            return Err(Error::config(format!(
                "redirect-base must be an http(s) URL: {}",
                self.redirect_base
            )));
        }

        Ok(())
    }

    /// HTTP listen address as a socket address
    ///
    /// An empty host (`:80`) listens on all interfaces.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let addr = if self.http.starts_with(':') {
            format!("0.0.0.0{}", self.http)
        } else {
            self.http.clone()
        };
        addr.parse()
            .map_err(|_| Error::config(format!("invalid http listen address: {}", self.http)))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            http: default_http(),
            dns: DnsConfig::default(),
            redirect_base: default_redirect_base(),
            log_level: Some("info".to_string()),
        }
    }
}

/// DNS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsConfig {
    /// Resolver address, port defaults to 53
    pub resolver: String,

    /// How long a resolved host is served before DNS is asked again
    #[serde(with = "humantime_serde")]
    pub refresh: Duration,

    /// Per-exchange timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Attempts per exchange
    pub attempts: usize,

    /// Maximum number of cached hosts
    #[serde(rename = "cache-size")]
    pub cache_size: usize,

    /// Coalesce concurrent identical queries
    #[serde(rename = "single-flight")]
    pub single_flight: bool,
}

impl DnsConfig {
    pub fn validate(&self) -> Result<()> {
        parse_resolver(&self.resolver)?;

        if self.refresh.is_zero() {
            return Err(Error::config("dns.refresh must be greater than zero"));
        }
        if self.timeout.is_zero() {
            return Err(Error::config("dns.timeout must be greater than zero"));
        }
        if self.attempts == 0 {
            return Err(Error::config("dns.attempts must be at least 1"));
        }
        if self.cache_size == 0 {
            return Err(Error::config("dns.cache-size must be at least 1"));
        }

        Ok(())
    }

    /// Bound on a whole lookup: every attempt timing out
    pub fn lookup_timeout(&self) -> Duration {
        self.timeout.saturating_mul(self.attempts.max(1) as u32)
    }
}

impl Default for DnsConfig {
    fn default() -> Self {
        DnsConfig {
            resolver: "8.8.8.8:53".to_string(),
            refresh: Duration::from_secs(15 * 60),
            timeout: Duration::from_secs(5),
            attempts: 2,
            cache_size: default_cache_size(),
            single_flight: true,
        }
    }
}

fn default_http() -> String {
    ":80".to_string()
}

fn default_redirect_base() -> String {
    "https://pkg.go.dev".to_string()
}

fn default_cache_size() -> usize {
    4096
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.log_level, Some("info".to_string()));
        assert_eq!(config.dns.resolver, "8.8.8.8:53");
        assert_eq!(config.dns.refresh, Duration::from_secs(900));
        assert!(config.dns.single_flight);
        config.validate().unwrap();
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
http: "127.0.0.1:8080"
log-level: debug
redirect-base: https://godoc.org
dns:
  resolver: 1.1.1.1
  refresh: 1h 30m
  timeout: 2s
  cache-size: 128
  single-flight: false
"#;
        let config = Config::from_str(yaml).unwrap();
        assert_eq!(config.log_level, Some("debug".to_string()));
        assert_eq!(config.listen_addr().unwrap().port(), 8080);
        assert_eq!(config.dns.refresh, Duration::from_secs(5400));
        assert_eq!(config.dns.timeout, Duration::from_secs(2));
        assert_eq!(config.dns.attempts, 2);
        assert_eq!(config.dns.cache_size, 128);
        assert!(!config.dns.single_flight);
        assert_eq!(config.redirect_base, "https://godoc.org");
    }

    #[test]
    fn test_config_empty_yaml_uses_defaults() {
        let config = Config::from_str("{}").unwrap();
        assert_eq!(config.http, ":80");
        assert_eq!(config.dns.cache_size, 4096);
    }

    #[test]
    fn test_listen_addr_go_style() {
        let config = Config {
            http: ":8080".to_string(),
            ..Default::default()
        };
        assert_eq!(config.listen_addr().unwrap().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let yaml = "dns:\n  refresh: 0s\n";
        assert!(matches!(Config::from_str(yaml), Err(Error::Config(_))));

        let yaml = "dns:\n  resolver: not-an-address\n";
        assert!(Config::from_str(yaml).is_err());

        let yaml = "http: nowhere\n";
        assert!(Config::from_str(yaml).is_err());

        let yaml = "redirect-base: ftp://example.org\n";
        assert!(Config::from_str(yaml).is_err());
    }

    #[tokio::test]
    async fn test_load_async() {
        let path = std::env::temp_dir().join(format!("vanity-config-{}.yaml", std::process::id()));
        std::fs::write(&path, "dns:\n  refresh: 2m\n").unwrap();
        let config = Config::load_async(&path).await.unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.dns.refresh, Duration::from_secs(120));

        let missing = Config::load_async(&path).await;
        assert!(matches!(missing, Err(Error::Io(_))));
    }

    #[test]
    fn test_lookup_timeout() {
        let dns = DnsConfig::default();
        assert_eq!(dns.lookup_timeout(), Duration::from_secs(10));
    }
}

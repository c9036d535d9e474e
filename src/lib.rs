//! Vanity - go-import redirects for vanity domains, driven by DNS TXT records
//!
//! A request for `https://example.org/foo?go-get=1` is answered with the
//! `<meta name="go-import">` tags published as TXT records on `example.org`:
//!
//! ```text
//! example.org.  TXT  "go-import example.org/foo git https://github.com/example/foo"
//! example.org.  TXT  "go-import example.org/bar hg https://hg.example.org/bar"
//! ```
//!
//! # Architecture
//!
//! ```text
//!        +------------------+
//!        |   hub/ (HTTP)    |
//!        +--------+---------+
//!                 |
//!        +--------v---------+
//!        |  dns::HostCache  |   TTL map behind one RwLock
//!        +--------+---------+
//!                 |
//!        +--------v---------+
//!        | dns::SingleFlight|   coalesces identical queries
//!        +--------+---------+
//!                 |
//!        +--------v---------+
//!        | HickoryExchange  |   TXT over TCP
//!        +------------------+
//! ```

pub mod common;
pub mod config;
pub mod dns;
pub mod hub;

pub use common::error::{Error, Result};
pub use config::Config;

use dns::{HickoryExchange, HostCache, SingleFlight, TxtExchange};
use hub::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Redirector instance: configuration, resolution cache and HTTP front end
pub struct Server {
    config: Config,
    cache: Arc<HostCache>,
    addr: SocketAddr,
}

impl Server {
    /// Create a server resolving through the configured DNS resolver
    pub async fn new(config: Config) -> Result<Self> {
        let exchange = HickoryExchange::new(&config.dns)?;
        info!(
            "DNS resolver {} (tcp, refresh {})",
            exchange.server(),
            humantime::format_duration(config.dns.refresh)
        );
        Self::with_exchange(config, Arc::new(exchange))
    }

    /// Create a server on top of an arbitrary TXT exchange
    pub fn with_exchange(config: Config, exchange: Arc<dyn TxtExchange>) -> Result<Self> {
        config.validate()?;
        let addr = config.listen_addr()?;

        let exchange: Arc<dyn TxtExchange> = if config.dns.single_flight {
            Arc::new(SingleFlight::new(exchange))
        } else {
            exchange
        };

        let cache = Arc::new(HostCache::new(
            exchange,
            config.dns.refresh,
            config.dns.cache_size,
            config.dns.lookup_timeout(),
        ));

        Ok(Server {
            config,
            cache,
            addr,
        })
    }

    /// Serve HTTP until Ctrl-C
    pub async fn run(&self) -> Result<()> {
        info!("Starting server...");

        tokio::select! {
            result = hub::start_server(self.app_state(), self.addr) => result?,
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Received shutdown signal");
            }
        }

        info!("Server stopped");
        Ok(())
    }

    /// Router serving this instance, for embedding or tests
    pub fn router(&self) -> axum::Router {
        hub::create_router(self.app_state())
    }

    fn app_state(&self) -> AppState {
        AppState::new(self.cache.clone(), &self.config.redirect_base)
    }

    /// Get current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get resolution cache reference
    pub fn cache(&self) -> &Arc<HostCache> {
        &self.cache
    }

    /// Address the HTTP server binds to
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::testing::MockExchange;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_server_from_default_config() {
        let server = Server::new(Config::default()).await.unwrap();
        assert_eq!(server.addr().port(), 80);
        assert!(server.cache().is_empty());
    }

    #[tokio::test]
    async fn test_with_exchange_validates() {
        let mut config = Config::default();
        config.dns.cache_size = 0;
        let result = Server::with_exchange(config, Arc::new(MockExchange::new()));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}

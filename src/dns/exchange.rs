//! TXT query transport
//!
//! The cache only needs "give me the answers to a TXT query for this name".
//! [`HickoryExchange`] does that over TCP against one configured resolver.

use super::LookupError;
use crate::config::DnsConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::{Name, RData, RecordType};
use hickory_resolver::config::{NameServerConfig, Protocol, ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::TokioAsyncResolver;
use std::net::SocketAddr;
use tracing::debug;

/// One answer record from a TXT exchange
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxtAnswer {
    /// TXT record, one entry per character-string, in wire order
    Txt(Vec<String>),
    /// Any other record type present in the answer section (CNAME, ...)
    Other(String),
}

/// Issues TXT queries against an upstream resolver
#[async_trait]
pub trait TxtExchange: Send + Sync {
    /// Query TXT records for `name`, returning the answer section in order.
    ///
    /// A name with no records is a successful exchange with no answers.
    async fn exchange(&self, name: &str) -> std::result::Result<Vec<TxtAnswer>, LookupError>;
}

/// [`TxtExchange`] backed by hickory over TCP
pub struct HickoryExchange {
    resolver: TokioAsyncResolver,
    server: SocketAddr,
}

impl HickoryExchange {
    /// Build an exchange talking to the single resolver in `config`
    pub fn new(config: &DnsConfig) -> Result<Self> {
        let server = parse_resolver(&config.resolver)?;

        let mut resolver_config = ResolverConfig::new();
        resolver_config.add_name_server(NameServerConfig::new(server, Protocol::Tcp));

        let mut opts = ResolverOpts::default();
        opts.cache_size = 0; // HostCache owns caching
        opts.timeout = config.timeout;
        opts.attempts = config.attempts;
        opts.ndots = 0;

        Ok(HickoryExchange {
            resolver: TokioAsyncResolver::tokio(resolver_config, opts),
            server,
        })
    }

    /// Resolver address queries are sent to
    pub fn server(&self) -> SocketAddr {
        self.server
    }
}

#[async_trait]
impl TxtExchange for HickoryExchange {
    async fn exchange(&self, name: &str) -> std::result::Result<Vec<TxtAnswer>, LookupError> {
        let mut query = Name::from_ascii(name).map_err(|e| LookupError::dns(name, e))?;
        query.set_fqdn(true);

        let lookup = match self.resolver.lookup(query, RecordType::TXT).await {
            Ok(lookup) => lookup,
            Err(e) if is_no_records(&e) => {
                debug!("TXT {} via {}: no records", name, self.server);
                return Ok(Vec::new());
            }
            Err(e) => return Err(LookupError::dns(name, e)),
        };

        let answers: Vec<TxtAnswer> = lookup
            .record_iter()
            .map(|record| match record.data() {
                Some(RData::TXT(txt)) => TxtAnswer::Txt(
                    txt.txt_data()
                        .iter()
                        .map(|s| String::from_utf8_lossy(s).into_owned())
                        .collect(),
                ),
                _ => TxtAnswer::Other(record.record_type().to_string()),
            })
            .collect();

        debug!("TXT {} via {}: {} answers", name, self.server, answers.len());
        Ok(answers)
    }
}

/// NXDOMAIN and NODATA arrive as errors from hickory; both mean "nothing there".
///
/// SERVFAIL, REFUSED and friends share the same error kind but are resolver
/// failures.
fn is_no_records(e: &ResolveError) -> bool {
    match e.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. } => {
            is_empty_answer(*response_code)
        }
        _ => false,
    }
}

fn is_empty_answer(code: ResponseCode) -> bool {
    matches!(code, ResponseCode::NoError | ResponseCode::NXDomain)
}

/// Parse a resolver address, defaulting the port to 53
///
/// Accepts `8.8.8.8`, `8.8.8.8:53`, `2001:4860:4860::8888` and
/// `[2001:4860:4860::8888]:53`.
pub fn parse_resolver(addr: &str) -> Result<SocketAddr> {
    if let Ok(sock) = addr.parse::<SocketAddr>() {
        return Ok(sock);
    }
    if let Ok(ip) = addr.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, 53));
    }
    Err(Error::config(format!("invalid resolver address: {}", addr)))
}

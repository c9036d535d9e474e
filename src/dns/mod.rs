//! go-import resolution over DNS TXT records

mod cache;
mod exchange;
mod inflight;
mod record;

pub use cache::{normalize_host, HostCache, LookupError, ResolvedHost};
pub use exchange::{parse_resolver, HickoryExchange, TxtAnswer, TxtExchange};
pub use inflight::SingleFlight;
pub use record::{parse_import, ImportDirective};

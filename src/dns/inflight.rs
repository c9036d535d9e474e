//! Single-flight coalescing of identical in-flight TXT queries

use super::{LookupError, TxtAnswer, TxtExchange};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

type ExchangeFuture = BoxFuture<'static, Result<Vec<TxtAnswer>, LookupError>>;

/// Collapses concurrent queries for the same name into one upstream exchange.
///
/// Only weak handles are kept in the in-flight map, so when every waiter
/// goes away the shared exchange is dropped and its network I/O with it.
pub struct SingleFlight<E: ?Sized> {
    inner: Arc<E>,
    inflight: Mutex<HashMap<String, WeakShared<ExchangeFuture>>>,
}

impl<E: TxtExchange + ?Sized + 'static> SingleFlight<E> {
    pub fn new(inner: Arc<E>) -> Self {
        SingleFlight {
            inner,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Number of names with a live or not yet reaped exchange
    pub fn inflight(&self) -> usize {
        self.inflight.lock().len()
    }

    fn join_or_start(&self, name: &str) -> Shared<ExchangeFuture> {
        let mut inflight = self.inflight.lock();

        if let Some(running) = inflight.get(name).and_then(WeakShared::upgrade) {
            debug!("TXT {}: joining in-flight exchange", name);
            return running;
        }

        let inner = Arc::clone(&self.inner);
        let query = name.to_string();
        let exchange: Shared<ExchangeFuture> =
            async move { inner.exchange(&query).await }.boxed().shared();

        match exchange.downgrade() {
            Some(weak) => {
                inflight.insert(name.to_string(), weak);
            }
            None => {
                inflight.remove(name);
            }
        }
        exchange
    }

    fn reap(&self, name: &str) {
        let mut inflight = self.inflight.lock();
        let finished = inflight
            .get(name)
            .map_or(false, |weak| weak.upgrade().is_none());
        if finished {
            inflight.remove(name);
        }
    }
}

/// One caller's handle on a shared exchange
///
/// Dropping it, on completion or cancellation, releases the handle and then
/// reaps the name's entry if no other waiter is left.
struct Waiter<'a, E: TxtExchange + ?Sized + 'static> {
    flight: &'a SingleFlight<E>,
    name: &'a str,
    exchange: Option<Shared<ExchangeFuture>>,
}

impl<E: TxtExchange + ?Sized + 'static> Drop for Waiter<'_, E> {
    fn drop(&mut self) {
        drop(self.exchange.take());
        self.flight.reap(self.name);
    }
}

#[async_trait]
impl<E: TxtExchange + ?Sized + 'static> TxtExchange for SingleFlight<E> {
    async fn exchange(&self, name: &str) -> Result<Vec<TxtAnswer>, LookupError> {
        let mut waiter = Waiter {
            flight: self,
            name,
            exchange: None,
        };
        let exchange = waiter.exchange.insert(self.join_or_start(name));
        exchange.await
    }
}

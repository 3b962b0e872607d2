//! Concurrent per-target fetching

use crate::types::MultiFetch;
use futures::future::join_all;
use rivalscope_domain::Target;
use rivalscope_provider::ProviderError;
use std::future::Future;
use tracing::{debug, warn};

/// Run `fetch` for every target at once and collect successes and failures apart
///
/// All calls are started together and awaited together, so total latency is that of
/// the slowest call. One target failing never affects the others.
pub async fn fetch_all<T, F, Fut>(targets: &[Target], fetch: F) -> MultiFetch<T>
where
    F: Fn(Target) -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let calls = targets.iter().map(|target| {
        let call = fetch(target.clone());
        async move { (target.clone(), call.await) }
    });

    let mut merged = MultiFetch::default();
    for (target, result) in join_all(calls).await {
        match result {
            Ok(value) => {
                debug!(domain = %target, "Fetch succeeded");
                merged.succeeded.insert(target, value);
            }
            Err(e) => {
                warn!(domain = %target, error = %e, "Fetch failed");
                merged.failed.insert(target, e);
            }
        }
    }
    merged
}

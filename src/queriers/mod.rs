pub mod application;
pub mod supplier;
pub mod wallet;

use prometheus::core::Collector;
use std::future::Future;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::types::QueryInfo;

pub use application::ApplicationQuerier;
pub use supplier::SupplierQuerier;
pub use wallet::WalletQuerier;

/// Produces one family group of gauges per collection cycle.
///
/// Failures of individual queries never fail the cycle; they show up as
/// `QueryInfo { success: false }` entries and log lines.
pub trait Querier: Send + Sync {
    fn get_metrics(
        &self,
        cancel: CancellationToken,
    ) -> impl Future<Output = (Vec<Box<dyn Collector>>, Vec<QueryInfo>)> + Send;
}

/// Run one LCD query, turning cancellation into a failed query instead of a hang.
/// `url` is the address the query would have hit, reported when it never ran.
pub(crate) async fn cancellable<T, F>(
    cancel: &CancellationToken,
    chain: &str,
    url: String,
    query: F,
) -> (QueryInfo, eyre::Result<T>)
where
    F: Future<Output = (QueryInfo, eyre::Result<T>)>,
{
    let started = Instant::now();
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            let info = QueryInfo {
                chain: chain.to_string(),
                url,
                success: false,
                duration: started.elapsed(),
            };
            (info, Err(eyre::eyre!("Query cancelled")))
        }
        result = query => result,
    }
}

/// Wait for every task of a phase. A panicked task counts as a failed query.
pub(crate) async fn join_all(phase: &'static str, handles: Vec<JoinHandle<()>>) {
    for result in futures::future::join_all(handles).await {
        if let Err(e) = result {
            tracing::error!(phase, error = %e, "Query task failed");
        }
    }
}

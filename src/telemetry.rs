use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::metrics::GaugeSet;
use crate::types::QueryInfo;

/// Shared record of every remote query issued during one collection cycle.
#[derive(Clone, Default)]
pub struct QueryLog {
    inner: Arc<Mutex<Vec<QueryInfo>>>,
}

impl QueryLog {
    pub async fn push(&self, info: QueryInfo) {
        self.inner.lock().await.push(info);
    }

    /// Drain everything recorded so far. Call after the last phase has finished.
    pub async fn take(&self) -> Vec<QueryInfo> {
        std::mem::take(&mut *self.inner.lock().await)
    }
}

/// Build the diagnostic gauges describing the queries of one cycle.
pub fn query_gauges(infos: &[QueryInfo]) -> Vec<GaugeSet> {
    let mut success = GaugeSet::new(
        "cosmos_wallets_exporter_query_success",
        "Whether the last LCD query for this URL succeeded (1) or failed (0)",
        &["chain", "url"],
    );
    let mut duration = GaugeSet::new(
        "cosmos_wallets_exporter_query_duration_seconds",
        "Duration of the last LCD query for this URL",
        &["chain", "url"],
    );
    let mut total = GaugeSet::new(
        "cosmos_wallets_exporter_queries_total",
        "LCD queries issued during this scrape",
        &["chain"],
    );
    let mut failed = GaugeSet::new(
        "cosmos_wallets_exporter_queries_failed_total",
        "LCD queries that failed during this scrape",
        &["chain"],
    );

    let mut per_chain: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for info in infos {
        let labels = vec![info.chain.clone(), info.url.clone()];
        success.set(labels.clone(), if info.success { 1.0 } else { 0.0 });
        duration.set(labels, info.duration.as_secs_f64());

        let counts = per_chain.entry(info.chain.as_str()).or_default();
        counts.0 += 1;
        if !info.success {
            counts.1 += 1;
        }
    }

    for (chain, (queries, failures)) in per_chain {
        total.set(vec![chain.to_string()], queries as f64);
        failed.set(vec![chain.to_string()], failures as f64);
    }

    vec![success, duration, total, failed]
}

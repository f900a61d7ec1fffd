//! Supplier stake and rev-share balance metrics.
//!
//! Collection runs as three barrier-separated phases:
//! 1. [`discovery::discover`] queries every supplier concurrently and builds
//!    the payout address → associations map.
//! 2. [`balances::fetch_balances`] queries each unique payout address once.
//! 3. [`aggregate::aggregate`] re-joins balances with the associations.

pub mod aggregate;
pub mod balances;
pub mod discovery;

use prometheus::core::Collector;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::ChainConfig;
use crate::lcd::LcdQuery;
use crate::metrics;
use crate::telemetry::QueryLog;
use crate::types::QueryInfo;

use super::Querier;

pub struct SupplierQuerier<L> {
    lcd: Arc<L>,
    chains: Vec<Arc<ChainConfig>>,
}

impl<L: LcdQuery> SupplierQuerier<L> {
    pub fn new(lcd: Arc<L>, chains: Vec<Arc<ChainConfig>>) -> Self {
        Self { lcd, chains }
    }

    async fn collect(&self, cancel: CancellationToken) -> (Vec<Box<dyn Collector>>, Vec<QueryInfo>) {
        let queries = QueryLog::default();

        let discovery = discovery::discover(&self.lcd, &self.chains, &queries, &cancel).await;
        tracing::debug!(
            stakes = discovery.stake.len(),
            rev_share_addresses = discovery.rev_shares.len(),
            "Supplier discovery complete"
        );

        let balances = balances::fetch_balances(
            &self.lcd,
            &self.chains,
            &discovery.rev_shares,
            &queries,
            &cancel,
        )
        .await;

        let gauges = aggregate::aggregate(&self.chains, &discovery.rev_shares, &balances);
        tracing::debug!(
            detailed = gauges.detailed.len(),
            aggregate = gauges.aggregate.len(),
            "Rev-share aggregation complete"
        );

        let collectors =
            metrics::into_collectors(vec![discovery.stake, gauges.detailed, gauges.aggregate]);
        (collectors, queries.take().await)
    }
}

impl<L: LcdQuery> Querier for SupplierQuerier<L> {
    async fn get_metrics(&self, cancel: CancellationToken) -> (Vec<Box<dyn Collector>>, Vec<QueryInfo>) {
        if self.chains.iter().all(|chain| chain.suppliers.is_empty()) {
            return (Vec::new(), Vec::new());
        }

        self.collect(cancel)
            .instrument(tracing::info_span!("querier", kind = "supplier"))
            .await
    }
}

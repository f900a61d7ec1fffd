use prometheus::core::Collector;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::ChainConfig;
use crate::denom;
use crate::lcd::{balances_url, LcdQuery};
use crate::metrics::{self, GaugeSet, STAKE_LABELS};
use crate::telemetry::QueryLog;
use crate::types::QueryInfo;

use super::{cancellable, join_all, Querier};

/// Bank balances of the configured wallets, one query per wallet.
pub struct WalletQuerier<L> {
    lcd: Arc<L>,
    chains: Vec<Arc<ChainConfig>>,
}

impl<L: LcdQuery> WalletQuerier<L> {
    pub fn new(lcd: Arc<L>, chains: Vec<Arc<ChainConfig>>) -> Self {
        Self { lcd, chains }
    }

    async fn collect(&self, cancel: CancellationToken) -> (Vec<Box<dyn Collector>>, Vec<QueryInfo>) {
        let gauge = Arc::new(Mutex::new(GaugeSet::new(
            "cosmos_wallets_exporter_balance",
            "A wallet balance (in tokens)",
            STAKE_LABELS,
        )));
        let queries = QueryLog::default();
        let mut handles = Vec::new();

        for chain in &self.chains {
            for wallet in &chain.wallets {
                let lcd = self.lcd.clone();
                let chain = chain.clone();
                let wallet = wallet.clone();
                let gauge = gauge.clone();
                let queries = queries.clone();
                let cancel = cancel.clone();
                let span = tracing::info_span!("wallet_balance", chain = %chain.name, wallet = %wallet.address);

                handles.push(tokio::spawn(
                    async move {
                        let (info, result) = cancellable(
                            &cancel,
                            &chain.name,
                            balances_url(&chain, &wallet.address),
                            lcd.balances(&chain, &wallet.address),
                        )
                        .await;
                        queries.push(info).await;

                        let balances = match result {
                            Ok(balances) => balances,
                            Err(e) => {
                                tracing::error!(
                                    chain = %chain.name,
                                    wallet = %wallet.address,
                                    error = %e,
                                    "Error querying wallet balance"
                                );
                                return;
                            }
                        };

                        let mut gauge = gauge.lock().await;
                        for balance in &balances {
                            match denom::gauge_sample(&chain, &balance.denom, &balance.amount) {
                                Ok((display, value)) => gauge.set(
                                    vec![
                                        chain.name.clone(),
                                        wallet.address.clone(),
                                        wallet.name.clone(),
                                        wallet.group.clone(),
                                        display,
                                    ],
                                    value,
                                ),
                                Err(e) => {
                                    tracing::error!(
                                        chain = %chain.name,
                                        wallet = %wallet.address,
                                        denom = %balance.denom,
                                        amount = %balance.amount,
                                        error = %e,
                                        "Error parsing balance amount"
                                    );
                                }
                            }
                        }
                    }
                    .instrument(span),
                ));
            }
        }

        join_all("wallet_balance", handles).await;

        let gauge = gauge.lock().await.clone();
        (metrics::into_collectors(vec![gauge]), queries.take().await)
    }
}

impl<L: LcdQuery> Querier for WalletQuerier<L> {
    async fn get_metrics(&self, cancel: CancellationToken) -> (Vec<Box<dyn Collector>>, Vec<QueryInfo>) {
        if self.chains.iter().all(|chain| chain.wallets.is_empty()) {
            return (Vec::new(), Vec::new());
        }

        self.collect(cancel)
            .instrument(tracing::info_span!("querier", kind = "wallet"))
            .await
    }
}

use prometheus::core::Collector;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::ChainConfig;
use crate::denom;
use crate::lcd::{application_url, LcdQuery};
use crate::metrics::{self, GaugeSet, STAKE_LABELS};
use crate::telemetry::QueryLog;
use crate::types::QueryInfo;

use super::{cancellable, join_all, Querier};

pub struct ApplicationQuerier<L> {
    lcd: Arc<L>,
    chains: Vec<Arc<ChainConfig>>,
}

impl<L: LcdQuery> ApplicationQuerier<L> {
    pub fn new(lcd: Arc<L>, chains: Vec<Arc<ChainConfig>>) -> Self {
        Self { lcd, chains }
    }

    async fn collect(&self, cancel: CancellationToken) -> (Vec<Box<dyn Collector>>, Vec<QueryInfo>) {
        let gauge = Arc::new(Mutex::new(GaugeSet::new(
            "cosmos_wallets_exporter_application_stake",
            "A Pocket Network application stake (in tokens)",
            STAKE_LABELS,
        )));
        let queries = QueryLog::default();
        let mut handles = Vec::new();

        for chain in &self.chains {
            for application in &chain.applications {
                let lcd = self.lcd.clone();
                let chain = chain.clone();
                let application = application.clone();
                let gauge = gauge.clone();
                let queries = queries.clone();
                let cancel = cancel.clone();
                let span = tracing::info_span!(
                    "application_stake",
                    chain = %chain.name,
                    application = %application.address
                );

                handles.push(tokio::spawn(
                    async move {
                        let (info, result) = cancellable(
                            &cancel,
                            &chain.name,
                            application_url(&chain, &application.address),
                            lcd.application(&chain, &application.address),
                        )
                        .await;
                        queries.push(info).await;

                        let stake = match result {
                            Ok(data) => data.stake,
                            Err(e) => {
                                tracing::error!(
                                    chain = %chain.name,
                                    application = %application.address,
                                    error = %e,
                                    "Error querying application stake"
                                );
                                return;
                            }
                        };

                        let (display, value) =
                            match denom::gauge_sample(&chain, &stake.denom, &stake.amount) {
                                Ok(sample) => sample,
                                Err(e) => {
                                    tracing::error!(
                                        chain = %chain.name,
                                        application = %application.address,
                                        amount = %stake.amount,
                                        error = %e,
                                        "Error parsing stake amount"
                                    );
                                    return;
                                }
                            };

                        gauge.lock().await.set(
                            vec![
                                chain.name.clone(),
                                application.address.clone(),
                                application.name.clone(),
                                application.group.clone(),
                                display,
                            ],
                            value,
                        );
                    }
                    .instrument(span),
                ));
            }
        }

        join_all("application_stake", handles).await;

        let gauge = gauge.lock().await.clone();
        (metrics::into_collectors(vec![gauge]), queries.take().await)
    }
}

impl<L: LcdQuery> Querier for ApplicationQuerier<L> {
    async fn get_metrics(&self, cancel: CancellationToken) -> (Vec<Box<dyn Collector>>, Vec<QueryInfo>) {
        if self.chains.iter().all(|chain| chain.applications.is_empty()) {
            return (Vec::new(), Vec::new());
        }

        self.collect(cancel)
            .instrument(tracing::info_span!("querier", kind = "application"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Application, DenomInfo};
    use crate::lcd::mock::MockLcd;
    use crate::types::Stake;

    fn chain(applications: &[&str]) -> Arc<ChainConfig> {
        Arc::new(ChainConfig {
            name: "pocket".to_string(),
            lcd_endpoint: "http://localhost:1317".to_string(),
            denoms: vec![DenomInfo {
                denom: "upokt".to_string(),
                display_denom: Some("pokt".to_string()),
                denom_exponent: 6,
            }],
            wallets: vec![],
            applications: applications
                .iter()
                .map(|address| Application {
                    address: address.to_string(),
                    name: "app".to_string(),
                    group: "gateway".to_string(),
                })
                .collect(),
            suppliers: vec![],
            rev_share_detailed_metrics: None,
        })
    }

    fn stake(amount: &str) -> Stake {
        Stake {
            amount: amount.to_string(),
            denom: "upokt".to_string(),
        }
    }

    #[tokio::test]
    async fn test_application_stake_skips_unparseable_amount() {
        let mut lcd = MockLcd::default();
        lcd.applications.insert("A1".to_string(), stake("7000000"));
        lcd.applications.insert("A2".to_string(), stake("seven"));

        let querier = ApplicationQuerier::new(Arc::new(lcd), vec![chain(&["A1", "A2"])]);
        let (collectors, infos) = querier.get_metrics(CancellationToken::new()).await;

        assert_eq!(infos.len(), 2);
        assert!(infos.iter().all(|info| info.success));

        let families: Vec<_> = collectors.iter().flat_map(|c| c.collect()).collect();
        assert_eq!(families.len(), 1);
        assert_eq!(families[0].get_metric().len(), 1);
        assert_eq!(families[0].get_metric()[0].get_gauge().get_value(), 7.0);
    }

    #[tokio::test]
    async fn test_no_applications_configured() {
        let lcd = Arc::new(MockLcd::default());
        let querier = ApplicationQuerier::new(lcd.clone(), vec![chain(&[])]);
        let (collectors, infos) = querier.get_metrics(CancellationToken::new()).await;

        assert!(collectors.is_empty());
        assert!(infos.is_empty());
        assert_eq!(lcd.total_calls(), 0);
    }
}

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::{ChainConfig, Supplier};
use crate::denom;
use crate::lcd::{supplier_url, LcdQuery};
use crate::metrics::{GaugeSet, STAKE_LABELS};
use crate::queriers::{cancellable, join_all};
use crate::telemetry::QueryLog;
use crate::types::{RevShareMetadata, SupplierStakeRecord};

/// Payout address → every supplier service that shares revenue with it.
pub type RevShareMap = HashMap<String, Vec<RevShareMetadata>>;

/// Phase-one state: supplier stakes plus the discovered rev-share payout addresses.
#[derive(Debug)]
pub struct RevShareDiscovery {
    pub stake: GaugeSet,
    pub rev_shares: RevShareMap,
}

impl Default for RevShareDiscovery {
    fn default() -> Self {
        Self {
            stake: GaugeSet::new(
                "cosmos_wallets_exporter_supplier_stake",
                "A Pocket Network supplier stake (in tokens)",
                STAKE_LABELS,
            ),
            rev_shares: HashMap::new(),
        }
    }
}

impl RevShareDiscovery {
    /// Fold one supplier's on-chain state into the shared stake gauge and address map.
    ///
    /// Every rev-share entry adds an association, even when the address was
    /// already seen for another service or supplier.
    pub fn fold(&mut self, chain: &ChainConfig, supplier: &Supplier, record: &SupplierStakeRecord) {
        match denom::gauge_sample(chain, &record.stake.denom, &record.stake.amount) {
            Ok((display, value)) => {
                self.stake.set(
                    vec![
                        chain.name.clone(),
                        supplier.address.clone(),
                        supplier.name.clone(),
                        supplier.group.clone(),
                        display,
                    ],
                    value,
                );
            }
            Err(e) => {
                tracing::error!(
                    chain = %chain.name,
                    supplier = %supplier.address,
                    amount = %record.stake.amount,
                    error = %e,
                    "Error parsing stake amount"
                );
            }
        }

        let operator = if record.operator_address.is_empty() {
            supplier.address.clone()
        } else {
            record.operator_address.clone()
        };
        let detailed = chain.rev_share_detailed_metrics_enabled();

        for service in &record.services {
            for share in &service.rev_share {
                self.rev_shares
                    .entry(share.address.clone())
                    .or_default()
                    .push(RevShareMetadata {
                        chain: chain.name.clone(),
                        supplier_operator_addr: operator.clone(),
                        supplier_owner_addr: record.owner_address.clone(),
                        supplier_name: supplier.name.clone(),
                        service_id: service.service_id.clone(),
                        percentage: share.rev_share_percentage.clone(),
                        detailed_metrics_enabled: detailed,
                    });
            }
        }
    }
}

/// Phase one: query every configured supplier concurrently and fold the results.
/// Returns once every supplier task has finished.
pub async fn discover<L: LcdQuery>(
    lcd: &Arc<L>,
    chains: &[Arc<ChainConfig>],
    queries: &QueryLog,
    cancel: &CancellationToken,
) -> RevShareDiscovery {
    let discovery = Arc::new(Mutex::new(RevShareDiscovery::default()));
    let mut handles = Vec::new();

    for chain in chains {
        for supplier in &chain.suppliers {
            let lcd = lcd.clone();
            let chain = chain.clone();
            let supplier = supplier.clone();
            let discovery = discovery.clone();
            let queries = queries.clone();
            let cancel = cancel.clone();
            let span = tracing::info_span!(
                "supplier_stake",
                chain = %chain.name,
                supplier = %supplier.address
            );

            handles.push(tokio::spawn(
                async move {
                    let (info, result) = cancellable(
                        &cancel,
                        &chain.name,
                        supplier_url(&chain, &supplier.address),
                        lcd.supplier(&chain, &supplier.address),
                    )
                    .await;
                    queries.push(info).await;

                    match result {
                        Ok(record) => discovery.lock().await.fold(&chain, &supplier, &record),
                        Err(e) => {
                            tracing::error!(
                                chain = %chain.name,
                                supplier = %supplier.address,
                                error = %e,
                                "Error querying supplier stake"
                            );
                        }
                    }
                }
                .instrument(span),
            ));
        }
    }

    join_all("supplier_stake", handles).await;

    let mut guard = discovery.lock().await;
    std::mem::take(&mut *guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DenomInfo;
    use crate::types::{RevShare, Service, Stake};

    fn pocket(detailed: Option<bool>) -> ChainConfig {
        ChainConfig {
            name: "pocket".to_string(),
            lcd_endpoint: "http://localhost:1317".to_string(),
            denoms: vec![DenomInfo {
                denom: "upokt".to_string(),
                display_denom: Some("pokt".to_string()),
                denom_exponent: 6,
            }],
            wallets: vec![],
            applications: vec![],
            suppliers: vec![],
            rev_share_detailed_metrics: detailed,
        }
    }

    fn supplier(address: &str) -> Supplier {
        Supplier {
            address: address.to_string(),
            name: format!("{}-name", address),
            group: "ops".to_string(),
        }
    }

    fn record(amount: &str, services: Vec<(&str, Vec<(&str, &str)>)>) -> SupplierStakeRecord {
        SupplierStakeRecord {
            operator_address: "op".to_string(),
            owner_address: "owner".to_string(),
            stake: Stake {
                amount: amount.to_string(),
                denom: "upokt".to_string(),
            },
            services: services
                .into_iter()
                .map(|(id, shares)| Service {
                    service_id: id.to_string(),
                    rev_share: shares
                        .into_iter()
                        .map(|(address, pct)| RevShare {
                            address: address.to_string(),
                            rev_share_percentage: pct.to_string(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_fold_normalizes_stake() {
        let chain = pocket(None);
        let s1 = supplier("S1");
        let mut discovery = RevShareDiscovery::default();
        discovery.fold(&chain, &s1, &record("1000000", vec![]));

        assert_eq!(discovery.stake.len(), 1);
        assert_eq!(
            discovery.stake.get(&["pocket", "S1", "S1-name", "ops", "pokt"]),
            Some(1.0)
        );
    }

    #[test]
    fn test_fold_keeps_every_association() {
        let chain = pocket(Some(false));
        let mut discovery = RevShareDiscovery::default();
        discovery.fold(
            &chain,
            &supplier("S1"),
            &record("1", vec![("anvil", vec![("A", "50")]), ("eth", vec![("A", "20"), ("B", "80")])]),
        );
        discovery.fold(&chain, &supplier("S2"), &record("1", vec![("anvil", vec![("A", "100")])]));

        assert_eq!(discovery.rev_shares.len(), 2);
        let a = &discovery.rev_shares["A"];
        assert_eq!(a.len(), 3);
        assert!(a.iter().all(|m| !m.detailed_metrics_enabled));
        assert!(a.iter().any(|m| m.supplier_name == "S2-name" && m.percentage == "100"));
        assert_eq!(discovery.rev_shares["B"][0].service_id, "eth");
    }

    #[test]
    fn test_fold_bad_stake_still_discovers_payouts() {
        let chain = pocket(None);
        let mut discovery = RevShareDiscovery::default();
        discovery.fold(&chain, &supplier("S1"), &record("garbage", vec![("anvil", vec![("A", "100")])]));

        assert!(discovery.stake.is_empty());
        assert_eq!(discovery.rev_shares["A"].len(), 1);
    }
}

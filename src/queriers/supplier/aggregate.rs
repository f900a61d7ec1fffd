use bigdecimal::BigDecimal;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::ChainConfig;
use crate::denom;
use crate::metrics::GaugeSet;
use crate::types::RevShareAggregateKey;

use super::balances::BalanceMap;
use super::discovery::RevShareMap;

const DETAILED_LABELS: &[&str] = &[
    "chain",
    "supplier_operator_address",
    "supplier_owner_address",
    "supplier_name",
    "rev_share_address",
    "service_id",
    "rev_share_percentage",
    "denom",
];

const AGGREGATE_LABELS: &[&str] = &[
    "chain",
    "supplier_operator_address",
    "supplier_owner_address",
    "supplier_name",
    "rev_share_address",
    "denom",
];

#[derive(Debug)]
pub struct RevShareGauges {
    pub detailed: GaugeSet,
    pub aggregate: GaugeSet,
}

/// Phase three: spread each address balance back over every association that
/// references it.
///
/// Detailed associations get one sample per service and denom. The others are
/// summed per [`RevShareAggregateKey`] and denom, in display units, before a
/// single sample is emitted.
pub fn aggregate(
    chains: &[Arc<ChainConfig>],
    rev_shares: &RevShareMap,
    balances: &BalanceMap,
) -> RevShareGauges {
    let mut detailed = GaugeSet::new(
        "cosmos_wallets_exporter_supplier_rev_share_balance",
        "Balance of a supplier rev-share address, per service (in tokens)",
        DETAILED_LABELS,
    );
    let mut aggregate = GaugeSet::new(
        "cosmos_wallets_exporter_supplier_rev_share_balance_total",
        "Balance of a supplier rev-share address, across services (in tokens)",
        AGGREGATE_LABELS,
    );
    let mut sums: BTreeMap<(RevShareAggregateKey, String), BigDecimal> = BTreeMap::new();

    for (address, associations) in rev_shares {
        // Failed or skipped balance queries leave no entry.
        let Some(address_balances) = balances.get(address) else {
            continue;
        };

        for meta in associations {
            let Some(chain) = chains.iter().find(|chain| chain.name == meta.chain) else {
                continue;
            };

            for balance in address_balances {
                let raw = match denom::parse_amount(&balance.amount) {
                    Ok(raw) => raw,
                    Err(e) => {
                        tracing::error!(
                            chain = %chain.name,
                            address = %address,
                            denom = %balance.denom,
                            error = %e,
                            "Error parsing rev-share balance amount"
                        );
                        continue;
                    }
                };
                let (display, amount) = denom::normalize(chain, &balance.denom, &raw);

                if meta.detailed_metrics_enabled {
                    let Some(value) = denom::to_gauge_value(&amount) else {
                        tracing::error!(
                            chain = %chain.name,
                            address = %address,
                            amount = %balance.amount,
                            "Rev-share balance does not fit a gauge value"
                        );
                        continue;
                    };
                    detailed.set(
                        vec![
                            meta.chain.clone(),
                            meta.supplier_operator_addr.clone(),
                            meta.supplier_owner_addr.clone(),
                            meta.supplier_name.clone(),
                            address.clone(),
                            meta.service_id.clone(),
                            meta.percentage.clone(),
                            display,
                        ],
                        value,
                    );
                } else {
                    let key = (RevShareAggregateKey::new(address, meta), display);
                    *sums.entry(key).or_default() += amount;
                }
            }
        }
    }

    for ((key, display), total) in sums {
        let Some(value) = denom::to_gauge_value(&total) else {
            tracing::error!(
                chain = %key.chain,
                address = %key.payout_address,
                total = %total,
                "Rev-share total does not fit a gauge value"
            );
            continue;
        };
        aggregate.set(
            vec![
                key.chain,
                key.supplier_operator_addr,
                key.supplier_owner_addr,
                key.supplier_name,
                key.payout_address,
                display,
            ],
            value,
        );
    }

    RevShareGauges { detailed, aggregate }
}

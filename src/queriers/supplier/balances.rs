use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::ChainConfig;
use crate::lcd::{balances_url, LcdQuery};
use crate::queriers::{cancellable, join_all};
use crate::telemetry::QueryLog;
use crate::types::Balance;

use super::discovery::RevShareMap;

pub type BalanceMap = HashMap<String, Vec<Balance>>;

/// Chain to query an address against: the chain of its first association.
///
/// Addresses shared by several chains are only queried on one of them.
fn resolve_chain<'a>(
    chains: &'a [Arc<ChainConfig>],
    rev_shares: &RevShareMap,
    address: &str,
) -> Option<&'a Arc<ChainConfig>> {
    let chain_name = &rev_shares.get(address)?.first()?.chain;
    chains.iter().find(|chain| &chain.name == chain_name)
}

/// Phase two: one balance query per unique payout address, however many
/// suppliers reference it. Returns once every address task has finished.
pub async fn fetch_balances<L: LcdQuery>(
    lcd: &Arc<L>,
    chains: &[Arc<ChainConfig>],
    rev_shares: &RevShareMap,
    queries: &QueryLog,
    cancel: &CancellationToken,
) -> BalanceMap {
    let balances = Arc::new(Mutex::new(BalanceMap::new()));
    let mut handles = Vec::with_capacity(rev_shares.len());

    for address in rev_shares.keys() {
        let Some(chain) = resolve_chain(chains, rev_shares, address) else {
            tracing::debug!(address = %address, "No chain found for rev-share address, skipping");
            continue;
        };

        let lcd = lcd.clone();
        let chain = chain.clone();
        let address = address.clone();
        let balances = balances.clone();
        let queries = queries.clone();
        let cancel = cancel.clone();
        let span = tracing::info_span!("rev_share_balance", chain = %chain.name, address = %address);

        handles.push(tokio::spawn(
            async move {
                let url = balances_url(&chain, &address);
                let (info, result) =
                    cancellable(&cancel, &chain.name, url, lcd.balances(&chain, &address)).await;
                queries.push(info).await;

                match result {
                    Ok(found) => {
                        balances.lock().await.insert(address, found);
                    }
                    Err(e) => {
                        tracing::error!(
                            chain = %chain.name,
                            address = %address,
                            error = %e,
                            "Error querying rev-share address balance"
                        );
                    }
                }
            }
            .instrument(span),
        ));
    }

    join_all("rev_share_balance", handles).await;

    let mut guard = balances.lock().await;
    std::mem::take(&mut *guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RevShareMetadata;

    fn chain(name: &str) -> Arc<ChainConfig> {
        Arc::new(ChainConfig {
            name: name.to_string(),
            lcd_endpoint: "http://localhost:1317".to_string(),
            denoms: vec![],
            wallets: vec![],
            applications: vec![],
            suppliers: vec![],
            rev_share_detailed_metrics: None,
        })
    }

    fn meta(chain: &str) -> RevShareMetadata {
        RevShareMetadata {
            chain: chain.to_string(),
            supplier_operator_addr: "op".to_string(),
            supplier_owner_addr: "owner".to_string(),
            supplier_name: "s".to_string(),
            service_id: "anvil".to_string(),
            percentage: "100".to_string(),
            detailed_metrics_enabled: true,
        }
    }

    #[test]
    fn test_resolve_chain_uses_first_association() {
        let chains = vec![chain("pocket"), chain("pocket-beta")];
        let mut rev_shares = RevShareMap::new();
        rev_shares.insert("A".to_string(), vec![meta("pocket-beta"), meta("pocket")]);
        rev_shares.insert("B".to_string(), vec![meta("unknown")]);

        assert_eq!(resolve_chain(&chains, &rev_shares, "A").unwrap().name, "pocket-beta");
        assert!(resolve_chain(&chains, &rev_shares, "B").is_none());
        assert!(resolve_chain(&chains, &rev_shares, "C").is_none());
    }
}

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Router};
use prometheus::{Encoder, Registry, TextEncoder};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::config::ChainConfig;
use crate::lcd::LcdQuery;
use crate::metrics;
use crate::queriers::{ApplicationQuerier, Querier, SupplierQuerier, WalletQuerier};
use crate::telemetry;

pub struct AppState<L> {
    pub wallets: WalletQuerier<L>,
    pub applications: ApplicationQuerier<L>,
    pub suppliers: SupplierQuerier<L>,
    pub shutdown: CancellationToken,
}

impl<L: LcdQuery> AppState<L> {
    pub fn new(lcd: Arc<L>, chains: Vec<ChainConfig>, shutdown: CancellationToken) -> Self {
        let chains: Vec<Arc<ChainConfig>> = chains.into_iter().map(Arc::new).collect();
        Self {
            wallets: WalletQuerier::new(lcd.clone(), chains.clone()),
            applications: ApplicationQuerier::new(lcd.clone(), chains.clone()),
            suppliers: SupplierQuerier::new(lcd, chains),
            shutdown,
        }
    }
}

/// Run one collection cycle across all queriers and render it in the
/// Prometheus text format.
pub async fn gather<L: LcdQuery>(state: &AppState<L>, cancel: CancellationToken) -> eyre::Result<String> {
    let started = Instant::now();

    let ((wallets, wallet_queries), (applications, application_queries), (suppliers, supplier_queries)) = tokio::join!(
        state.wallets.get_metrics(cancel.clone()),
        state.applications.get_metrics(cancel.clone()),
        state.suppliers.get_metrics(cancel.clone()),
    );

    let mut queries = wallet_queries;
    queries.extend(application_queries);
    queries.extend(supplier_queries);

    for info in &queries {
        tracing::debug!(
            chain = %info.chain,
            url = %info.url,
            success = info.success,
            duration_ms = info.duration.as_millis() as u64,
            "Query"
        );
    }
    tracing::info!(
        queries = queries.len(),
        failed = queries.iter().filter(|info| !info.success).count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Collection cycle finished"
    );

    let registry = Registry::new();
    let collectors = wallets
        .into_iter()
        .chain(applications)
        .chain(suppliers)
        .chain(metrics::into_collectors(telemetry::query_gauges(&queries)));
    for collector in collectors {
        registry
            .register(collector)
            .map_err(|e| eyre::eyre!("Failed to register collector: {}", e))?;
    }

    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&registry.gather(), &mut buffer)
        .map_err(|e| eyre::eyre!("Failed to encode metrics: {}", e))?;
    Ok(String::from_utf8(buffer)?)
}

async fn metrics_handler<L: LcdQuery>(State(state): State<Arc<AppState<L>>>) -> Response {
    // Dropping the request (client gone, shutdown) cancels its in-flight queries.
    let cancel = state.shutdown.child_token();
    let _guard = cancel.clone().drop_guard();

    match gather(&state, cancel).await {
        Ok(body) => (
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to gather metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

pub fn router<L: LcdQuery>(state: Arc<AppState<L>>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler::<L>))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn serve<L: LcdQuery>(state: Arc<AppState<L>>, addr: &str) -> eyre::Result<()> {
    let shutdown = state.shutdown.clone();
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Metrics server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::{Supplier, Wallet};
    use crate::lcd::mock::MockLcd;
    use crate::types::{Balance, RevShare, Service, Stake, SupplierStakeRecord};

    fn chain() -> ChainConfig {
        ChainConfig {
            name: "pocket".to_string(),
            lcd_endpoint: "http://localhost:1317".to_string(),
            denoms: vec![],
            wallets: vec![Wallet {
                address: "W1".to_string(),
                name: "treasury".to_string(),
                group: "ops".to_string(),
            }],
            applications: vec![],
            suppliers: vec![Supplier {
                address: "S1".to_string(),
                name: "main".to_string(),
                group: "ops".to_string(),
            }],
            rev_share_detailed_metrics: Some(false),
        }
    }

    #[tokio::test]
    async fn test_gather_renders_all_families() {
        let mut lcd = MockLcd::default();
        lcd.balances.insert(
            "W1".to_string(),
            vec![Balance {
                denom: "upokt".to_string(),
                amount: "10".to_string(),
            }],
        );
        lcd.suppliers.insert(
            "S1".to_string(),
            SupplierStakeRecord {
                operator_address: "S1".to_string(),
                owner_address: "owner".to_string(),
                stake: Stake {
                    amount: "5".to_string(),
                    denom: "upokt".to_string(),
                },
                services: vec![Service {
                    service_id: "anvil".to_string(),
                    rev_share: vec![RevShare {
                        address: "W1".to_string(),
                        rev_share_percentage: "100".to_string(),
                    }],
                }],
            },
        );

        let state = AppState::new(Arc::new(lcd), vec![chain()], CancellationToken::new());
        let body = gather(&state, CancellationToken::new()).await.unwrap();

        assert!(body.contains("cosmos_wallets_exporter_balance{"));
        assert!(body.contains("cosmos_wallets_exporter_supplier_stake{"));
        assert!(body.contains("cosmos_wallets_exporter_supplier_rev_share_balance_total{"));
        assert!(!body.contains("cosmos_wallets_exporter_supplier_rev_share_balance{"));
        assert!(!body.contains("cosmos_wallets_exporter_application_stake"));
        assert!(body.contains("cosmos_wallets_exporter_queries_total{chain=\"pocket\"} 3"));
    }
}

use serde::Deserialize;
use std::time::Duration;

/// One remote call made during a collection cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryInfo {
    pub chain: String,
    pub url: String,
    pub success: bool,
    pub duration: Duration,
}

/// A bank balance as returned by the chain. The amount is parsed per entry
/// later, so one malformed denom doesn't take its siblings down with it.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Balance {
    pub denom: String,
    pub amount: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BalanceResponse {
    #[serde(default)]
    pub balances: Vec<Balance>,
}

/// Stake as returned by the chain; the amount stays a string until normalization.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Stake {
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub denom: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationData {
    pub address: String,
    #[serde(default)]
    pub delegatee_gateway_addresses: Vec<String>,
    #[serde(default)]
    pub stake: Stake,
    #[serde(default)]
    pub unstake_session_end_height: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationResponse {
    pub application: ApplicationData,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RevShare {
    pub address: String,
    pub rev_share_percentage: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Service {
    pub service_id: String,
    #[serde(default)]
    pub rev_share: Vec<RevShare>,
}

/// Supplier stake plus the services it advertises and who gets paid for them.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SupplierStakeRecord {
    #[serde(default)]
    pub operator_address: String,
    #[serde(default)]
    pub owner_address: String,
    #[serde(default)]
    pub stake: Stake,
    #[serde(default)]
    pub services: Vec<Service>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupplierResponse {
    pub supplier: SupplierStakeRecord,
}

/// Ties a payout address to one supplier service that shares revenue with it.
#[derive(Debug, Clone, PartialEq)]
pub struct RevShareMetadata {
    pub chain: String,
    pub supplier_operator_addr: String,
    pub supplier_owner_addr: String,
    pub supplier_name: String,
    pub service_id: String,
    pub percentage: String,
    pub detailed_metrics_enabled: bool,
}

/// Identity of one summed rev-share sample. Service IDs collapse into it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RevShareAggregateKey {
    pub chain: String,
    pub supplier_operator_addr: String,
    pub supplier_owner_addr: String,
    pub supplier_name: String,
    pub payout_address: String,
}

impl RevShareAggregateKey {
    pub fn new(payout_address: &str, meta: &RevShareMetadata) -> Self {
        Self {
            chain: meta.chain.clone(),
            supplier_operator_addr: meta.supplier_operator_addr.clone(),
            supplier_owner_addr: meta.supplier_owner_addr.clone(),
            supplier_name: meta.supplier_name.clone(),
            payout_address: payout_address.to_string(),
        }
    }
}

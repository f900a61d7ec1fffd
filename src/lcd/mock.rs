//! In-memory LCD used by the querier tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use crate::config::ChainConfig;
use crate::types::{ApplicationData, Balance, QueryInfo, Stake, SupplierStakeRecord};

use super::LcdQuery;

#[derive(Default)]
pub struct MockLcd {
    pub suppliers: HashMap<String, SupplierStakeRecord>,
    pub applications: HashMap<String, Stake>,
    pub balances: HashMap<String, Vec<Balance>>,
    pub failing: HashSet<String>,
    calls: Mutex<HashMap<String, usize>>,
}

impl MockLcd {
    /// Calls per `kind/address` key, e.g. `balances/A`.
    pub fn calls(&self, key: &str) -> usize {
        self.calls.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    pub fn balance_calls(&self, address: &str) -> usize {
        self.calls(&format!("balances/{}", address))
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    fn record<T: Clone>(
        &self,
        chain: &ChainConfig,
        key: String,
        url: String,
        address: &str,
        value: Option<&T>,
    ) -> (QueryInfo, eyre::Result<T>) {
        *self.calls.lock().unwrap().entry(key).or_default() += 1;

        let result = match value {
            Some(v) if !self.failing.contains(address) => Ok(v.clone()),
            _ => Err(eyre::eyre!("mock LCD has no answer for {}", address)),
        };
        let info = QueryInfo {
            chain: chain.name.clone(),
            url,
            success: result.is_ok(),
            duration: Duration::from_millis(1),
        };
        (info, result)
    }
}

impl LcdQuery for MockLcd {
    async fn supplier(
        &self,
        chain: &ChainConfig,
        address: &str,
    ) -> (QueryInfo, eyre::Result<SupplierStakeRecord>) {
        let key = format!("supplier/{}", address);
        let url = super::supplier_url(chain, address);
        self.record(chain, key, url, address, self.suppliers.get(address))
    }

    async fn application(
        &self,
        chain: &ChainConfig,
        address: &str,
    ) -> (QueryInfo, eyre::Result<ApplicationData>) {
        let key = format!("application/{}", address);
        let url = super::application_url(chain, address);
        let data = self.applications.get(address).map(|stake| ApplicationData {
            address: address.to_string(),
            delegatee_gateway_addresses: vec![],
            stake: stake.clone(),
            unstake_session_end_height: None,
        });
        self.record(chain, key, url, address, data.as_ref())
    }

    async fn balances(
        &self,
        chain: &ChainConfig,
        address: &str,
    ) -> (QueryInfo, eyre::Result<Vec<Balance>>) {
        let key = format!("balances/{}", address);
        let url = super::balances_url(chain, address);
        self.record(chain, key, url, address, self.balances.get(address))
    }
}

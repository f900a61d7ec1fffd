pub mod client;
#[cfg(test)]
pub mod mock;

use std::future::Future;

use crate::config::ChainConfig;
use crate::types::{ApplicationData, Balance, QueryInfo, SupplierStakeRecord};

pub use client::LcdClient;

pub fn supplier_url(chain: &ChainConfig, address: &str) -> String {
    endpoint_url(chain, &format!("/pokt-network/poktroll/supplier/supplier/{}", address))
}

pub fn application_url(chain: &ChainConfig, address: &str) -> String {
    endpoint_url(chain, &format!("/pokt-network/poktroll/application/application/{}", address))
}

pub fn balances_url(chain: &ChainConfig, address: &str) -> String {
    endpoint_url(chain, &format!("/cosmos/bank/v1beta1/balances/{}", address))
}

fn endpoint_url(chain: &ChainConfig, path: &str) -> String {
    format!("{}{}", chain.lcd_endpoint.trim_end_matches('/'), path)
}

/// A single query against one chain's LCD endpoint.
///
/// Every call reports a [`QueryInfo`], including failed ones, so callers can
/// record telemetry without caring whether the decode succeeded.
pub trait LcdQuery: Send + Sync + 'static {
    fn supplier(
        &self,
        chain: &ChainConfig,
        address: &str,
    ) -> impl Future<Output = (QueryInfo, eyre::Result<SupplierStakeRecord>)> + Send;

    fn application(
        &self,
        chain: &ChainConfig,
        address: &str,
    ) -> impl Future<Output = (QueryInfo, eyre::Result<ApplicationData>)> + Send;

    fn balances(
        &self,
        chain: &ChainConfig,
        address: &str,
    ) -> impl Future<Output = (QueryInfo, eyre::Result<Vec<Balance>>)> + Send;
}

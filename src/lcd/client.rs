use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};

use crate::config::ChainConfig;
use crate::types::{
    ApplicationData, ApplicationResponse, Balance, BalanceResponse, QueryInfo,
    SupplierResponse, SupplierStakeRecord,
};

use super::LcdQuery;

/// `reqwest`-backed LCD client shared by all queriers.
#[derive(Clone)]
pub struct LcdClient {
    http: reqwest::Client,
}

impl LcdClient {
    pub fn new(timeout: Duration) -> eyre::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| eyre::eyre!("Failed to build HTTP client: {}", e))?;
        Ok(Self { http })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        chain: &ChainConfig,
        url: String,
    ) -> (QueryInfo, eyre::Result<T>) {
        let started = Instant::now();
        let result = self.fetch::<T>(&url).await;

        tracing::debug!(
            chain = %chain.name,
            %url,
            success = result.is_ok(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "LCD query finished"
        );

        let info = QueryInfo {
            chain: chain.name.clone(),
            url,
            success: result.is_ok(),
            duration: started.elapsed(),
        };
        (info, result)
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> eyre::Result<T> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| eyre::eyre!("Request to {} failed: {}", url, e))?
            .error_for_status()
            .map_err(|e| eyre::eyre!("LCD returned an error: {}", e))?;

        response
            .json::<T>()
            .await
            .map_err(|e| eyre::eyre!("Failed to decode response from {}: {}", url, e))
    }
}

impl LcdQuery for LcdClient {
    async fn supplier(
        &self,
        chain: &ChainConfig,
        address: &str,
    ) -> (QueryInfo, eyre::Result<SupplierStakeRecord>) {
        let url = super::supplier_url(chain, address);
        let (info, result) = self.get::<SupplierResponse>(chain, url).await;
        (info, result.map(|r| r.supplier))
    }

    async fn application(
        &self,
        chain: &ChainConfig,
        address: &str,
    ) -> (QueryInfo, eyre::Result<ApplicationData>) {
        let url = super::application_url(chain, address);
        let (info, result) = self.get::<ApplicationResponse>(chain, url).await;
        (info, result.map(|r| r.application))
    }

    async fn balances(
        &self,
        chain: &ChainConfig,
        address: &str,
    ) -> (QueryInfo, eyre::Result<Vec<Balance>>) {
        let url = super::balances_url(chain, address);
        let (info, result) = self.get::<BalanceResponse>(chain, url).await;
        (info, result.map(|r| r.balances))
    }
}

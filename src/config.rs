use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub log: LogConfig,
    pub chains: Vec<ChainConfig>,
}

fn default_listen_address() -> String {
    "0.0.0.0:9550".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct ChainConfig {
    pub name: String,
    pub lcd_endpoint: String,
    #[serde(default)]
    pub denoms: Vec<DenomInfo>,
    #[serde(default)]
    pub wallets: Vec<Wallet>,
    #[serde(default)]
    pub applications: Vec<Application>,
    #[serde(default)]
    pub suppliers: Vec<Supplier>,
    pub rev_share_detailed_metrics: Option<bool>,
}

/// Maps a raw on-chain denom to its display name and power-of-ten exponent.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct DenomInfo {
    pub denom: String,
    pub display_denom: Option<String>,
    #[serde(default)]
    pub denom_exponent: u32,
}

impl DenomInfo {
    pub fn display_name(&self) -> &str {
        match &self.display_denom {
            Some(display) if !display.is_empty() => display,
            _ => &self.denom,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Wallet {
    pub address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub group: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Application {
    pub address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub group: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Supplier {
    pub address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub group: String,
}

impl ChainConfig {
    pub fn find_denom_by_name(&self, denom: &str) -> Option<&DenomInfo> {
        self.denoms.iter().find(|info| info.denom == denom)
    }

    /// Chains without an explicit setting keep per-service rev-share series.
    pub fn rev_share_detailed_metrics_enabled(&self) -> bool {
        self.rev_share_detailed_metrics.unwrap_or(true)
    }

    fn validate(&self) -> eyre::Result<()> {
        if self.name.is_empty() {
            return Err(eyre::eyre!("Empty chain name"));
        }
        if self.lcd_endpoint.is_empty() {
            return Err(eyre::eyre!("No LCD endpoint provided"));
        }
        if self.wallets.is_empty() && self.applications.is_empty() && self.suppliers.is_empty() {
            return Err(eyre::eyre!("No wallets, applications, or suppliers provided"));
        }

        for (index, wallet) in self.wallets.iter().enumerate() {
            if wallet.address.is_empty() {
                return Err(eyre::eyre!("Error in wallet {}: address is not specified", index));
            }
        }
        for (index, application) in self.applications.iter().enumerate() {
            if application.address.is_empty() {
                return Err(eyre::eyre!(
                    "Error in application {}: address is not specified",
                    index
                ));
            }
        }
        for (index, supplier) in self.suppliers.iter().enumerate() {
            if supplier.address.is_empty() {
                return Err(eyre::eyre!("Error in supplier {}: address is not specified", index));
            }
        }

        Ok(())
    }
}

impl Config {
    pub fn load(path: &str) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("Failed to read config file '{}': {}", path, e))?;
        Self::parse(&content)
            .map_err(|e| eyre::eyre!("Invalid config file '{}': {}", path, e))
    }

    pub fn parse(content: &str) -> eyre::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> eyre::Result<()> {
        if self.chains.is_empty() {
            return Err(eyre::eyre!("At least one chain must be configured"));
        }

        let mut names = HashSet::new();
        for (index, chain) in self.chains.iter().enumerate() {
            chain
                .validate()
                .map_err(|e| eyre::eyre!("Error in chain {}: {}", index, e))?;
            if !names.insert(chain.name.as_str()) {
                return Err(eyre::eyre!("Chain '{}' is configured more than once", chain.name));
            }
        }

        Ok(())
    }
}

use crate::chain_errors::{ChainClientError, ChainClientResult};
use chain_err_handle::prelude::*;
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const ENDPOINTS_COUNT: usize = 3;

/// TRON chain/network.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub enum Network {
    Mainnet,
    Shasta,
    Nile,
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 728126428,
            Network::Shasta => 2494104990,
            Network::Nile => 3448148188,
        }
    }

    /// `[rpc, fullnode, grid]` endpoints of the public TronGrid service.
    pub fn default_endpoints(&self) -> [&'static str; ENDPOINTS_COUNT] {
        match self {
            Network::Mainnet => [
                "https://api.trongrid.io/jsonrpc",
                "https://api.trongrid.io",
                "https://api.trongrid.io",
            ],
            Network::Shasta => [
                "https://api.shasta.trongrid.io/jsonrpc",
                "https://api.shasta.trongrid.io",
                "https://api.shasta.trongrid.io",
            ],
            Network::Nile => [
                "https://nile.trongrid.io/jsonrpc",
                "https://nile.trongrid.io",
                "https://nile.trongrid.io",
            ],
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ChainConfiguration {
    /// `[rpc, fullnode, grid]`.
    pub endpoints: Vec<String>,
    /// Sent as `TRON-PRO-API-KEY` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub chain_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Validated endpoints of a [`ChainConfiguration`].
#[derive(Clone, Debug, PartialEq)]
pub struct Endpoints {
    pub rpc: Url,
    pub fullnode: Url,
    pub grid: Url,
}

impl ChainConfiguration {
    pub fn for_network(network: Network, api_key: Option<String>) -> ChainConfiguration {
        ChainConfiguration {
            endpoints: network.default_endpoints().iter().map(|url| url.to_string()).collect(),
            api_key,
            chain_id: network.chain_id(),
            timeout_secs: None,
        }
    }

    pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)) }

    pub fn endpoints(&self) -> ChainClientResult<Endpoints> {
        if self.endpoints.len() != ENDPOINTS_COUNT {
            return ChainError::err(ChainClientError::InvalidConfig(format!(
                "expected {} endpoints [rpc, fullnode, grid], got {}",
                ENDPOINTS_COUNT,
                self.endpoints.len()
            )));
        }
        let parse = |url: &str| {
            Url::parse(url).map_to_chain(|e| ChainClientError::InvalidConfig(format!("invalid endpoint '{}': {}", url, e)))
        };
        Ok(Endpoints {
            rpc: parse(&self.endpoints[0])?,
            fullnode: parse(&self.endpoints[1])?,
            grid: parse(&self.endpoints[2])?,
        })
    }

    pub fn validate(&self) -> ChainClientResult<()> {
        self.endpoints()?;
        if self.timeout_secs == Some(0) {
            return ChainError::err(ChainClientError::InvalidConfig("timeout_secs must be positive".to_owned()));
        }
        if matches!(&self.api_key, Some(key) if key.is_empty()) {
            return ChainError::err(ChainClientError::InvalidConfig("api_key must not be empty".to_owned()));
        }
        Ok(())
    }
}

//! Transport to the three TRON services: the JSON-RPC node, the wallet REST API of the fullnode
//! and the TronGrid event index.
//!
//! Each call is a single round trip. Address arguments are passed through as given; callers
//! convert them to the form each API expects.

use super::types::*;
use crate::chain_conf::ChainConfiguration;
use crate::chain_errors::{ChainClientError, ChainClientResult};
use async_trait::async_trait;
use chain_err_handle::prelude::*;
use chain_net::transport::{build_client, slurp_get, slurp_post_json, SlurpError, SlurpResult};
use chain_number::{big_uint_to_hex, decode_hex, hex_to_big_uint, hex_to_u64, BigUint};
use common::log::{debug, warn};
use common::now_ms;
use derive_more::Display;
use http::header::{HeaderMap, HeaderValue};
use http::StatusCode;
use jsonrpc_core::{Call, Id, MethodCall, Output, Params, Response, Version};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{self as json, Value as Json};
use std::sync::Arc;
use url::Url;

const API_KEY_HEADER: &str = "tron-pro-api-key";
const JSON_RPC_ID: u64 = 2023;

pub type TronRpcResult<T> = Result<T, ChainError<TronRpcError>>;

#[derive(Clone, Debug, Display, PartialEq)]
pub enum TronRpcError {
    #[display(fmt = "Transport error: {}", _0)]
    Transport(String),
    #[display(fmt = "Request timeout: {}", _0)]
    Timeout(String),
    #[display(fmt = "Invalid response: {}", _0)]
    InvalidResponse(String),
    #[display(fmt = "RPC error {}: {}", code, message)]
    RpcError { code: i64, message: String },
    #[display(fmt = "Node rejected the request: {}", raw)]
    NodeRejected { raw: String },
    #[display(fmt = "Internal error: {}", _0)]
    Internal(String),
}

impl From<SlurpError> for TronRpcError {
    fn from(e: SlurpError) -> Self {
        match e {
            SlurpError::Timeout { .. } => TronRpcError::Timeout(e.to_string()),
            SlurpError::Transport { .. } => TronRpcError::Transport(e.to_string()),
            SlurpError::ErrorDeserializing { .. } => TronRpcError::InvalidResponse(e.to_string()),
            SlurpError::InvalidRequest(_) | SlurpError::Internal(_) => TronRpcError::Internal(e.to_string()),
        }
    }
}

fn node_rejected(body: &[u8]) -> TronRpcError {
    TronRpcError::NodeRejected {
        raw: String::from_utf8_lossy(body).into_owned(),
    }
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum TronEndpoint {
    #[display(fmt = "rpc")]
    JsonRpc,
    #[display(fmt = "fullnode")]
    FullNode,
    #[display(fmt = "grid")]
    Grid,
}

/// Raw HTTP access to the TRON services.
#[async_trait]
pub trait TronTransport: Send + Sync {
    async fn get(&self, endpoint: TronEndpoint, path: &str) -> SlurpResult;

    async fn post_json(&self, endpoint: TronEndpoint, path: &str, body: Vec<u8>) -> SlurpResult;
}

/// [`TronTransport`] over HTTPS.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    rpc: Url,
    fullnode: Url,
    grid: Url,
}

impl HttpTransport {
    pub fn new(conf: &ChainConfiguration) -> ChainClientResult<HttpTransport> {
        let endpoints = conf.endpoints()?;
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &conf.api_key {
            let value = HeaderValue::from_str(api_key)
                .map_to_chain(|e| ChainClientError::InvalidConfig(format!("invalid api_key: {}", e)))?;
            headers.insert(API_KEY_HEADER, value);
        }
        let client =
            build_client(conf.timeout(), headers).chain_err(|e| ChainClientError::InvalidConfig(e.to_string()))?;
        Ok(HttpTransport {
            client,
            rpc: endpoints.rpc,
            fullnode: endpoints.fullnode,
            grid: endpoints.grid,
        })
    }

    fn uri(&self, endpoint: TronEndpoint, path: &str) -> String {
        let base = match endpoint {
            TronEndpoint::JsonRpc => &self.rpc,
            TronEndpoint::FullNode => &self.fullnode,
            TronEndpoint::Grid => &self.grid,
        };
        let base = base.as_str().trim_end_matches('/');
        if path.is_empty() {
            base.to_owned()
        } else {
            format!("{}/{}", base, path.trim_start_matches('/'))
        }
    }
}

#[async_trait]
impl TronTransport for HttpTransport {
    async fn get(&self, endpoint: TronEndpoint, path: &str) -> SlurpResult {
        slurp_get(&self.client, &self.uri(endpoint, path)).await
    }

    async fn post_json(&self, endpoint: TronEndpoint, path: &str, body: Vec<u8>) -> SlurpResult {
        slurp_post_json(&self.client, &self.uri(endpoint, path), body).await
    }
}

/// Typed calls over a [`TronTransport`].
#[derive(Clone)]
pub struct TronHttpClient {
    transport: Arc<dyn TronTransport>,
}

impl TronHttpClient {
    pub fn new(transport: Arc<dyn TronTransport>) -> TronHttpClient { TronHttpClient { transport } }

    /// Sends a JSON-RPC 2.0 request and returns its `result`.
    pub async fn rpc_call(&self, method: &str, params: Vec<Json>) -> TronRpcResult<Json> {
        let request = Call::MethodCall(MethodCall {
            jsonrpc: Some(Version::V2),
            method: method.to_owned(),
            params: Params::Array(params),
            id: Id::Num(JSON_RPC_ID),
        });
        let body = json::to_vec(&request).map_to_chain(|e| TronRpcError::Internal(e.to_string()))?;
        debug!("JSON-RPC call {}", method);
        let response = self
            .transport
            .post_json(TronEndpoint::JsonRpc, "", body)
            .await
            .chain_err(TronRpcError::from)?;
        let body = check_status(method, response)?;
        single_response(&body)
    }

    /// POSTs `body` to `fullnode/{path}` and returns the raw response.
    pub async fn wallet_call<Req>(&self, path: &str, body: &Req) -> TronRpcResult<Vec<u8>>
    where
        Req: Serialize + Sync,
    {
        let body = json::to_vec(body).map_to_chain(|e| TronRpcError::Internal(e.to_string()))?;
        debug!("Wallet call {}", path);
        let response = self
            .transport
            .post_json(TronEndpoint::FullNode, path, body)
            .await
            .chain_err(TronRpcError::from)?;
        check_status(path, response)
    }

    pub async fn wallet_get(&self, path: &str) -> TronRpcResult<Vec<u8>> {
        let response = self
            .transport
            .get(TronEndpoint::FullNode, path)
            .await
            .chain_err(TronRpcError::from)?;
        check_status(path, response)
    }

    /// GETs `grid/{path}` and returns the raw response.
    pub async fn grid_get(&self, path: &str) -> TronRpcResult<Vec<u8>> {
        let response = self
            .transport
            .get(TronEndpoint::Grid, path)
            .await
            .chain_err(TronRpcError::from)?;
        check_status(path, response)
    }

    async fn rpc_str(&self, method: &str, params: Vec<Json>) -> TronRpcResult<String> {
        match self.rpc_call(method, params).await? {
            Json::String(s) => Ok(s),
            other => ChainError::err(TronRpcError::InvalidResponse(format!(
                "{}: expected a hex string, got {}",
                method, other
            ))),
        }
    }

    async fn rpc_u64(&self, method: &str, params: Vec<Json>) -> TronRpcResult<u64> {
        let result = self.rpc_str(method, params).await?;
        hex_to_u64(&result).chain_err(|e| TronRpcError::InvalidResponse(format!("{}: {}", method, e)))
    }

    async fn rpc_big_uint(&self, method: &str, params: Vec<Json>) -> TronRpcResult<BigUint> {
        let result = self.rpc_str(method, params).await?;
        hex_to_big_uint(&result).chain_err(|e| TronRpcError::InvalidResponse(format!("{}: {}", method, e)))
    }

    async fn rpc_bytes(&self, method: &str, params: Vec<Json>) -> TronRpcResult<Vec<u8>> {
        let result = self.rpc_str(method, params).await?;
        if !result.starts_with("0x") {
            return Ok(result.into_bytes());
        }
        decode_hex(&result).chain_err(|e| TronRpcError::InvalidResponse(format!("{}: {}", method, e)))
    }

    pub async fn chain_id(&self) -> TronRpcResult<u64> { self.rpc_u64("eth_chainId", vec![]).await }

    pub async fn block_number(&self) -> TronRpcResult<u64> { self.rpc_u64("eth_blockNumber", vec![]).await }

    /// `address` is the `0x41`-prefixed hex form.
    pub async fn balance_at(&self, address: &str) -> TronRpcResult<BigUint> {
        self.rpc_big_uint("eth_getBalance", vec![Json::from(address), Json::from("latest")])
            .await
    }

    pub async fn gas_price(&self) -> TronRpcResult<BigUint> { self.rpc_big_uint("eth_gasPrice", vec![]).await }

    /// `address` is the `0x` + 40 hex form.
    pub async fn get_code(&self, address: &str) -> TronRpcResult<Vec<u8>> {
        self.rpc_bytes("eth_getCode", vec![Json::from(address), Json::from("latest")])
            .await
    }

    pub async fn get_block_by_number(&self, number: u64) -> TronRpcResult<Option<Json>> {
        let number = format!("0x{:x}", number);
        let block = self
            .rpc_call("eth_getBlockByNumber", vec![Json::from(number), Json::Bool(true)])
            .await?;
        Ok(Some(block).filter(|block| !block.is_null()))
    }

    pub async fn transaction_receipt(&self, hash: &str) -> TronRpcResult<Option<Json>> {
        let receipt = self
            .rpc_call("eth_getTransactionReceipt", vec![Json::from(hash)])
            .await?;
        Ok(Some(receipt).filter(|receipt| !receipt.is_null()))
    }

    /// Read-only call. `from` and `to` are `41`-prefixed hex without `0x`.
    pub async fn eth_call(&self, from: &str, to: &str, data: &[u8], value: &BigUint) -> TronRpcResult<Vec<u8>> {
        let request = json!({
            "from": from,
            "to": to,
            "data": format!("0x{}", hex::encode(data)),
            "value": big_uint_to_hex(value),
        });
        self.rpc_bytes("eth_call", vec![request, Json::from("latest")]).await
    }

    /// `from` and `to` are the `0x41`-prefixed hex forms.
    pub async fn estimate_gas(&self, from: &str, to: &str, data: &[u8], value: &BigUint) -> TronRpcResult<BigUint> {
        let request = json!({
            "from": from,
            "to": to,
            "data": format!("0x{}", hex::encode(data)),
            "value": big_uint_to_hex(value),
        });
        self.rpc_big_uint("eth_estimateGas", vec![request]).await
    }

    pub async fn create_transaction(&self, req: &TransferRequest<'_>) -> TronRpcResult<TronTransaction> {
        self.wallet_transaction("wallet/createtransaction", req).await
    }

    /// Returns the unsigned transaction created by the node. The contract is not executed.
    pub async fn trigger_smart_contract(&self, req: &TriggerContractRequest<'_>) -> TronRpcResult<TronTransaction> {
        let path = "wallet/triggersmartcontract";
        let body = self.wallet_call(path, req).await?;
        let extention: TransactionExtention = parse_json(path, &body)?;
        match extention.transaction {
            Some(tx) if !tx.tx_id.is_empty() => Ok(tx),
            _ => ChainError::err(node_rejected(&body)),
        }
    }

    /// Returns `constant_result[0]`, a hex encoded ABI blob.
    pub async fn trigger_constant_contract(&self, req: &TriggerContractRequest<'_>) -> TronRpcResult<String> {
        let path = "wallet/triggerconstantcontract";
        let body = self.wallet_call(path, req).await?;
        let result: ConstantContractResult = parse_json(path, &body)?;
        if !result.result.result {
            return ChainError::err(node_rejected(&body));
        }
        result
            .constant_result
            .into_iter()
            .next()
            .or_chain_err(|| node_rejected(&body))
    }

    /// Fails with `NodeRejected` when the node does not acknowledge the transaction,
    /// whatever the HTTP status was.
    pub async fn broadcast_transaction(&self, tx: &TronTransaction) -> TronRpcResult<BroadcastResult> {
        let path = "wallet/broadcasttransaction";
        let body = self.wallet_call(path, tx).await?;
        let result: BroadcastResult = parse_json(path, &body)?;
        if !result.result {
            return ChainError::err(node_rejected(&body));
        }
        Ok(result)
    }

    pub async fn deploy_contract(&self, req: &DeployContractRequest<'_>) -> TronRpcResult<DeployContractResult> {
        let path = "wallet/deploycontract";
        let body = self.wallet_call(path, req).await?;
        let result: DeployContractResult = parse_json(path, &body)?;
        if result.tx_id.is_empty() {
            return ChainError::err(node_rejected(&body));
        }
        Ok(result)
    }

    pub async fn get_transaction_by_id(&self, hash: &str) -> TronRpcResult<TransactionDetail> {
        let path = "wallet/gettransactionbyid";
        let body = self.wallet_call(path, &TransactionIdRequest { value: hash }).await?;
        parse_json(path, &body)
    }

    pub async fn get_transaction_info_by_id(&self, hash: &str) -> TronRpcResult<TransactionInfoById> {
        let path = "wallet/gettransactioninfobyid";
        let body = self.wallet_call(path, &TransactionIdRequest { value: hash }).await?;
        parse_json(path, &body)
    }

    /// `address` is base58.
    pub async fn get_account_resource(&self, address: &str) -> TronRpcResult<ResourceLeft> {
        let path = "wallet/getaccountresource";
        let body = self
            .wallet_call(path, &AccountRequest { address, visible: true })
            .await?;
        let resource: AccountResource = parse_json(path, &body)?;
        Ok(ResourceLeft {
            bandwidth: resource.free_net_limit.saturating_sub(resource.free_net_used),
            energy: resource.energy_limit.saturating_sub(resource.energy_used),
        })
    }

    pub async fn get_latest_block_number(&self) -> TronRpcResult<u64> {
        let path = "wallet/getblockbylatestnum?num=1";
        let body = self.wallet_get(path).await?;
        let blocks: LatestBlocks = parse_json(path, &body)?;
        blocks
            .block
            .first()
            .map(|block| block.block_header.raw_data.number)
            .or_chain_err(|| node_rejected(&body))
    }

    /// Energy price in sun, as of now.
    pub async fn get_energy_price(&self) -> TronRpcResult<u64> {
        let path = "wallet/getenergyprices";
        let body = self.wallet_get(path).await?;
        let prices: EnergyPrices = parse_json(path, &body)?;
        current_price(&prices.prices, now_ms()).or_chain_err(|| node_rejected(&body))
    }

    pub async fn freeze_balance_v2(&self, req: &FreezeBalanceRequest) -> TronRpcResult<TronTransaction> {
        self.wallet_transaction("wallet/freezebalancev2", req).await
    }

    pub async fn unfreeze_balance_v2(&self, req: &UnfreezeBalanceRequest) -> TronRpcResult<TronTransaction> {
        self.wallet_transaction("wallet/unfreezebalancev2", req).await
    }

    pub async fn withdraw_expire_unfreeze(&self, req: &WithdrawExpireUnfreezeRequest) -> TronRpcResult<TronTransaction> {
        self.wallet_transaction("wallet/withdrawexpireunfreeze", req).await
    }

    pub async fn delegate_resource(&self, req: &DelegateResourceRequest) -> TronRpcResult<TronTransaction> {
        self.wallet_transaction("wallet/delegateresource", req).await
    }

    pub async fn get_transaction_events(&self, hash: &str) -> TronRpcResult<TransactionEvents> {
        let path = format!("v1/transactions/{}/events", hash);
        let body = self.grid_get(&path).await?;
        parse_json(&path, &body)
    }

    /// Calls a wallet API that answers with a bare transaction.
    async fn wallet_transaction<Req>(&self, path: &str, req: &Req) -> TronRpcResult<TronTransaction>
    where
        Req: Serialize + Sync,
    {
        let body = self.wallet_call(path, req).await?;
        let tx: TronTransaction = parse_json(path, &body)?;
        if tx.tx_id.is_empty() {
            return ChainError::err(node_rejected(&body));
        }
        Ok(tx)
    }
}

fn check_status(what: &str, response: (StatusCode, HeaderMap, Vec<u8>)) -> TronRpcResult<Vec<u8>> {
    let (status, _headers, body) = response;
    if !status.is_success() {
        return ChainError::err(TronRpcError::Transport(format!(
            "{} responded with {}: {}",
            what,
            status,
            String::from_utf8_lossy(&body)
        )));
    }
    Ok(body)
}

fn parse_json<T: DeserializeOwned>(what: &str, body: &[u8]) -> TronRpcResult<T> {
    json::from_slice(body).map_to_chain(|e| {
        TronRpcError::InvalidResponse(format!("{}: {}, body: {}", what, e, String::from_utf8_lossy(body)))
    })
}

fn single_response(body: &[u8]) -> TronRpcResult<Json> {
    let response: Response = parse_json("JSON-RPC", body)?;
    match response {
        Response::Single(Output::Success(success)) => Ok(success.result),
        Response::Single(Output::Failure(failure)) => ChainError::err(TronRpcError::RpcError {
            code: failure.error.code.code(),
            message: failure.error.message,
        }),
        Response::Batch(_) => ChainError::err(TronRpcError::InvalidResponse("Expected single, got batch.".to_owned())),
    }
}

/// Picks the price of the most recent `timestamp:price` entry that is not in the future.
fn current_price(prices: &str, now_ms: u64) -> Option<u64> {
    let mut current: Option<(u64, u64)> = None;
    for entry in prices.split(',').filter(|entry| !entry.is_empty()) {
        let parsed = entry
            .split_once(':')
            .and_then(|(since, price)| Some((since.trim().parse::<u64>().ok()?, price.trim().parse::<u64>().ok()?)));
        let (since, price) = match parsed {
            Some(parsed) => parsed,
            None => {
                warn!("Skipping malformed energy price entry '{}'", entry);
                continue;
            },
        };
        if since > now_ms {
            continue;
        }
        if current.map_or(true, |(latest, _)| since >= latest) {
            current = Some((since, price));
        }
    }
    current.map(|(_, price)| price)
}

//! TRON backend of [`BlockChainClient`].

use crate::abi::{AbiArg, AbiRegistry, AbiValue, TRC20_ABI_NAME};
use crate::chain_conf::ChainConfiguration;
use crate::chain_errors::{ChainClientError, ChainClientResult};
use crate::{BlockChainClient, EventLog, FeeLimit, Transaction, TransactionInfo, UnsignedTransaction};
use async_trait::async_trait;
use chain_err_handle::prelude::*;
use chain_number::BigUint;
use ethereum_types::{Address as EvmAddress, H256};
use serde_json::Value as Json;
use std::str::FromStr;
use std::sync::Arc;

pub mod address;
#[cfg(any(test, feature = "for-tests"))] pub mod for_tests;
pub mod http_client;
mod resolver;
mod trc20;
mod tx_builder;
pub mod types;

pub use address::Address as TronAddress;
pub use address::{EMPTY_ADDRESS_BASE58, EMPTY_ADDRESS_HEX};
pub use http_client::{HttpTransport, TronEndpoint, TronHttpClient, TronRpcError, TronTransport};
pub use types::{Resource, ResourceLeft};

/// TRX has 6 decimals (1 TRX = 1_000_000 sun).
pub const TRX_DECIMALS: u8 = 6;

/// Client of a TRON network.
///
/// Owns its transport and its ABI registry; share it between tasks behind an `Arc`.
pub struct TronClient {
    http: TronHttpClient,
    abis: AbiRegistry,
    chain_id: u64,
}

impl TronClient {
    pub fn new(conf: &ChainConfiguration) -> ChainClientResult<TronClient> {
        conf.validate()?;
        let transport = HttpTransport::new(conf)?;
        TronClient::with_transport(Arc::new(transport), conf.chain_id)
    }

    pub fn with_transport(transport: Arc<dyn TronTransport>, chain_id: u64) -> ChainClientResult<TronClient> {
        let abis = AbiRegistry::with_standard_abis().chain_err(ChainClientError::from)?;
        Ok(TronClient {
            http: TronHttpClient::new(transport),
            abis,
            chain_id,
        })
    }

    pub fn abis(&self) -> &AbiRegistry { &self.abis }

    pub fn http(&self) -> &TronHttpClient { &self.http }

    pub fn configured_chain_id(&self) -> u64 { self.chain_id }
}

/// Parses an address given in any supported form.
fn parse_address(address: &str) -> ChainClientResult<TronAddress> {
    TronAddress::from_str(address).chain_err(ChainClientError::from)
}

#[async_trait]
impl BlockChainClient for TronClient {
    fn register_abi(&self, name: &str, json: &str) -> ChainClientResult<()> {
        self.abis.register(name, json).chain_err(ChainClientError::from)
    }

    fn get_transaction_data_by_abi(&self, method: &str, abi_name: &str, args: &[AbiArg]) -> ChainClientResult<Vec<u8>> {
        self.abis.encode(method, abi_name, args).chain_err(ChainClientError::from)
    }

    fn unpack_by_abi(&self, method: &str, abi_name: &str, data: &[u8]) -> ChainClientResult<Vec<AbiValue>> {
        self.abis.decode(method, abi_name, data).chain_err(ChainClientError::from)
    }

    fn function_selector_by_data(&self, abi_name: &str, data: &[u8]) -> ChainClientResult<String> {
        self.abis
            .selector_to_method(abi_name, data)
            .chain_err(ChainClientError::from)
    }

    fn transfer_data(&self, to: &str, value: &BigUint) -> ChainClientResult<Vec<u8>> {
        let args = [AbiArg::Address(to.to_owned()), AbiArg::Uint(value.clone())];
        self.get_transaction_data_by_abi("transfer", TRC20_ABI_NAME, &args)
    }

    fn approve_data(&self, spender: &str, amount: &BigUint) -> ChainClientResult<Vec<u8>> {
        let args = [AbiArg::Address(spender.to_owned()), AbiArg::Uint(amount.clone())];
        self.get_transaction_data_by_abi("approve", TRC20_ABI_NAME, &args)
    }

    async fn balance_at(&self, address: &str) -> ChainClientResult<BigUint> {
        let address = parse_address(address)?;
        self.http
            .balance_at(&format!("0x{}", address.to_hex()))
            .await
            .chain_err(ChainClientError::from)
    }

    async fn balance_of(&self, contract: &str, owner: &str) -> ChainClientResult<BigUint> {
        self.trc20_balance_of(contract, owner).await
    }

    async fn decimals_of(&self, contract: &str) -> ChainClientResult<u8> { self.trc20_decimals(contract).await }

    async fn total_supply_of(&self, contract: &str) -> ChainClientResult<BigUint> {
        self.trc20_total_supply(contract).await
    }

    async fn symbol_of(&self, contract: &str) -> ChainClientResult<String> { self.trc20_symbol(contract).await }

    async fn allowance(&self, contract: &str, owner: &str, spender: &str) -> ChainClientResult<BigUint> {
        self.trc20_allowance(contract, owner, spender).await
    }

    async fn get_transaction(&self, tx: &Transaction) -> ChainClientResult<UnsignedTransaction> {
        self.build_transaction(tx).await
    }

    async fn broadcast_transaction(&self, envelope: &[u8], signature: &[u8]) -> ChainClientResult<H256> {
        self.broadcast_signed(envelope, signature).await
    }

    /// TRON accounts have no nonce.
    async fn get_nonce(&self, _address: &str) -> ChainClientResult<u64> { Ok(0) }

    async fn estimate_gas(&self, tx: &Transaction) -> ChainClientResult<u64> { self.estimate_energy(tx).await }

    async fn get_suggest_fee(&self, tx: &Transaction) -> ChainClientResult<FeeLimit> { self.suggest_fee(tx).await }

    async fn get_gas_price(&self) -> ChainClientResult<(BigUint, BigUint)> {
        let price = self.http.gas_price().await.chain_err(ChainClientError::from)?;
        Ok((price, BigUint::default()))
    }

    async fn call_contract(&self, tx: &Transaction) -> ChainClientResult<Vec<u8>> { self.eth_call(tx).await }

    async fn get_transaction_by_hash(&self, hash: &str) -> ChainClientResult<TransactionInfo> {
        self.resolve_transaction(hash).await
    }

    fn parse_event_log(&self, _abi_name: &str, log: &EventLog) -> ChainClientResult<Vec<String>> {
        crate::abi::event::positional_results(&log.data).chain_err(ChainClientError::from)
    }

    fn is_valid_address(&self, address: &str) -> bool { address::is_valid(address) }

    fn normalize_address(&self, address: &str) -> String { address::normalize_address(address) }

    fn is_native_asset(&self, asset: &str) -> bool { address::is_native(asset) }

    fn native_asset_address(&self) -> String { EMPTY_ADDRESS_BASE58.to_owned() }

    fn native_asset_decimals(&self) -> u8 { TRX_DECIMALS }

    fn address_from_string(&self, address: &str) -> ChainClientResult<EvmAddress> {
        parse_address(address).map(|address| address.to_evm())
    }

    fn address_to_string(&self, address: EvmAddress) -> String { TronAddress::from_evm(address).to_base58() }

    async fn is_contract_address(&self, address: EvmAddress) -> ChainClientResult<bool> {
        let code = self
            .http
            .get_code(&format!("0x{}", hex::encode(address.as_bytes())))
            .await
            .chain_err(ChainClientError::from)?;
        Ok(!code.is_empty())
    }

    async fn latest_block_number(&self) -> ChainClientResult<u64> {
        self.http
            .get_latest_block_number()
            .await
            .chain_err(ChainClientError::from)
    }

    async fn block_number(&self) -> ChainClientResult<u64> {
        self.http.block_number().await.chain_err(ChainClientError::from)
    }

    async fn get_block_by_number(&self, number: u64) -> ChainClientResult<Option<Json>> {
        self.http
            .get_block_by_number(number)
            .await
            .chain_err(ChainClientError::from)
    }

    async fn chain_id(&self) -> ChainClientResult<u64> { self.http.chain_id().await.chain_err(ChainClientError::from) }

    async fn transaction_receipt(&self, hash: H256) -> ChainClientResult<Option<Json>> {
        self.http
            .transaction_receipt(&format!("0x{}", hex::encode(hash.as_bytes())))
            .await
            .chain_err(ChainClientError::from)
    }
}

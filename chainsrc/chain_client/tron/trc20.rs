use super::types::TriggerContractRequest;
use super::{parse_address, TronClient, EMPTY_ADDRESS_BASE58, EMPTY_ADDRESS_HEX};
use crate::abi::{AbiArg, TRC20_ABI_NAME};
use crate::chain_errors::{ChainClientError, ChainClientResult};
use crate::Transaction;
use chain_err_handle::prelude::*;
use chain_number::{extract_number, extract_string, hex_to_big_uint, BigUint};
use common::log::debug;
use num_traits::ToPrimitive;

impl TronClient {
    /// Runs a read-only method through `wallet/triggerconstantcontract` and returns the hex encoded
    /// result.
    async fn constant_call(
        &self,
        contract: &str,
        owner: &str,
        function_selector: &str,
        parameter: String,
    ) -> ChainClientResult<String> {
        let contract = parse_address(contract)?.to_base58();
        debug!("Constant call {} on {}", function_selector, contract);
        let req = TriggerContractRequest {
            owner_address: owner,
            contract_address: &contract,
            function_selector,
            parameter,
            visible: true,
            fee_limit: None,
        };
        self.http
            .trigger_constant_contract(&req)
            .await
            .chain_err(ChainClientError::from)
    }

    pub(super) async fn trc20_balance_of(&self, contract: &str, owner: &str) -> ChainClientResult<BigUint> {
        let owner = parse_address(owner)?.to_base58();
        let data = self
            .abis
            .encode("balanceOf", TRC20_ABI_NAME, &[AbiArg::Address(owner.clone())])
            .chain_err(ChainClientError::from)?;
        let result = self
            .constant_call(contract, &owner, "balanceOf(address)", hex::encode(&data[4..]))
            .await?;
        hex_to_big_uint(&result).chain_err(ChainClientError::from)
    }

    pub(super) async fn trc20_decimals(&self, contract: &str) -> ChainClientResult<u8> {
        let result = self
            .constant_call(contract, EMPTY_ADDRESS_BASE58, "decimals()", String::new())
            .await?;
        let decimals = extract_number(&result).chain_err(ChainClientError::from)?;
        decimals
            .to_u8()
            .or_chain_err(|| ChainClientError::InvalidResponse(format!("decimals {} do not fit into u8", decimals)))
    }

    pub(super) async fn trc20_total_supply(&self, contract: &str) -> ChainClientResult<BigUint> {
        let result = self
            .constant_call(contract, EMPTY_ADDRESS_BASE58, "totalSupply()", String::new())
            .await?;
        extract_number(&result).chain_err(ChainClientError::from)
    }

    pub(super) async fn trc20_symbol(&self, contract: &str) -> ChainClientResult<String> {
        let result = self
            .constant_call(contract, EMPTY_ADDRESS_BASE58, "symbol()", String::new())
            .await?;
        extract_string(&result).chain_err(ChainClientError::from)
    }

    pub(super) async fn trc20_allowance(&self, contract: &str, owner: &str, spender: &str) -> ChainClientResult<BigUint> {
        let method = "allowance";
        let args = [AbiArg::Address(owner.to_owned()), AbiArg::Address(spender.to_owned())];
        let data = self
            .abis
            .encode(method, TRC20_ABI_NAME, &args)
            .chain_err(ChainClientError::from)?;
        let tx = Transaction {
            from: owner.to_owned(),
            to: contract.to_owned(),
            data,
            ..Default::default()
        };
        let result = self.eth_call(&tx).await?;
        let values = self
            .abis
            .decode(method, TRC20_ABI_NAME, &result)
            .chain_err(ChainClientError::from)?;
        values.into_iter().next().and_then(|value| value.into_uint()).or_chain_err(|| {
            ChainClientError::InvalidResponse(format!("unexpected {} result 0x{}", method, hex::encode(&result)))
        })
    }

    /// Read-only execution through `eth_call`. An unreadable `from` is replaced by the empty
    /// address.
    pub(super) async fn eth_call(&self, tx: &Transaction) -> ChainClientResult<Vec<u8>> {
        let from = parse_address(&tx.from)
            .map(|address| address.to_hex())
            .unwrap_or_else(|_| EMPTY_ADDRESS_HEX.to_owned());
        let to = parse_address(&tx.to)?.to_hex();
        let value = tx
            .amount
            .to_biguint()
            .or_chain_err(|| ChainClientError::InvalidArgument(format!("negative call value {}", tx.amount)))?;
        self.http
            .eth_call(&from, &to, &tx.data, &value)
            .await
            .chain_err(ChainClientError::from)
    }
}

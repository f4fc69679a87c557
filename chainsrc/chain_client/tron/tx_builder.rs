//! Unsigned transaction construction and broadcast.
//!
//! The node builds every transaction: a native transfer through `wallet/createtransaction`,
//! a contract call through `wallet/triggersmartcontract`. The returned `txID` is the digest the
//! external signer signs, it is never recomputed here.

use super::types::{DelegateResourceRequest, DeployContractRequest, FreezeBalanceRequest, Resource, TransactionEnvelope,
                   TransferRequest, TriggerContractRequest, TronTransaction, UnfreezeBalanceRequest,
                   WithdrawExpireUnfreezeRequest};
use super::{parse_address, TronAddress, TronClient};
use crate::chain_errors::{ChainClientError, ChainClientResult};
use crate::{FeeLimit, Transaction, UnsignedTransaction};
use chain_err_handle::prelude::*;
use chain_number::{BigInt, BigUint};
use common::log::debug;
use ethereum_types::H256;
use num_traits::{ToPrimitive, Zero};
use std::str::FromStr;

const SELECTOR_LEN: usize = 4;
const DEPLOY_FEE_LIMIT: u64 = 1_000_000_000;
const DEPLOY_ORIGIN_ENERGY_LIMIT: u64 = 1_000_000_000;
const DEPLOY_CONTRACT_NAME: &str = "Migrations";

/// `gas * gas_fee_cap + len(data) / 2`, or zero without a complete fee.
pub fn energy_limit(fee: Option<&FeeLimit>, data: &[u8]) -> BigUint {
    match fee {
        Some(fee) => &fee.gas * &fee.gas_fee_cap + BigUint::from(data.len() / 2),
        None => BigUint::zero(),
    }
}

fn same_address(left: &str, right: &str) -> bool {
    match (TronAddress::from_str(left), TronAddress::from_str(right)) {
        (Ok(left), Ok(right)) => left == right,
        _ => left == right,
    }
}

/// Parses an account that may own or receive a transaction. The empty address never does.
fn parse_account(address: &str) -> ChainClientResult<TronAddress> {
    let account = parse_address(address)?;
    if account.is_empty() {
        return ChainError::err(ChainClientError::AddressInvalid(format!(
            "'{}' is the reserved empty address",
            address
        )));
    }
    Ok(account)
}

fn positive_amount(amount: &BigInt) -> ChainClientResult<BigUint> {
    match amount.to_biguint() {
        Some(amount) if !amount.is_zero() => Ok(amount),
        _ => ChainError::err(ChainClientError::NonPositiveAmount(amount.to_string())),
    }
}

fn seal(tx: TronTransaction) -> ChainClientResult<UnsignedTransaction> {
    let hash = tx_hash(&tx.tx_id)?;
    let envelope = TransactionEnvelope {
        tx_id: tx.tx_id.clone(),
        transaction: tx,
    };
    let envelope = serde_json::to_vec(&envelope).map_to_chain(|e| ChainClientError::EncodeFailed(e.to_string()))?;
    Ok(UnsignedTransaction { envelope, hash })
}

fn tx_hash(tx_id: &str) -> ChainClientResult<H256> {
    let bytes = hex::decode(tx_id).map_to_chain(|e| ChainClientError::EncodeFailed(format!("txID '{}': {}", tx_id, e)))?;
    if bytes.len() != H256::len_bytes() {
        return ChainError::err(ChainClientError::EncodeFailed(format!(
            "txID '{}' is not a 32-byte hash",
            tx_id
        )));
    }
    Ok(H256::from_slice(&bytes))
}

impl TronClient {
    pub(super) async fn build_transaction(&self, tx: &Transaction) -> ChainClientResult<UnsignedTransaction> {
        let node_tx = if tx.data.is_empty() {
            self.create_transfer(tx).await?
        } else {
            self.trigger_contract(tx).await?
        };
        seal(node_tx)
    }

    async fn create_transfer(&self, tx: &Transaction) -> ChainClientResult<TronTransaction> {
        if same_address(&tx.from, &tx.to) {
            return ChainError::err(ChainClientError::SelfTransfer(tx.from.clone()));
        }
        let amount = positive_amount(&tx.amount)?;
        let from = parse_account(&tx.from)?.to_base58();
        let to = parse_account(&tx.to)?.to_base58();

        debug!("Creating transfer of {} sun from {} to {}", amount, from, to);
        let req = TransferRequest {
            owner_address: &from,
            to_address: &to,
            amount,
            visible: true,
        };
        self.http
            .create_transaction(&req)
            .await
            .chain_err(ChainClientError::from)
    }

    async fn trigger_contract(&self, tx: &Transaction) -> ChainClientResult<TronTransaction> {
        let signature = self.abis.lookup_selector(&tx.data).chain_err(ChainClientError::from)?;
        let owner = parse_account(&tx.from)?.to_base58();
        let contract = parse_account(&tx.to)?.to_base58();
        let fee_limit = energy_limit(tx.fee.as_ref(), &tx.data);

        debug!("Triggering {} on {} from {}, fee_limit {}", signature, contract, owner, fee_limit);
        let req = TriggerContractRequest {
            owner_address: &owner,
            contract_address: &contract,
            function_selector: &signature,
            parameter: hex::encode(&tx.data[SELECTOR_LEN..]),
            visible: true,
            fee_limit: Some(fee_limit),
        };
        self.http
            .trigger_smart_contract(&req)
            .await
            .chain_err(ChainClientError::from)
    }

    /// Re-reads an envelope produced by [`TronClient::build_transaction`], attaches `signature`
    /// and submits the transaction.
    pub(super) async fn broadcast_signed(&self, envelope: &[u8], signature: &[u8]) -> ChainClientResult<H256> {
        let envelope: TransactionEnvelope = serde_json::from_slice(envelope)
            .map_to_chain(|e| ChainClientError::InvalidArgument(format!("malformed transaction envelope: {}", e)))?;
        let hash = tx_hash(&envelope.tx_id)?;
        let tx = envelope.transaction;
        let signed = TronTransaction {
            visible: tx.visible,
            tx_id: envelope.tx_id,
            contract_address: tx.contract_address,
            raw_data: tx.raw_data,
            raw_data_hex: tx.raw_data_hex,
            signature: vec![hex::encode(signature)],
        };
        self.http
            .broadcast_transaction(&signed)
            .await
            .chain_err(ChainClientError::from)?;
        Ok(hash)
    }

    /// Builds an unsigned contract deployment. Returns the transaction and the address the node
    /// assigned to the contract.
    pub async fn deploy_contract(
        &self,
        abi: &str,
        bytecode: &str,
        tx: &Transaction,
    ) -> ChainClientResult<(UnsignedTransaction, String)> {
        let owner = parse_account(&tx.from)?;
        let req = DeployContractRequest {
            owner_address: owner.to_hex(),
            abi,
            bytecode,
            fee_limit: DEPLOY_FEE_LIMIT,
            parameter: "",
            origin_energy_limit: DEPLOY_ORIGIN_ENERGY_LIMIT,
            name: DEPLOY_CONTRACT_NAME,
            consume_user_resource_percent: 0,
            call_value: 0,
        };
        let deployed = self.http.deploy_contract(&req).await.chain_err(ChainClientError::from)?;
        let contract_address = deployed.contract_address.clone();
        let unsigned = seal(TronTransaction {
            visible: deployed.visible,
            tx_id: deployed.tx_id,
            contract_address: Some(deployed.contract_address),
            raw_data: deployed.raw_data,
            raw_data_hex: deployed.raw_data_hex,
            signature: Vec::new(),
        })?;
        Ok((unsigned, contract_address))
    }

    /// Stakes `amount` sun of `from` for `resource`.
    pub async fn stake(&self, from: &str, resource: Resource, amount: &BigUint) -> ChainClientResult<UnsignedTransaction> {
        let req = FreezeBalanceRequest {
            owner_address: parse_account(from)?.to_hex(),
            frozen_balance: amount.clone(),
            resource,
        };
        let tx = self.http.freeze_balance_v2(&req).await.chain_err(ChainClientError::from)?;
        seal(tx)
    }

    pub async fn unstake(&self, from: &str, resource: Resource, amount: &BigUint) -> ChainClientResult<UnsignedTransaction> {
        let req = UnfreezeBalanceRequest {
            owner_address: parse_account(from)?.to_hex(),
            unfreeze_balance: amount.clone(),
            resource,
        };
        let tx = self
            .http
            .unfreeze_balance_v2(&req)
            .await
            .chain_err(ChainClientError::from)?;
        seal(tx)
    }

    /// Withdraws every unstaked amount whose lock period is over.
    pub async fn withdraw_unstaked(&self, from: &str) -> ChainClientResult<UnsignedTransaction> {
        let req = WithdrawExpireUnfreezeRequest {
            owner_address: parse_account(from)?.to_hex(),
        };
        let tx = self
            .http
            .withdraw_expire_unfreeze(&req)
            .await
            .chain_err(ChainClientError::from)?;
        seal(tx)
    }

    pub async fn delegate_resource(
        &self,
        from: &str,
        to: &str,
        resource: Resource,
        amount: &BigUint,
    ) -> ChainClientResult<UnsignedTransaction> {
        let req = DelegateResourceRequest {
            owner_address: parse_account(from)?.to_hex(),
            receiver_address: parse_account(to)?.to_hex(),
            balance: amount.clone(),
            resource,
        };
        let tx = self
            .http
            .delegate_resource(&req)
            .await
            .chain_err(ChainClientError::from)?;
        seal(tx)
    }

    /// Energy a contract call would use. A native transfer uses none.
    pub(super) async fn estimate_energy(&self, tx: &Transaction) -> ChainClientResult<u64> {
        if tx.data.is_empty() {
            return Ok(0);
        }
        let from = format!("0x{}", parse_address(&tx.from)?.to_hex());
        let to = format!("0x{}", parse_address(&tx.to)?.to_hex());
        let value = tx
            .amount
            .to_biguint()
            .or_chain_err(|| ChainClientError::NonPositiveAmount(tx.amount.to_string()))?;
        let energy = self
            .http
            .estimate_gas(&from, &to, &tx.data, &value)
            .await
            .chain_err(ChainClientError::from)?;
        energy
            .to_u64()
            .or_chain_err(|| ChainClientError::InvalidResponse(format!("estimated energy {} overflows u64", energy)))
    }

    pub(super) async fn suggest_fee(&self, tx: &Transaction) -> ChainClientResult<FeeLimit> {
        let gas = self.estimate_energy(tx).await?;
        let gas_price = self.http.gas_price().await.chain_err(ChainClientError::from)?;
        Ok(FeeLimit {
            gas: BigUint::from(gas),
            gas_fee_cap: gas_price,
            gas_tip_cap: BigUint::zero(),
        })
    }

    /// Free bandwidth and energy left to `address` today.
    pub async fn account_resource(&self, address: &str) -> ChainClientResult<super::ResourceLeft> {
        let address = parse_address(address)?.to_base58();
        self.http
            .get_account_resource(&address)
            .await
            .chain_err(ChainClientError::from)
    }

    /// Energy price in sun.
    pub async fn energy_price(&self) -> ChainClientResult<u64> {
        self.http.get_energy_price().await.chain_err(ChainClientError::from)
    }
}

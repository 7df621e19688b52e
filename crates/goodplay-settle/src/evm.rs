//! EVM settlement client.
//!
//! Only available with the `evm-sdk` feature. Signs and submits reward-vault
//! contract calls via alloy; the vault contract tracks processed reward ids
//! (keccak256 of the correlation id) so duplicate disbursements revert
//! on-chain instead of double-paying.

use std::str::FromStr;

use alloy::network::EthereumWallet;
use alloy::primitives::{keccak256, Address, TxHash as AlloyTxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use async_trait::async_trait;
use tracing::{info, warn};

use goodplay_types::constants::MAX_DISBURSE_BATCH;
use goodplay_types::{CorrelationId, TokenAmount, TxHash, WalletAddress};

use crate::config::ChainConfig;
use crate::error::{SettleError, SettleResult};
use crate::traits::SettlementClient;
use crate::types::{
    DisbursementReceipt, DisbursementRequest, DisbursementStatus,
};

sol! {
    #[sol(rpc)]
    contract RewardVault {
        function disburseReward(address recipient, uint256 amount, string correlationId) external returns (bytes32);
        function batchDisburseRewards(address[] recipients, uint256[] amounts, string[] correlationIds) external;
        function getVaultBalance() external view returns (uint256);
        function isRewardProcessed(bytes32 rewardId) external view returns (bool);
    }
}

/// Settlement client backed by a deployed reward-vault contract.
pub struct EvmSettlementClient {
    provider: DynProvider,
    signer_address: Address,
    vault_address: Address,
    treasury: WalletAddress,
    config: ChainConfig,
}

impl EvmSettlementClient {
    /// Create a client from chain configuration.
    ///
    /// Reads the signing key, validates addresses, and connects the provider.
    pub fn new(config: ChainConfig) -> SettleResult<Self> {
        config.validate()?;

        let key_path = config
            .signer_key_path
            .as_ref()
            .ok_or_else(|| SettleError::config("signer_key_path is required for settlement"))?;
        let key_text = std::fs::read_to_string(key_path)
            .map_err(|e| SettleError::config(format!("cannot read signer key: {e}")))?;
        let signer = PrivateKeySigner::from_str(key_text.trim())
            .map_err(|e| SettleError::config(format!("invalid signer key: {e}")))?;
        let signer_address = signer.address();

        let vault_address = Address::from_str(config.vault_contract.as_str())
            .map_err(|e| SettleError::InvalidAddress(e.to_string()))?;

        let url = config
            .rpc_url
            .parse()
            .map_err(|e| SettleError::config(format!("invalid rpc url: {e}")))?;
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();

        info!(
            signer = %signer_address,
            vault = %config.vault_contract,
            chain_id = config.chain_id,
            "evm settlement client initialized"
        );

        let treasury = config.treasury_address.clone();
        Ok(Self {
            provider,
            signer_address,
            vault_address,
            treasury,
            config,
        })
    }

    fn parse_recipient(recipient: &WalletAddress) -> SettleResult<Address> {
        Address::from_str(recipient.as_str())
            .map_err(|e| SettleError::InvalidAddress(format!("{recipient}: {e}")))
    }

    fn reward_id(correlation_id: &CorrelationId) -> [u8; 32] {
        keccak256(correlation_id.as_str().as_bytes()).0
    }

    fn classify_send_error(err: impl std::fmt::Display, need: TokenAmount) -> SettleError {
        let text = err.to_string();
        let lower = text.to_lowercase();
        if lower.contains("insufficient funds") {
            SettleError::InsufficientFunds {
                have: TokenAmount::ZERO,
                need,
            }
        } else if lower.contains("revert") {
            SettleError::reverted(text)
        } else if lower.contains("timed out") || lower.contains("timeout") {
            SettleError::timeout(text)
        } else if lower.contains("connect") || lower.contains("transport") {
            SettleError::chain_unavailable(text)
        } else {
            SettleError::unknown(text)
        }
    }

    /// Sample the network fee and apply the configured safety multiplier.
    async fn fee_bid(&self) -> SettleResult<u128> {
        let sampled = self
            .provider
            .get_gas_price()
            .await
            .map_err(|e| SettleError::chain_unavailable(format!("gas price: {e}")))?;
        Ok(self.config.fee.bid(sampled))
    }

    async fn next_nonce(&self) -> SettleResult<u64> {
        self.provider
            .get_transaction_count(self.signer_address)
            .await
            .map_err(|e| SettleError::chain_unavailable(format!("nonce: {e}")))
    }

    /// Best-effort vault balance pre-check before submission.
    ///
    /// The submission result stays authoritative; a pre-check failure other
    /// than a clear shortfall is logged and ignored.
    async fn precheck_balance(&self, need: TokenAmount) -> SettleResult<()> {
        match self.treasury_balance().await {
            Ok(have) if have < need => Err(SettleError::InsufficientFunds { have, need }),
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(error = %e, "vault balance pre-check failed, proceeding to submission");
                Ok(())
            }
        }
    }

    async fn await_receipt(
        &self,
        pending: alloy::providers::PendingTransactionBuilder<alloy::network::Ethereum>,
    ) -> SettleResult<DisbursementReceipt> {
        let tx_hash = *pending.tx_hash();
        let receipt = pending
            .with_timeout(Some(self.config.confirm.timeout))
            .get_receipt()
            .await
            .map_err(|e| {
                // Not a failure verdict: the transaction may still land.
                SettleError::timeout(format!("no receipt for {tx_hash}: {e}"))
            })?;

        if !receipt.status() {
            return Err(SettleError::reverted(format!(
                "transaction {tx_hash} reverted in block {:?}",
                receipt.block_number
            )));
        }

        let fee_paid = TokenAmount::from_base_units(
            (receipt.gas_used as u128).saturating_mul(receipt.effective_gas_price),
        );
        Ok(DisbursementReceipt {
            tx_hash: TxHash::parse(&format!("{tx_hash:#x}"))
                .map_err(|e| SettleError::unknown(format!("bad receipt hash: {e}")))?,
            fee_paid,
            block_number: receipt.block_number.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl SettlementClient for EvmSettlementClient {
    fn treasury_address(&self) -> &WalletAddress {
        &self.treasury
    }

    async fn treasury_balance(&self) -> SettleResult<TokenAmount> {
        let vault = RewardVault::new(self.vault_address, self.provider.clone());
        let balance = vault
            .getVaultBalance()
            .call()
            .await
            .map_err(|e| SettleError::chain_unavailable(format!("vault balance: {e}")))?;
        let units = u128::try_from(balance)
            .map_err(|_| SettleError::unknown("vault balance exceeds u128"))?;
        Ok(TokenAmount::from_base_units(units))
    }

    async fn disburse(
        &self,
        recipient: &WalletAddress,
        amount: TokenAmount,
        correlation_id: &CorrelationId,
    ) -> SettleResult<DisbursementReceipt> {
        let to = Self::parse_recipient(recipient)?;
        self.precheck_balance(amount).await?;

        let nonce = self.next_nonce().await?;
        let fee = self.fee_bid().await?;
        let vault = RewardVault::new(self.vault_address, self.provider.clone());

        info!(
            recipient = %recipient.masked(),
            amount = %amount,
            correlation_id = %correlation_id,
            nonce,
            "submitting disbursement"
        );

        let pending = vault
            .disburseReward(to, U256::from(amount.base_units()), correlation_id.as_str().to_string())
            .nonce(nonce)
            .gas(self.config.fee.gas_limit)
            .gas_price(fee)
            .send()
            .await
            .map_err(|e| Self::classify_send_error(e, amount))?;

        let receipt = self.await_receipt(pending).await?;
        info!(
            tx_hash = %receipt.tx_hash.short(),
            block = receipt.block_number,
            fee = %receipt.fee_paid,
            "disbursement confirmed"
        );
        Ok(receipt)
    }

    async fn disburse_batch(
        &self,
        entries: &[DisbursementRequest],
    ) -> SettleResult<DisbursementReceipt> {
        if entries.is_empty() {
            return Err(SettleError::invalid_batch("empty batch"));
        }
        if entries.len() > MAX_DISBURSE_BATCH {
            return Err(SettleError::invalid_batch(format!(
                "{} entries exceeds cap of {MAX_DISBURSE_BATCH}",
                entries.len()
            )));
        }

        let mut recipients = Vec::with_capacity(entries.len());
        let mut amounts = Vec::with_capacity(entries.len());
        let mut correlation_ids = Vec::with_capacity(entries.len());
        let mut total = TokenAmount::ZERO;
        for entry in entries {
            recipients.push(Self::parse_recipient(&entry.recipient)?);
            amounts.push(U256::from(entry.amount.base_units()));
            correlation_ids.push(entry.correlation_id.as_str().to_string());
            total = total
                .checked_add(entry.amount)
                .ok_or_else(|| SettleError::invalid_batch("batch total overflow"))?;
        }
        self.precheck_balance(total).await?;

        let nonce = self.next_nonce().await?;
        let fee = self.fee_bid().await?;
        let vault = RewardVault::new(self.vault_address, self.provider.clone());

        info!(entries = entries.len(), total = %total, nonce, "submitting batch disbursement");

        let pending = vault
            .batchDisburseRewards(recipients, amounts, correlation_ids)
            .nonce(nonce)
            .gas(self.config.fee.gas_limit.saturating_mul(entries.len() as u64))
            .gas_price(fee)
            .send()
            .await
            .map_err(|e| Self::classify_send_error(e, total))?;

        self.await_receipt(pending).await
    }

    async fn verify_disbursement(&self, tx_hash: &TxHash) -> SettleResult<DisbursementStatus> {
        let hash = AlloyTxHash::from_str(tx_hash.as_str())
            .map_err(|e| SettleError::unknown(format!("bad tx hash: {e}")))?;
        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| SettleError::chain_unavailable(format!("receipt query: {e}")))?;

        Ok(match receipt {
            None => DisbursementStatus::Pending,
            Some(r) if r.status() => DisbursementStatus::Confirmed {
                block_number: r.block_number.unwrap_or_default(),
            },
            Some(r) => DisbursementStatus::Failed {
                reason: format!("reverted in block {:?}", r.block_number),
            },
        })
    }

    async fn is_disbursed(&self, correlation_id: &CorrelationId) -> SettleResult<bool> {
        let vault = RewardVault::new(self.vault_address, self.provider.clone());
        vault
            .isRewardProcessed(Self::reward_id(correlation_id).into())
            .call()
            .await
            .map_err(|e| SettleError::chain_unavailable(format!("reward lookup: {e}")))
    }
}

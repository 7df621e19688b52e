//! Withdrawal flow: pay the available balance out on-chain.
//!
//! The balance is mutated if and only if the disbursement confirmed. On any
//! failure or timeout the balance is left untouched and the error says so —
//! the rarer inverse risk (a transfer that landed after we stopped waiting)
//! is handled by the correlation id, which a reconciliation job can match
//! against the chain before any retry is paid again.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use goodplay_store::WithdrawalLog;
use goodplay_types::{
    CorrelationId, DayStamp, TokenAmount, TxHash, WalletAddress, WithdrawalRecord,
};

use crate::error::{OpsError, OpsResult};
use crate::{current_timestamp, Engine};

/// A confirmed withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    /// Amount sent on-chain.
    pub amount: TokenAmount,
    /// Confirmed transaction hash.
    pub tx_hash: TxHash,
    /// Inclusion block.
    pub block_number: u64,
    /// Available balance after the withdrawal (zero).
    pub remaining_balance: TokenAmount,
}

fn fresh_withdrawal_id() -> CorrelationId {
    let hex = Uuid::new_v4().simple().to_string();
    CorrelationId::new(format!("WITHDRAW-{}", hex[..8].to_uppercase()))
}

impl Engine {
    /// Withdraw the wallet's full available balance to its on-chain account.
    pub async fn withdraw(&self, wallet: &WalletAddress) -> OpsResult<WithdrawalReceipt> {
        // One withdrawal per wallet at a time: the read-disburse-debit
        // sequence below spans the chain call and cannot be covered by a
        // single store transaction.
        let lock = self.wallet_lock(wallet).await;
        let _guard = lock.lock().await;

        let balance = self.balance_fresh(wallet)?;
        let amount = balance.available;

        if amount < self.config.withdrawals.min {
            return Err(OpsError::BelowMinimum {
                amount,
                minimum: self.config.withdrawals.min,
            });
        }
        if amount > self.config.withdrawals.max {
            return Err(OpsError::AboveMaximum {
                amount,
                maximum: self.config.withdrawals.max,
            });
        }

        let correlation_id = fresh_withdrawal_id();
        info!(
            wallet = %wallet.masked(),
            amount = %amount,
            correlation_id = %correlation_id,
            "submitting withdrawal"
        );

        let receipt = match self
            .settlement
            .disburse(wallet, amount, &correlation_id)
            .await
        {
            Ok(receipt) => receipt,
            Err(source) => {
                warn!(
                    wallet = %wallet.masked(),
                    correlation_id = %correlation_id,
                    error = %source,
                    "withdrawal disbursement failed, balance untouched"
                );
                return Err(OpsError::WithdrawalFailed { source });
            }
        };

        // Only now, with on-chain confirmation in hand, is the ledger
        // debited and the withdrawal recorded.
        let now = current_timestamp();
        let updated = self.apply_delta(wallet, TokenAmount::ZERO, amount)?;
        self.store.withdrawals.insert(&WithdrawalRecord {
            wallet: wallet.clone(),
            amount,
            tx_hash: receipt.tx_hash.clone(),
            correlation_id,
            day: DayStamp::from_timestamp(now),
            created_at: now,
        })?;

        info!(
            wallet = %wallet.masked(),
            amount = %amount,
            tx_hash = %receipt.tx_hash.short(),
            "withdrawal confirmed"
        );

        Ok(WithdrawalReceipt {
            amount,
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
            remaining_balance: updated.available,
        })
    }
}

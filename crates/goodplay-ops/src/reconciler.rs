//! Deposit reconciliation: bring the internal ledger into agreement with
//! observed on-chain transfers.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use goodplay_settle::BlockRange;
use goodplay_store::{DepositLog, StoreError};
use goodplay_types::{DepositRecord, TokenAmount, WalletAddress};

use crate::error::{OpsError, OpsResult};
use crate::{current_timestamp, Engine};

/// What one reconciliation pass did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Deposits newly verified and credited by this pass.
    pub verified_count: u32,
    /// Sum of the newly credited amounts.
    pub total_amount: TokenAmount,
    /// Candidates skipped because they were already recorded.
    pub skipped_duplicates: u32,
    /// Candidates skipped because the amount was outside the deposit bounds.
    pub skipped_out_of_bounds: u32,
}

impl ReconcileReport {
    fn empty() -> Self {
        Self {
            verified_count: 0,
            total_amount: TokenAmount::ZERO,
            skipped_duplicates: 0,
            skipped_out_of_bounds: 0,
        }
    }
}

impl Engine {
    /// Scan the chain for deposits from `wallet` to the treasury and credit
    /// every verified, previously unseen, in-bounds transfer exactly once.
    ///
    /// Idempotent: a second pass with no new on-chain activity verifies
    /// nothing. A scan that succeeds but finds nothing is an empty report,
    /// not an error; an unreachable chain surfaces as a retryable
    /// `ChainUnavailable`. Concurrent passes for the same wallet cannot
    /// double-credit — the deposit log's uniqueness constraint, not call
    /// ordering, is the enforcement point.
    pub async fn reconcile_deposits(&self, wallet: &WalletAddress) -> OpsResult<ReconcileReport> {
        let latest = self.scanner.latest_block().await?;
        let range = BlockRange::lookback(
            latest,
            self.config.scan.lookback_hours,
            self.config.scan.blocks_per_hour,
        );

        let candidates = self
            .scanner
            .scan_transfers(wallet, self.settlement.treasury_address(), range, None)
            .await?;

        if candidates.is_empty() {
            debug!(wallet = %wallet.masked(), "no pending deposits found");
            return Ok(ReconcileReport::empty());
        }

        let recorded = self.store.deposits.recorded_tx_hashes(wallet)?;
        let mut report = ReconcileReport::empty();

        for candidate in candidates {
            if recorded.contains(&candidate.tx_hash) {
                debug!(
                    wallet = %wallet.masked(),
                    tx_hash = %candidate.tx_hash.short(),
                    "skipping already recorded deposit"
                );
                report.skipped_duplicates += 1;
                continue;
            }
            if !self.config.deposits.contains(candidate.amount) {
                warn!(
                    wallet = %wallet.masked(),
                    tx_hash = %candidate.tx_hash.short(),
                    amount = %candidate.amount,
                    "deposit amount out of bounds, skipping"
                );
                report.skipped_out_of_bounds += 1;
                continue;
            }

            let record = DepositRecord {
                wallet: wallet.clone(),
                amount: candidate.amount,
                tx_hash: candidate.tx_hash.clone(),
                block_number: candidate.block_number,
                observed_at: candidate.timestamp.unwrap_or_else(current_timestamp),
            };

            match self.credit_deposit(&record) {
                Ok(_) => {
                    report.verified_count += 1;
                    report.total_amount = report
                        .total_amount
                        .checked_add(candidate.amount)
                        .unwrap_or(report.total_amount);
                }
                Err(OpsError::Store(StoreError::DuplicateDeposit(_))) => {
                    // A concurrent pass won the race for this transaction.
                    report.skipped_duplicates += 1;
                }
                Err(e) => {
                    warn!(
                        wallet = %wallet.masked(),
                        tx_hash = %candidate.tx_hash.short(),
                        error = %e,
                        "failed to record deposit, continuing"
                    );
                }
            }
        }

        info!(
            wallet = %wallet.masked(),
            verified = report.verified_count,
            total = %report.total_amount,
            duplicates = report.skipped_duplicates,
            out_of_bounds = report.skipped_out_of_bounds,
            "deposit reconciliation finished"
        );
        Ok(report)
    }
}

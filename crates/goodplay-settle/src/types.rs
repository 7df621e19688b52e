//! Core types for the settlement boundary.

use serde::{Deserialize, Serialize};

use goodplay_types::{CorrelationId, Timestamp, TokenAmount, TxHash, WalletAddress};

/// One token transfer observed on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEvent {
    /// Transaction the transfer happened in.
    pub tx_hash: TxHash,
    /// Transferred amount.
    pub amount: TokenAmount,
    /// Block the transfer was included in.
    pub block_number: u64,
    /// Block timestamp, when the scan could resolve it.
    pub timestamp: Option<Timestamp>,
}

/// An inclusive block range to scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRange {
    /// First block of the window.
    pub from_block: u64,
    /// Last block of the window.
    pub to_block: u64,
}

impl BlockRange {
    /// A window reaching `hours` back from `latest`, assuming
    /// `blocks_per_hour` chain throughput.
    pub fn lookback(latest: u64, hours: u64, blocks_per_hour: u64) -> Self {
        Self {
            from_block: latest.saturating_sub(hours.saturating_mul(blocks_per_hour)),
            to_block: latest,
        }
    }

    /// True if the block falls inside the window.
    pub fn contains(&self, block: u64) -> bool {
        block >= self.from_block && block <= self.to_block
    }
}

/// One entry of a (possibly batched) disbursement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisbursementRequest {
    /// Receiving wallet.
    pub recipient: WalletAddress,
    /// Amount to transfer.
    pub amount: TokenAmount,
    /// Correlation id recorded with the transfer for later reconciliation.
    pub correlation_id: CorrelationId,
}

/// Confirmation of a disbursement that landed on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisbursementReceipt {
    /// Confirmed transaction hash.
    pub tx_hash: TxHash,
    /// Fee consumed by the transaction.
    pub fee_paid: TokenAmount,
    /// Block the transaction was included in.
    pub block_number: u64,
}

/// On-chain status of a previously submitted disbursement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisbursementStatus {
    /// Not yet observed in a block.
    Pending,
    /// Included and successful.
    Confirmed {
        /// Inclusion block.
        block_number: u64,
    },
    /// Included but reverted.
    Failed {
        /// Failure reason, as far as it could be determined.
        reason: String,
    },
}

impl DisbursementStatus {
    /// Check if the status is confirmed.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }

    /// Check if the status is pending.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Check if the status is failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookback_range() {
        let range = BlockRange::lookback(100_000, 24, 720);
        assert_eq!(range.from_block, 100_000 - 17_280);
        assert_eq!(range.to_block, 100_000);
        assert!(range.contains(90_000));
        assert!(!range.contains(100_001));
        assert!(!range.contains(range.from_block - 1));
    }

    #[test]
    fn test_lookback_saturates_at_genesis() {
        let range = BlockRange::lookback(100, 24, 720);
        assert_eq!(range.from_block, 0);
    }

    #[test]
    fn test_status_helpers() {
        assert!(DisbursementStatus::Pending.is_pending());
        assert!(DisbursementStatus::Confirmed { block_number: 7 }.is_confirmed());
        assert!(DisbursementStatus::Failed {
            reason: "out of gas".into()
        }
        .is_failed());
    }
}

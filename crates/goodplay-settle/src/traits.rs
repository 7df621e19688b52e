//! Scanner and settlement client trait definitions.

use async_trait::async_trait;

use goodplay_types::{CorrelationId, TokenAmount, TxHash, WalletAddress};

use crate::error::SettleResult;
use crate::types::{
    BlockRange, DisbursementReceipt, DisbursementRequest, DisbursementStatus, TransferEvent,
};

/// Read-only access to on-chain token transfer logs.
///
/// Pure reads, no local state. A scan that reaches the chain but finds
/// nothing returns an empty vector; failure to reach the chain at all is
/// `ChainUnavailable` — callers must treat that as retryable, never as
/// "zero deposits found".
#[async_trait]
pub trait LogScanner: Send + Sync {
    /// The most recent block number the endpoint knows of.
    async fn latest_block(&self) -> SettleResult<u64>;

    /// Transfer events of the reward token from `sender` to `recipient`
    /// within the block range, oldest first.
    ///
    /// With `expected_amount`, only exact-amount matches are returned.
    /// Individually malformed log entries are skipped with a log line; a
    /// bad entry never hides well-formed entries around it.
    async fn scan_transfers(
        &self,
        sender: &WalletAddress,
        recipient: &WalletAddress,
        range: BlockRange,
        expected_amount: Option<TokenAmount>,
    ) -> SettleResult<Vec<TransferEvent>>;
}

/// Outbound token transfers against the external chain.
///
/// Every operation that submits a transaction is irreversible once sent: a
/// [`Timeout`](crate::SettleError::Timeout) does not mean the transfer did
/// not land, so callers must never blindly re-send the same semantic
/// transfer. The correlation id is recorded on-chain with each disbursement
/// and [`is_disbursed`](Self::is_disbursed) answers whether an attempt
/// actually went through.
#[async_trait]
pub trait SettlementClient: Send + Sync {
    /// The treasury account deposits are sent to and rewards are paid from.
    fn treasury_address(&self) -> &WalletAddress;

    /// Current treasury balance.
    ///
    /// Used as a best-effort pre-check before submission; the authoritative
    /// outcome is always the submission result, since chain state can change
    /// between check and send.
    async fn treasury_balance(&self) -> SettleResult<TokenAmount>;

    /// Transfer `amount` to `recipient`, tagged with `correlation_id`, and
    /// wait (bounded) for inclusion.
    ///
    /// Determines the signer's nonce, bids the sampled network fee times the
    /// configured safety multiplier, signs, submits, and polls for the
    /// receipt up to the configured confirmation timeout.
    async fn disburse(
        &self,
        recipient: &WalletAddress,
        amount: TokenAmount,
        correlation_id: &CorrelationId,
    ) -> SettleResult<DisbursementReceipt>;

    /// Transfer to many recipients in one transaction.
    ///
    /// Rejected with `InvalidBatch` before any chain interaction when empty
    /// or over the batch cap.
    async fn disburse_batch(
        &self,
        entries: &[DisbursementRequest],
    ) -> SettleResult<DisbursementReceipt>;

    /// On-chain status of a previously submitted transaction.
    async fn verify_disbursement(&self, tx_hash: &TxHash) -> SettleResult<DisbursementStatus>;

    /// Whether a disbursement with this correlation id already landed.
    ///
    /// The reconciliation primitive behind "timed out is not failed".
    async fn is_disbursed(&self, correlation_id: &CorrelationId) -> SettleResult<bool>;
}

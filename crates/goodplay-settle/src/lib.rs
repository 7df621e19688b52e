//! On-chain settlement boundary for the GoodPlay reward engine.
//!
//! Everything that touches the external ledger lives here, behind two
//! traits:
//!
//! - [`LogScanner`] — pure reads of token transfer logs (deposit detection)
//! - [`SettlementClient`] — outbound transfers with nonce/fee management and
//!   bounded confirmation waits (reward payouts and withdrawals)
//!
//! # Architecture
//!
//! ```text
//! goodplay-ops                   goodplay-settle
//! ┌──────────────────┐          ┌──────────────────────────┐
//! │ reconcile        │ ───────► │ LogScanner (trait)       │
//! │ complete_session │          │   ├─ HttpLogScanner      │
//! │ withdraw         │ ───────► │   └─ MockChain           │
//! └──────────────────┘          │ SettlementClient (trait) │
//!                               │   ├─ EvmSettlementClient │  (evm-sdk)
//!                               │   └─ MockChain           │
//!                               └────────────┬─────────────┘
//!                                            ▼
//!                                  EVM JSON-RPC endpoint
//! ```
//!
//! # Irreversibility
//!
//! A submitted transaction cannot be recalled, and a confirmation timeout is
//! not a failure verdict. Callers tag every disbursement with a
//! [`CorrelationId`](goodplay_types::CorrelationId) and use
//! [`SettlementClient::is_disbursed`] to reconcile uncertain attempts
//! instead of re-sending them.
//!
//! # Testing
//!
//! [`MockChain`] implements both traits over in-memory state, with seedable
//! transfers and failure injection:
//!
//! ```rust
//! use goodplay_settle::{MockChain, SettlementClient};
//! use goodplay_types::{CorrelationId, TokenAmount, WalletAddress};
//!
//! # async fn example() -> goodplay_settle::SettleResult<()> {
//! let treasury = WalletAddress::parse("0x1111111111111111111111111111111111111111").unwrap();
//! let chain = MockChain::builder()
//!     .treasury_address(treasury)
//!     .treasury_balance(TokenAmount::from_tokens(1_000))
//!     .build();
//!
//! let user = WalletAddress::parse("0xff00a683f7bd77665754a65f2b82fdefc4371a50").unwrap();
//! let receipt = chain
//!     .disburse(&user, TokenAmount::from_tokens(20), &CorrelationId::new("GAME-1A2B3C4D"))
//!     .await?;
//! assert!(chain.is_disbursed(&CorrelationId::new("GAME-1A2B3C4D")).await?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
#[cfg(feature = "evm-sdk")]
mod evm;
pub mod mock;
pub mod retry;
pub mod rpc;
pub mod traits;
pub mod types;

pub use config::{ChainConfig, ConfirmConfig, FeeConfig, RetryConfig, ScanConfig};
pub use error::{SettleError, SettleResult};
#[cfg(feature = "evm-sdk")]
pub use evm::EvmSettlementClient;
pub use mock::{MockChain, MockChainBuilder};
pub use retry::RetryPolicy;
pub use rpc::HttpLogScanner;
pub use traits::{LogScanner, SettlementClient};
pub use types::{
    BlockRange, DisbursementReceipt, DisbursementRequest, DisbursementStatus, TransferEvent,
};

#[cfg(test)]
mod tests {
    use super::*;
    use goodplay_types::{CorrelationId, TokenAmount, WalletAddress};

    fn addr(last: &str) -> WalletAddress {
        WalletAddress::parse(&format!("0x{:0>40}", last)).unwrap()
    }

    #[tokio::test]
    async fn test_trait_objects() {
        let chain = std::sync::Arc::new(
            MockChain::builder()
                .treasury_address(addr("feed"))
                .treasury_balance(TokenAmount::from_tokens(100))
                .build(),
        );

        let scanner: std::sync::Arc<dyn LogScanner> = chain.clone();
        let settlement: std::sync::Arc<dyn SettlementClient> = chain;

        assert!(scanner.latest_block().await.unwrap() > 0);
        assert_eq!(
            settlement.treasury_balance().await.unwrap(),
            TokenAmount::from_tokens(100)
        );
    }

    #[tokio::test]
    async fn test_deposit_then_scan_roundtrip() {
        let treasury = addr("feed");
        let user = addr("beef");
        let chain = MockChain::builder().treasury_address(treasury.clone()).build();

        chain.seed_transfer(&user, &treasury, TokenAmount::from_tokens(150), 99_500);

        let latest = chain.latest_block().await.unwrap();
        let range = BlockRange::lookback(latest, 24, 720);
        let events = chain
            .scan_transfers(&user, &treasury, range, None)
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].amount, TokenAmount::from_tokens(150));
    }

    #[tokio::test]
    async fn test_timeout_is_not_a_failure_verdict() {
        let chain = MockChain::builder()
            .treasury_address(addr("feed"))
            .treasury_balance(TokenAmount::from_tokens(100))
            .build();
        let corr = CorrelationId::new("WITHDRAW-TIMEOUT1");

        chain.fail_next_disburse(SettleError::timeout("no receipt after 120s"));
        let err = chain
            .disburse(&addr("beef"), TokenAmount::from_tokens(10), &corr)
            .await
            .unwrap_err();

        // Retryable classification, but the correlation id — not a retry —
        // is how the caller finds out what actually happened.
        assert!(err.is_retryable());
        assert!(!chain.is_disbursed(&corr).await.unwrap());
    }
}

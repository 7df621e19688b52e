//! Balance ledger and game engine operations.
//!
//! [`Engine`] composes the persistent store, the chain scanner, and the
//! settlement client into the operations the presentation layer calls:
//!
//! - [`balance`](Engine::balance) — cache-aware balance read
//! - [`reconcile_deposits`](Engine::reconcile_deposits) — idempotent
//!   deposit detection and crediting
//! - [`start_session`](Engine::start_session) /
//!   [`complete_session`](Engine::complete_session) — the game session
//!   state machine
//! - [`withdraw`](Engine::withdraw) — bounds-checked withdrawal, balance
//!   mutated only on confirmed disbursement
//!
//! No operation bypasses the ledger's apply-delta funnel for balance
//! mutation, and no operation trusts local memory over the chain: deposits
//! are re-derived from transfer logs, payouts from submission results.

pub mod cache;
pub mod error;
mod ledger;
mod reconciler;
mod sessions;
mod withdraw;

pub use cache::BalanceCache;
pub use error::{OpsError, OpsResult};
pub use reconciler::ReconcileReport;
pub use sessions::{SessionResult, SessionStart};
pub use withdraw::WithdrawalReceipt;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use goodplay_rewards::{DepositBounds, RewardConfig, WithdrawalBounds};
use goodplay_settle::{LogScanner, ScanConfig, SettlementClient};
use goodplay_store::GameStore;
use goodplay_types::constants::BALANCE_CACHE_TTL;
use goodplay_types::{Timestamp, WalletAddress};

/// Engine-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Accepted deposit range; out-of-bounds deposits are skipped.
    pub deposits: DepositBounds,
    /// Withdrawal floor and ceiling.
    pub withdrawals: WithdrawalBounds,
    /// Payout tables, bet bounds, and daily caps.
    pub rewards: RewardConfig,
    /// Deposit scan window.
    pub scan: ScanConfig,
    /// Balance read cache time-to-live.
    #[serde(skip, default = "default_cache_ttl")]
    pub cache_ttl: Duration,
}

fn default_cache_ttl() -> Duration {
    BALANCE_CACHE_TTL
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            deposits: DepositBounds::default(),
            withdrawals: WithdrawalBounds::default(),
            rewards: RewardConfig::default(),
            scan: ScanConfig::default(),
            cache_ttl: BALANCE_CACHE_TTL,
        }
    }
}

/// The balance ledger and game engine.
pub struct Engine {
    pub(crate) store: GameStore,
    pub(crate) scanner: Arc<dyn LogScanner>,
    pub(crate) settlement: Arc<dyn SettlementClient>,
    pub(crate) config: EngineConfig,
    pub(crate) cache: BalanceCache,
    wallet_locks: tokio::sync::Mutex<HashMap<WalletAddress, Arc<tokio::sync::Mutex<()>>>>,
}

impl Engine {
    /// Create an engine over a store and chain clients.
    pub fn new(
        store: GameStore,
        scanner: Arc<dyn LogScanner>,
        settlement: Arc<dyn SettlementClient>,
        config: EngineConfig,
    ) -> Self {
        let cache = BalanceCache::new(config.cache_ttl);
        Self {
            store,
            scanner,
            settlement,
            config,
            cache,
            wallet_locks: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &GameStore {
        &self.store
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The mutual-exclusion scope for one wallet.
    ///
    /// Held across check-then-act sequences that the store's transaction
    /// cannot cover on its own (the withdrawal's read → disburse → debit).
    pub(crate) async fn wallet_lock(
        &self,
        wallet: &WalletAddress,
    ) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.wallet_locks.lock().await;
        Arc::clone(locks.entry(wallet.clone()).or_default())
    }
}

/// Current time in milliseconds since the Unix epoch.
pub(crate) fn current_timestamp() -> Timestamp {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as Timestamp)
        .unwrap_or(0)
}

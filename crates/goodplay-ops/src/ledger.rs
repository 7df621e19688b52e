//! Balance ledger: the cache-fronted apply-delta funnel.
//!
//! All balance mutation in the engine goes through these methods. The store
//! enforces atomicity and the non-negative post-condition; this layer owns
//! the read cache and invalidates it synchronously before any successful
//! mutation returns.

use goodplay_store::BalanceStore;
use goodplay_types::{DepositRecord, TokenAmount, UserBalance, WalletAddress};

use crate::error::OpsResult;
use crate::Engine;

impl Engine {
    /// The wallet's balance, served from the short-lived cache when fresh.
    pub fn balance(&self, wallet: &WalletAddress) -> OpsResult<UserBalance> {
        if let Some(cached) = self.cache.get(wallet) {
            return Ok(cached);
        }
        let balance = self.store.balances.read(wallet)?;
        self.cache.insert(balance.clone());
        Ok(balance)
    }

    /// The wallet's balance straight from the store, bypassing the cache.
    ///
    /// Used where a decision hangs on the value (withdrawal bounds), not
    /// just a display.
    pub fn balance_fresh(&self, wallet: &WalletAddress) -> OpsResult<UserBalance> {
        Ok(self.store.balances.read(wallet)?)
    }

    /// Apply earned/withdrawn deltas through the store's atomic
    /// read-modify-write, then invalidate the cache entry.
    pub(crate) fn apply_delta(
        &self,
        wallet: &WalletAddress,
        earned: TokenAmount,
        withdrawn: TokenAmount,
    ) -> OpsResult<UserBalance> {
        let balance = self.store.balances.apply_delta(wallet, earned, withdrawn)?;
        self.cache.invalidate(wallet);
        Ok(balance)
    }

    /// Record and credit a verified deposit, then invalidate the cache
    /// entry.
    pub(crate) fn credit_deposit(&self, record: &DepositRecord) -> OpsResult<UserBalance> {
        let balance = self.store.balances.credit_deposit(record)?;
        self.cache.invalidate(&record.wallet);
        Ok(balance)
    }
}

//! Bounded TTL cache for balance reads.
//!
//! Owned by the ledger, never shared ambient state. Entries expire after a
//! short TTL and are invalidated synchronously by every successful balance
//! mutation, so a caller that writes then reads never sees a stale value.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use goodplay_types::{UserBalance, WalletAddress};

/// Thread-safe TTL cache keyed by wallet.
pub struct BalanceCache {
    entries: Mutex<HashMap<WalletAddress, (UserBalance, Instant)>>,
    ttl: Duration,
}

impl BalanceCache {
    /// Create a cache with the given time-to-live.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// A cached balance, if present and not expired.
    ///
    /// A poisoned lock degrades to a miss; the cache is an optimization, not
    /// a source of truth.
    pub fn get(&self, wallet: &WalletAddress) -> Option<UserBalance> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(wallet) {
            Some((balance, stored_at)) if stored_at.elapsed() < self.ttl => {
                tracing::debug!(wallet = %wallet.masked(), "balance cache hit");
                Some(balance.clone())
            }
            Some(_) => {
                entries.remove(wallet);
                None
            }
            None => None,
        }
    }

    /// Store a balance.
    pub fn insert(&self, balance: UserBalance) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(balance.wallet.clone(), (balance, Instant::now()));
        }
    }

    /// Drop the entry for a wallet. Called by the ledger before any
    /// successful mutation returns.
    pub fn invalidate(&self, wallet: &WalletAddress) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(wallet);
        }
    }

    /// Number of live entries (expired ones included until next access).
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// True if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use goodplay_types::TokenAmount;

    fn wallet() -> WalletAddress {
        WalletAddress::parse("0xff00a683f7bd77665754a65f2b82fdefc4371a50").unwrap()
    }

    fn balance(tokens: u64) -> UserBalance {
        let mut b = UserBalance::empty(wallet());
        b.available = TokenAmount::from_tokens(tokens);
        b.total_earned = TokenAmount::from_tokens(tokens);
        b
    }

    #[test]
    fn test_hit_within_ttl() {
        let cache = BalanceCache::new(Duration::from_secs(30));
        cache.insert(balance(100));
        assert_eq!(cache.get(&wallet()), Some(balance(100)));
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = BalanceCache::new(Duration::from_millis(10));
        cache.insert(balance(100));
        std::thread::sleep(Duration::from_millis(25));
        assert!(cache.get(&wallet()).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_removes_entry() {
        let cache = BalanceCache::new(Duration::from_secs(30));
        cache.insert(balance(100));
        cache.invalidate(&wallet());
        assert!(cache.get(&wallet()).is_none());
    }

    #[test]
    fn test_insert_overwrites() {
        let cache = BalanceCache::new(Duration::from_secs(30));
        cache.insert(balance(100));
        cache.insert(balance(250));
        assert_eq!(cache.get(&wallet()).unwrap().available, TokenAmount::from_tokens(250));
        assert_eq!(cache.len(), 1);
    }
}

//! Protocol-wide constants.
//!
//! Limits and timings that every component agrees on. Deployment-specific
//! values (RPC endpoint, contract addresses, signing keys) live in config
//! structs instead.

use std::time::Duration;

/// Decimal places of the reward token (ERC-20 standard 18).
pub const TOKEN_DECIMALS: u32 = 18;

/// Minimum single deposit credited to a game balance, in whole tokens.
pub const MIN_DEPOSIT_TOKENS: u64 = 100;

/// Maximum single deposit credited to a game balance, in whole tokens.
pub const MAX_DEPOSIT_TOKENS: u64 = 500;

/// Minimum withdrawal, in whole tokens.
pub const MIN_WITHDRAWAL_TOKENS: u64 = 100;

/// Maximum withdrawal, in whole tokens. Larger balances are routed to
/// manual handling.
pub const MAX_WITHDRAWAL_TOKENS: u64 = 10_000;

/// Approximate chain throughput used to translate hours into block ranges
/// (5-second block time).
pub const BLOCKS_PER_HOUR: u64 = 720;

/// How far back the deposit scan looks by default.
pub const DEPOSIT_LOOKBACK_HOURS: u64 = 24;

/// Hard cap on entries in a single batch disbursement.
pub const MAX_DISBURSE_BATCH: usize = 50;

/// Fee bid safety multiplier over the sampled network fee rate, in basis
/// points (12_000 = 1.2x).
pub const FEE_MULTIPLIER_BPS: u64 = 12_000;

/// Gas limit for a single token transfer or reward disbursement.
pub const DISBURSE_GAS_LIMIT: u64 = 250_000;

/// Upper bound on waiting for on-chain inclusion of a submitted transaction.
pub const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(120);

/// How often the receipt poll loop re-queries while waiting for inclusion.
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Time-to-live of the ledger's balance read cache.
pub const BALANCE_CACHE_TTL: Duration = Duration::from_secs(30);

/// Default daily play cap for the crash game.
pub const CRASH_PLAYS_PER_DAY: u32 = 20;

/// Default daily play cap for every other game kind.
pub const DEFAULT_PLAYS_PER_DAY: u32 = 10;

//! Configuration for the chain boundary.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use goodplay_types::constants::{
    BLOCKS_PER_HOUR, CONFIRMATION_TIMEOUT, DEPOSIT_LOOKBACK_HOURS, DISBURSE_GAS_LIMIT,
    FEE_MULTIPLIER_BPS, RECEIPT_POLL_INTERVAL,
};
use goodplay_types::WalletAddress;

use crate::error::{SettleError, SettleResult};

/// Everything the scanner and settlement client need to talk to one chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// JSON-RPC endpoint.
    pub rpc_url: String,

    /// Chain id included in signed transactions.
    pub chain_id: u64,

    /// Reward token (ERC-20) contract address.
    pub token_contract: WalletAddress,

    /// Treasury address: deposits arrive here, rewards are paid from here.
    pub treasury_address: WalletAddress,

    /// Reward vault contract address (direct payouts and correlation ids).
    pub vault_contract: WalletAddress,

    /// Path to the signing key for outbound transfers.
    pub signer_key_path: Option<PathBuf>,

    /// Fee bidding parameters.
    pub fee: FeeConfig,

    /// Confirmation wait parameters.
    pub confirm: ConfirmConfig,

    /// Retry policy for chain reads.
    pub retry: RetryConfig,

    /// Deposit scan window parameters.
    pub scan: ScanConfig,
}

impl ChainConfig {
    /// Validate the configuration before constructing clients from it.
    pub fn validate(&self) -> SettleResult<()> {
        if self.rpc_url.is_empty() {
            return Err(SettleError::config("rpc_url must not be empty"));
        }
        if self.fee.multiplier_bps < 10_000 {
            return Err(SettleError::config(
                "fee multiplier must be at least 1.0x (10000 bps)",
            ));
        }
        if let Some(path) = &self.signer_key_path {
            if !path.exists() {
                return Err(SettleError::config(format!(
                    "signer key file not found: {}",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        // Celo mainnet; the zero addresses must be overridden per deployment.
        let zero = WalletAddress::parse("0x0000000000000000000000000000000000000000")
            .expect("zero address is well-formed");
        Self {
            rpc_url: "https://forno.celo.org".to_string(),
            chain_id: 42_220,
            token_contract: zero.clone(),
            treasury_address: zero.clone(),
            vault_contract: zero,
            signer_key_path: None,
            fee: FeeConfig::default(),
            confirm: ConfirmConfig::default(),
            retry: RetryConfig::default(),
            scan: ScanConfig::default(),
        }
    }
}

/// Fee bidding parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Safety multiplier over the sampled network fee, in basis points.
    pub multiplier_bps: u64,
    /// Gas limit per disbursement transaction.
    pub gas_limit: u64,
}

impl FeeConfig {
    /// Apply the multiplier to a sampled fee rate.
    pub fn bid(&self, sampled_fee: u128) -> u128 {
        sampled_fee.saturating_mul(self.multiplier_bps as u128) / 10_000
    }
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            multiplier_bps: FEE_MULTIPLIER_BPS,
            gas_limit: DISBURSE_GAS_LIMIT,
        }
    }
}

/// Confirmation wait parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConfirmConfig {
    /// Upper bound on waiting for inclusion.
    #[serde(with = "duration_millis")]
    pub timeout: Duration,
    /// Receipt polling cadence.
    #[serde(with = "duration_millis")]
    pub poll_interval: Duration,
}

impl Default for ConfirmConfig {
    fn default() -> Self {
        Self {
            timeout: CONFIRMATION_TIMEOUT,
            poll_interval: RECEIPT_POLL_INTERVAL,
        }
    }
}

/// Retry policy configuration for chain reads.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Base delay between retries.
    #[serde(with = "duration_millis")]
    pub base_delay: Duration,
    /// Maximum delay between retries.
    #[serde(with = "duration_millis")]
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Deposit scan window parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Approximate blocks produced per hour.
    pub blocks_per_hour: u64,
    /// How far back the deposit scan looks.
    pub lookback_hours: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            blocks_per_hour: BLOCKS_PER_HOUR,
            lookback_hours: DEPOSIT_LOOKBACK_HOURS,
        }
    }
}

/// Serde helper storing Durations as integer milliseconds.
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_targets_celo() {
        let config = ChainConfig::default();
        assert_eq!(config.chain_id, 42_220);
        assert_eq!(config.scan.blocks_per_hour, 720);
        assert_eq!(config.scan.lookback_hours, 24);
    }

    #[test]
    fn test_fee_bid_multiplier() {
        let fee = FeeConfig::default();
        assert_eq!(fee.bid(10_000_000_000), 12_000_000_000);
        assert_eq!(FeeConfig { multiplier_bps: 10_000, gas_limit: 1 }.bid(500), 500);
    }

    #[test]
    fn test_validate_rejects_sub_one_multiplier() {
        let config = ChainConfig {
            fee: FeeConfig {
                multiplier_bps: 9_000,
                gas_limit: DISBURSE_GAS_LIMIT,
            },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SettleError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_missing_key_file() {
        let config = ChainConfig {
            signer_key_path: Some(PathBuf::from("/definitely/not/here.key")),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = ChainConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: ChainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.confirm.timeout, config.confirm.timeout);
        assert_eq!(back.retry.max_attempts, config.retry.max_attempts);
    }
}

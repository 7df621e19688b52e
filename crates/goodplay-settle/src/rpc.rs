//! JSON-RPC log scanner.
//!
//! Talks directly to an EVM JSON-RPC endpoint over HTTP: `eth_blockNumber`
//! for the chain head, `eth_getLogs` filtered on the ERC-20 Transfer topic
//! for deposit detection, `eth_getBlockByNumber` to resolve block
//! timestamps. Reads only; nothing here can move funds.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

use goodplay_types::{Timestamp, TokenAmount, TxHash, WalletAddress};

use crate::config::ChainConfig;
use crate::error::{SettleError, SettleResult};
use crate::retry::RetryPolicy;
use crate::traits::LogScanner;
use crate::types::{BlockRange, TransferEvent};

/// keccak256("Transfer(address,address,uint256)") — the ERC-20 Transfer
/// event signature topic.
pub const TRANSFER_TOPIC: &str =
    "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

/// Per-request HTTP timeout for RPC calls.
const RPC_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Encode an address as a 32-byte log topic (zero-padded on the left).
pub(crate) fn topic_for_address(address: &WalletAddress) -> String {
    format!("0x{}{}", "0".repeat(24), address.hex_digits())
}

/// Parse a `0x`-prefixed hex quantity into a u64.
pub(crate) fn parse_hex_u64(value: &str) -> Option<u64> {
    let digits = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X"))?;
    u64::from_str_radix(digits, 16).ok()
}

/// Minimal JSON-RPC 2.0 client.
struct RpcClient {
    http: reqwest::Client,
    url: String,
}

impl RpcClient {
    fn new(url: &str) -> SettleResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(RPC_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SettleError::config(format!("failed to build http client: {e}")))?;
        Ok(Self {
            http,
            url: url.to_string(),
        })
    }

    async fn call(&self, method: &str, params: Value) -> SettleResult<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1,
        });

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SettleError::chain_unavailable(format!("{method}: {e}")))?;

        let envelope: Value = response
            .json()
            .await
            .map_err(|e| SettleError::chain_unavailable(format!("{method}: bad response: {e}")))?;

        if let Some(err) = envelope.get("error") {
            return Err(SettleError::unknown(format!("{method}: rpc error: {err}")));
        }
        envelope
            .get("result")
            .cloned()
            .ok_or_else(|| SettleError::chain_unavailable(format!("{method}: missing result")))
    }
}

/// JSON-RPC backed [`LogScanner`].
pub struct HttpLogScanner {
    rpc: RpcClient,
    token_contract: WalletAddress,
    retry: RetryPolicy,
}

impl HttpLogScanner {
    /// Create a scanner from chain configuration.
    pub fn new(config: &ChainConfig) -> SettleResult<Self> {
        Ok(Self {
            rpc: RpcClient::new(&config.rpc_url)?,
            token_contract: config.token_contract.clone(),
            retry: RetryPolicy::new(&config.retry),
        })
    }

    /// Resolve a block's timestamp, best effort.
    async fn block_timestamp(&self, block_number: u64) -> Option<Timestamp> {
        let result = self
            .rpc
            .call(
                "eth_getBlockByNumber",
                json!([format!("0x{:x}", block_number), false]),
            )
            .await
            .ok()?;
        let seconds = parse_hex_u64(result.get("timestamp")?.as_str()?)?;
        Some(seconds * 1000)
    }
}

/// Parse one `eth_getLogs` entry into a transfer event.
///
/// Returns `None` for entries missing or mangling any required field; the
/// caller logs and moves on, so one bad entry cannot hide its neighbors.
fn parse_log_entry(entry: &Value) -> Option<TransferEvent> {
    let tx_hash = TxHash::parse(entry.get("transactionHash")?.as_str()?).ok()?;
    let block_number = parse_hex_u64(entry.get("blockNumber")?.as_str()?)?;
    let amount = TokenAmount::from_hex_quantity(entry.get("data")?.as_str()?).ok()?;
    Some(TransferEvent {
        tx_hash,
        amount,
        block_number,
        timestamp: None,
    })
}

#[async_trait]
impl LogScanner for HttpLogScanner {
    async fn latest_block(&self) -> SettleResult<u64> {
        let result = self
            .retry
            .read(|| self.rpc.call("eth_blockNumber", json!([])))
            .await?;
        result
            .as_str()
            .and_then(parse_hex_u64)
            .ok_or_else(|| SettleError::unknown(format!("eth_blockNumber: bad result {result}")))
    }

    async fn scan_transfers(
        &self,
        sender: &WalletAddress,
        recipient: &WalletAddress,
        range: BlockRange,
        expected_amount: Option<TokenAmount>,
    ) -> SettleResult<Vec<TransferEvent>> {
        let filter = json!([{
            "fromBlock": format!("0x{:x}", range.from_block),
            "toBlock": format!("0x{:x}", range.to_block),
            "address": self.token_contract.as_str(),
            "topics": [
                TRANSFER_TOPIC,
                topic_for_address(sender),
                topic_for_address(recipient),
            ],
        }]);

        let result = self
            .retry
            .read(|| self.rpc.call("eth_getLogs", filter.clone()))
            .await?;
        let entries = result
            .as_array()
            .ok_or_else(|| SettleError::unknown("eth_getLogs: result is not an array"))?;

        debug!(
            sender = %sender.masked(),
            recipient = %recipient.masked(),
            from_block = range.from_block,
            to_block = range.to_block,
            raw = entries.len(),
            "scanned transfer logs"
        );

        let mut events = Vec::new();
        for entry in entries {
            let Some(event) = parse_log_entry(entry) else {
                warn!(entry = %entry, "skipping malformed log entry");
                continue;
            };
            if let Some(expected) = expected_amount {
                if event.amount != expected {
                    continue;
                }
            }
            events.push(event);
        }
        events.sort_by_key(|e| e.block_number);

        // Resolve timestamps once per distinct block, best effort.
        let mut stamps: HashMap<u64, Option<Timestamp>> = HashMap::new();
        for event in &mut events {
            let stamp = match stamps.get(&event.block_number) {
                Some(cached) => *cached,
                None => {
                    let fetched = self.block_timestamp(event.block_number).await;
                    stamps.insert(event.block_number, fetched);
                    fetched
                }
            };
            event.timestamp = stamp;
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn good_entry(salt: u8, amount_hex: &str) -> Value {
        json!({
            "transactionHash": format!("0x{:02x}{}", salt, "ab".repeat(31)),
            "blockNumber": format!("0x{:x}", 1_000 + salt as u64),
            "data": amount_hex,
        })
    }

    #[test]
    fn test_topic_for_address() {
        let addr = WalletAddress::parse("0xff00a683f7bd77665754a65f2b82fdefc4371a50").unwrap();
        let topic = topic_for_address(&addr);
        assert_eq!(topic.len(), 66);
        assert_eq!(
            topic,
            "0x000000000000000000000000ff00a683f7bd77665754a65f2b82fdefc4371a50"
        );
    }

    #[test]
    fn test_parse_hex_u64() {
        assert_eq!(parse_hex_u64("0x0"), Some(0));
        assert_eq!(parse_hex_u64("0x2a"), Some(42));
        assert_eq!(parse_hex_u64("2a"), None);
        assert_eq!(parse_hex_u64("0xzz"), None);
    }

    #[test]
    fn test_parse_log_entry_well_formed() {
        // 100 tokens = 100 * 10^18 = 0x56bc75e2d63100000
        let event = parse_log_entry(&good_entry(1, "0x56bc75e2d63100000")).unwrap();
        assert_eq!(event.amount, TokenAmount::from_tokens(100));
        assert_eq!(event.block_number, 1_001);
        assert!(event.timestamp.is_none());
    }

    #[test]
    fn test_parse_log_entry_rejects_malformed() {
        // Missing data field.
        let entry = json!({
            "transactionHash": format!("0x{}", "ab".repeat(32)),
            "blockNumber": "0x10",
        });
        assert!(parse_log_entry(&entry).is_none());

        // Garbage amount.
        assert!(parse_log_entry(&good_entry(1, "0x")).is_none());

        // Truncated tx hash.
        let entry = json!({
            "transactionHash": "0x1234",
            "blockNumber": "0x10",
            "data": "0x1",
        });
        assert!(parse_log_entry(&entry).is_none());
    }

    #[test]
    fn test_one_malformed_entry_does_not_hide_the_rest() {
        // Nine good entries and one with mangled data: exactly nine parse.
        let mut entries: Vec<Value> = (0..9)
            .map(|i| good_entry(i, "0x56bc75e2d63100000"))
            .collect();
        entries.insert(4, json!({ "transactionHash": "oops" }));

        let parsed: Vec<_> = entries.iter().filter_map(parse_log_entry).collect();
        assert_eq!(parsed.len(), 9);
    }
}

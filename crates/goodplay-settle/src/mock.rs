//! In-memory mock chain for testing.
//!
//! Implements both [`LogScanner`] and [`SettlementClient`] over in-memory
//! state with no network calls. Seed transfers to simulate deposits, inject
//! failures to exercise error paths, and inspect what was disbursed.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;

use goodplay_types::constants::MAX_DISBURSE_BATCH;
use goodplay_types::{CorrelationId, TokenAmount, TxHash, WalletAddress};

use crate::error::{SettleError, SettleResult};
use crate::traits::{LogScanner, SettlementClient};
use crate::types::{
    BlockRange, DisbursementReceipt, DisbursementRequest, DisbursementStatus, TransferEvent,
};

/// Flat fee the mock charges per submitted transaction.
const MOCK_FEE: TokenAmount = TokenAmount::from_base_units(1_000_000_000_000_000);

struct SeededTransfer {
    sender: WalletAddress,
    recipient: WalletAddress,
    event: TransferEvent,
}

/// Mock chain with seedable transfers and injectable failures.
pub struct MockChain {
    treasury_address: WalletAddress,
    treasury: RwLock<TokenAmount>,
    transfers: RwLock<Vec<SeededTransfer>>,
    disbursed: RwLock<HashMap<CorrelationId, DisbursementReceipt>>,
    fail_queue: Mutex<VecDeque<SettleError>>,
    tx_counter: AtomicU64,
    latest_block: AtomicU64,
}

impl MockChain {
    /// Create a mock chain with the given treasury address.
    pub fn new(treasury_address: WalletAddress) -> Self {
        Self {
            treasury_address,
            treasury: RwLock::new(TokenAmount::ZERO),
            transfers: RwLock::new(Vec::new()),
            disbursed: RwLock::new(HashMap::new()),
            fail_queue: Mutex::new(VecDeque::new()),
            tx_counter: AtomicU64::new(1),
            latest_block: AtomicU64::new(100_000),
        }
    }

    /// Builder for seeded mock chains.
    pub fn builder() -> MockChainBuilder {
        MockChainBuilder::default()
    }

    fn next_tx_hash(&self) -> TxHash {
        let counter = self.tx_counter.fetch_add(1, Ordering::SeqCst);
        TxHash::parse(&format!("0x{:064x}", counter)).expect("counter hash is well-formed")
    }

    fn take_injected_failure(&self) -> Option<SettleError> {
        self.fail_queue.lock().expect("fail queue lock").pop_front()
    }

    fn debit_treasury(&self, amount: TokenAmount) -> SettleResult<()> {
        let mut treasury = self.treasury.write().expect("treasury lock");
        let have = *treasury;
        *treasury = have
            .checked_sub(amount)
            .ok_or(SettleError::InsufficientFunds { have, need: amount })?;
        Ok(())
    }

    /// Seed an observable transfer (e.g. a user deposit to the treasury).
    pub fn seed_transfer(
        &self,
        sender: &WalletAddress,
        recipient: &WalletAddress,
        amount: TokenAmount,
        block_number: u64,
    ) -> TxHash {
        let tx_hash = self.next_tx_hash();
        self.transfers
            .write()
            .expect("transfers lock")
            .push(SeededTransfer {
                sender: sender.clone(),
                recipient: recipient.clone(),
                event: TransferEvent {
                    tx_hash: tx_hash.clone(),
                    amount,
                    block_number,
                    timestamp: Some(block_number * 5_000),
                },
            });
        self.latest_block.fetch_max(block_number, Ordering::SeqCst);
        tx_hash
    }

    /// Set the treasury balance.
    pub fn set_treasury(&self, amount: TokenAmount) {
        *self.treasury.write().expect("treasury lock") = amount;
    }

    /// Queue an error to be returned by the next disbursement attempt.
    pub fn fail_next_disburse(&self, error: SettleError) {
        self.fail_queue
            .lock()
            .expect("fail queue lock")
            .push_back(error);
    }

    /// Number of successful disbursements so far.
    pub fn disbursement_count(&self) -> usize {
        self.disbursed.read().expect("disbursed lock").len()
    }

    /// The receipt recorded for a correlation id, if any.
    pub fn receipt_for(&self, correlation_id: &CorrelationId) -> Option<DisbursementReceipt> {
        self.disbursed
            .read()
            .expect("disbursed lock")
            .get(correlation_id)
            .cloned()
    }

    /// Advance the simulated chain head.
    pub fn advance_blocks(&self, blocks: u64) {
        self.latest_block.fetch_add(blocks, Ordering::SeqCst);
    }
}

/// Builder for [`MockChain`].
#[derive(Default)]
pub struct MockChainBuilder {
    treasury_address: Option<WalletAddress>,
    treasury_balance: TokenAmount,
    transfers: Vec<(WalletAddress, WalletAddress, TokenAmount, u64)>,
}

impl MockChainBuilder {
    /// Set the treasury address.
    pub fn treasury_address(mut self, address: WalletAddress) -> Self {
        self.treasury_address = Some(address);
        self
    }

    /// Set the initial treasury balance.
    pub fn treasury_balance(mut self, amount: TokenAmount) -> Self {
        self.treasury_balance = amount;
        self
    }

    /// Seed a transfer.
    pub fn transfer(
        mut self,
        sender: &WalletAddress,
        recipient: &WalletAddress,
        amount: TokenAmount,
        block_number: u64,
    ) -> Self {
        self.transfers
            .push((sender.clone(), recipient.clone(), amount, block_number));
        self
    }

    /// Build the mock.
    pub fn build(self) -> MockChain {
        let treasury = self.treasury_address.unwrap_or_else(|| {
            WalletAddress::parse(&format!("0x{:0>40}", "fee1d"))
                .expect("default treasury address is well-formed")
        });
        let chain = MockChain::new(treasury);
        chain.set_treasury(self.treasury_balance);
        for (sender, recipient, amount, block) in self.transfers {
            chain.seed_transfer(&sender, &recipient, amount, block);
        }
        chain
    }
}

#[async_trait]
impl LogScanner for MockChain {
    async fn latest_block(&self) -> SettleResult<u64> {
        Ok(self.latest_block.load(Ordering::SeqCst))
    }

    async fn scan_transfers(
        &self,
        sender: &WalletAddress,
        recipient: &WalletAddress,
        range: BlockRange,
        expected_amount: Option<TokenAmount>,
    ) -> SettleResult<Vec<TransferEvent>> {
        let transfers = self.transfers.read().expect("transfers lock");
        let mut events: Vec<TransferEvent> = transfers
            .iter()
            .filter(|t| {
                t.sender == *sender
                    && t.recipient == *recipient
                    && range.contains(t.event.block_number)
                    && expected_amount.map_or(true, |a| t.event.amount == a)
            })
            .map(|t| t.event.clone())
            .collect();
        events.sort_by_key(|e| e.block_number);
        Ok(events)
    }
}

#[async_trait]
impl SettlementClient for MockChain {
    fn treasury_address(&self) -> &WalletAddress {
        &self.treasury_address
    }

    async fn treasury_balance(&self) -> SettleResult<TokenAmount> {
        Ok(*self.treasury.read().expect("treasury lock"))
    }

    async fn disburse(
        &self,
        recipient: &WalletAddress,
        amount: TokenAmount,
        correlation_id: &CorrelationId,
    ) -> SettleResult<DisbursementReceipt> {
        if let Some(err) = self.take_injected_failure() {
            return Err(err);
        }
        if self
            .disbursed
            .read()
            .expect("disbursed lock")
            .contains_key(correlation_id)
        {
            return Err(SettleError::reverted(format!(
                "reward already processed: {correlation_id}"
            )));
        }

        self.debit_treasury(amount)?;
        let block_number = self.latest_block.fetch_add(1, Ordering::SeqCst) + 1;
        let receipt = DisbursementReceipt {
            tx_hash: self.next_tx_hash(),
            fee_paid: MOCK_FEE,
            block_number,
        };
        self.disbursed
            .write()
            .expect("disbursed lock")
            .insert(correlation_id.clone(), receipt.clone());

        // The disbursement is itself an observable on-chain transfer.
        self.transfers
            .write()
            .expect("transfers lock")
            .push(SeededTransfer {
                sender: self.treasury_address.clone(),
                recipient: recipient.clone(),
                event: TransferEvent {
                    tx_hash: receipt.tx_hash.clone(),
                    amount,
                    block_number,
                    timestamp: Some(block_number * 5_000),
                },
            });

        Ok(receipt)
    }

    async fn disburse_batch(
        &self,
        entries: &[DisbursementRequest],
    ) -> SettleResult<DisbursementReceipt> {
        if entries.is_empty() {
            return Err(SettleError::invalid_batch("empty batch"));
        }
        if entries.len() > MAX_DISBURSE_BATCH {
            return Err(SettleError::invalid_batch(format!(
                "{} entries exceeds cap of {MAX_DISBURSE_BATCH}",
                entries.len()
            )));
        }
        if let Some(err) = self.take_injected_failure() {
            return Err(err);
        }
        {
            let disbursed = self.disbursed.read().expect("disbursed lock");
            if let Some(dup) = entries
                .iter()
                .find(|e| disbursed.contains_key(&e.correlation_id))
            {
                return Err(SettleError::reverted(format!(
                    "reward already processed: {}",
                    dup.correlation_id
                )));
            }
        }

        let mut total = TokenAmount::ZERO;
        for entry in entries {
            total = total
                .checked_add(entry.amount)
                .ok_or_else(|| SettleError::invalid_batch("batch total overflow"))?;
        }
        self.debit_treasury(total)?;

        let block_number = self.latest_block.fetch_add(1, Ordering::SeqCst) + 1;
        let receipt = DisbursementReceipt {
            tx_hash: self.next_tx_hash(),
            fee_paid: MOCK_FEE,
            block_number,
        };

        let mut disbursed = self.disbursed.write().expect("disbursed lock");
        let mut transfers = self.transfers.write().expect("transfers lock");
        for entry in entries {
            disbursed.insert(entry.correlation_id.clone(), receipt.clone());
            transfers.push(SeededTransfer {
                sender: self.treasury_address.clone(),
                recipient: entry.recipient.clone(),
                event: TransferEvent {
                    tx_hash: receipt.tx_hash.clone(),
                    amount: entry.amount,
                    block_number,
                    timestamp: Some(block_number * 5_000),
                },
            });
        }

        Ok(receipt)
    }

    async fn verify_disbursement(&self, tx_hash: &TxHash) -> SettleResult<DisbursementStatus> {
        let disbursed = self.disbursed.read().expect("disbursed lock");
        Ok(disbursed
            .values()
            .find(|r| r.tx_hash == *tx_hash)
            .map(|r| DisbursementStatus::Confirmed {
                block_number: r.block_number,
            })
            .unwrap_or(DisbursementStatus::Pending))
    }

    async fn is_disbursed(&self, correlation_id: &CorrelationId) -> SettleResult<bool> {
        Ok(self
            .disbursed
            .read()
            .expect("disbursed lock")
            .contains_key(correlation_id))
    }
}

//! Core data structures for the GoodPlay reward engine.
//!
//! This crate defines the vocabulary shared by every other crate in the
//! workspace:
//!
//! - **Identifiers**: [`WalletAddress`], [`TxHash`], [`SessionId`],
//!   [`CorrelationId`]
//! - **Money**: [`TokenAmount`], a checked integer over 18-decimal base units
//! - **Entities**: [`UserBalance`], [`DepositRecord`], [`GameSession`],
//!   [`DailyLimitCounter`], [`WithdrawalRecord`], [`GameStats`]
//! - **Enums**: [`GameKind`], [`SessionStatus`], [`DisbursementModel`],
//!   [`GameOutcome`]
//! - **Constants**: protocol-wide limits and timings in [`constants`]
//!
//! Balance math never touches floating point. All amounts are unsigned, and
//! deltas are expressed as separate earned/withdrawn magnitudes so negative
//! intermediate values are unrepresentable.

pub mod amount;
pub mod constants;
pub mod entities;
pub mod enums;
pub mod error;
pub mod ids;
pub mod outcome;

pub use amount::TokenAmount;
pub use entities::{
    DailyLimitCounter, DayStamp, DepositRecord, GameSession, GameStats, Timestamp, UserBalance,
    WithdrawalRecord,
};
pub use enums::{DisbursementModel, GameKind, SessionStatus};
pub use error::TypeError;
pub use ids::{CorrelationId, SessionId, TxHash, WalletAddress};
pub use outcome::GameOutcome;

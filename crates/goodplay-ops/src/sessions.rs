//! Game session state machine.
//!
//! Sessions move `in_progress -> completed` and nowhere else. Completion
//! recomputes the reward server-side from the raw outcome, persists the
//! terminal state behind a conditional update, counts the play against the
//! daily limit, and settles the reward by the game kind's disbursement
//! model.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use goodplay_rewards::{compute_reward, disbursement_model, validate_stake};
use goodplay_settle::DisbursementReceipt;
use goodplay_store::{DailyLimitStore, SessionStore, StatsStore};
use goodplay_types::{
    CorrelationId, DayStamp, DisbursementModel, GameKind, GameOutcome, GameSession, SessionId,
    TokenAmount, WalletAddress,
};

use crate::error::{OpsError, OpsResult};
use crate::{current_timestamp, Engine};

/// A freshly started session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStart {
    /// Identifier to complete the session with.
    pub session_id: SessionId,
    /// Game being played.
    pub kind: GameKind,
    /// Stake recorded at start.
    pub stake: TokenAmount,
    /// Plays remaining today, this one included.
    pub remaining_plays: u32,
}

/// The result of completing a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    /// The completed session.
    pub session_id: SessionId,
    /// Server-computed reward.
    pub reward: TokenAmount,
    /// New available balance, for ledger-credit games.
    pub available_balance: Option<TokenAmount>,
    /// On-chain receipt, for direct-payout games with a non-zero reward.
    pub disbursement: Option<DisbursementReceipt>,
    /// Plays left today.
    pub remaining_plays: u32,
}

fn fresh_session_id() -> SessionId {
    let hex = Uuid::new_v4().simple().to_string();
    SessionId::new(format!("GAME-{}", hex[..8].to_uppercase()))
}

impl Engine {
    /// Start a session for `wallet`, enforcing the daily cap and stake
    /// bounds.
    pub fn start_session(
        &self,
        wallet: &WalletAddress,
        kind: GameKind,
        stake: TokenAmount,
    ) -> OpsResult<SessionStart> {
        let today = DayStamp::today();
        let counter = self.store.limits.counter(wallet, kind, today)?;
        let cap = self.config.rewards.plays_per_day(kind);
        if counter.plays_today >= cap {
            return Err(OpsError::DailyLimitExceeded {
                kind,
                plays: counter.plays_today,
                cap,
            });
        }

        validate_stake(kind, stake, &self.config.rewards)?;

        let session = GameSession::started(
            fresh_session_id(),
            wallet.clone(),
            kind,
            stake,
            current_timestamp(),
        );
        self.store.sessions.insert(&session)?;

        info!(
            wallet = %wallet.masked(),
            session_id = %session.id,
            kind = %kind,
            stake = %stake,
            "game session started"
        );

        Ok(SessionStart {
            session_id: session.id,
            kind,
            stake,
            remaining_plays: cap - counter.plays_today,
        })
    }

    /// Complete a session with the client-reported raw outcome.
    ///
    /// The first valid completion wins; any later attempt for the same
    /// identifier fails with `AlreadyCompleted` and changes nothing.
    pub async fn complete_session(
        &self,
        session_id: &SessionId,
        outcome: &GameOutcome,
    ) -> OpsResult<SessionResult> {
        let session = self
            .store
            .sessions
            .load(session_id)?
            .ok_or_else(|| OpsError::SessionNotFound(session_id.clone()))?;

        if !session.status.is_in_progress() {
            return Err(OpsError::AlreadyCompleted(session_id.clone()));
        }
        if outcome.kind() != session.kind {
            return Err(OpsError::OutcomeMismatch {
                expected: session.kind,
                got: outcome.kind(),
            });
        }

        let reward = compute_reward(outcome, &self.config.rewards)?;
        let now = current_timestamp();

        // Conditional update: losing the race here means another request
        // completed the session between our load and now.
        if !self.store.sessions.complete(session_id, outcome, reward, now)? {
            return Err(OpsError::AlreadyCompleted(session_id.clone()));
        }

        let today = DayStamp::from_timestamp(now);
        let counter = self
            .store
            .limits
            .record_play(&session.wallet, session.kind, today, reward)?;
        self.store.stats.record_result(
            &session.wallet,
            session.kind,
            outcome.score(),
            reward,
            now,
        )?;

        let cap = self.config.rewards.plays_per_day(session.kind);
        let remaining_plays = cap.saturating_sub(counter.plays_today);

        info!(
            wallet = %session.wallet.masked(),
            session_id = %session_id,
            kind = %session.kind,
            reward = %reward,
            "game session completed"
        );

        match disbursement_model(session.kind) {
            DisbursementModel::LedgerCredit => {
                let balance = self.apply_delta(&session.wallet, reward, TokenAmount::ZERO)?;
                Ok(SessionResult {
                    session_id: session_id.clone(),
                    reward,
                    available_balance: Some(balance.available),
                    disbursement: None,
                    remaining_plays,
                })
            }
            DisbursementModel::DirectPayout => {
                if reward.is_zero() {
                    return Ok(SessionResult {
                        session_id: session_id.clone(),
                        reward,
                        available_balance: None,
                        disbursement: None,
                        remaining_plays,
                    });
                }

                let correlation_id = CorrelationId::from(session_id);
                if self.settlement.is_disbursed(&correlation_id).await? {
                    warn!(
                        session_id = %session_id,
                        "reward already disbursed on-chain, skipping duplicate payout"
                    );
                    return Ok(SessionResult {
                        session_id: session_id.clone(),
                        reward,
                        available_balance: None,
                        disbursement: None,
                        remaining_plays,
                    });
                }

                let receipt = self
                    .settlement
                    .disburse(&session.wallet, reward, &correlation_id)
                    .await
                    .map_err(|source| {
                        warn!(
                            session_id = %session_id,
                            error = %source,
                            "reward disbursement failed, correlation id retained"
                        );
                        OpsError::DisbursementFailed {
                            session_id: session_id.clone(),
                            source,
                        }
                    })?;

                info!(
                    session_id = %session_id,
                    tx_hash = %receipt.tx_hash.short(),
                    "reward disbursed on-chain"
                );
                Ok(SessionResult {
                    session_id: session_id.clone(),
                    reward,
                    available_balance: None,
                    disbursement: Some(receipt),
                    remaining_plays,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::tests::test_engine;
    use crate::OpsError;
    use goodplay_types::{GameKind, GameOutcome, SessionId, TokenAmount, WalletAddress};

    fn wallet() -> WalletAddress {
        WalletAddress::parse("0xff00a683f7bd77665754a65f2b82fdefc4371a50").unwrap()
    }

    fn crash_outcome(hundredths: u32, claimed: u64) -> GameOutcome {
        GameOutcome::Crash {
            multiplier_hundredths: hundredths,
            claimed_payout: TokenAmount::from_tokens(claimed),
        }
    }

    #[tokio::test]
    async fn test_crash_completion_credits_ledger() {
        let (engine, _) = test_engine();
        let start = engine
            .start_session(&wallet(), GameKind::CrashGame, TokenAmount::ZERO)
            .unwrap();

        let result = engine
            .complete_session(&start.session_id, &crash_outcome(230, 8))
            .await
            .unwrap();

        assert_eq!(result.reward, TokenAmount::from_tokens(8));
        assert_eq!(result.available_balance, Some(TokenAmount::from_tokens(8)));
        assert!(result.disbursement.is_none());

        let balance = engine.balance(&wallet()).unwrap();
        assert_eq!(balance.total_earned, TokenAmount::from_tokens(8));
    }

    #[tokio::test]
    async fn test_inflated_claim_clamped_to_tier() {
        let (engine, _) = test_engine();
        let start = engine
            .start_session(&wallet(), GameKind::CrashGame, TokenAmount::ZERO)
            .unwrap();

        // 2.3x claiming the 20-token top tier gets the 2x tier instead.
        let result = engine
            .complete_session(&start.session_id, &crash_outcome(230, 20))
            .await
            .unwrap();
        assert_eq!(result.reward, TokenAmount::from_tokens(8));
    }

    #[tokio::test]
    async fn test_double_completion_rejected_and_balance_unchanged() {
        let (engine, _) = test_engine();
        let start = engine
            .start_session(&wallet(), GameKind::CrashGame, TokenAmount::ZERO)
            .unwrap();

        engine
            .complete_session(&start.session_id, &crash_outcome(230, 8))
            .await
            .unwrap();
        let before = engine.balance(&wallet()).unwrap();

        let err = engine
            .complete_session(&start.session_id, &crash_outcome(500, 20))
            .await
            .unwrap_err();
        assert!(matches!(err, OpsError::AlreadyCompleted(_)));
        assert!(err.balance_unchanged());

        let after = engine.balance(&wallet()).unwrap();
        assert_eq!(before.available, after.available);
    }

    #[tokio::test]
    async fn test_unknown_session_rejected() {
        let (engine, _) = test_engine();
        let err = engine
            .complete_session(&SessionId::new("GAME-MISSING1"), &crash_outcome(200, 8))
            .await
            .unwrap_err();
        assert!(matches!(err, OpsError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_outcome_kind_must_match_session() {
        let (engine, _) = test_engine();
        let start = engine
            .start_session(&wallet(), GameKind::CrashGame, TokenAmount::ZERO)
            .unwrap();

        let err = engine
            .complete_session(&start.session_id, &GameOutcome::Quiz { correct_answers: 5 })
            .await
            .unwrap_err();
        assert!(matches!(err, OpsError::OutcomeMismatch { .. }));
    }

    #[tokio::test]
    async fn test_daily_limit_blocks_after_cap() {
        let (engine, _) = test_engine();
        let w = wallet();
        let cap = engine.config().rewards.plays_per_day(GameKind::CrashGame);

        for _ in 0..cap {
            let start = engine
                .start_session(&w, GameKind::CrashGame, TokenAmount::ZERO)
                .unwrap();
            engine
                .complete_session(&start.session_id, &crash_outcome(110, 4))
                .await
                .unwrap();
        }

        let err = engine
            .start_session(&w, GameKind::CrashGame, TokenAmount::ZERO)
            .unwrap_err();
        assert!(matches!(
            err,
            OpsError::DailyLimitExceeded { plays, cap: c, .. } if plays == cap && c == cap
        ));
    }

    #[tokio::test]
    async fn test_quiz_pays_out_on_chain() {
        let (engine, chain) = test_engine();
        let start = engine
            .start_session(&wallet(), GameKind::QuizTrivia, TokenAmount::ZERO)
            .unwrap();

        let result = engine
            .complete_session(&start.session_id, &GameOutcome::Quiz { correct_answers: 7 })
            .await
            .unwrap();

        assert_eq!(result.reward, TokenAmount::from_tokens(14));
        assert!(result.available_balance.is_none());
        let receipt = result.disbursement.expect("direct payout receipt");
        assert_eq!(chain.disbursement_count(), 1);

        // The internal ledger is untouched by direct payouts.
        assert!(engine.balance(&wallet()).unwrap().available.is_zero());

        // The correlation id is the session id.
        let corr = goodplay_types::CorrelationId::from(&start.session_id);
        assert_eq!(chain.receipt_for(&corr), Some(receipt));
    }

    #[tokio::test]
    async fn test_zero_reward_skips_disbursement() {
        let (engine, chain) = test_engine();
        let start = engine
            .start_session(&wallet(), GameKind::QuizTrivia, TokenAmount::ZERO)
            .unwrap();

        let result = engine
            .complete_session(&start.session_id, &GameOutcome::Quiz { correct_answers: 0 })
            .await
            .unwrap();
        assert!(result.reward.is_zero());
        assert!(result.disbursement.is_none());
        assert_eq!(chain.disbursement_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_stake_rejected_at_start() {
        let (engine, _) = test_engine();
        let err = engine
            .start_session(&wallet(), GameKind::CrashGame, TokenAmount::from_tokens(5))
            .unwrap_err();
        assert!(matches!(err, OpsError::Reward(_)));
    }
}

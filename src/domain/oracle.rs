//! Randomness boundary for win determination.
//!
//! A [`PoolEngine`](super::PoolEngine) never generates randomness itself; it
//! hands a [`DrawRequest`] to a [`RandomnessOracle`] and receives a bare
//! [`DrawOutcome`]. Swapping the oracle changes the fairness mechanism
//! without touching ledger code.
//!
//! Oracle failures surface as [`LootpotError::OracleUnavailable`] and are
//! never folded into a win or a loss.

use std::fmt;
use std::num::NonZeroU32;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use utoipa::ToSchema;

use super::{Address, Amount, PoolId};
use crate::error::LootpotError;

/// How a pool's draws obtain their randomness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SettlementMode {
    /// Join settles in one call against the local oracle.
    #[default]
    Sync,
    /// Join escrows the deposit and waits for an external provider to
    /// fulfill the draw.
    Deferred,
}

impl std::str::FromStr for SettlementMode {
    type Err = LootpotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sync" | "synchronous" => Ok(Self::Sync),
            "deferred" | "async" => Ok(Self::Deferred),
            other => Err(LootpotError::InvalidConfig(format!(
                "unknown settlement mode {other:?}; expected sync or deferred"
            ))),
        }
    }
}

/// Everything an oracle is told about a single draw.
#[derive(Debug, Clone)]
pub struct DrawRequest {
    /// Pool the draw belongs to.
    pub pool_id: PoolId,
    /// Participant whose deposit triggered the draw.
    pub participant: Address,
    /// Deposited amount.
    pub amount: Amount,
    /// Win odds are `1 / denominator`.
    pub denominator: NonZeroU32,
}

/// Result of a single draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DrawOutcome {
    /// The participant wins.
    Win,
    /// The participant does not win.
    Lose,
}

impl DrawOutcome {
    /// Maps a uniformly distributed random word onto an outcome with odds
    /// `1 / denominator`.
    #[must_use]
    pub fn from_random_word(word: u64, denominator: NonZeroU32) -> Self {
        if word % u64::from(denominator.get()) == 0 {
            Self::Win
        } else {
            Self::Lose
        }
    }

    /// Returns `true` for [`DrawOutcome::Win`].
    #[must_use]
    pub const fn is_win(self) -> bool {
        matches!(self, Self::Win)
    }
}

/// Capability that answers win/lose draws.
///
/// Implementations must be calibrated (win frequency converges to
/// `1 / denominator`) and must not let the requesting participant predict
/// the outcome before the request is committed.
pub trait RandomnessOracle: Send + Sync + fmt::Debug {
    /// Evaluates one draw.
    ///
    /// # Errors
    ///
    /// Returns [`LootpotError::OracleUnavailable`] when no outcome can be
    /// produced.
    fn draw(&self, request: &DrawRequest) -> Result<DrawOutcome, LootpotError>;
}

/// Oracle backed by the thread-local, OS-seeded CSPRNG.
///
/// Answers synchronously. The outcome is unpredictable to participants but
/// not externally verifiable; pools that need verifiable draws use the
/// deferred request/fulfill path instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntropyOracle;

impl RandomnessOracle for EntropyOracle {
    fn draw(&self, request: &DrawRequest) -> Result<DrawOutcome, LootpotError> {
        let roll = rand::rng().random_range(0..request.denominator.get());
        Ok(if roll == 0 {
            DrawOutcome::Win
        } else {
            DrawOutcome::Lose
        })
    }
}

/// Deterministic oracle driven by a seeded [`StdRng`].
///
/// Reproducible across runs with the same seed, which makes it suitable for
/// simulations and calibration tests. Not for production draws.
#[derive(Debug)]
pub struct SeededOracle {
    rng: Mutex<StdRng>,
}

impl SeededOracle {
    /// Creates an oracle from a 64-bit seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomnessOracle for SeededOracle {
    fn draw(&self, request: &DrawRequest) -> Result<DrawOutcome, LootpotError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| LootpotError::OracleUnavailable("seeded rng poisoned".to_string()))?;
        let word: u64 = rng.random();
        Ok(DrawOutcome::from_random_word(word, request.denominator))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod tests {
    use std::collections::VecDeque;

    use super::*;

    /// Oracle that replays a fixed script, failing once it runs dry.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedOracle {
        script: Mutex<VecDeque<Result<DrawOutcome, String>>>,
    }

    impl ScriptedOracle {
        pub(crate) fn new(outcomes: &[DrawOutcome]) -> Self {
            Self {
                script: Mutex::new(outcomes.iter().copied().map(Ok).collect()),
            }
        }

        pub(crate) fn always_failing() -> Self {
            Self::default()
        }
    }

    impl RandomnessOracle for ScriptedOracle {
        fn draw(&self, _request: &DrawRequest) -> Result<DrawOutcome, LootpotError> {
            let mut script = self
                .script
                .lock()
                .map_err(|_| LootpotError::OracleUnavailable("poisoned".to_string()))?;
            match script.pop_front() {
                Some(Ok(outcome)) => Ok(outcome),
                Some(Err(reason)) => Err(LootpotError::OracleUnavailable(reason)),
                None => Err(LootpotError::OracleUnavailable("provider offline".to_string())),
            }
        }
    }

    fn request(denominator: u32) -> DrawRequest {
        let Some(denominator) = NonZeroU32::new(denominator) else {
            panic!("denominator must be non-zero");
        };
        let Ok(participant) = Address::new("0xa11ce") else {
            panic!("valid address");
        };
        DrawRequest {
            pool_id: PoolId::new(),
            participant,
            amount: Amount::new(1),
            denominator,
        }
    }

    fn win_rate(oracle: &dyn RandomnessOracle, denominator: u32, draws: u32) -> f64 {
        let req = request(denominator);
        let wins = (0..draws)
            .filter(|_| matches!(oracle.draw(&req), Ok(DrawOutcome::Win)))
            .count();
        wins as f64 / f64::from(draws)
    }

    #[test]
    fn seeded_oracle_converges_to_one_over_n() {
        for denominator in [1_u32, 2, 10, 15, 100] {
            let oracle = SeededOracle::new(0x5eed + u64::from(denominator));
            let draws = 200_000;
            let observed = win_rate(&oracle, denominator, draws);
            let expected = 1.0 / f64::from(denominator);
            // five standard deviations of a binomial proportion
            let sigma = (expected * (1.0 - expected) / f64::from(draws)).sqrt();
            let tolerance = (5.0 * sigma).max(1e-9);
            assert!(
                (observed - expected).abs() <= tolerance,
                "n={denominator} observed={observed} expected={expected}"
            );
        }
    }

    #[test]
    fn entropy_oracle_is_calibrated() {
        let observed = win_rate(&EntropyOracle, 4, 100_000);
        assert!((observed - 0.25).abs() < 0.01, "observed={observed}");
    }

    #[test]
    fn denominator_one_always_wins() {
        let req = request(1);
        for _ in 0..100 {
            assert_eq!(EntropyOracle.draw(&req).ok(), Some(DrawOutcome::Win));
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let a = SeededOracle::new(7);
        let b = SeededOracle::new(7);
        let req = request(3);
        for _ in 0..50 {
            assert_eq!(a.draw(&req).ok(), b.draw(&req).ok());
        }
    }

    #[test]
    fn random_word_mapping() {
        let Some(ten) = NonZeroU32::new(10) else {
            panic!("non-zero");
        };
        assert_eq!(DrawOutcome::from_random_word(0, ten), DrawOutcome::Win);
        assert_eq!(DrawOutcome::from_random_word(30, ten), DrawOutcome::Win);
        assert_eq!(DrawOutcome::from_random_word(31, ten), DrawOutcome::Lose);
    }

    #[test]
    fn scripted_oracle_reports_unavailable_when_empty() {
        let oracle = ScriptedOracle::always_failing();
        let result = oracle.draw(&request(2));
        assert!(matches!(result, Err(LootpotError::OracleUnavailable(_))));
    }
}

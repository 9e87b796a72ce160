//! Precision-safe balance deltas.
//!
//! Uses `rust_decimal` so that lamport conversions and token ui amounts
//! never pass through binary floating point.

use crate::error::Result;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lamports in one SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Decimal places kept when a lamport delta is shown as SOL.
pub const SOL_DISPLAY_DECIMALS: u32 = 4;

/// Decimal places of a lamport amount expressed in SOL.
const LAMPORT_SCALE: u32 = 9;

/// Signed SOL change of one account, rounded to 4 decimal places.
///
/// The sign is the raw ledger sign: negative when the account paid SOL out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolDelta(pub Decimal);

impl SolDelta {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Build from pre/post lamport balances of the same account.
    pub fn from_lamports(pre: u64, post: u64) -> Result<Self> {
        let raw = i128::from(post) - i128::from(pre);
        let sol = Decimal::try_from_i128_with_scale(raw, LAMPORT_SCALE)?;
        Ok(Self(sol.round_dp_with_strategy(
            SOL_DISPLAY_DECIMALS,
            RoundingStrategy::MidpointAwayFromZero,
        )))
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_outflow(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Absolute amount, for "amount paid/received" style display.
    #[inline]
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }
}

impl fmt::Display for SolDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whole-token change of the actor, truncated toward zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenDelta(pub Decimal);

impl TokenDelta {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Difference between post and pre ui amounts, fractional part dropped.
    pub fn between(pre: Decimal, post: Decimal) -> Self {
        Self((post - pre).trunc())
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for TokenDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sol_delta_buy_is_negative() {
        let delta = SolDelta::from_lamports(2_000_000_000, 1_900_000_000).unwrap();
        assert_eq!(delta.to_string(), "-0.1000");
        assert!(delta.is_outflow());
    }

    #[test]
    fn test_sol_delta_sell_is_positive() {
        let delta = SolDelta::from_lamports(1_000_000_000, 1_250_000_000).unwrap();
        assert_eq!(delta.to_string(), "0.2500");
        assert!(!delta.is_outflow());
    }

    #[test]
    fn test_sol_delta_rounds_to_four_places() {
        // 0.00012345 SOL -> 0.0001
        let delta = SolDelta::from_lamports(0, 123_450).unwrap();
        assert_eq!(delta.inner(), dec!(0.0001));
        // 0.00015 SOL is a midpoint, away from zero -> 0.0002
        let delta = SolDelta::from_lamports(150_000, 0).unwrap();
        assert_eq!(delta.inner(), dec!(-0.0002));
    }

    #[test]
    fn test_sol_delta_zero() {
        let delta = SolDelta::from_lamports(5, 5).unwrap();
        assert!(delta.inner().is_zero());
        assert!(!delta.is_outflow());
    }

    #[test]
    fn test_token_delta_truncates_toward_zero() {
        assert_eq!(TokenDelta::between(dec!(0), dec!(5.9)).inner(), dec!(5));
        assert_eq!(TokenDelta::between(dec!(10.5), dec!(0)).inner(), dec!(-10));
        assert_eq!(TokenDelta::between(dec!(1), dec!(1.2)).to_string(), "0");
    }
}

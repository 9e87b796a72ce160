//! Balance extraction from transaction metadata.

use crate::error::{ClassifierError, ClassifierResult};
use pumpwatch_core::{SolDelta, TokenBalance, TokenDelta};
use rust_decimal::Decimal;

/// The token a trade moved, as found in the pre-trade balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradedToken<'a> {
    pub mint: &'a str,
    /// Account index of the first non-reserved token balance.
    pub account_index: u32,
}

/// First pre-trade token balance not at `reserved_index`.
///
/// In a pump.fun trade the reserved index holds the bonding curve's token
/// account, so the remaining entry is the trader's side of the same mint.
pub fn resolve_traded_token(pre: &[TokenBalance], reserved_index: u32) -> Option<TradedToken<'_>> {
    pre.iter()
        .find(|b| b.account_index != reserved_index)
        .map(|b| TradedToken {
            mint: &b.mint,
            account_index: b.account_index,
        })
}

/// Whole-token change of `owner` in `mint`. Missing entries count as zero.
pub fn token_delta(pre: &[TokenBalance], post: &[TokenBalance], owner: &str, mint: &str) -> TokenDelta {
    let amount = |balances: &[TokenBalance]| {
        balances
            .iter()
            .find(|b| b.owner == owner && b.mint == mint)
            .and_then(|b| b.ui_amount)
            .unwrap_or(Decimal::ZERO)
    };
    TokenDelta::between(amount(pre), amount(post))
}

/// Account index whose lamports move with the traded token account.
///
/// `None` when the token account sits before `offset`.
pub fn sol_account_index(token_index: u32, offset: u32) -> Option<u32> {
    token_index.checked_sub(offset)
}

/// SOL change at `index`, raw sign kept.
pub fn sol_delta(pre: &[u64], post: &[u64], index: u32) -> ClassifierResult<SolDelta> {
    let index = index as usize;
    let before = pre.get(index).ok_or(ClassifierError::BalanceIndexOutOfRange {
        index,
        len: pre.len(),
    })?;
    let after = post.get(index).ok_or(ClassifierError::BalanceIndexOutOfRange {
        index,
        len: post.len(),
    })?;
    Ok(SolDelta::from_lamports(*before, *after)?)
}

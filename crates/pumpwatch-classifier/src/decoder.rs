//! Trade-kind detection for pump.fun transactions.
//!
//! Instructions addressed to the program are matched on their 8-byte Anchor
//! discriminator. When none of them decodes, the program log markers are
//! used instead.

use pumpwatch_core::{Address, TradeKind, TransactionEvent, TransactionMeta};

/// Anchor discriminator of the pump.fun `buy` instruction.
pub const BUY_DISCRIMINATOR: [u8; 8] = [102, 6, 61, 18, 1, 218, 235, 234];

/// Anchor discriminator of the pump.fun `sell` instruction.
pub const SELL_DISCRIMINATOR: [u8; 8] = [51, 230, 133, 164, 1, 127, 131, 173];

pub const BUY_LOG_MARKER: &str = "Program log: Instruction: Buy";
pub const SELL_LOG_MARKER: &str = "Program log: Instruction: Sell";

/// Result of scanning one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    Trade(TradeKind),
    /// Neither a buy nor a sell.
    Neither,
    /// Both a buy and a sell in one transaction.
    Ambiguous,
}

#[derive(Debug, Default, Clone, Copy)]
struct Seen {
    buy: bool,
    sell: bool,
}

impl Seen {
    fn any(&self) -> bool {
        self.buy || self.sell
    }

    fn into_detection(self) -> Detection {
        match (self.buy, self.sell) {
            (true, true) => Detection::Ambiguous,
            (true, false) => Detection::Trade(TradeKind::Buy),
            (false, true) => Detection::Trade(TradeKind::Sell),
            (false, false) => Detection::Neither,
        }
    }
}

/// Classify the instruction type of `event` against `program`.
pub fn detect_kind(event: &TransactionEvent, meta: &TransactionMeta, program: &Address) -> Detection {
    let decoded = scan_instructions(event, program);
    if decoded.any() {
        return decoded.into_detection();
    }
    scan_logs(meta).into_detection()
}

fn scan_instructions(event: &TransactionEvent, program: &Address) -> Seen {
    let mut seen = Seen::default();
    for ix in &event.instructions {
        if event.program_of(ix) != Some(program) {
            continue;
        }
        match ix.data.get(..8) {
            Some(d) if d == BUY_DISCRIMINATOR => seen.buy = true,
            Some(d) if d == SELL_DISCRIMINATOR => seen.sell = true,
            _ => {}
        }
    }
    seen
}

fn scan_logs(meta: &TransactionMeta) -> Seen {
    Seen {
        buy: meta.logs_contain(BUY_LOG_MARKER),
        sell: meta.logs_contain(SELL_LOG_MARKER),
    }
}

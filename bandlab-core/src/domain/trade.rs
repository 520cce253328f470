//! TradeRecord — a completed round-trip trade.

use super::position::PositionSide;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    /// An exit (or opposite-side entry) signal fired.
    Signal,
    /// The data ran out with the position still open.
    EndOfData,
}

/// A complete round-trip trade record: entry → exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub side: PositionSide,
    /// Fraction of equity committed at entry.
    pub size: f64,

    // ── Entry ──
    pub entry_bar: usize,
    pub entry_timestamp: NaiveDateTime,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_bar: usize,
    pub exit_timestamp: NaiveDateTime,
    pub exit_price: f64,
    pub exit_reason: ExitReason,

    pub quantity: f64,

    // ── PnL ──
    pub gross_pnl: f64,
    /// Entry plus exit commission.
    pub commission: f64,
    pub net_pnl: f64,

    pub bars_held: usize,
}

impl TradeRecord {
    /// Return on the trade as a fraction of entry notional.
    pub fn return_pct(&self) -> f64 {
        if self.entry_price == 0.0 || self.quantity == 0.0 {
            return 0.0;
        }
        self.net_pnl / (self.entry_price * self.quantity)
    }

    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }

    pub fn is_forced_close(&self) -> bool {
        self.exit_reason == ExitReason::EndOfData
    }
}

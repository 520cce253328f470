//! Cash/equity ledger — applies transitions as same-bar-close fills.
//!
//! Fill model: every fill happens at the signal bar's close, in full, with
//! no slippage and no latency. Commission is `commission_rate * fill notional`
//! on the entry leg and again on the exit leg.
//!
//! Accounting: the ledger keeps the running sum of closed trades' net PnL.
//! cash = initial_cash + realized_pnl - open entry commission, and
//! equity = cash + unrealized PnL at the mark price. Once flat,
//! equity = initial_cash + Σ net_pnl by construction.
//!
//! Every method consumes the ledger and returns its successor; nothing is
//! mutated in place behind the caller's back.

use crate::domain::{Bar, ExitReason, OpenPosition, Position, PositionSide, TradeRecord};

use super::position_manager::Transition;

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    initial_cash: f64,
    realized_pnl: f64,
    position: Position,
}

impl Ledger {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            initial_cash,
            realized_pnl: 0.0,
            position: Position::Flat,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    pub fn cash(&self) -> f64 {
        let pending = self.position.as_open().map_or(0.0, |o| o.entry_commission);
        self.initial_cash + self.realized_pnl - pending
    }

    /// Cash plus mark-to-market PnL of any open position at `price`.
    pub fn equity(&self, price: f64) -> f64 {
        match &self.position {
            Position::Flat => self.initial_cash + self.realized_pnl,
            Position::Open(open) => self.cash() + open.unrealized_pnl(price),
        }
    }

    /// Apply a transition at `bar`'s close.
    pub fn apply(
        self,
        transition: Transition,
        bar_index: usize,
        bar: &Bar,
        commission_rate: f64,
    ) -> (Self, Option<TradeRecord>) {
        match transition {
            Transition::Hold => (self, None),
            Transition::Open {
                side,
                size,
                notional,
            } => (
                self.open(side, size, notional, bar_index, bar, commission_rate),
                None,
            ),
            Transition::Close => self.close(bar_index, bar, ExitReason::Signal, commission_rate),
        }
    }

    fn open(
        self,
        side: PositionSide,
        size: f64,
        notional: f64,
        bar_index: usize,
        bar: &Bar,
        commission_rate: f64,
    ) -> Self {
        debug_assert!(self.position.is_flat(), "open on a non-flat ledger");
        let entry_commission = commission_rate * notional;
        tracing::debug!(
            bar = bar_index,
            ?side,
            price = bar.close,
            notional,
            commission = entry_commission,
            "entry fill"
        );
        Self {
            position: Position::Open(OpenPosition {
                side,
                size,
                quantity: notional / bar.close,
                entry_bar: bar_index,
                entry_timestamp: bar.timestamp,
                entry_price: bar.close,
                entry_commission,
            }),
            ..self
        }
    }

    /// Close any open position at `bar`'s close. A flat ledger is returned unchanged.
    pub fn close(
        self,
        bar_index: usize,
        bar: &Bar,
        reason: ExitReason,
        commission_rate: f64,
    ) -> (Self, Option<TradeRecord>) {
        let Position::Open(open) = &self.position else {
            return (self, None);
        };

        let exit_price = bar.close;
        let gross_pnl = open.unrealized_pnl(exit_price);
        let exit_commission = commission_rate * open.quantity * exit_price;
        let commission = open.entry_commission + exit_commission;
        let net_pnl = gross_pnl - commission;

        let trade = TradeRecord {
            side: open.side,
            size: open.size,
            entry_bar: open.entry_bar,
            entry_timestamp: open.entry_timestamp,
            entry_price: open.entry_price,
            exit_bar: bar_index,
            exit_timestamp: bar.timestamp,
            exit_price,
            exit_reason: reason,
            quantity: open.quantity,
            gross_pnl,
            commission,
            net_pnl,
            bars_held: bar_index - open.entry_bar,
        };
        tracing::debug!(
            bar = bar_index,
            side = ?trade.side,
            price = exit_price,
            net_pnl,
            ?reason,
            "exit fill"
        );

        let next = Self {
            initial_cash: self.initial_cash,
            realized_pnl: self.realized_pnl + net_pnl,
            position: Position::Flat,
        };
        (next, Some(trade))
    }
}

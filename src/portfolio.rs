//! Position and realized-PnL tracking for futures-style accounting.
//!
//! Positions are signed base quantity with a volume-weighted average entry
//! price. Realized PnL is recorded when a fill reduces, closes or flips a
//! position; fees always reduce realized PnL and accumulate separately.

use rustc_hash::FxHashMap;

use crate::{Side, Symbol, DUST_QTY};

/// A single-instrument position.
///
/// Invariant: a flat position (`qty == 0`) has `avg_price == 0`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// Signed base quantity: positive long, negative short.
    pub qty: f64,
    /// Average entry price for the open quantity, in quote units.
    pub avg_price: f64,
}

impl Position {
    /// Returns true if the position is flat.
    #[inline]
    pub fn is_flat(&self) -> bool {
        self.qty == 0.0
    }

    /// Unrealized PnL at the given mark.
    #[inline]
    pub fn unrealized_pnl(&self, mark_price: f64) -> f64 {
        if self.qty == 0.0 {
            return 0.0;
        }
        self.qty * (mark_price - self.avg_price)
    }

    /// Notional exposure at the given mark (signed).
    #[inline]
    pub fn notional(&self, mark_price: f64) -> f64 {
        self.qty * mark_price
    }
}

/// Positions plus realized PnL and fee accounting across symbols.
///
/// `realized_pnl_usdt` is net of fees; `fees_paid_usdt` is the cumulative
/// positive total.
#[derive(Clone, Debug, Default)]
pub struct Portfolio {
    pub realized_pnl_usdt: f64,
    pub fees_paid_usdt: f64,
    positions: FxHashMap<Symbol, Position>,
}

impl Portfolio {
    /// Create an empty portfolio.
    pub fn new() -> Self {
        Self::default()
    }

    /// The position for a symbol, if one was ever opened.
    pub fn position(&self, symbol: Symbol) -> Option<&Position> {
        self.positions.get(&symbol)
    }

    /// Signed quantity for a symbol (zero when no position exists).
    pub fn qty(&self, symbol: Symbol) -> f64 {
        self.positions.get(&symbol).map_or(0.0, |p| p.qty)
    }

    /// Iterate all positions.
    pub fn positions(&self) -> impl Iterator<Item = (&Symbol, &Position)> {
        self.positions.iter()
    }

    fn pos_mut(&mut self, symbol: Symbol) -> &mut Position {
        self.positions.entry(symbol).or_default()
    }

    /// Apply an execution.
    ///
    /// Fees are charged unconditionally. The position update realizes PnL on
    /// the closed portion (reduce, full close, or flip) and maintains the
    /// weighted-average entry price when exposure grows. A resulting quantity
    /// within the dust threshold snaps to exactly flat.
    pub fn apply_fill(&mut self, symbol: Symbol, side: Side, qty: f64, price: f64, fee_usdt: f64) {
        if qty <= 0.0 {
            return;
        }

        self.fees_paid_usdt += fee_usdt;
        self.realized_pnl_usdt -= fee_usdt;

        let mut realized = 0.0;
        {
            let pos = self.pos_mut(symbol);

            let signed = qty * side.sign();
            let mut new_qty = pos.qty + signed;
            if new_qty.abs() <= DUST_QTY {
                new_qty = 0.0;
            }
            let direction = if pos.qty > 0.0 { 1.0 } else { -1.0 };

            if new_qty == 0.0 && pos.qty != 0.0 {
                // Full close.
                realized = pos.qty.abs() * (price - pos.avg_price) * direction;
                pos.qty = 0.0;
                pos.avg_price = 0.0;
            } else if pos.qty == 0.0 {
                // Opening from flat.
                pos.qty = new_qty;
                pos.avg_price = if new_qty == 0.0 { 0.0 } else { price };
            } else if (pos.qty > 0.0) == (new_qty > 0.0) {
                if new_qty.abs() > pos.qty.abs() {
                    // Increasing same-direction exposure: weighted average.
                    let old_notional = pos.qty.abs() * pos.avg_price;
                    let add_notional = signed.abs() * price;
                    pos.avg_price = (old_notional + add_notional) / new_qty.abs();
                    pos.qty = new_qty;
                } else {
                    // Reducing without flipping: realize the reduced part.
                    realized = signed.abs() * (price - pos.avg_price) * direction;
                    pos.qty = new_qty;
                }
            } else {
                // Flip: close the old side fully, open the residual at `price`.
                realized = pos.qty.abs() * (price - pos.avg_price) * direction;
                pos.qty = new_qty;
                pos.avg_price = price;
            }
        }
        self.realized_pnl_usdt += realized;
    }

    /// Apply a funding exchange for a perpetual position.
    ///
    /// Funding PnL to the account is `-qty * mark_price * funding_rate`:
    /// positive rates mean longs pay and shorts receive. Returns the applied
    /// amount (zero when flat).
    pub fn apply_funding(&mut self, symbol: Symbol, mark_price: f64, funding_rate: f64) -> f64 {
        let Some(pos) = self.positions.get(&symbol) else {
            return 0.0;
        };
        if pos.qty == 0.0 {
            return 0.0;
        }

        let pnl = -(pos.qty * mark_price) * funding_rate;
        self.realized_pnl_usdt += pnl;
        pnl
    }
}

//! L2Book: in-memory depth book for a single symbol.
//!
//! Price → quantity on each side, driven by self-contained depth deltas.
//! This is a market-data view, not a matching book: levels are aggregate
//! visible quantity, with no order-level resolution.

use std::cell::RefCell;
use std::rc::Rc;

use crate::{BookLevels, BookSide, Side};

/// Shared handle to a book.
///
/// Books are shared between the engine (creation), the broker (mutation on
/// depth updates and taker self-impact) and strategies (reads), all within a
/// single-threaded event loop. The broker's latency queue also has to hold
/// the submission's book until activation, which rules out plain borrows.
/// Do not hold a borrow across a broker call.
pub type BookHandle = Rc<RefCell<L2Book>>;

/// An L2 depth book.
#[derive(Clone, Debug)]
pub struct L2Book {
    bids: BookLevels,
    asks: BookLevels,
}

impl Default for L2Book {
    fn default() -> Self {
        Self::new()
    }
}

impl L2Book {
    /// Create an empty book.
    pub fn new() -> Self {
        Self {
            bids: BookLevels::new(BookSide::Bid),
            asks: BookLevels::new(BookSide::Ask),
        }
    }

    /// Wrap the book in a shared handle for use with the broker and engine.
    pub fn into_shared(self) -> BookHandle {
        Rc::new(RefCell::new(self))
    }

    /// The bid side.
    #[inline]
    pub fn bids(&self) -> &BookLevels {
        &self.bids
    }

    /// The ask side.
    #[inline]
    pub fn asks(&self) -> &BookLevels {
        &self.asks
    }

    /// One side by tag.
    pub fn side(&self, side: BookSide) -> &BookLevels {
        match side {
            BookSide::Bid => &self.bids,
            BookSide::Ask => &self.asks,
        }
    }

    pub(crate) fn side_mut(&mut self, side: BookSide) -> &mut BookLevels {
        match side {
            BookSide::Bid => &mut self.bids,
            BookSide::Ask => &mut self.asks,
        }
    }

    /// Apply a single level update. A quantity `<= 0` deletes the level.
    pub fn apply_level(&mut self, side: BookSide, price: f64, qty: f64) {
        self.side_mut(side).set(price, qty);
    }

    /// Apply one depth message atomically (all entries, in call order).
    pub fn apply_depth_update(&mut self, bid_updates: &[(f64, f64)], ask_updates: &[(f64, f64)]) {
        for &(price, qty) in bid_updates {
            self.bids.set(price, qty);
        }
        for &(price, qty) in ask_updates {
            self.asks.set(price, qty);
        }
    }

    /// Highest bid price, if any.
    #[inline]
    pub fn best_bid(&self) -> Option<f64> {
        self.bids.best_price()
    }

    /// Lowest ask price, if any.
    #[inline]
    pub fn best_ask(&self) -> Option<f64> {
        self.asks.best_price()
    }

    /// Arithmetic mid of best bid and best ask.
    ///
    /// Returns `None` when either side is empty or either best price is
    /// non-positive (a defective feed should not produce a "mid").
    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) if bid > 0.0 && ask > 0.0 => Some((bid + ask) / 2.0),
            _ => None,
        }
    }

    /// Volume-weighted average price for consuming liquidity until
    /// `target_notional` (quote units) is reached.
    ///
    /// A buy walks asks low → high, a sell walks bids high → low. Returns NaN
    /// when the book cannot supply the target notional.
    pub fn impact_vwap(&self, side: Side, target_notional: f64) -> f64 {
        const EPS_NOTIONAL: f64 = 1e-6;

        debug_assert!(target_notional > 0.0, "target_notional must be > 0");
        if target_notional <= 0.0 {
            return f64::NAN;
        }

        let levels = match side {
            Side::Buy => &self.asks,
            Side::Sell => &self.bids,
        };

        let mut remaining = target_notional;
        let mut total_qty = 0.0;
        let mut total_cost = 0.0;

        for (price, qty) in levels.iter_best_first() {
            if remaining <= EPS_NOTIONAL {
                break;
            }
            let level_notional = price * qty;
            if level_notional <= 0.0 {
                continue;
            }

            let take_notional = level_notional.min(remaining);
            let take_qty = take_notional / price;

            total_cost += take_qty * price;
            total_qty += take_qty;
            remaining -= take_notional;
        }

        if remaining > EPS_NOTIONAL || total_qty <= 0.0 {
            return f64::NAN;
        }

        total_cost / total_qty
    }
}

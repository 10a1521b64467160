//! Maker queue model: approximate fills for resting limit orders.
//!
//! A resting order cannot observe its true queue position from L2 data, so
//! the model assumes the worst on entry (behind all visible quantity at the
//! level, scaled by the broker's queue-ahead knobs) and only improves from
//! there:
//!
//! - a drop in visible quantity at our level moves us forward (cancels or
//!   executions ahead of us),
//! - a rise is ignored (new liquidity is assumed to join behind us),
//! - trades at our level against our passive side first burn queue-ahead,
//!   then fill us.

use crate::{event::Trade, Side, Symbol, PRICE_TOL};

/// State of a resting maker order.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MakerQueueOrder {
    pub symbol: Symbol,
    /// `Buy` rests on the bid, `Sell` on the ask.
    pub side: Side,
    pub price: f64,
    pub quantity: f64,

    /// Estimated same-side volume that must execute before we start filling.
    pub queue_ahead_qty: f64,
    pub filled_qty: f64,
    /// Fraction of tape volume credited toward our queue/fills, in (0, 1].
    /// Values below 1 are conservative.
    pub trade_participation: f64,
}

impl MakerQueueOrder {
    pub fn new(
        symbol: Symbol,
        side: Side,
        price: f64,
        quantity: f64,
        queue_ahead_qty: f64,
        trade_participation: f64,
    ) -> Self {
        Self {
            symbol,
            side,
            price,
            quantity,
            queue_ahead_qty,
            filled_qty: 0.0,
            trade_participation,
        }
    }

    /// Quantity still open.
    #[inline]
    pub fn remaining_qty(&self) -> f64 {
        let rem = self.quantity - self.filled_qty;
        if rem > 0.0 { rem } else { 0.0 }
    }

    /// Terminal once the full quantity has filled.
    #[inline]
    pub fn is_filled(&self) -> bool {
        self.remaining_qty() <= 0.0
    }

    /// React to a change of the visible quantity at our price level on our
    /// side. Only decreases apply; increases queue behind us.
    pub fn on_book_qty_update(&mut self, new_visible_qty: f64) {
        let v = new_visible_qty.max(0.0);
        if v < self.queue_ahead_qty {
            self.queue_ahead_qty = v;
        }
    }

    /// Consume a tape trade. Returns the quantity filled by this trade
    /// (zero when the trade is for another symbol, another price level, or
    /// the wrong aggressor side).
    pub fn on_trade(&mut self, trade: &Trade) -> f64 {
        if trade.symbol != self.symbol {
            return 0.0;
        }
        if self.is_filled() {
            return 0.0;
        }

        if (trade.price - self.price).abs() > PRICE_TOL {
            return 0.0;
        }

        // Binance semantics: is_buyer_maker=true is a sell aggressor hitting
        // bids; only that flow can fill a resting buy, and vice versa.
        match self.side {
            Side::Buy if !trade.is_buyer_maker => return 0.0,
            Side::Sell if trade.is_buyer_maker => return 0.0,
            _ => {}
        }

        debug_assert!(
            self.trade_participation > 0.0 && self.trade_participation <= 1.0,
            "trade_participation out of range: {}",
            self.trade_participation
        );

        let v = trade.quantity * self.trade_participation;
        if v <= 0.0 {
            return 0.0;
        }

        // The queue ahead absorbs volume before any reaches us.
        if self.queue_ahead_qty >= v {
            self.queue_ahead_qty -= v;
            return 0.0;
        }

        let past_queue = v - self.queue_ahead_qty;
        self.queue_ahead_qty = 0.0;

        let fill = self.remaining_qty().min(past_queue);
        self.filled_qty += fill;
        fill
    }
}

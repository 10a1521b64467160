//! Taker matching against L2 depth.
//!
//! A buy consumes asks low → high, a sell consumes bids high → low, stopping
//! at an optional limit price. `consume_taker_fill` additionally applies
//! self-impact: consumed quantity is removed from the book in place, so
//! subsequent events observe the reduced liquidity.

use crate::{L2Book, Side, DUST_QTY};

/// Outcome of a taker walk.
///
/// When nothing filled, `quantity` is `0` and `avg_price` is NaN.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TakerFill {
    pub avg_price: f64,
    pub quantity: f64,
}

impl TakerFill {
    /// The no-fill outcome.
    pub fn none() -> Self {
        Self {
            avg_price: f64::NAN,
            quantity: 0.0,
        }
    }

    /// Returns true if nothing was filled.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.quantity <= 0.0
    }
}

#[inline]
fn limit_crossed(side: Side, price: f64, limit_price: Option<f64>) -> bool {
    match (side, limit_price) {
        (Side::Buy, Some(limit)) => price > limit,
        (Side::Sell, Some(limit)) => price < limit,
        (_, None) => false,
    }
}

/// Walk the book as a taker without mutating it.
///
/// Useful for previewing execution cost before committing to an order.
pub fn simulate_taker_fill(
    book: &L2Book,
    side: Side,
    quantity: f64,
    limit_price: Option<f64>,
) -> TakerFill {
    debug_assert!(quantity > 0.0, "quantity must be > 0");
    if quantity <= 0.0 {
        return TakerFill::none();
    }

    let levels = match side {
        Side::Buy => book.asks(),
        Side::Sell => book.bids(),
    };

    let mut remaining = quantity;
    let mut filled = 0.0;
    let mut cost = 0.0;

    for (price, lvl_qty) in levels.iter_best_first() {
        if remaining <= 0.0 || limit_crossed(side, price, limit_price) {
            break;
        }
        let take = lvl_qty.min(remaining);
        filled += take;
        cost += take * price;
        remaining -= take;
    }

    if filled <= 0.0 {
        return TakerFill::none();
    }
    TakerFill {
        avg_price: cost / filled,
        quantity: filled,
    }
}

/// Walk the book as a taker and apply self-impact.
///
/// Identical to [`simulate_taker_fill`] except consumed levels are
/// decremented in place; a level drained to dust is removed.
pub fn consume_taker_fill(
    book: &mut L2Book,
    side: Side,
    quantity: f64,
    limit_price: Option<f64>,
) -> TakerFill {
    debug_assert!(quantity > 0.0, "quantity must be > 0");
    if quantity <= 0.0 {
        return TakerFill::none();
    }

    let book_side = side.opposite().resting_book_side();

    let mut remaining = quantity;
    let mut filled = 0.0;
    let mut cost = 0.0;

    while remaining > 0.0 {
        let Some((price, lvl_qty)) = book.side(book_side).best() else {
            break;
        };
        if limit_crossed(side, price, limit_price) {
            break;
        }

        let take = lvl_qty.min(remaining);
        filled += take;
        cost += take * price;
        remaining -= take;

        let levels = book.side_mut(book_side);
        let new_qty = lvl_qty - take;
        if new_qty <= DUST_QTY {
            levels.remove(price);
        } else {
            levels.set(price, new_qty);
        }
    }

    if filled <= 0.0 {
        return TakerFill::none();
    }
    TakerFill {
        avg_price: cost / filled,
        quantity: filled,
    }
}

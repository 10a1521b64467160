//! Execution records produced by the simulated broker.

use std::fmt;

use crate::{OrderId, Side, Symbol, TimeMs};

/// Whether an execution added or removed liquidity. Fee tiers differ by
/// liquidity type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Liquidity {
    Maker,
    Taker,
}

impl fmt::Display for Liquidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Liquidity::Maker => write!(f, "maker"),
            Liquidity::Taker => write!(f, "taker"),
        }
    }
}

/// A (possibly partial) execution of an order.
///
/// Fills are append-only; the broker never rewrites history.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fill {
    pub order_id: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: f64,
    pub price: f64,
    pub fee_usdt: f64,
    pub event_time_ms: TimeMs,
    pub liquidity: Liquidity,
}

impl Fill {
    /// Notional value in quote units (price × quantity).
    #[inline]
    pub fn notional(&self) -> f64 {
        self.price * self.quantity
    }
}

impl fmt::Display for Fill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} @ {} ({})",
            self.order_id, self.symbol, self.side, self.quantity, self.price, self.liquidity
        )
    }
}

//! Order representation.

use crate::{OrderId, Side, Symbol, TimeInForce, TimeMs};

/// Order type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OrderType {
    /// Execute immediately against available depth, no price cap.
    Market,
    /// Execute or rest at a limit price, per time-in-force and post-only.
    Limit,
}

/// An order submitted to the simulated broker.
///
/// The caller assigns the id; the broker keeps it through the whole
/// lifecycle, including the resting remainder of a crossing GTC limit.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Order {
    pub id: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    /// Base quantity. Must be positive.
    pub quantity: f64,
    /// Limit price. Required for limit orders, ignored for market orders.
    pub price: Option<f64>,
    pub time_in_force: TimeInForce,
    /// Post-only limits are rejected instead of taking liquidity.
    pub post_only: bool,
    pub created_time_ms: TimeMs,
}

impl Order {
    /// Create a market order.
    pub fn market(id: OrderId, symbol: Symbol, side: Side, quantity: f64) -> Self {
        Self {
            id,
            symbol,
            side,
            order_type: OrderType::Market,
            quantity,
            price: None,
            time_in_force: TimeInForce::GTC,
            post_only: false,
            created_time_ms: 0,
        }
    }

    /// Create a GTC limit order.
    pub fn limit(id: OrderId, symbol: Symbol, side: Side, quantity: f64, price: f64) -> Self {
        Self {
            id,
            symbol,
            side,
            order_type: OrderType::Limit,
            quantity,
            price: Some(price),
            time_in_force: TimeInForce::GTC,
            post_only: false,
            created_time_ms: 0,
        }
    }

    /// Switch the order to immediate-or-cancel.
    pub fn ioc(mut self) -> Self {
        self.time_in_force = TimeInForce::IOC;
        self
    }

    /// Mark the order post-only.
    pub fn post_only(mut self) -> Self {
        self.post_only = true;
        self
    }

    /// Set the creation timestamp.
    pub fn created_at(mut self, time_ms: TimeMs) -> Self {
        self.created_time_ms = time_ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_order_has_no_price() {
        let o = Order::market(OrderId(1), Symbol::new("BTCUSDT"), Side::Buy, 1.5);
        assert_eq!(o.order_type, OrderType::Market);
        assert_eq!(o.price, None);
        assert!(!o.post_only);
    }

    #[test]
    fn limit_order_defaults_to_gtc() {
        let o = Order::limit(OrderId(2), Symbol::new("BTCUSDT"), Side::Sell, 1.0, 100.0);
        assert_eq!(o.order_type, OrderType::Limit);
        assert_eq!(o.price, Some(100.0));
        assert_eq!(o.time_in_force, TimeInForce::GTC);
    }

    #[test]
    fn builders_compose() {
        let o = Order::limit(OrderId(3), Symbol::new("ETHUSDT"), Side::Buy, 2.0, 50.0)
            .ioc()
            .created_at(1_000);
        assert_eq!(o.time_in_force, TimeInForce::IOC);
        assert_eq!(o.created_time_ms, 1_000);

        let p = Order::limit(OrderId(4), Symbol::new("ETHUSDT"), Side::Buy, 2.0, 50.0).post_only();
        assert!(p.post_only);
    }
}

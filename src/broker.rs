//! Simulated broker: order lifecycle, latency modeling, fill emission.
//!
//! Taker fills consume L2 depth (with self-impact on the shared book); maker
//! fills come from the queue model driven by depth updates and the trade
//! tape. Submission and cancellation can be delayed by configurable
//! latencies; delayed actions activate through [`SimBroker::on_time`].

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::event::{DepthUpdate, Trade};
use crate::taker::consume_taker_fill;
use crate::{
    BookHandle, ConfigError, Fill, Liquidity, MakerQueueOrder, Order, OrderError, OrderId,
    OrderType, Portfolio, Side, Symbol, TakerFill, TimeInForce, TimeMs, PRICE_TOL,
};

/// Broker realism knobs.
///
/// Defaults model a typical USDT-margined futures fee schedule with no
/// latency and worst-case maker queue placement.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BrokerConfig {
    /// Maker fee as a fraction of notional.
    pub maker_fee_frac: f64,
    /// Taker fee as a fraction of notional.
    pub taker_fee_frac: f64,

    /// Delay between `submit` and the order reaching the matching logic.
    pub submit_latency_ms: TimeMs,
    /// Delay between `cancel` and the order leaving the book.
    pub cancel_latency_ms: TimeMs,

    /// Multiplier on the visible quantity at our level when seeding
    /// queue-ahead for a new maker order.
    pub maker_queue_ahead_factor: f64,
    /// Flat quantity added to the seeded queue-ahead.
    pub maker_queue_ahead_extra_qty: f64,
    /// Fraction of tape volume credited toward maker queues, in (0, 1].
    pub maker_trade_participation: f64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            maker_fee_frac: 0.0004,
            taker_fee_frac: 0.0005,
            submit_latency_ms: 0,
            cancel_latency_ms: 0,
            maker_queue_ahead_factor: 1.0,
            maker_queue_ahead_extra_qty: 0.0,
            maker_trade_participation: 1.0,
        }
    }
}

impl BrokerConfig {
    /// Check the configuration. Negative fees, latencies or queue parameters
    /// and out-of-range participation are construction-time failures.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("maker_fee_frac", self.maker_fee_frac),
            ("taker_fee_frac", self.taker_fee_frac),
            ("submit_latency_ms", self.submit_latency_ms as f64),
            ("cancel_latency_ms", self.cancel_latency_ms as f64),
            ("maker_queue_ahead_factor", self.maker_queue_ahead_factor),
            (
                "maker_queue_ahead_extra_qty",
                self.maker_queue_ahead_extra_qty,
            ),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) {
                return Err(ConfigError::NegativeParameter { name, value });
            }
        }
        let p = self.maker_trade_participation;
        if !(p > 0.0 && p <= 1.0) {
            return Err(ConfigError::TradeParticipation(p));
        }
        Ok(())
    }
}

/// A submit waiting out its latency. Ordered by `(due_ms, seq)` so that
/// equally-due submits activate in submission order.
#[derive(Debug)]
struct PendingSubmit {
    due_ms: TimeMs,
    seq: u64,
    order: Order,
    book: BookHandle,
}

impl PartialEq for PendingSubmit {
    fn eq(&self, other: &Self) -> bool {
        self.due_ms == other.due_ms && self.seq == other.seq
    }
}

impl Eq for PendingSubmit {}

impl PartialOrd for PendingSubmit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingSubmit {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due_ms, self.seq).cmp(&(other.due_ms, other.seq))
    }
}

/// A cancel waiting out its latency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct PendingCancel {
    due_ms: TimeMs,
    seq: u64,
    order_id: OrderId,
}

/// The simulated broker.
///
/// Owns the portfolio, the append-only fill list and the resting-order map.
/// All entry points are driven by the engine loop (or directly by tests).
#[derive(Debug)]
pub struct SimBroker {
    config: BrokerConfig,
    portfolio: Portfolio,
    fills: Vec<Fill>,

    maker_orders: FxHashMap<OrderId, MakerQueueOrder>,
    pending_submits: BinaryHeap<Reverse<PendingSubmit>>,
    pending_cancels: BinaryHeap<Reverse<PendingCancel>>,
    /// Monotonic tiebreaker for equally-due queue entries.
    seq: u64,
    /// Ids cancelled before their submit activated; the submit is dropped.
    canceled: FxHashSet<OrderId>,
}

impl Default for SimBroker {
    fn default() -> Self {
        Self::new(BrokerConfig::default()).expect("default broker config is valid")
    }
}

impl SimBroker {
    /// Create a broker, validating the configuration.
    pub fn new(config: BrokerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            portfolio: Portfolio::new(),
            fills: Vec::new(),
            maker_orders: FxHashMap::default(),
            pending_submits: BinaryHeap::new(),
            pending_cancels: BinaryHeap::new(),
            seq: 0,
            canceled: FxHashSet::default(),
        })
    }

    /// The active configuration.
    #[inline]
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Read-only portfolio state.
    #[inline]
    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    /// All fills so far, in emission order.
    #[inline]
    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    /// Returns true if any maker order is resting.
    pub fn has_open_orders(&self) -> bool {
        !self.maker_orders.is_empty()
    }

    /// A resting maker order by id.
    pub fn open_order(&self, order_id: OrderId) -> Option<&MakerQueueOrder> {
        self.maker_orders.get(&order_id)
    }

    /// Iterate resting maker orders.
    pub fn open_orders(&self) -> impl Iterator<Item = (&OrderId, &MakerQueueOrder)> {
        self.maker_orders.iter()
    }

    /// Apply a funding exchange to the owned portfolio. Returns the applied
    /// amount.
    pub fn apply_funding(&mut self, symbol: Symbol, mark_price: f64, funding_rate: f64) -> f64 {
        self.portfolio.apply_funding(symbol, mark_price, funding_rate)
    }

    /// Advance broker time: drain due cancels, then due submits.
    ///
    /// Cancels drain first so that a cancel and a submit due at the same
    /// instant resolve as cancel-before-submit (conservative).
    pub fn on_time(&mut self, now_ms: TimeMs) {
        while self
            .pending_cancels
            .peek()
            .is_some_and(|c| c.0.due_ms <= now_ms)
        {
            if let Some(Reverse(c)) = self.pending_cancels.pop() {
                self.cancel_now(c.order_id);
            }
        }

        while self
            .pending_submits
            .peek()
            .is_some_and(|s| s.0.due_ms <= now_ms)
        {
            if let Some(Reverse(s)) = self.pending_submits.pop() {
                if self.canceled.remove(&s.order.id) {
                    continue;
                }
                self.submit_now(s.order, &s.book, now_ms);
            }
        }
    }

    /// Submit an order.
    ///
    /// With `submit_latency_ms > 0` the order is queued and activates on a
    /// later [`on_time`](Self::on_time); validation still happens here, so a
    /// malformed order fails immediately.
    pub fn submit(
        &mut self,
        order: Order,
        book: &BookHandle,
        now_ms: TimeMs,
    ) -> Result<(), OrderError> {
        if !(order.quantity > 0.0) {
            return Err(OrderError::NonPositiveQuantity(order.quantity));
        }
        if order.order_type == OrderType::Limit && order.price.is_none() {
            return Err(OrderError::MissingLimitPrice);
        }

        if self.config.submit_latency_ms > 0 {
            self.seq += 1;
            self.pending_submits.push(Reverse(PendingSubmit {
                due_ms: now_ms + self.config.submit_latency_ms,
                seq: self.seq,
                order,
                book: Rc::clone(book),
            }));
            return Ok(());
        }

        self.submit_now(order, book, now_ms);
        Ok(())
    }

    fn submit_now(&mut self, order: Order, book: &BookHandle, now_ms: TimeMs) {
        match order.order_type {
            OrderType::Market => {
                self.fill_taker(&order, order.quantity, book, now_ms, None);
            }
            OrderType::Limit => {
                let limit_px = order.price.expect("limit price validated at submit");

                let (best_bid, best_ask) = {
                    let b = book.borrow();
                    (b.best_bid(), b.best_ask())
                };
                // Buy crosses if it reaches the ask; sell if it reaches the bid.
                let crosses = match order.side {
                    Side::Buy => best_ask.is_some_and(|ask| limit_px >= ask),
                    Side::Sell => best_bid.is_some_and(|bid| limit_px <= bid),
                };

                if order.post_only {
                    if crosses {
                        log::trace!("post-only {} would cross, rejected", order.id);
                        return;
                    }
                    self.open_maker(&order, order.quantity, limit_px, book);
                    return;
                }

                // Non-post-only IOC acts as a taker up to the limit; the
                // remainder is discarded.
                if order.time_in_force == TimeInForce::IOC {
                    self.fill_taker(&order, order.quantity, book, now_ms, Some(limit_px));
                    return;
                }

                // GTC: take the crossing portion, rest the remainder at the
                // limit under the same id.
                if crosses {
                    let fill = self.fill_taker(&order, order.quantity, book, now_ms, Some(limit_px));
                    let remaining = order.quantity - fill.quantity;
                    if remaining > 0.0 {
                        self.open_maker(&order, remaining, limit_px, book);
                    }
                    return;
                }

                self.open_maker(&order, order.quantity, limit_px, book);
            }
        }
    }

    /// Rest `quantity` of `order` as a maker at `price`, seeding queue-ahead
    /// from the currently visible same-side quantity.
    fn open_maker(&mut self, order: &Order, quantity: f64, price: f64, book: &BookHandle) {
        let visible = {
            let b = book.borrow();
            b.side(order.side.resting_book_side())
                .qty_at(price)
                .unwrap_or(0.0)
        };
        let queue_ahead = visible * self.config.maker_queue_ahead_factor
            + self.config.maker_queue_ahead_extra_qty;

        log::debug!(
            "maker open {} {} {} {} @ {} queue_ahead {:.8}",
            order.id,
            order.symbol,
            order.side,
            quantity,
            price,
            queue_ahead
        );

        self.maker_orders.insert(
            order.id,
            MakerQueueOrder::new(
                order.symbol,
                order.side,
                price,
                quantity,
                queue_ahead,
                self.config.maker_trade_participation,
            ),
        );
    }

    /// Run a taker walk and, on a positive fill, book fees and emit a fill.
    fn fill_taker(
        &mut self,
        order: &Order,
        quantity: f64,
        book: &BookHandle,
        now_ms: TimeMs,
        limit_price: Option<f64>,
    ) -> TakerFill {
        let fill = {
            let mut b = book.borrow_mut();
            consume_taker_fill(&mut b, order.side, quantity, limit_price)
        };
        if fill.is_empty() {
            return TakerFill::none();
        }

        let fee = fill.quantity * fill.avg_price * self.config.taker_fee_frac;
        self.portfolio
            .apply_fill(order.symbol, order.side, fill.quantity, fill.avg_price, fee);
        log::debug!(
            "taker fill {} {} {} {} @ {:.8}",
            order.id,
            order.symbol,
            order.side,
            fill.quantity,
            fill.avg_price
        );
        self.fills.push(Fill {
            order_id: order.id,
            symbol: order.symbol,
            side: order.side,
            quantity: fill.quantity,
            price: fill.avg_price,
            fee_usdt: fee,
            event_time_ms: now_ms,
            liquidity: Liquidity::Taker,
        });
        fill
    }

    /// Apply a depth message to the shared book, then pass touched levels at
    /// each resting order's price through its queue model.
    pub fn on_depth_update(&mut self, update: &DepthUpdate, book: &BookHandle) {
        {
            let mut b = book.borrow_mut();
            b.apply_depth_update(&update.bid_updates, &update.ask_updates);
        }

        let mut done: Vec<OrderId> = Vec::new();
        for (order_id, mo) in self.maker_orders.iter_mut() {
            if mo.symbol != update.symbol {
                continue;
            }
            // Only updates on our side at our price can move our queue.
            let touched = match mo.side {
                Side::Buy => &update.bid_updates,
                Side::Sell => &update.ask_updates,
            };
            for &(price, qty) in touched {
                if (price - mo.price).abs() <= PRICE_TOL {
                    mo.on_book_qty_update(qty);
                    break;
                }
            }

            // Filled via prior trades; finalize and remove.
            if mo.is_filled() {
                done.push(*order_id);
            }
        }
        for order_id in done {
            self.maker_orders.remove(&order_id);
        }
    }

    /// Feed a tape trade to every resting maker order, emitting maker fills
    /// as queues deplete.
    pub fn on_trade(&mut self, trade: &Trade, now_ms: TimeMs) {
        let mut done: Vec<OrderId> = Vec::new();
        for (order_id, mo) in self.maker_orders.iter_mut() {
            let fill_qty = mo.on_trade(trade);
            if fill_qty <= 0.0 {
                continue;
            }

            let fee = fill_qty * trade.price * self.config.maker_fee_frac;
            self.portfolio
                .apply_fill(mo.symbol, mo.side, fill_qty, trade.price, fee);
            log::debug!(
                "maker fill {} {} {} {} @ {:.8}",
                order_id,
                mo.symbol,
                mo.side,
                fill_qty,
                trade.price
            );
            self.fills.push(Fill {
                order_id: *order_id,
                symbol: mo.symbol,
                side: mo.side,
                quantity: fill_qty,
                price: trade.price,
                fee_usdt: fee,
                event_time_ms: now_ms,
                liquidity: Liquidity::Maker,
            });

            if mo.is_filled() {
                done.push(*order_id);
            }
        }
        for order_id in done {
            self.maker_orders.remove(&order_id);
        }
    }

    /// Cancel an order.
    ///
    /// With `cancel_latency_ms > 0` and a known `now_ms`, the cancel is
    /// delayed and applied via [`on_time`](Self::on_time). Cancelling an id
    /// whose submit is still pending suppresses that submit when it comes
    /// due.
    pub fn cancel(&mut self, order_id: OrderId, now_ms: Option<TimeMs>) {
        if self.config.cancel_latency_ms > 0 {
            if let Some(now) = now_ms {
                self.seq += 1;
                self.pending_cancels.push(Reverse(PendingCancel {
                    due_ms: now + self.config.cancel_latency_ms,
                    seq: self.seq,
                    order_id,
                }));
                return;
            }
        }
        self.cancel_now(order_id);
    }

    fn cancel_now(&mut self, order_id: OrderId) {
        self.maker_orders.remove(&order_id);
        // Also covers an order submitted but not yet activated.
        self.canceled.insert(order_id);
    }
}

//! Backtest engine: merged-event iteration, tick scheduling, dispatch.
//!
//! The engine is the sole driver. For each event it advances broker time,
//! applies the event to the shared market state, then hands the event to the
//! strategy. Strategy callbacks run synchronously inside the loop and may
//! submit or cancel orders at the current simulation time.

use rustc_hash::FxHashMap;

use crate::event::{Event, Liquidation, MarkPrice, OpenInterest, Ticker};
use crate::{BookHandle, L2Book, SimBroker, Symbol, TimeMs};

/// Engine configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Tick-callback period. `<= 0` disables the tick driver.
    pub tick_interval_ms: TimeMs,
    /// Optional trading window start, consulted via
    /// [`EngineContext::is_trading_time`].
    pub trading_start_ms: Option<TimeMs>,
    /// Optional trading window end (inclusive).
    pub trading_end_ms: Option<TimeMs>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1_000,
            trading_start_ms: None,
            trading_end_ms: None,
        }
    }
}

/// Market state and services visible to strategies.
///
/// Owns the broker (which owns the portfolio and fills) and the per-symbol
/// books and latest-event maps. Books are created lazily on first reference.
pub struct EngineContext {
    pub config: EngineConfig,
    pub broker: SimBroker,
    pub now_ms: TimeMs,

    books: FxHashMap<Symbol, BookHandle>,
    mark: FxHashMap<Symbol, MarkPrice>,
    ticker: FxHashMap<Symbol, Ticker>,
    open_interest: FxHashMap<Symbol, OpenInterest>,
    liquidation: FxHashMap<Symbol, Liquidation>,

    last_funding_applied_ms: FxHashMap<Symbol, TimeMs>,
}

impl EngineContext {
    fn new(config: EngineConfig, broker: SimBroker) -> Self {
        Self {
            config,
            broker,
            now_ms: 0,
            books: FxHashMap::default(),
            mark: FxHashMap::default(),
            ticker: FxHashMap::default(),
            open_interest: FxHashMap::default(),
            liquidation: FxHashMap::default(),
            last_funding_applied_ms: FxHashMap::default(),
        }
    }

    /// The book for a symbol, created empty on first reference.
    ///
    /// Returns an owned handle; do not hold a borrow of it across a broker
    /// call, the broker borrows the same book internally.
    pub fn book(&mut self, symbol: Symbol) -> BookHandle {
        self.books
            .entry(symbol)
            .or_insert_with(|| L2Book::new().into_shared())
            .clone()
    }

    /// All books created so far.
    pub fn books(&self) -> &FxHashMap<Symbol, BookHandle> {
        &self.books
    }

    /// Latest mark-price event for a symbol.
    pub fn mark(&self, symbol: Symbol) -> Option<&MarkPrice> {
        self.mark.get(&symbol)
    }

    /// Latest ticker for a symbol.
    pub fn ticker(&self, symbol: Symbol) -> Option<&Ticker> {
        self.ticker.get(&symbol)
    }

    /// Latest open-interest snapshot for a symbol.
    pub fn open_interest(&self, symbol: Symbol) -> Option<&OpenInterest> {
        self.open_interest.get(&symbol)
    }

    /// Latest liquidation record for a symbol.
    pub fn liquidation(&self, symbol: Symbol) -> Option<&Liquidation> {
        self.liquidation.get(&symbol)
    }

    /// Returns true if `now_ms` is inside the configured trading window.
    pub fn is_trading_time(&self) -> bool {
        if let Some(start) = self.config.trading_start_ms {
            if self.now_ms < start {
                return false;
            }
        }
        if let Some(end) = self.config.trading_end_ms {
            if self.now_ms > end {
                return false;
            }
        }
        true
    }

    /// Apply funding for a mark-price event if its funding timestamp is due
    /// and has not been applied yet. Returns the funding PnL applied (zero
    /// when gated out or flat).
    ///
    /// Funding applies at the first mark-price event at or after
    /// `next_funding_time_ms`, once per distinct funding timestamp per
    /// symbol.
    pub fn apply_funding_if_due(&mut self, mp: &MarkPrice) -> f64 {
        if mp.next_funding_time_ms <= 0 {
            return 0.0;
        }
        if mp.event_time_ms < mp.next_funding_time_ms {
            return 0.0;
        }

        let last_applied = self
            .last_funding_applied_ms
            .get(&mp.symbol)
            .copied()
            .unwrap_or(-1);
        if mp.next_funding_time_ms <= last_applied {
            return 0.0;
        }

        self.last_funding_applied_ms
            .insert(mp.symbol, mp.next_funding_time_ms);
        let pnl = self
            .broker
            .apply_funding(mp.symbol, mp.mark_price, mp.funding_rate);
        if pnl != 0.0 {
            log::debug!(
                "funding {} rate {:.6} mark {:.2} pnl {:.6}",
                mp.symbol,
                mp.funding_rate,
                mp.mark_price,
                pnl
            );
        }
        pnl
    }
}

/// Strategy callback hooks. All methods default to no-ops, so a strategy
/// implements only what it needs.
pub trait Strategy {
    /// Called once before the first event.
    fn on_start(&mut self, _ctx: &mut EngineContext) {}

    /// Called on each tick-grid boundary (only when `tick_interval_ms > 0`).
    fn on_tick(&mut self, _now_ms: TimeMs, _ctx: &mut EngineContext) {}

    /// Called once per event, after the event has been applied to the
    /// market state.
    fn on_event(&mut self, _event: &Event, _ctx: &mut EngineContext) {}

    /// Called once after the last tick.
    fn on_end(&mut self, _ctx: &mut EngineContext) {}
}

/// Result of a backtest run: the final context, including broker state,
/// portfolio, fills, and the latest-event maps.
pub struct BacktestResult {
    pub ctx: EngineContext,
}

/// The backtest engine.
///
/// ```
/// use perpsim::{BacktestEngine, EngineConfig, Strategy};
///
/// struct Noop;
/// impl Strategy for Noop {}
///
/// let engine = BacktestEngine::new(EngineConfig::default());
/// let result = engine.run(Vec::new(), &mut Noop);
/// assert!(result.ctx.broker.fills().is_empty());
/// ```
pub struct BacktestEngine {
    config: EngineConfig,
    broker: SimBroker,
}

impl BacktestEngine {
    /// Create an engine with a default-configured broker.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            broker: SimBroker::default(),
        }
    }

    /// Create an engine around a pre-configured broker.
    pub fn with_broker(config: EngineConfig, broker: SimBroker) -> Self {
        Self { config, broker }
    }

    /// Run the backtest over a time-ordered event stream.
    ///
    /// Per event: drive due ticks, advance broker time, dispatch the event,
    /// then invoke the strategy. After the stream, one final tick fires at
    /// the next grid boundary, then `on_end`.
    pub fn run<S: Strategy>(
        self,
        events: impl IntoIterator<Item = Event>,
        strategy: &mut S,
    ) -> BacktestResult {
        let mut ctx = EngineContext::new(self.config, self.broker);

        strategy.on_start(&mut ctx);

        let tick_interval = ctx.config.tick_interval_ms.max(0);
        let mut next_tick_ms: Option<TimeMs> = None;

        for ev in events {
            let now = ev.event_time_ms();

            // Drive ticks up to the current event time. A tick landing
            // exactly on `now` fires before the event.
            if tick_interval > 0 {
                let mut next = *next_tick_ms
                    .get_or_insert_with(|| now.div_euclid(tick_interval) * tick_interval);
                while next <= now {
                    ctx.now_ms = next;
                    ctx.broker.on_time(next);
                    strategy.on_tick(next, &mut ctx);
                    next += tick_interval;
                }
                next_tick_ms = Some(next);
            }

            ctx.now_ms = now;
            ctx.broker.on_time(now);

            match &ev {
                Event::Depth(update) => {
                    let book = ctx.book(update.symbol);
                    ctx.broker.on_depth_update(update, &book);
                }
                Event::Trade(trade) => {
                    ctx.broker.on_trade(trade, now);
                }
                Event::Mark(mp) => {
                    ctx.mark.insert(mp.symbol, mp.clone());
                    ctx.apply_funding_if_due(mp);
                }
                Event::Ticker(t) => {
                    ctx.ticker.insert(t.symbol, t.clone());
                }
                Event::OpenInterest(oi) => {
                    ctx.open_interest.insert(oi.symbol, oi.clone());
                }
                Event::Liquidation(liq) => {
                    ctx.liquidation.insert(liq.symbol, liq.clone());
                }
            }

            strategy.on_event(&ev, &mut ctx);
        }

        // One last tick so strategies can clean up on a grid boundary.
        if tick_interval > 0 {
            if let Some(next) = next_tick_ms {
                ctx.now_ms = next;
                ctx.broker.on_time(next);
                strategy.on_tick(next, &mut ctx);
            }
        }

        strategy.on_end(&mut ctx);

        BacktestResult { ctx }
    }
}

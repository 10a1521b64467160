//! # perpsim
//!
//! A deterministic, event-driven backtesting engine for cryptocurrency
//! derivatives (perpetual and dated futures).
//!
//! The engine consumes a time-ordered stream of recorded market-data events
//! (L2 depth deltas, trades, mark-price/funding snapshots, tickers, open
//! interest, liquidations) and drives:
//!
//! - an in-memory [`L2Book`] per symbol,
//! - a [`SimBroker`] with realistic maker/taker semantics, latency and
//!   queue-position modeling,
//! - a [`Portfolio`] accumulating positions, realized PnL, fees and funding.
//!
//! Strategies plug in as callbacks via the [`Strategy`] trait and issue
//! orders in response to events. Given identical inputs and configuration,
//! a run is byte-identical.
//!
//! ## Quick start
//!
//! ```
//! use perpsim::{
//!     BrokerConfig, L2Book, Order, OrderId, Side, SimBroker, Symbol,
//! };
//!
//! let sym = Symbol::new("BTCUSDT");
//!
//! // A book with one bid and one ask level.
//! let mut book = L2Book::new();
//! book.apply_depth_update(&[(99.0, 1.0)], &[(100.0, 2.0)]);
//! let book = book.into_shared();
//!
//! let mut broker = SimBroker::new(BrokerConfig::default()).unwrap();
//! broker
//!     .submit(Order::market(OrderId(1), sym, Side::Buy, 1.5), &book, 0)
//!     .unwrap();
//!
//! let pos = broker.portfolio().position(sym).unwrap();
//! assert_eq!(pos.qty, 1.5);
//! assert_eq!(pos.avg_price, 100.0);
//!
//! // Taker self-impact: the consumed liquidity is gone from the book.
//! assert_eq!(book.borrow().asks().qty_at(100.0), Some(0.5));
//! ```
//!
//! ## Running a backtest
//!
//! ```
//! use perpsim::{
//!     BacktestEngine, DepthUpdate, EngineConfig, EngineContext, Event,
//!     Order, OrderId, Side, Strategy, Symbol,
//! };
//!
//! /// Buys once, on the first event it sees.
//! struct BuyOnce {
//!     done: bool,
//! }
//!
//! impl Strategy for BuyOnce {
//!     fn on_event(&mut self, event: &Event, ctx: &mut EngineContext) {
//!         if self.done {
//!             return;
//!         }
//!         self.done = true;
//!         let sym = event.symbol();
//!         let book = ctx.book(sym);
//!         ctx.broker
//!             .submit(Order::market(OrderId(1), sym, Side::Buy, 1.0), &book, ctx.now_ms)
//!             .unwrap();
//!     }
//! }
//!
//! let events = vec![Event::Depth(DepthUpdate {
//!     received_time_ns: 0,
//!     event_time_ms: 1_000,
//!     transaction_time_ms: 1_000,
//!     symbol: Symbol::new("BTCUSDT"),
//!     first_update_id: 1,
//!     final_update_id: 1,
//!     prev_final_update_id: 0,
//!     bid_updates: vec![(99.0, 1.0)],
//!     ask_updates: vec![(100.0, 2.0)],
//! })];
//!
//! let engine = BacktestEngine::new(EngineConfig::default());
//! let result = engine.run(events, &mut BuyOnce { done: false });
//!
//! assert_eq!(result.ctx.broker.fills().len(), 1);
//! ```
//!
//! ## Merging recorded streams
//!
//! Per-source streams (depth, trades, marks, ...) merge into the single
//! ordered stream the engine consumes:
//!
//! ```
//! use perpsim::{merge_event_streams, slice_event_stream, Event};
//!
//! let depth: Vec<Event> = Vec::new();
//! let trades: Vec<Event> = Vec::new();
//!
//! let merged = merge_event_streams(vec![depth, trades]);
//! let day: Vec<Event> =
//!     slice_event_stream(merged, Some(1_700_000_000_000), Some(1_700_086_400_000)).collect();
//! assert!(day.is_empty());
//! ```

mod analytics;
mod book;
mod broker;
mod engine;
mod error;
mod event;
mod fill;
mod levels;
mod order;
mod portfolio;
mod queue;
mod side;
mod stream;
mod taker;
mod tif;
mod types;

// Re-export public API
pub use analytics::{
    max_drawdown, round_trips_from_fills, summarize_round_trips, RoundTrip, RoundTripSummary,
    TradeDirection,
};
pub use book::{BookHandle, L2Book};
pub use broker::{BrokerConfig, SimBroker};
pub use engine::{BacktestEngine, BacktestResult, EngineConfig, EngineContext, Strategy};
pub use error::{ConfigError, OrderError};
pub use event::{
    DepthUpdate, Event, Liquidation, MarkPrice, OpenInterest, Ticker, Timestamped, Trade,
};
pub use fill::{Fill, Liquidity};
pub use levels::BookLevels;
pub use order::{Order, OrderType};
pub use portfolio::{Portfolio, Position};
pub use queue::MakerQueueOrder;
pub use side::{BookSide, Side};
pub use stream::{merge_event_streams, slice_event_stream, MergedStreams};
pub use taker::{consume_taker_fill, simulate_taker_fill, TakerFill};
pub use tif::TimeInForce;
pub use types::{OrderId, Symbol, TimeMs, TimeNs, DUST_QTY, PRICE_TOL};

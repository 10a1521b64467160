//! Market-data events.
//!
//! Every event carries `event_time_ms`, the monotone simulation-clock anchor,
//! and `received_time_ns`, the wall-clock receive hint from the recording
//! process. Streams are merged and sliced on `event_time_ms` only.

use crate::{Side, Symbol, TimeMs, TimeNs};

/// Anything with a simulation-clock timestamp. Implemented by [`Event`] and
/// usable for merging custom record types with the stream utilities.
pub trait Timestamped {
    fn event_time_ms(&self) -> TimeMs;
}

/// L2 depth update.
///
/// Aggregated per-level deltas: each `(price, qty)` entry replaces the level's
/// visible quantity, and `qty == 0` deletes the level. The stream supplies
/// self-contained deltas; no snapshot reconstruction is performed.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DepthUpdate {
    pub received_time_ns: TimeNs,
    pub event_time_ms: TimeMs,
    pub transaction_time_ms: TimeMs,
    pub symbol: Symbol,

    pub first_update_id: i64,
    pub final_update_id: i64,
    pub prev_final_update_id: i64,

    pub bid_updates: Vec<(f64, f64)>,
    pub ask_updates: Vec<(f64, f64)>,
}

/// A trade print from the tape.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trade {
    pub received_time_ns: TimeNs,
    pub event_time_ms: TimeMs,
    pub trade_time_ms: TimeMs,
    pub symbol: Symbol,

    pub trade_id: i64,
    pub price: f64,
    pub quantity: f64,

    /// Binance semantics: `true` means the buyer was the maker, i.e. a sell
    /// aggressor hit the bids.
    pub is_buyer_maker: bool,
}

/// Mark-price / funding snapshot.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarkPrice {
    pub received_time_ns: TimeNs,
    pub event_time_ms: TimeMs,
    pub symbol: Symbol,

    pub mark_price: f64,
    pub index_price: f64,
    pub funding_rate: f64,
    /// Timestamp of the upcoming funding exchange; `<= 0` means unknown.
    pub next_funding_time_ms: TimeMs,
}

/// Aggregated ticker (Binance-style 24h rolling window statistics).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ticker {
    pub received_time_ns: TimeNs,
    pub event_time_ms: TimeMs,
    pub symbol: Symbol,

    pub price_change: f64,
    pub price_change_percent: f64,
    pub weighted_average_price: f64,
    pub last_price: f64,
    pub last_quantity: f64,
    pub open_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub base_asset_volume: f64,
    pub quote_asset_volume: f64,

    pub statistics_open_time_ms: TimeMs,
    pub statistics_close_time_ms: TimeMs,
    pub first_trade_id: i64,
    pub last_trade_id: i64,
    pub total_trades: i64,
}

/// Open-interest snapshot (typically low frequency, e.g. 5m).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpenInterest {
    pub received_time_ns: TimeNs,
    /// Availability time on the simulation clock: when a strategy is allowed
    /// to see the snapshot. Defaults to `timestamp_ms` in recorded data.
    pub event_time_ms: TimeMs,
    /// Measurement time (epoch ms, UTC).
    pub timestamp_ms: TimeMs,
    pub symbol: Symbol,

    pub sum_open_interest: f64,
    pub sum_open_interest_value: f64,
}

/// Public forced-order (liquidation) record.
///
/// Exchange-reported fields are carried through verbatim; `order_type`,
/// `time_in_force` and `order_status` keep the raw exchange strings.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Liquidation {
    pub received_time_ns: TimeNs,
    pub event_time_ms: TimeMs,
    pub symbol: Symbol,

    pub side: Side,
    pub order_type: String,
    pub time_in_force: String,
    pub quantity: f64,
    pub price: f64,
    pub average_price: f64,
    pub order_status: String,
    pub last_filled_quantity: f64,
    pub filled_quantity: f64,
    pub trade_time_ms: TimeMs,
}

/// A market-data event, dispatched by the engine loop.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Event {
    Depth(DepthUpdate),
    Trade(Trade),
    Mark(MarkPrice),
    Ticker(Ticker),
    OpenInterest(OpenInterest),
    Liquidation(Liquidation),
}

impl Event {
    /// Simulation-clock timestamp of the event.
    pub fn event_time_ms(&self) -> TimeMs {
        match self {
            Event::Depth(e) => e.event_time_ms,
            Event::Trade(e) => e.event_time_ms,
            Event::Mark(e) => e.event_time_ms,
            Event::Ticker(e) => e.event_time_ms,
            Event::OpenInterest(e) => e.event_time_ms,
            Event::Liquidation(e) => e.event_time_ms,
        }
    }

    /// Wall-clock receive-time hint.
    pub fn received_time_ns(&self) -> TimeNs {
        match self {
            Event::Depth(e) => e.received_time_ns,
            Event::Trade(e) => e.received_time_ns,
            Event::Mark(e) => e.received_time_ns,
            Event::Ticker(e) => e.received_time_ns,
            Event::OpenInterest(e) => e.received_time_ns,
            Event::Liquidation(e) => e.received_time_ns,
        }
    }

    /// The instrument this event refers to.
    pub fn symbol(&self) -> Symbol {
        match self {
            Event::Depth(e) => e.symbol,
            Event::Trade(e) => e.symbol,
            Event::Mark(e) => e.symbol,
            Event::Ticker(e) => e.symbol,
            Event::OpenInterest(e) => e.symbol,
            Event::Liquidation(e) => e.symbol,
        }
    }
}

impl Timestamped for Event {
    fn event_time_ms(&self) -> TimeMs {
        Event::event_time_ms(self)
    }
}

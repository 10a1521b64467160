//! Post-run analytics: round-trip reconstruction and drawdown.
//!
//! A round trip is a position's lifetime: it opens when the symbol goes flat
//! → non-zero and closes when it returns to flat or flips direction. PnL is
//! computed from fills only (funding is excluded); fees are included in the
//! net figure, matching portfolio semantics.

use rustc_hash::FxHashMap;

use crate::{Fill, Portfolio, Symbol, TimeMs};

/// Direction of a round trip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TradeDirection {
    Long,
    Short,
}

/// One reconstructed round trip.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundTrip {
    pub symbol: Symbol,
    pub direction: TradeDirection,
    pub open_time_ms: TimeMs,
    pub close_time_ms: TimeMs,

    /// Realized PnL over the trip, net of fees.
    pub net_pnl_usdt: f64,
    /// Realized PnL over the trip before fees.
    pub gross_pnl_usdt: f64,
    pub fees_usdt: f64,

    /// Peak absolute exposure reached during the trip.
    pub max_abs_qty: f64,
}

impl RoundTrip {
    /// Time from open to close.
    #[inline]
    pub fn duration_ms(&self) -> TimeMs {
        self.close_time_ms - self.open_time_ms
    }
}

/// Aggregate statistics over a set of round trips.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundTripSummary {
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: Option<f64>,

    pub net_pnl_usdt: f64,
    pub gross_pnl_usdt: f64,
    pub fees_usdt: f64,

    pub avg_net_pnl_usdt: Option<f64>,
    pub avg_duration_ms: Option<f64>,
    pub max_duration_ms: Option<TimeMs>,
}

struct OpenState {
    open_time_ms: TimeMs,
    direction: TradeDirection,
    realized_start: f64,
    fees_start: f64,
    max_abs_qty: f64,
}

/// Reconstruct per-symbol round trips from a fill list.
///
/// Fills are replayed through a scratch [`Portfolio`] in stable
/// `(event_time_ms, insertion)` order, so the result is deterministic
/// regardless of how the caller interleaved symbols.
pub fn round_trips_from_fills(fills: &[Fill]) -> Vec<RoundTrip> {
    let mut order: Vec<usize> = (0..fills.len()).collect();
    order.sort_by_key(|&i| (fills[i].event_time_ms, i));

    let mut pf = Portfolio::new();
    let mut open_state: FxHashMap<Symbol, OpenState> = FxHashMap::default();
    let mut out = Vec::new();

    for i in order {
        let f = &fills[i];
        let sym = f.symbol;

        let qty_before = pf.qty(sym);
        let realized_before = pf.realized_pnl_usdt;
        let fees_before = pf.fees_paid_usdt;

        pf.apply_fill(sym, f.side, f.quantity, f.price, f.fee_usdt);

        let qty_after = pf.qty(sym);
        let realized_after = pf.realized_pnl_usdt;
        let fees_after = pf.fees_paid_usdt;

        // Open.
        if qty_before == 0.0 && qty_after != 0.0 {
            open_state.insert(
                sym,
                OpenState {
                    open_time_ms: f.event_time_ms,
                    direction: if qty_after > 0.0 {
                        TradeDirection::Long
                    } else {
                        TradeDirection::Short
                    },
                    realized_start: realized_before,
                    fees_start: fees_before,
                    max_abs_qty: qty_after.abs(),
                },
            );
            continue;
        }

        let Some(st) = open_state.get_mut(&sym) else {
            continue;
        };

        // Track peak exposure during the trip.
        st.max_abs_qty = st.max_abs_qty.max(qty_after.abs());

        let flipped = (qty_before > 0.0 && qty_after < 0.0) || (qty_before < 0.0 && qty_after > 0.0);

        // Close (flat or flip).
        if qty_after == 0.0 || flipped {
            let st = open_state
                .remove(&sym)
                .expect("open state present for closing fill");
            let fees = fees_after - st.fees_start;
            let net = realized_after - st.realized_start;
            out.push(RoundTrip {
                symbol: sym,
                direction: st.direction,
                open_time_ms: st.open_time_ms,
                close_time_ms: f.event_time_ms,
                net_pnl_usdt: net,
                gross_pnl_usdt: net + fees,
                fees_usdt: fees,
                max_abs_qty: st.max_abs_qty,
            });

            // A flip opens the next trip at this same fill.
            if flipped && qty_after != 0.0 {
                open_state.insert(
                    sym,
                    OpenState {
                        open_time_ms: f.event_time_ms,
                        direction: if qty_after > 0.0 {
                            TradeDirection::Long
                        } else {
                            TradeDirection::Short
                        },
                        realized_start: realized_after,
                        fees_start: fees_after,
                        max_abs_qty: qty_after.abs(),
                    },
                );
            }
        }
    }

    out
}

/// Summarize a set of round trips.
pub fn summarize_round_trips(trades: &[RoundTrip]) -> RoundTripSummary {
    if trades.is_empty() {
        return RoundTripSummary::default();
    }

    let wins = trades.iter().filter(|t| t.net_pnl_usdt > 0.0).count();
    let losses = trades.iter().filter(|t| t.net_pnl_usdt < 0.0).count();

    let net: f64 = trades.iter().map(|t| t.net_pnl_usdt).sum();
    let gross: f64 = trades.iter().map(|t| t.gross_pnl_usdt).sum();
    let fees: f64 = trades.iter().map(|t| t.fees_usdt).sum();

    let n = trades.len() as f64;
    let durations: Vec<TimeMs> = trades.iter().map(|t| t.duration_ms()).collect();

    RoundTripSummary {
        trades: trades.len(),
        wins,
        losses,
        win_rate: Some(wins as f64 / n),
        net_pnl_usdt: net,
        gross_pnl_usdt: gross,
        fees_usdt: fees,
        avg_net_pnl_usdt: Some(net / n),
        avg_duration_ms: Some(durations.iter().sum::<TimeMs>() as f64 / n),
        max_duration_ms: durations.iter().copied().max(),
    }
}

/// Maximum drawdown of an equity curve `(time_ms, equity)`.
///
/// Returns the most negative peak-to-trough excursion, or `None` for an
/// empty curve.
pub fn max_drawdown(equity_curve: &[(TimeMs, f64)]) -> Option<f64> {
    if equity_curve.is_empty() {
        return None;
    }

    let mut peak = f64::NEG_INFINITY;
    let mut mdd = 0.0;
    for &(_, equity) in equity_curve {
        if equity > peak {
            peak = equity;
        }
        let dd = equity - peak;
        if dd < mdd {
            mdd = dd;
        }
    }
    Some(mdd)
}

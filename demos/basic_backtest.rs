//! Minimal end-to-end backtest: a strategy that buys on a wide spread and
//! flattens at the end of the run.
//!
//! Run with: `cargo run --example basic_backtest`

use perpsim::{
    round_trips_from_fills, summarize_round_trips, BacktestEngine, BrokerConfig, DepthUpdate,
    EngineConfig, EngineContext, Event, Order, OrderId, Side, SimBroker, Strategy, Symbol, TimeMs,
    Trade,
};

const SYMBOL: &str = "BTCUSDT";

/// Buys 0.1 whenever the spread is at least 2.0 quote units wide and no
/// position is open; sells everything in `on_end`.
struct SpreadBuyer {
    next_id: u64,
}

impl SpreadBuyer {
    fn new() -> Self {
        Self { next_id: 0 }
    }

    fn next_id(&mut self) -> OrderId {
        self.next_id += 1;
        OrderId(self.next_id)
    }
}

impl Strategy for SpreadBuyer {
    fn on_event(&mut self, event: &Event, ctx: &mut EngineContext) {
        let sym = event.symbol();
        if !matches!(event, Event::Depth(_)) {
            return;
        }
        if ctx.broker.portfolio().qty(sym) != 0.0 {
            return;
        }

        let book = ctx.book(sym);
        let spread = {
            let b = book.borrow();
            match (b.best_bid(), b.best_ask()) {
                (Some(bid), Some(ask)) => ask - bid,
                _ => return,
            }
        };
        if spread < 2.0 {
            return;
        }

        let id = self.next_id();
        ctx.broker
            .submit(Order::market(id, sym, Side::Buy, 0.1), &book, ctx.now_ms)
            .expect("valid order");
    }

    fn on_end(&mut self, ctx: &mut EngineContext) {
        let sym = Symbol::new(SYMBOL);
        let qty = ctx.broker.portfolio().qty(sym);
        if qty > 0.0 {
            let book = ctx.book(sym);
            let id = self.next_id();
            ctx.broker
                .submit(Order::market(id, sym, Side::Sell, qty), &book, ctx.now_ms)
                .expect("valid order");
        }
    }
}

fn synthetic_tape() -> Vec<Event> {
    let sym = Symbol::new(SYMBOL);
    let mut events = Vec::new();
    for i in 0..200i64 {
        let t: TimeMs = 1_000 + i * 250;
        // Price drifts upward; the spread widens every 25th update.
        let mid = 30_000.0 + i as f64 * 0.5;
        let half_spread = if i % 25 == 0 { 1.5 } else { 0.5 };
        events.push(Event::Depth(DepthUpdate {
            received_time_ns: t * 1_000_000,
            event_time_ms: t,
            transaction_time_ms: t,
            symbol: sym,
            first_update_id: i,
            final_update_id: i,
            prev_final_update_id: i - 1,
            bid_updates: vec![(mid - half_spread, 2.0)],
            ask_updates: vec![(mid + half_spread, 2.0)],
        }));
        if i % 10 == 5 {
            events.push(Event::Trade(Trade {
                received_time_ns: t * 1_000_000 + 1,
                event_time_ms: t,
                trade_time_ms: t,
                symbol: sym,
                trade_id: i,
                price: mid,
                quantity: 0.2,
                is_buyer_maker: i % 20 == 5,
            }));
        }
    }
    events
}

fn main() {
    let broker = SimBroker::new(BrokerConfig {
        maker_fee_frac: 0.0002,
        taker_fee_frac: 0.0005,
        ..BrokerConfig::default()
    })
    .expect("valid broker config");

    let engine = BacktestEngine::with_broker(
        EngineConfig {
            tick_interval_ms: 1_000,
            ..EngineConfig::default()
        },
        broker,
    );

    let result = engine.run(synthetic_tape(), &mut SpreadBuyer::new());

    let portfolio = result.ctx.broker.portfolio();
    println!("fills:        {}", result.ctx.broker.fills().len());
    println!("realized pnl: {:.4} USDT", portfolio.realized_pnl_usdt);
    println!("fees paid:    {:.4} USDT", portfolio.fees_paid_usdt);

    let trips = round_trips_from_fills(result.ctx.broker.fills());
    let summary = summarize_round_trips(&trips);
    println!(
        "round trips:  {} ({} wins / {} losses)",
        summary.trades, summary.wins, summary.losses
    );
    if let Some(avg) = summary.avg_net_pnl_usdt {
        println!("avg net pnl:  {:.4} USDT", avg);
    }
}

//! Demonstrates maker queue mechanics: a post-only bid working its way to
//! the front of the queue as depth shrinks and trades print at its level.
//!
//! Run with: `cargo run --example maker_queue`

use perpsim::{
    BrokerConfig, DepthUpdate, L2Book, Order, OrderId, Side, SimBroker, Symbol, Trade,
};

fn main() {
    let sym = Symbol::new("BTCUSDT");

    let mut book = L2Book::new();
    book.apply_depth_update(&[(30_000.0, 4.0)], &[(30_001.0, 3.0)]);
    let book = book.into_shared();

    let mut broker = SimBroker::new(BrokerConfig {
        maker_fee_frac: 0.0002,
        taker_fee_frac: 0.0005,
        // Assume we join behind everything visible, plus a safety pad.
        maker_queue_ahead_factor: 1.0,
        maker_queue_ahead_extra_qty: 0.5,
        maker_trade_participation: 0.9,
        ..BrokerConfig::default()
    })
    .expect("valid broker config");

    broker
        .submit(
            Order::limit(OrderId(1), sym, Side::Buy, 1.0, 30_000.0).post_only(),
            &book,
            0,
        )
        .expect("valid order");

    let report = |broker: &SimBroker, label: &str| {
        match broker.open_order(OrderId(1)) {
            Some(mo) => println!(
                "{label:<28} queue_ahead={:.2} filled={:.2}",
                mo.queue_ahead_qty, mo.filled_qty
            ),
            None => println!("{label:<28} order done"),
        }
    };
    report(&broker, "after submit");

    // Half the level cancels: queue ahead shrinks.
    broker.on_depth_update(
        &DepthUpdate {
            received_time_ns: 0,
            event_time_ms: 1_000,
            transaction_time_ms: 1_000,
            symbol: sym,
            first_update_id: 2,
            final_update_id: 2,
            prev_final_update_id: 1,
            bid_updates: vec![(30_000.0, 2.0)],
            ask_updates: vec![],
        },
        &book,
    );
    report(&broker, "after depth shrink");

    // Sell aggressors hit the bid in three prints.
    for (i, qty) in [1.5, 0.8, 0.9].into_iter().enumerate() {
        broker.on_trade(
            &Trade {
                received_time_ns: 0,
                event_time_ms: 2_000 + i as i64,
                trade_time_ms: 2_000 + i as i64,
                symbol: sym,
                trade_id: i as i64,
                price: 30_000.0,
                quantity: qty,
                is_buyer_maker: true,
            },
            2_000 + i as i64,
        );
        report(&broker, &format!("after trade {:.1}", qty));
    }

    println!();
    for fill in broker.fills() {
        println!("fill: {fill}");
    }
    let pos = broker
        .portfolio()
        .position(sym)
        .expect("position opened by maker fills");
    println!(
        "position: qty={:.4} avg_price={:.2}, fees={:.4}",
        pos.qty,
        pos.avg_price,
        broker.portfolio().fees_paid_usdt
    );
}

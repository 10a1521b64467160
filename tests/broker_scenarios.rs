//! End-to-end broker scenarios: taker self-impact, IOC caps, post-only,
//! GTC crossing remainders, maker queues under the tape, latency ordering.

use perpsim::{
    BookHandle, BrokerConfig, DepthUpdate, L2Book, Order, OrderId, Side, SimBroker, Symbol, Trade,
};

fn sym() -> Symbol {
    Symbol::new("BTCUSDT")
}

fn shared_book(bids: &[(f64, f64)], asks: &[(f64, f64)]) -> BookHandle {
    let mut book = L2Book::new();
    book.apply_depth_update(bids, asks);
    book.into_shared()
}

fn zero_fee_broker() -> SimBroker {
    SimBroker::new(BrokerConfig {
        maker_fee_frac: 0.0,
        taker_fee_frac: 0.0,
        ..BrokerConfig::default()
    })
    .unwrap()
}

fn depth_update(bids: Vec<(f64, f64)>, asks: Vec<(f64, f64)>) -> DepthUpdate {
    DepthUpdate {
        received_time_ns: 0,
        event_time_ms: 0,
        transaction_time_ms: 0,
        symbol: sym(),
        first_update_id: 1,
        final_update_id: 1,
        prev_final_update_id: 0,
        bid_updates: bids,
        ask_updates: asks,
    }
}

fn tape_trade(price: f64, qty: f64, is_buyer_maker: bool) -> Trade {
    Trade {
        received_time_ns: 0,
        event_time_ms: 0,
        trade_time_ms: 0,
        symbol: sym(),
        trade_id: 1,
        price,
        quantity: qty,
        is_buyer_maker,
    }
}

// ============================================================================
// Taker execution
// ============================================================================

#[test]
fn market_taker_with_self_impact() {
    let book = shared_book(&[(99.0, 1.0)], &[(100.0, 2.0)]);
    let mut broker = zero_fee_broker();

    broker
        .submit(Order::market(OrderId(1), sym(), Side::Buy, 1.5), &book, 0)
        .unwrap();

    let pos = broker.portfolio().position(sym()).unwrap();
    assert!((pos.qty - 1.5).abs() < 1e-12);
    assert!((pos.avg_price - 100.0).abs() < 1e-12);
    assert!((book.borrow().asks().qty_at(100.0).unwrap() - 0.5).abs() < 1e-12);
}

#[test]
fn ioc_limit_respects_cap() {
    let book = shared_book(&[(99.0, 1.0)], &[(100.0, 1.0), (101.0, 10.0)]);
    let mut broker = zero_fee_broker();

    broker
        .submit(
            Order::limit(OrderId(1), sym(), Side::Buy, 5.0, 100.0).ioc(),
            &book,
            0,
        )
        .unwrap();

    let pos = broker.portfolio().position(sym()).unwrap();
    assert!((pos.qty - 1.0).abs() < 1e-12);
    assert!((pos.avg_price - 100.0).abs() < 1e-12);
    // The 100 level was fully consumed; the 101 level is untouched.
    assert_eq!(book.borrow().asks().qty_at(100.0), None);
    assert!((book.borrow().asks().qty_at(101.0).unwrap() - 10.0).abs() < 1e-12);
}

#[test]
fn taker_fee_hits_portfolio_and_fill() {
    let book = shared_book(&[], &[(100.0, 1.0)]);
    let mut broker = SimBroker::new(BrokerConfig {
        maker_fee_frac: 0.0,
        taker_fee_frac: 0.001,
        ..BrokerConfig::default()
    })
    .unwrap();

    broker
        .submit(Order::market(OrderId(1), sym(), Side::Buy, 1.0), &book, 7)
        .unwrap();

    let fill = &broker.fills()[0];
    assert!((fill.fee_usdt - 0.1).abs() < 1e-12);
    assert_eq!(fill.event_time_ms, 7);
    assert!((broker.portfolio().fees_paid_usdt - 0.1).abs() < 1e-12);
    assert!((broker.portfolio().realized_pnl_usdt + 0.1).abs() < 1e-12);
}

// ============================================================================
// Maker queue under the tape
// ============================================================================

#[test]
fn maker_queue_under_trade_tape() {
    let book = shared_book(&[(100.0, 0.5)], &[(101.0, 1.0)]);
    let mut broker = zero_fee_broker();

    broker
        .submit(
            Order::limit(OrderId(1), sym(), Side::Buy, 1.0, 100.0).post_only(),
            &book,
            0,
        )
        .unwrap();
    assert_eq!(broker.open_order(OrderId(1)).unwrap().queue_ahead_qty, 0.5);

    // Visible qty at our level drops to 0.2: queue ahead follows.
    broker.on_depth_update(&depth_update(vec![(100.0, 0.2)], vec![]), &book);
    assert_eq!(broker.open_order(OrderId(1)).unwrap().queue_ahead_qty, 0.2);

    // 0.4 of sell-aggressor volume: 0.2 burns the queue, 0.2 fills us.
    broker.on_trade(&tape_trade(100.0, 0.4, true), 0);
    let mo = broker.open_order(OrderId(1)).unwrap();
    assert_eq!(mo.queue_ahead_qty, 0.0);
    assert!((mo.filled_qty - 0.2).abs() < 1e-12);

    // The next print finishes the order.
    broker.on_trade(&tape_trade(100.0, 1.0, true), 0);
    assert!(!broker.has_open_orders());
    let pos = broker.portfolio().position(sym()).unwrap();
    assert!((pos.qty - 1.0).abs() < 1e-12);
    assert!((pos.avg_price - 100.0).abs() < 1e-12);
}

#[test]
fn buy_aggressor_cannot_fill_resting_bid() {
    let book = shared_book(&[(100.0, 0.0)], &[(101.0, 1.0)]);
    let mut broker = zero_fee_broker();

    broker
        .submit(
            Order::limit(OrderId(1), sym(), Side::Buy, 1.0, 100.0).post_only(),
            &book,
            0,
        )
        .unwrap();

    broker.on_trade(&tape_trade(100.0, 5.0, false), 0);
    assert!(broker.has_open_orders());
    assert!(broker.fills().is_empty());
}

// ============================================================================
// Post-only
// ============================================================================

#[test]
fn post_only_rejects_crossing() {
    let book = shared_book(&[(99.0, 1.0)], &[(100.0, 2.0)]);
    let mut broker = zero_fee_broker();

    broker
        .submit(
            Order::limit(OrderId(1), sym(), Side::Buy, 1.0, 100.0).post_only(),
            &book,
            0,
        )
        .unwrap();

    assert!(!broker.has_open_orders());
    assert!(broker.fills().is_empty());
    assert!(broker.portfolio().position(sym()).is_none());
}

#[test]
fn post_only_at_exact_best_ask_is_rejected_one_tick_below_rests() {
    let book = shared_book(&[(99.0, 1.0)], &[(100.0, 2.0)]);
    let mut broker = zero_fee_broker();

    broker
        .submit(
            Order::limit(OrderId(1), sym(), Side::Buy, 1.0, 100.0).post_only(),
            &book,
            0,
        )
        .unwrap();
    assert!(!broker.has_open_orders());

    broker
        .submit(
            Order::limit(OrderId(2), sym(), Side::Buy, 1.0, 99.99).post_only(),
            &book,
            0,
        )
        .unwrap();
    assert!(broker.has_open_orders());
    assert_eq!(broker.open_order(OrderId(2)).unwrap().price, 99.99);
}

#[test]
fn post_only_sell_touching_bid_is_rejected() {
    let book = shared_book(&[(99.0, 1.0)], &[(100.0, 2.0)]);
    let mut broker = zero_fee_broker();

    broker
        .submit(
            Order::limit(OrderId(1), sym(), Side::Sell, 1.0, 99.0).post_only(),
            &book,
            0,
        )
        .unwrap();
    assert!(!broker.has_open_orders());
    assert!(broker.portfolio().position(sym()).is_none());
}

// ============================================================================
// GTC crossing
// ============================================================================

#[test]
fn gtc_limit_crossing_leaves_remainder_resting() {
    let book = shared_book(&[(99.0, 1.0)], &[(100.0, 1.0), (101.0, 10.0)]);
    let mut broker = zero_fee_broker();

    broker
        .submit(
            Order::limit(OrderId(1), sym(), Side::Buy, 5.0, 100.5),
            &book,
            0,
        )
        .unwrap();

    // Immediate taker fill for the crossed portion.
    let pos = broker.portfolio().position(sym()).unwrap();
    assert!((pos.qty - 1.0).abs() < 1e-12);
    assert!((pos.avg_price - 100.0).abs() < 1e-12);
    assert_eq!(book.borrow().asks().qty_at(100.0), None);

    // Remainder rests as maker under the original id.
    assert!(broker.has_open_orders());
    let mo = broker.open_order(OrderId(1)).unwrap();
    assert!((mo.quantity - 4.0).abs() < 1e-12);

    // A sell-aggressor print at our level fills the remainder.
    broker.on_trade(&tape_trade(100.5, 10.0, true), 0);
    assert!(!broker.has_open_orders());
    let pos = broker.portfolio().position(sym()).unwrap();
    assert!((pos.qty - 5.0).abs() < 1e-12);
    assert!((pos.avg_price - 100.4).abs() < 1e-12);
}

#[test]
fn gtc_fully_filled_on_entry_rests_nothing() {
    let book = shared_book(&[], &[(100.0, 5.0)]);
    let mut broker = zero_fee_broker();

    broker
        .submit(
            Order::limit(OrderId(1), sym(), Side::Buy, 2.0, 100.0),
            &book,
            0,
        )
        .unwrap();
    assert!(!broker.has_open_orders());
    let pos = broker.portfolio().position(sym()).unwrap();
    assert!((pos.qty - 2.0).abs() < 1e-12);
}

// ============================================================================
// Latency and cancellation ordering
// ============================================================================

#[test]
fn submit_latency_defers_market_fill() {
    let book = shared_book(&[(99.0, 1.0)], &[(100.0, 2.0)]);
    let mut broker = SimBroker::new(BrokerConfig {
        maker_fee_frac: 0.0,
        taker_fee_frac: 0.0,
        submit_latency_ms: 100,
        ..BrokerConfig::default()
    })
    .unwrap();

    broker
        .submit(Order::market(OrderId(1), sym(), Side::Buy, 1.0), &book, 0)
        .unwrap();
    assert!(broker.portfolio().position(sym()).is_none());

    broker.on_time(99);
    assert!(broker.portfolio().position(sym()).is_none());

    broker.on_time(100);
    let pos = broker.portfolio().position(sym()).unwrap();
    assert!((pos.qty - 1.0).abs() < 1e-12);
    assert!((pos.avg_price - 100.0).abs() < 1e-12);
}

#[test]
fn cancel_at_same_ms_as_pending_submit_cancels_the_submit() {
    let book = shared_book(&[(99.0, 1.0)], &[(100.0, 2.0)]);
    let mut broker = SimBroker::new(BrokerConfig {
        maker_fee_frac: 0.0,
        taker_fee_frac: 0.0,
        submit_latency_ms: 50,
        cancel_latency_ms: 50,
        ..BrokerConfig::default()
    })
    .unwrap();

    broker
        .submit(Order::market(OrderId(1), sym(), Side::Buy, 1.0), &book, 0)
        .unwrap();
    broker.cancel(OrderId(1), Some(0));

    // Both due at t=50; the cancel is applied first.
    broker.on_time(50);
    assert!(broker.fills().is_empty());
    assert!(broker.portfolio().position(sym()).is_none());
    assert!(!broker.has_open_orders());
}

#[test]
fn pending_submits_activate_against_current_book_state() {
    // The book changes while the submit is in flight; the fill must see the
    // post-change liquidity.
    let book = shared_book(&[(99.0, 1.0)], &[(100.0, 2.0)]);
    let mut broker = SimBroker::new(BrokerConfig {
        maker_fee_frac: 0.0,
        taker_fee_frac: 0.0,
        submit_latency_ms: 10,
        ..BrokerConfig::default()
    })
    .unwrap();

    broker
        .submit(Order::market(OrderId(1), sym(), Side::Buy, 1.0), &book, 0)
        .unwrap();

    // Ask moves up before activation.
    broker.on_depth_update(
        &depth_update(vec![], vec![(100.0, 0.0), (102.0, 3.0)]),
        &book,
    );

    broker.on_time(10);
    let pos = broker.portfolio().position(sym()).unwrap();
    assert!((pos.avg_price - 102.0).abs() < 1e-12);
}

#[test]
fn resubmitting_after_cancel_of_resting_order_works() {
    let book = shared_book(&[(99.0, 1.0)], &[(101.0, 1.0)]);
    let mut broker = zero_fee_broker();

    broker
        .submit(
            Order::limit(OrderId(1), sym(), Side::Buy, 1.0, 100.0),
            &book,
            0,
        )
        .unwrap();
    broker.cancel(OrderId(1), None);
    assert!(!broker.has_open_orders());

    broker
        .submit(
            Order::limit(OrderId(2), sym(), Side::Buy, 1.0, 100.0),
            &book,
            0,
        )
        .unwrap();
    assert!(broker.has_open_orders());
}

// ============================================================================
// Cross-checks
// ============================================================================

#[test]
fn round_trip_through_taker_fills_is_flat_with_zero_pnl() {
    let book = shared_book(&[(100.0, 5.0)], &[(100.0, 5.0)]);
    let mut broker = zero_fee_broker();

    broker
        .submit(Order::market(OrderId(1), sym(), Side::Buy, 2.0), &book, 0)
        .unwrap();
    broker
        .submit(Order::market(OrderId(2), sym(), Side::Sell, 2.0), &book, 0)
        .unwrap();

    let pos = broker.portfolio().position(sym()).unwrap();
    assert!(pos.is_flat());
    assert_eq!(pos.avg_price, 0.0);
    assert_eq!(broker.portfolio().realized_pnl_usdt, 0.0);
}

#[test]
fn buy_then_sell_realizes_price_move() {
    let book = shared_book(&[(110.0, 5.0)], &[(100.0, 5.0)]);
    let mut broker = zero_fee_broker();

    broker
        .submit(Order::market(OrderId(1), sym(), Side::Buy, 2.0), &book, 0)
        .unwrap();
    broker
        .submit(Order::market(OrderId(2), sym(), Side::Sell, 2.0), &book, 0)
        .unwrap();

    // Bought at 100, sold at 110.
    assert!((broker.portfolio().realized_pnl_usdt - 20.0).abs() < 1e-12);
}

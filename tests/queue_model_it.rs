mod common;

use simbroker::{
    book::{L3Book, QueueModel, Side},
    decimal::Decimal,
};

#[test]
fn queue_model_probabilities_match_concrete_scenario() {
    common::init_tracing();

    assert_eq!(QueueModel::RiskAverse.fill_probability(0.5), 0.0);
    assert_eq!(QueueModel::Probability.fill_probability(0.5), 0.5);
    assert_eq!(QueueModel::PowerLaw.fill_probability(0.5), 0.75);
    assert!((QueueModel::Logarithmic.fill_probability(0.5) - 0.415).abs() < 0.001);
}

#[test]
fn book_evicts_fully_consumed_orders_and_updates_survivors() {
    let mut book = L3Book::new();
    let price = Decimal::from_int(100);
    let first = book.add_order(Side::Ask, price, Decimal::from_int(5));
    let second = book.add_order(Side::Ask, price, Decimal::from_int(5));

    book.on_trade(Side::Bid, price, Decimal::from_int(7));

    assert!(book.queue_position(first).is_none());
    let survivor = book.queue_position(second).unwrap();
    // `first`'s full 5 units were consumed ahead of `second`, so nothing
    // remains ahead of it even though 2 more units were eaten from its own
    // remaining size.
    assert_eq!(survivor.total_size_ahead, Decimal::ZERO);
}

#[test]
fn cancel_is_idempotent_on_unknown_id() {
    let mut book = L3Book::new();
    book.cancel(999);
}

//! BookLevels: one side of an L2 book.
//!
//! A sorted price → quantity map. Levels are aggregated (no per-order
//! resolution within a level), and every stored level has positive quantity.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;

use crate::BookSide;

/// One side of the order book (all bids or all asks).
///
/// The `BTreeMap` keeps levels price-ordered, so the best of the side is the
/// last key (bids) or the first key (asks), and taker walks iterate in
/// consume order without sorting.
#[derive(Clone, Debug)]
pub struct BookLevels {
    side: BookSide,
    levels: BTreeMap<OrderedFloat<f64>, f64>,
}

impl BookLevels {
    /// Create an empty side.
    pub fn new(side: BookSide) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    /// Which book side this collection represents.
    #[inline]
    pub fn side(&self) -> BookSide {
        self.side
    }

    /// Returns true if the side has no levels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Number of distinct price levels.
    #[inline]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Set the visible quantity at a price. A quantity `<= 0` deletes the
    /// level (exchange depth feeds encode deletion as a zero-qty update).
    pub fn set(&mut self, price: f64, qty: f64) {
        if qty <= 0.0 {
            self.levels.remove(&OrderedFloat(price));
        } else {
            self.levels.insert(OrderedFloat(price), qty);
        }
    }

    /// Remove the level at a price, if present.
    pub fn remove(&mut self, price: f64) {
        self.levels.remove(&OrderedFloat(price));
    }

    /// Visible quantity at a price, or `None` if the level does not exist.
    pub fn qty_at(&self, price: f64) -> Option<f64> {
        self.levels.get(&OrderedFloat(price)).copied()
    }

    /// The best level of the side: highest bid or lowest ask.
    pub fn best(&self) -> Option<(f64, f64)> {
        let entry = match self.side {
            BookSide::Bid => self.levels.last_key_value(),
            BookSide::Ask => self.levels.first_key_value(),
        };
        entry.map(|(p, q)| (p.into_inner(), *q))
    }

    /// The best price of the side.
    #[inline]
    pub fn best_price(&self) -> Option<f64> {
        self.best().map(|(p, _)| p)
    }

    /// Iterate levels best-first: bids descending, asks ascending.
    pub fn iter_best_first(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        let entries = |(p, q): (&OrderedFloat<f64>, &f64)| (p.into_inner(), *q);
        match self.side {
            BookSide::Bid => Box::new(self.levels.iter().rev().map(entries))
                as Box<dyn Iterator<Item = (f64, f64)> + '_>,
            BookSide::Ask => Box::new(self.levels.iter().map(entries)),
        }
    }

    /// The top `n` levels, best-first.
    pub fn depth(&self, n: usize) -> Vec<(f64, f64)> {
        self.iter_best_first().take(n).collect()
    }

    /// Total visible quantity across all levels.
    pub fn total_quantity(&self) -> f64 {
        self.levels.values().sum()
    }
}

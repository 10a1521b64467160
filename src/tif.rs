//! Time-in-force: controls what happens to the unfilled remainder of a limit
//! order.

use std::fmt;

/// Time-in-force for limit orders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimeInForce {
    /// Good-til-cancelled: the unfilled remainder rests on the book until
    /// filled or explicitly cancelled.
    #[default]
    GTC,

    /// Immediate-or-cancel: fill what crosses immediately, discard the
    /// remainder.
    IOC,
}

impl TimeInForce {
    /// Returns true if this TIF allows a remainder to rest on the book.
    #[inline]
    pub fn can_rest(self) -> bool {
        matches!(self, TimeInForce::GTC)
    }
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeInForce::GTC => write!(f, "GTC"),
            TimeInForce::IOC => write!(f, "IOC"),
        }
    }
}

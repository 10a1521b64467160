//! Core types: Symbol, OrderId, time aliases, numeric tolerances.

use std::fmt;

/// Milliseconds since the UTC epoch. The simulation clock.
pub type TimeMs = i64;

/// Nanoseconds since the UTC epoch. Wall-clock receive-time hint carried by
/// events; the engine never keys decisions on it.
pub type TimeNs = i64;

/// Quantities with magnitude at or below this threshold snap to zero.
///
/// Floating-point arithmetic on position flips and level decrements leaves
/// residuals around 1e-16; snapping keeps "flat" and "empty level" exact.
pub const DUST_QTY: f64 = 1e-12;

/// Absolute tolerance for matching a trade or depth level against a resting
/// order's price.
pub const PRICE_TOL: f64 = 1e-9;

/// An instrument symbol, e.g. `BTCUSDT`.
///
/// Stored inline (no allocation) so it can be used as a cheap `Copy` map key.
/// Symbols are limited to 16 ASCII bytes, which covers the perpetual and
/// dated-futures universe this engine targets.
///
/// ```
/// use perpsim::Symbol;
///
/// let btc = Symbol::new("BTCUSDT");
/// assert_eq!(btc.as_str(), "BTCUSDT");
/// assert_eq!(format!("{}", btc), "BTCUSDT");
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    bytes: [u8; 16],
    len: u8,
}

impl Symbol {
    /// Create a symbol from a string.
    ///
    /// # Panics
    ///
    /// Panics if the string is longer than 16 bytes.
    pub fn new(s: &str) -> Self {
        assert!(
            s.len() <= 16,
            "symbol {:?} exceeds 16 bytes ({})",
            s,
            s.len()
        );
        let mut bytes = [0u8; 16];
        bytes[..s.len()].copy_from_slice(s.as_bytes());
        Self {
            bytes,
            len: s.len() as u8,
        }
    }

    /// The symbol as a string slice.
    pub fn as_str(&self) -> &str {
        // Construction only admits valid UTF-8 prefixes.
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.as_str())
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::new(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Symbol {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Symbol {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Symbol, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.len() > 16 {
            return Err(serde::de::Error::custom("symbol exceeds 16 bytes"));
        }
        Ok(Symbol::new(&s))
    }
}

/// Unique order identifier, assigned by the caller (strategies own their id
/// space; the broker never re-ids an order).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "O{}", self.0)
    }
}

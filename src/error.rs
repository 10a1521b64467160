//! Error types for broker configuration and order submission.

/// Rejected broker configuration. Raised at construction, never mid-run.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be >= 0, got {value}")]
    NegativeParameter { name: &'static str, value: f64 },

    #[error("maker_trade_participation must be in (0, 1], got {0}")]
    TradeParticipation(f64),
}

/// Rejected order submission. Raised before the order enters any queue.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum OrderError {
    #[error("limit order requires a price")]
    MissingLimitPrice,

    #[error("order quantity must be > 0, got {0}")]
    NonPositiveQuantity(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let e = ConfigError::NegativeParameter {
            name: "maker_fee_frac",
            value: -0.1,
        };
        assert!(e.to_string().contains("maker_fee_frac"));
        assert!(ConfigError::TradeParticipation(1.5)
            .to_string()
            .contains("(0, 1]"));
        assert_eq!(
            OrderError::MissingLimitPrice.to_string(),
            "limit order requires a price"
        );
    }
}

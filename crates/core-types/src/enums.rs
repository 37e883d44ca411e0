use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a ticker's closing price over a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Green,
    Red,
}

impl Trend {
    /// Classifies a period by its first and last closing price.
    ///
    /// A flat period (last == first) counts as `Red`; only a strict gain is `Green`.
    pub fn of_period(first_close: Decimal, last_close: Decimal) -> Self {
        if last_close > first_close {
            Trend::Green
        } else {
            Trend::Red
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_trend_classification() {
        assert_eq!(Trend::of_period(dec!(10), dec!(11)), Trend::Green);
        assert_eq!(Trend::of_period(dec!(20), dec!(19)), Trend::Red);
        assert_eq!(Trend::of_period(dec!(15), dec!(15)), Trend::Red);
    }
}

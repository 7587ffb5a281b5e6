use tap_core::models::{Price, Rate};

/// The discount price equivalent of a bill yield.
///
/// Standard discount convention on an actual/365 basis:
/// `price = 100 / (1 + yield * tenor / 365)`, carried out in integer
/// arithmetic. With yields in basis points the factor becomes
/// `3_650_000 / (3_650_000 + yield_bp * tenor_days)`, and the result is
/// rounded half-up to the 1e-4 price scale.
pub fn discount_price(rate: Rate, tenor_days: u32) -> Price {
    let numerator = 1_000_000i128 * 3_650_000i128;
    let denominator = 3_650_000i128 + rate.0 as i128 * tenor_days as i128;
    Price(((numerator + denominator / 2) / denominator) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn par_at_zero_yield() {
        assert_eq!(discount_price(Rate(0), 91), Price(1_000_000));
    }

    #[test]
    fn one_year_bill() {
        // 24.5% over 364 days: 1 / (1 + 0.245 * 364/365) = 0.803646...
        assert_eq!(discount_price(Rate(2450), 364), Price(803_646));
    }

    #[test]
    fn short_tenor_discounts_less() {
        let quarter = discount_price(Rate(2450), 91);
        let year = discount_price(Rate(2450), 364);
        assert!(quarter > year);
        assert!(quarter < Price(1_000_000));
    }
}

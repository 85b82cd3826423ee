//! Utility functions and helpers

/// Calculate percentage change. Returns 0 when there is no usable baseline.
pub fn calculate_percentage_change(old_value: f64, new_value: f64) -> f64 {
    if old_value > 0.0 {
        ((new_value - old_value) / old_value) * 100.0
    } else {
        0.0
    }
}

/// Format a price with precision chosen by its magnitude:
/// >= 1000 -> 2 dp, >= 1 -> 6 dp, >= 0.001 -> 8 dp, otherwise exponential.
pub fn format_price(price: f64) -> String {
    if price >= 1000.0 {
        format!("{:.2}", price)
    } else if price >= 1.0 {
        format!("{:.6}", price)
    } else if price >= 0.001 {
        format!("{:.8}", price)
    } else {
        format_exponential(price, 3)
    }
}

/// Exponential notation with an explicit exponent sign, e.g. `1.234e-7`.
fn format_exponential(value: f64, fraction_digits: usize) -> String {
    let raw = format!("{:.*e}", fraction_digits, value);
    match raw.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_percentage_change() {
        assert!((calculate_percentage_change(100.0, 103.0) - 3.0).abs() < 1e-9);
        assert!((calculate_percentage_change(100.0, 98.0) + 2.0).abs() < 1e-9);
        assert_eq!(calculate_percentage_change(0.0, 5.0), 0.0);
    }

    #[test]
    fn test_format_price_tiers() {
        assert_eq!(format_price(1500.0), "1500.00");
        assert_eq!(format_price(2.123456789), "2.123457");
        assert_eq!(format_price(0.0012345), "0.00123450");
        assert_eq!(format_price(0.00012345), "1.234e-4");
        assert_eq!(format_price(0.0000001234), "1.234e-7");
    }

    #[test]
    fn test_format_price_boundaries() {
        assert_eq!(format_price(1000.0), "1000.00");
        assert_eq!(format_price(1.0), "1.000000");
        assert_eq!(format_price(0.001), "0.00100000");
        assert_eq!(format_price(0.0), "0.000e+0");
    }
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

/// Characters per word used by the standard words-per-minute formula
pub const CHARS_PER_WORD: f64 = 5.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(66.666_666, 2), 66.67);
        assert_eq!(round_to(12.34, 1), 12.3);
        assert_eq!(round_to(12.35, 0), 12.0);
    }

    #[test]
    fn test_round_to_negative_values() {
        assert_eq!(round_to(-1.25, 1), -1.3);
    }

    #[test]
    fn test_round_to_zero_places() {
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(0.0, 3), 0.0);
    }
}

//! # Probability Utilities

/// Check that a value is a legal probability.
///
/// # Returns
///
/// The probability, unchanged.
///
/// # Panics
///
/// If the value is not in ``[0.0, 1.0]``.
pub fn expect_probability(prob: f64) -> f64 {
    assert!(
        (0.0..=1.0).contains(&prob),
        "Probability must be in [0, 1]: {prob}"
    );
    prob
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_probability() {
        assert_eq!(expect_probability(0.0), 0.0);
        assert_eq!(expect_probability(0.2), 0.2);
        assert_eq!(expect_probability(1.0), 1.0);
    }

    #[test]
    #[should_panic(expected = "Probability must be in [0, 1]: 1.5")]
    fn test_expect_probability_panic() {
        expect_probability(1.5);
    }
}

//! American odds arithmetic.

/// Probability consistent with an American price, margin included.
pub fn implied_probability(odds: f64) -> f64 {
    if odds < 0.0 {
        odds.abs() / (odds.abs() + 100.0)
    } else {
        100.0 / (odds + 100.0)
    }
}

/// Sum of both sides' implied probabilities; anything above 1 is the book's margin.
pub fn overround(p_a: f64, p_b: f64) -> f64 {
    p_a + p_b
}

/// Scales a two-way pair so it sums to 1.
pub fn devig(p_a: f64, p_b: f64) -> (f64, f64) {
    let total = overround(p_a, p_b);
    if total <= 0.0 {
        return (0.5, 0.5);
    }
    let fair_a = p_a / total;
    (fair_a, 1.0 - fair_a)
}

/// Vig-free probability of the first price given the opposing price.
pub fn fair_probability(odds: f64, opposing_odds: f64) -> f64 {
    devig(implied_probability(odds), implied_probability(opposing_odds)).0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implied_probability_for_favorites_and_dogs() {
        assert_eq!(implied_probability(100.0), 0.5);
        assert_eq!(implied_probability(-100.0), 0.5);
        assert!((implied_probability(-150.0) - 0.6).abs() < 1e-12);
        assert!((implied_probability(150.0) - 0.4).abs() < 1e-12);
        assert!((implied_probability(-110.0) - 110.0 / 210.0).abs() < 1e-12);
    }

    #[test]
    fn devigged_pair_sums_to_one() {
        for (a, b) in [(0.55, 0.5), (0.9, 0.3), (0.01, 0.02), (0.5238, 0.5238)] {
            let (fa, fb) = devig(a, b);
            assert_eq!(fa + fb, 1.0, "pair ({a}, {b})");
            assert!(fa > 0.0 && fb > 0.0);
        }
    }

    #[test]
    fn standard_juice_devigs_to_even() {
        let p = fair_probability(-110.0, -110.0);
        assert!((p - 0.5).abs() < 1e-12);
        assert!(overround(implied_probability(-110.0), implied_probability(-110.0)) > 1.0);
    }
}

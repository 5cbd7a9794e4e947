/// Standard normal CDF (Abramowitz and Stegun 7.1.26, |error| < 1.5e-7).
pub fn normal_cdf(x: f64) -> f64 {
    if x == 0.0 {
        return 0.5;
    }

    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs() / std::f64::consts::SQRT_2;

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    0.5 * (1.0 + sign * y)
}

pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Probability that the realized margin ends up positive, given a predicted
/// margin and the residual standard deviation.
pub fn margin_to_probability(margin: f64, sigma: f64) -> f64 {
    1.0 - normal_cdf(-margin / sigma)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_cdf_reference_points() {
        assert_eq!(normal_cdf(0.0), 0.5);
        assert!((normal_cdf(1.0) - 0.841_344_746).abs() < 1e-6);
        assert!((normal_cdf(-1.96) - 0.024_997_895).abs() < 1e-6);
        assert!((normal_cdf(2.5) + normal_cdf(-2.5) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_margin_is_a_coin_flip_for_any_sigma() {
        for sigma in [1.0, 6.56, 11.0, 25.0] {
            assert_eq!(margin_to_probability(0.0, sigma), 0.5);
        }
    }

    #[test]
    fn larger_sigma_pulls_toward_even() {
        let tight = margin_to_probability(3.0, 6.56);
        let loose = margin_to_probability(3.0, 11.0);
        assert!(tight > loose && loose > 0.5);
        assert!(margin_to_probability(-3.0, 6.56) < 0.5);
    }

    #[test]
    fn sigmoid_is_stable_at_extremes() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-12);
    }
}

/**
Experience curve shared by recyclers and refurbishers: unit processing cost
falls as a power law of throughput relative to a baseline, and never rises
above the baseline cost. A period without throughput leaves the cost at the
baseline.
*/
pub fn learning_curve(
    original_volume: f64,
    volume: f64,
    original_cost: f64,
    shape_factor: f64,
) -> f64 {
    if volume > 0.0 {
        let candidate = original_cost * (volume / original_volume).powf(shape_factor);
        if candidate < original_cost {
            return candidate;
        }
    }
    original_cost
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn quadrupled_volume_halves_cost_at_minus_half_shape() {
        let cost = learning_curve(100.0, 400.0, 1.0, -0.5);
        assert!((cost - 0.5).abs() < 1e-12);
    }

    #[test]
    fn zero_volume_is_a_no_op() {
        assert_eq!(learning_curve(100.0, 0.0, 1.0, -0.5), 1.0);
        assert_eq!(learning_curve(100.0, -3.0, 1.0, -0.5), 1.0);
    }

    #[test]
    fn volume_below_baseline_never_raises_the_cost() {
        // A negative shape factor would extrapolate above the baseline for
        // sub-baseline volumes; the curve is capped instead.
        assert_eq!(learning_curve(100.0, 10.0, 1.0, -0.5), 1.0);
    }

    proptest! {
        #[test]
        fn cost_never_exceeds_the_baseline(
            volume in 0.0f64..1e9,
            shape in -2.0f64..0.0,
        ) {
            let cost = learning_curve(1000.0, volume, 0.077, shape);
            prop_assert!(cost <= 0.077 + f64::EPSILON);
            prop_assert!(cost >= 0.0);
        }

        #[test]
        fn cost_is_monotone_in_volume(
            volume in 1.0f64..1e9,
            extra in 1.0f64..1e6,
        ) {
            let lower = learning_curve(1000.0, volume + extra, 0.077, -0.39);
            let higher = learning_curve(1000.0, volume, 0.077, -0.39);
            prop_assert!(lower <= higher + f64::EPSILON);
        }
    }
}

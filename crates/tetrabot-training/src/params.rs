//! Operations on flat parameter vectors.
//!
//! A genome's connection weights and node biases are handled as one `Vec<f32>`
//! (see [`NetworkGenome::parameters`](tetrabot_policy::NetworkGenome::parameters)).
//! Every operator keeps values inside `[-bound, bound]`.

use rand::Rng;
use rand_distr::Normal;

/// Uniformly distributed parameters in `[-bound, bound]`.
pub fn random<R>(rng: &mut R, bound: f32, len: usize) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    (0..len).map(|_| rng.random_range(-bound..=bound)).collect()
}

/// BLX-α crossover.
///
/// Each child value is drawn uniformly from the parents' interval widened by
/// `alpha` times its length on both sides, then clamped to `[-bound, bound]`.
/// With `alpha = 0` children stay between their parents.
///
/// # Panics
///
/// Panics if the parents have different lengths.
///
/// ```
/// use rand::SeedableRng as _;
/// use rand_pcg::Pcg32;
/// use tetrabot_training::params;
///
/// let mut rng = Pcg32::seed_from_u64(7);
/// let child = params::blx_alpha(&[0.0, 1.0, -2.0], &[1.0, 1.0, 2.0], 0.0, 5.0, &mut rng);
/// assert!((0.0..=1.0).contains(&child[0]));
/// assert_eq!(child[1], 1.0);
/// assert!((-2.0..=2.0).contains(&child[2]));
/// ```
pub fn blx_alpha<R>(p1: &[f32], p2: &[f32], alpha: f32, bound: f32, rng: &mut R) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    assert_eq!(p1.len(), p2.len(), "parents differ in parameter count");
    p1.iter()
        .zip(p2)
        .map(|(&x1, &x2)| {
            let (min, max) = (x1.min(x2), x1.max(x2));
            let spread = alpha * (max - min);
            rng.random_range(min - spread..=max + spread)
                .clamp(-bound, bound)
        })
        .collect()
}

/// Gaussian mutation: each value is perturbed with probability `rate`.
pub fn mutate<R>(params: &mut [f32], noise: &Normal<f32>, rate: f64, bound: f32, rng: &mut R)
where
    R: Rng + ?Sized,
{
    for value in params {
        if rng.random_bool(rate) {
            *value = (*value + rng.sample(noise)).clamp(-bound, bound);
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn random_values_respect_the_bound() {
        let mut rng = Pcg32::seed_from_u64(1);
        let values = random(&mut rng, 0.5, 200);
        assert_eq!(values.len(), 200);
        assert!(values.iter().all(|v| (-0.5..=0.5).contains(v)));
        assert!(values.iter().any(|&v| v < 0.0));
    }

    #[test]
    fn crossover_is_clamped() {
        let mut rng = Pcg32::seed_from_u64(2);
        for _ in 0..50 {
            let child = blx_alpha(&[-1.0, 0.9], &[1.0, 1.0], 1.0, 1.0, &mut rng);
            assert!(child.iter().all(|v| (-1.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn zero_rate_leaves_values_untouched() {
        let mut rng = Pcg32::seed_from_u64(3);
        let noise = Normal::new(0.0, 10.0).unwrap();
        let mut values = vec![0.25, -0.5, 1.0];
        mutate(&mut values, &noise, 0.0, 5.0, &mut rng);
        assert_eq!(values, [0.25, -0.5, 1.0]);

        mutate(&mut values, &noise, 1.0, 2.0, &mut rng);
        assert!(values.iter().all(|v| (-2.0..=2.0).contains(v)));
    }
}

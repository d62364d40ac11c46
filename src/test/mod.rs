use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geometry::BoxGeometry;

mod integration;

pub(crate) fn testfun_2d(x: &[f64]) -> f64 {
    (f64::cos(5.0 * x[0]) * f64::sin(5.0 * x[1])).exp()
}

pub(crate) fn testfun_3d(x: &[f64]) -> f64 {
    (x[0] + 2.0 * x[1].sin()).exp() * (x[0] * x[0] + (2.0 + x[1] * x[2]).ln())
}

/// Interleaved uniformly random points inside `domain`.
pub(crate) fn random_points(domain: &BoxGeometry, num_points: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let dimension = domain.dimension();
    let mut points = Vec::with_capacity(num_points * dimension);
    for _ in 0..num_points {
        for axis in 0..dimension {
            let local: f64 = rng.gen_range(-1.0..1.0);
            points.push(domain.center()[axis] + domain.half_extent()[axis] * local);
        }
    }
    points
}

/// Largest relative error of `approx` against `func` over interleaved `points`.
pub(crate) fn max_rel_error(
    func: impl Fn(&[f64]) -> f64,
    approx: impl Fn(&[f64]) -> f64,
    points: &[f64],
    dimension: usize,
) -> f64 {
    points
        .chunks_exact(dimension)
        .map(|point| {
            let actual = func(point);
            (approx(point) - actual).abs() / actual.abs()
        })
        .fold(0.0, f64::max)
}

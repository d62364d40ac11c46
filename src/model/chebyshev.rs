//! Tensor-product Chebyshev interpolation on boxes.

use std::f64::consts::PI;

use tinyvec::ArrayVec;

use crate::constants::{MAX_DIMENSION, MAX_ORDER, NOISE_FLOOR};
use crate::function::TargetFunction;
use crate::geometry::{to_local, BoxGeometry};
use crate::model::ErrorEstimate;

/// Precomputed nodes and transforms for fitting `order^D` Chebyshev coefficients.
///
/// One basis is shared, read-only, by every box of a tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ChebyshevBasis {
    dimension: usize,
    order: usize,

    /// Chebyshev nodes of the first kind of T_order, in `[-1, 1]`
    fit_nodes: Vec<f64>,

    /// The `order + 1` extrema of T_order, endpoints included. These never coincide with
    /// `fit_nodes`, and the leading error term of the interpolant peaks at every one of them.
    test_nodes: Vec<f64>,

    /// `order x order` discrete cosine transform from samples at `fit_nodes` to coefficients
    fit_matrix: Vec<f64>,

    /// `(order + 1) x order` values of T_k at `test_nodes`
    test_matrix: Vec<f64>,
}

impl ChebyshevBasis {
    /// Precompute the basis for the given dimension and order.
    ///
    /// # Panics
    ///
    /// Panics if `dimension` is not in `1..=MAX_DIMENSION` or `order` is not in
    /// `1..=MAX_ORDER`. [`BuildConfig::validate`][crate::BuildConfig::validate] checks both.
    pub fn new(dimension: usize, order: usize) -> Self {
        assert!(
            (1..=MAX_DIMENSION).contains(&dimension),
            "Unsupported dimension {}.",
            dimension
        );
        assert!((1..=MAX_ORDER).contains(&order), "Unsupported order {}.", order);

        let fit_nodes = chebyshev_nodes(order);
        let test_nodes = chebyshev_extrema(order);

        let n = order as f64;
        let mut fit_matrix = vec![0.0; order * order];
        for k in 0..order {
            let scale = if k == 0 { 1.0 / n } else { 2.0 / n };
            for j in 0..order {
                let theta = PI * k as f64 * (j as f64 + 0.5) / n;
                fit_matrix[k * order + j] = scale * theta.cos();
            }
        }

        let test_matrix = chebyshev_polynomials(order, &test_nodes);

        Self {
            dimension,
            order,
            fit_nodes,
            test_nodes,
            fit_matrix,
            test_matrix,
        }
    }

    /// The number of dimensions.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The number of nodes (and coefficients) per axis.
    pub fn order(&self) -> usize {
        self.order
    }

    /// The number of coefficients in one box, `order^D`.
    pub fn num_coefficients(&self) -> usize {
        self.order.pow(self.dimension as u32)
    }

    /// The 1-D fit nodes in the normalized frame.
    pub fn fit_nodes(&self) -> &[f64] {
        &self.fit_nodes
    }

    /// The 1-D test nodes in the normalized frame, `order + 1` of them.
    pub fn test_nodes(&self) -> &[f64] {
        &self.test_nodes
    }

    /// Sample `func` on the fit grid of `geometry` and compute the coefficients interpolating
    /// those samples.
    ///
    /// Coefficients are stored with axis 0 varying slowest.
    pub fn fit<F: TargetFunction>(&self, func: &F, geometry: &BoxGeometry) -> Vec<f64> {
        debug_assert_eq!(geometry.dimension(), self.dimension);
        let samples = sample_grid(func, geometry, &self.fit_nodes);

        let mut shape = [self.order; MAX_DIMENSION];
        let shape = &mut shape[..self.dimension];
        let mut values = samples;
        for axis in 0..self.dimension {
            values = contract_axis(&values, shape, axis, &self.fit_matrix, self.order);
        }
        values
    }

    /// Evaluate coefficients fit on `geometry` at `point`.
    ///
    /// Points outside the box are extrapolated.
    #[inline]
    pub fn evaluate(&self, coefficients: &[f64], geometry: &BoxGeometry, point: &[f64]) -> f64 {
        evaluate_in_box(
            coefficients,
            self.order,
            geometry.center(),
            geometry.half_extent(),
            point,
        )
    }

    /// Compare `func` against the model on the test grid of `geometry`.
    pub fn estimate_error<F: TargetFunction>(
        &self,
        coefficients: &[f64],
        geometry: &BoxGeometry,
        func: &F,
    ) -> ErrorEstimate {
        let actual = sample_grid(func, geometry, &self.test_nodes);

        let test_order = self.order + 1;
        let mut shape = [self.order; MAX_DIMENSION];
        let shape = &mut shape[..self.dimension];
        let mut model = coefficients.to_vec();
        for axis in 0..self.dimension {
            model = contract_axis(&model, shape, axis, &self.test_matrix, test_order);
        }

        compare(&actual, &model)
    }
}

/// Chebyshev nodes of the first kind, `cos(pi (j + 1/2) / n)` for `j` in `0..n`.
fn chebyshev_nodes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|j| (PI * (j as f64 + 0.5) / n as f64).cos())
        .collect()
}

/// Extrema of T_n, `cos(pi k / n)` for `k` in `0..=n`.
fn chebyshev_extrema(n: usize) -> Vec<f64> {
    (0..=n)
        .map(|k| (PI * k as f64 / n as f64).cos())
        .collect()
}

/// Row-major `nodes.len() x order` matrix of T_k evaluated at each node.
///
/// Uses the recurrence T_0 = 1, T_1 = x, T_{k+1} = 2x T_k - T_{k-1}.
fn chebyshev_polynomials(order: usize, nodes: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; nodes.len() * order];
    for (i, x) in nodes.iter().enumerate() {
        let row = &mut out[i * order..(i + 1) * order];
        for k in 0..order {
            row[k] = match k {
                0 => 1.0,
                1 => *x,
                _ => 2.0 * x * row[k - 1] - row[k - 2],
            };
        }
    }
    out
}

/// Sample `func` on the tensor grid of `nodes` mapped into `geometry`, axis 0 slowest.
fn sample_grid<F: TargetFunction>(func: &F, geometry: &BoxGeometry, nodes: &[f64]) -> Vec<f64> {
    let dimension = geometry.dimension();
    let n = nodes.len();
    let total = n.pow(dimension as u32);

    let mut multi_index = [0usize; MAX_DIMENSION];
    let mut local = [0.0; MAX_DIMENSION];
    let mut point = [0.0; MAX_DIMENSION];

    let mut out = Vec::with_capacity(total);
    for _ in 0..total {
        for axis in 0..dimension {
            local[axis] = nodes[multi_index[axis]];
        }
        geometry.from_local(&local[..dimension], &mut point[..dimension]);
        out.push(func.eval(&point[..dimension]));

        // odometer, last axis fastest
        for axis in (0..dimension).rev() {
            multi_index[axis] += 1;
            if multi_index[axis] < n {
                break;
            }
            multi_index[axis] = 0;
        }
    }
    out
}

/// Apply `matrix` (`rows x shape[axis]`) along one axis of a dense tensor, replacing that
/// axis' length with `rows`.
fn contract_axis(
    input: &[f64],
    shape: &mut [usize],
    axis: usize,
    matrix: &[f64],
    rows: usize,
) -> Vec<f64> {
    let cols = shape[axis];
    let outer: usize = shape[..axis].iter().product();
    let inner: usize = shape[axis + 1..].iter().product();
    debug_assert_eq!(input.len(), outer * cols * inner);
    debug_assert_eq!(matrix.len(), rows * cols);

    let mut out = vec![0.0; outer * rows * inner];
    for a in 0..outer {
        for r in 0..rows {
            let weights = &matrix[r * cols..(r + 1) * cols];
            let start = (a * rows + r) * inner;
            let dst = &mut out[start..start + inner];
            for (k, w) in weights.iter().enumerate() {
                let src_start = (a * cols + k) * inner;
                let src = &input[src_start..src_start + inner];
                for (d, s) in dst.iter_mut().zip(src) {
                    *d += w * s;
                }
            }
        }
    }

    shape[axis] = rows;
    out
}

fn compare(actual: &[f64], model: &[f64]) -> ErrorEstimate {
    let mut estimate = ErrorEstimate::default();
    for (f, m) in actual.iter().zip(model) {
        if !f.is_finite() || !m.is_finite() {
            return ErrorEstimate::infinite();
        }

        let delta = (f - m).abs();
        estimate.max_abs_error = estimate.max_abs_error.max(delta);
        if f.abs() > NOISE_FLOOR {
            estimate.max_rel_error = estimate.max_rel_error.max(delta / f.abs());
        } else {
            estimate.max_near_zero_error = estimate.max_near_zero_error.max(delta);
        }
    }
    estimate
}

/// Evaluate coefficients of a box given by `center` and `half_extent` at `point`.
#[inline]
pub(crate) fn evaluate_in_box(
    coefficients: &[f64],
    order: usize,
    center: &[f64],
    half_extent: &[f64],
    point: &[f64],
) -> f64 {
    let dimension = center.len();
    let mut local = [0.0; MAX_DIMENSION];
    to_local(center, half_extent, point, &mut local[..dimension]);
    evaluate_local(coefficients, order, &local[..dimension])
}

/// Evaluate a tensor-product Chebyshev series at a point of the normalized frame with nested
/// Clenshaw recurrences.
///
/// Each of the `order` coefficient blocks along axis 0 is reduced over the remaining axes first,
/// so at most `order` partial sums are held per axis and nothing is allocated.
pub(crate) fn evaluate_local(coefficients: &[f64], order: usize, local: &[f64]) -> f64 {
    if local.len() == 1 {
        return clenshaw(coefficients, local[0]);
    }

    let block = coefficients.len() / order;
    let mut partial: ArrayVec<[f64; MAX_ORDER]> = ArrayVec::new();
    partial.extend(
        coefficients
            .chunks_exact(block)
            .map(|chunk| evaluate_local(chunk, order, &local[1..])),
    );
    clenshaw(&partial, local[0])
}

#[inline]
fn clenshaw(coefficients: &[f64], x: f64) -> f64 {
    let two_x = 2.0 * x;
    let mut b1 = 0.0;
    let mut b2 = 0.0;
    for c in coefficients[1..].iter().rev() {
        let b0 = c + two_x * b1 - b2;
        b2 = b1;
        b1 = b0;
    }
    coefficients[0] + x * b1 - b2
}

#[cfg(test)]
mod test {
    use assert_approx_eq::assert_approx_eq;

    use super::*;

    #[test]
    fn nodes_do_not_coincide() {
        for order in 1..=16 {
            let basis = ChebyshevBasis::new(1, order);
            for x in basis.fit_nodes() {
                for t in basis.test_nodes() {
                    assert!((x - t).abs() > 1e-6, "order {order}: {x} vs {t}");
                }
            }
        }
    }

    #[test]
    fn reproduces_samples_at_fit_nodes() {
        let geometry = BoxGeometry::new(&[0.5, 1.0], &[0.25, 2.0]);
        let basis = ChebyshevBasis::new(2, 6);
        let func = |x: &[f64]| (x[0] * 3.0).sin() * x[1].exp();
        let coefficients = basis.fit(&func, &geometry);
        assert_eq!(coefficients.len(), 36);

        let mut point = [0.0; 2];
        for xi in basis.fit_nodes() {
            for yi in basis.fit_nodes() {
                geometry.from_local(&[*xi, *yi], &mut point);
                let expected = func(&point);
                let actual = basis.evaluate(&coefficients, &geometry, &point);
                assert_approx_eq!(expected, actual, 1e-12);
            }
        }
    }

    #[test]
    fn exact_for_low_degree_polynomials() {
        let geometry = BoxGeometry::new(&[-1.0, 0.0, 2.0], &[1.0, 0.5, 3.0]);
        let basis = ChebyshevBasis::new(3, 4);
        let func = |x: &[f64]| 1.0 + x[0] * x[0] * x[1] - 2.0 * x[2].powi(3) + x[0] * x[2];
        let coefficients = basis.fit(&func, &geometry);

        for point in [[-1.5, 0.2, 4.0], [-0.1, -0.4, -0.9], [-2.0, 0.5, 5.0]] {
            assert_approx_eq!(
                func(&point),
                basis.evaluate(&coefficients, &geometry, &point),
                1e-10
            );
        }

        let estimate = basis.estimate_error(&coefficients, &geometry, &func);
        assert!(estimate.max_abs_error < 1e-10);
    }

    #[test]
    fn constant_order_one() {
        let geometry = BoxGeometry::new(&[0.0], &[1.0]);
        let basis = ChebyshevBasis::new(1, 1);
        let coefficients = basis.fit(&|_: &[f64]| 4.0, &geometry);
        assert_eq!(coefficients.len(), 1);
        assert_approx_eq!(basis.evaluate(&coefficients, &geometry, &[0.3]), 4.0);
    }

    #[test]
    fn detects_underresolved_fit() {
        let geometry = BoxGeometry::new(&[0.0], &[1.0]);
        let basis = ChebyshevBasis::new(1, 4);
        let func = |x: &[f64]| (20.0 * x[0]).sin() + 2.0;
        let coefficients = basis.fit(&func, &geometry);
        let estimate = basis.estimate_error(&coefficients, &geometry, &func);
        assert!(estimate.max_abs_error > 1e-2);
        assert!(estimate.max_rel_error > 1e-3);
    }

    #[test]
    fn non_finite_samples_are_infinite_error() {
        let geometry = BoxGeometry::new(&[0.0], &[1.0]);
        let basis = ChebyshevBasis::new(1, 5);
        let func = |x: &[f64]| x[0].sqrt();
        let coefficients = basis.fit(&func, &geometry);
        let estimate = basis.estimate_error(&coefficients, &geometry, &func);
        assert!(estimate.max_abs_error.is_infinite());
        assert!(estimate.max_rel_error.is_infinite());
    }

    #[test]
    fn near_zero_points_use_absolute_error() {
        let geometry = BoxGeometry::new(&[0.0], &[1.0]);
        let basis = ChebyshevBasis::new(1, 3);
        let coefficients = basis.fit(&|_: &[f64]| 0.0, &geometry);
        let estimate = basis.estimate_error(&coefficients, &geometry, &|_: &[f64]| 0.0);
        assert_eq!(estimate.max_rel_error, 0.0);
        assert_eq!(estimate.max_near_zero_error, 0.0);
    }

    #[test]
    fn test_nodes_include_endpoints() {
        let basis = ChebyshevBasis::new(1, 6);
        let nodes = basis.test_nodes();
        assert_eq!(nodes.len(), 7);
        assert_eq!(nodes[0], 1.0);
        assert_eq!(nodes[6], -1.0);
        for x in nodes {
            let t = chebyshev_polynomials(7, &[*x]);
            assert_approx_eq!(t[6].abs(), 1.0, 1e-12);
        }
    }

    #[test]
    fn nested_evaluation_matches_direct_sum() {
        let order = 5;
        let coefficients: Vec<f64> = (0..order * order * order)
            .map(|i| ((i * 37 % 11) as f64 - 5.0) / (1.0 + i as f64))
            .collect();
        let local = [0.3, -0.8, 0.55];
        let t: Vec<Vec<f64>> = local
            .iter()
            .map(|x| chebyshev_polynomials(order, &[*x]))
            .collect();

        let mut expected = 0.0;
        for i in 0..order {
            for j in 0..order {
                for k in 0..order {
                    let c = coefficients[(i * order + j) * order + k];
                    expected += c * t[0][i] * t[1][j] * t[2][k];
                }
            }
        }
        assert_approx_eq!(evaluate_local(&coefficients, order, &local), expected, 1e-12);
    }

    #[test]
    fn underestimate_at_box_corner_is_caught() {
        // Errors along both axes add up at the corners of the box
        let geometry = BoxGeometry::new(&[0.0, 0.0], &[1.0, 1.0]);
        let basis = ChebyshevBasis::new(2, 4);
        let func = |x: &[f64]| x[0].powi(4) + x[1].powi(4);
        let coefficients = basis.fit(&func, &geometry);
        let estimate = basis.estimate_error(&coefficients, &geometry, &func);

        let corner = [1.0, 1.0];
        let actual = (basis.evaluate(&coefficients, &geometry, &corner) - func(&corner)).abs();
        assert!(actual > 0.0);
        assert_approx_eq!(estimate.max_abs_error, actual, 1e-12);
    }

    #[test]
    #[should_panic(expected = "Unsupported order")]
    fn rejects_order_above_limit() {
        ChebyshevBasis::new(1, MAX_ORDER + 1);
    }

    #[test]
    fn clenshaw_matches_recurrence() {
        let coefficients = [0.5, -1.0, 0.25, 2.0];
        let x = 0.3;
        let t = chebyshev_polynomials(4, &[x]);
        let expected: f64 = coefficients.iter().zip(&t).map(|(c, t)| c * t).sum();
        assert_approx_eq!(clenshaw(&coefficients, x), expected, 1e-14);
    }
}

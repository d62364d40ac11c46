use std::path::PathBuf;

use crate::constants::MAX_DIMENSION;
use crate::test::{max_rel_error, random_points, testfun_2d, testfun_3d};
use crate::{ApproxError, BuildConfig, BoxGeometry, FunctionApproximator, WithData};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("polytree-{}-{}.bin", name, std::process::id()))
}

#[test]
fn approximates_2d_function_to_tolerance() {
    let tolerance = 1e-10;
    let domain = BoxGeometry::new(&[0.0, 0.0], &[1.0, 1.0]);
    let points = random_points(&domain, 10_000, 1);

    for order in [6, 8] {
        let approx = FunctionApproximator::construct(
            &testfun_2d,
            domain.center(),
            domain.half_extent(),
            order,
            tolerance,
        )
        .unwrap();
        assert!(approx.accuracy_warning().is_none());

        let error = max_rel_error(testfun_2d, |x| approx.evaluate(x), &points, 2);
        assert!(error <= tolerance, "order {}: max relative error {}", order, error);
    }
}

#[test]
fn approximates_with_user_data() {
    fn scaled(x: &[f64], scale_factor: &f64) -> f64 {
        scale_factor * testfun_2d(x)
    }

    let func = WithData::new(scaled, 1.5);
    let center = [1.5, 3.0];
    let half_extent = [1.0, 1.0];
    let approx = FunctionApproximator::construct(&func, &center, &half_extent, 6, 1e-10).unwrap();
    assert!(approx.accuracy_warning().is_none());

    let domain = BoxGeometry::new(&center, &half_extent);
    let points = random_points(&domain, 2_000, 2);
    let error = max_rel_error(|x| scaled(x, &1.5), |x| approx.evaluate(x), &points, 2);
    assert!(error <= 1e-10, "max relative error {}", error);
}

#[test]
fn approximates_3d_function() {
    let center = [1.5, 3.0, 1.5];
    let half_extent = [1.0, 1.0, 1.0];
    let approx =
        FunctionApproximator::construct(&testfun_3d, &center, &half_extent, 8, 1e-8).unwrap();
    assert!(approx.accuracy_warning().is_none());

    let domain = BoxGeometry::new(&center, &half_extent);
    let points = random_points(&domain, 2_000, 3);
    let values = approx.evaluate_many(&points);
    for (point, value) in points.chunks_exact(3).zip(values) {
        assert_eq!(value, approx.evaluate(point));
        let actual = testfun_3d(point);
        assert!(((value - actual) / actual).abs() < 1e-7);
    }
}

#[test]
fn every_supported_dimension() {
    for dimension in 1..=MAX_DIMENSION {
        let func = |x: &[f64]| (0.3 * x.iter().sum::<f64>()).exp();
        let center = vec![0.0; dimension];
        let half_extent = vec![1.0; dimension];
        let approx = FunctionApproximator::construct(&func, &center, &half_extent, 5, 1e-4)
            .unwrap();
        assert_eq!(approx.dimension(), dimension);
        assert!(approx.accuracy_warning().is_none());

        let domain = BoxGeometry::new(&center, &half_extent);
        let points = random_points(&domain, 200, dimension as u64);
        let error = max_rel_error(func, |x| approx.evaluate(x), &points, dimension);
        assert!(error < 1e-3, "dimension {}: {}", dimension, error);
    }
}

#[test]
fn construction_is_deterministic() {
    let build = || {
        FunctionApproximator::construct(&testfun_2d, &[0.0, 0.0], &[1.0, 1.0], 6, 1e-8).unwrap()
    };
    let a = build();
    let b = build();
    assert_eq!(a, b);

    let domain = BoxGeometry::new(&[0.0, 0.0], &[1.0, 1.0]);
    let points = random_points(&domain, 1_000, 4);
    assert_eq!(a.evaluate_many(&points), b.evaluate_many(&points));
}

#[cfg(feature = "rayon")]
#[test]
fn single_threaded_build_matches_parallel() {
    let config = BuildConfig::new(&[1.5, 3.0, 1.5], &[1.0, 1.0, 1.0])
        .with_order(6)
        .with_tolerance(1e-8);
    let parallel = FunctionApproximator::with_config(&testfun_3d, config.clone()).unwrap();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .unwrap();
    let sequential =
        pool.install(|| FunctionApproximator::with_config(&testfun_3d, config).unwrap());
    assert_eq!(parallel, sequential);
}

#[test]
fn save_and_restore() {
    let approx =
        FunctionApproximator::construct(&testfun_3d, &[1.5, 3.0, 1.5], &[1.0, 1.0, 1.0], 6, 1e-8)
            .unwrap();
    let path = temp_path("save_and_restore");
    approx.save(&path).unwrap();

    let restored = FunctionApproximator::restore(&path).unwrap();
    assert_eq!(approx, restored);

    let domain = BoxGeometry::new(&[1.5, 3.0, 1.5], &[1.0, 1.0, 1.0]);
    let points = random_points(&domain, 2_000, 5);
    for point in points.chunks_exact(3) {
        assert_eq!(
            approx.evaluate(point).to_bits(),
            restored.evaluate(point).to_bits()
        );
    }

    let header = crate::tree::read_header(&path).unwrap();
    assert_eq!((header.dimension, header.order), (3, 6));

    assert!(FunctionApproximator::restore_expecting(&path, 3, 6).is_ok());
    assert!(matches!(
        FunctionApproximator::restore_expecting(&path, 2, 6),
        Err(ApproxError::Format(_))
    ));
    assert!(matches!(
        FunctionApproximator::restore_expecting(&path, 3, 8),
        Err(ApproxError::Format(_))
    ));

    std::fs::remove_file(&path).unwrap();
    restored.release();
}

#[test]
fn io_errors() {
    let missing = temp_path("does-not-exist");
    assert!(matches!(
        FunctionApproximator::restore(&missing),
        Err(ApproxError::Io(_))
    ));
    assert!(matches!(
        crate::tree::read_header(&missing),
        Err(ApproxError::Io(_))
    ));

    let approx = FunctionApproximator::construct(&|x: &[f64]| x[0], &[0.0], &[1.0], 4, 1e-6)
        .unwrap();
    let unwritable = missing.join("nested").join("tree.bin");
    assert!(matches!(approx.save(&unwritable), Err(ApproxError::Io(_))));
}

#[test]
fn corrupted_file_is_a_format_error() {
    let approx = FunctionApproximator::construct(&testfun_2d, &[0.0, 0.0], &[1.0, 1.0], 6, 1e-6)
        .unwrap();
    let path = temp_path("corrupted");
    let mut buffer = approx.to_bytes();
    buffer.truncate(buffer.len() - 3);
    std::fs::write(&path, &buffer).unwrap();

    assert!(matches!(
        FunctionApproximator::restore(&path),
        Err(ApproxError::Format(_))
    ));
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn invalid_configuration_builds_nothing() {
    let func = |x: &[f64]| x[0];
    let cases: Vec<(Vec<f64>, Vec<f64>, usize, f64)> = vec![
        (vec![0.0], vec![1.0], 0, 1e-6),
        (vec![0.0], vec![1.0], 4, 0.0),
        (vec![0.0], vec![1.0], 4, -1e-6),
        (vec![0.0, 0.0], vec![1.0, 0.0], 4, 1e-6),
        (vec![], vec![], 4, 1e-6),
    ];
    for (center, half_extent, order, tolerance) in cases {
        let result = FunctionApproximator::construct(&func, &center, &half_extent, order, tolerance);
        assert!(
            matches!(result, Err(ApproxError::Configuration(_))),
            "{:?} {:?} {} {}",
            center,
            half_extent,
            order,
            tolerance
        );
    }
}

#[test]
fn singularity_reports_accuracy_shortfall() {
    let func = |x: &[f64]| 1.0 / x[0];
    let config = BuildConfig::new(&[0.0], &[1.0])
        .with_order(8)
        .with_tolerance(1e-10)
        .with_max_depth(12);
    let approx = FunctionApproximator::with_config(&func, config).unwrap();

    let warning = approx.accuracy_warning().expect("singularity cannot converge");
    assert!(warning.unconverged_leaves >= 1);
    assert_eq!(warning.max_depth, 12);
    assert_eq!(approx.stats().max_leaf_depth, 12);
    assert!(!approx.tree().is_converged());

    // Away from the singularity the fit still meets the tolerance
    for x in [0.5, -0.75, 0.9] {
        let error = (approx.evaluate(&[x]) * x - 1.0).abs();
        assert!(error < 1e-9, "x = {}: {}", x, error);
    }
}

#[test]
fn out_of_domain_points() {
    let approx = FunctionApproximator::construct(&testfun_2d, &[0.0, 0.0], &[1.0, 1.0], 6, 1e-6)
        .unwrap();
    assert!(approx.try_evaluate(&[0.5, 0.5]).is_some());
    assert!(approx.try_evaluate(&[1.0, -1.0]).is_some());
    assert!(approx.try_evaluate(&[1.5, 0.0]).is_none());
    assert!(approx.try_evaluate(&[0.5]).is_none());
    // Unchecked evaluation extrapolates from a boundary leaf
    assert!(approx.evaluate(&[1.01, 0.0]).is_finite());
}

//! The capability used to sample the function being approximated.

/// A scalar function of a point in `D` dimensions.
///
/// This is implemented for every `Fn(&[f64]) -> f64 + Sync`, so closures capturing whatever
/// context they need can be passed directly. Implementations must be deterministic and free of
/// side effects, since boxes are sampled concurrently during construction.
pub trait TargetFunction: Sync {
    /// Evaluate the function at `point`, whose length equals the dimension of the domain.
    fn eval(&self, point: &[f64]) -> f64;
}

impl<F> TargetFunction for F
where
    F: Fn(&[f64]) -> f64 + Sync,
{
    #[inline]
    fn eval(&self, point: &[f64]) -> f64 {
        self(point)
    }
}

/// Pairs a plain function taking auxiliary data with that data.
///
/// ```
/// use polytree::{TargetFunction, WithData};
///
/// fn scaled(x: &[f64], scale: &f64) -> f64 {
///     scale * x[0]
/// }
///
/// let func = WithData::new(scaled, 1.5);
/// assert_eq!(func.eval(&[2.0]), 3.0);
/// ```
#[derive(Debug, Clone)]
pub struct WithData<T> {
    func: fn(&[f64], &T) -> f64,
    data: T,
}

impl<T: Sync> WithData<T> {
    /// Bind `data` to `func`.
    pub fn new(func: fn(&[f64], &T) -> f64, data: T) -> Self {
        Self { func, data }
    }

    /// Access the bound data.
    pub fn data(&self) -> &T {
        &self.data
    }
}

impl<T: Sync> TargetFunction for WithData<T> {
    #[inline]
    fn eval(&self, point: &[f64]) -> f64 {
        (self.func)(point, &self.data)
    }
}

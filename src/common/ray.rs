use nalgebra::Vector3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vector3<f64>,
    pub dir: Vector3<f64>,
}

impl Ray {
    /// `dir` is normalized, it must not be zero.
    pub fn new(origin: Vector3<f64>, dir: Vector3<f64>) -> Self {
        Self {
            origin,
            dir: dir.normalize(),
        }
    }

    pub fn through(origin: Vector3<f64>, target: Vector3<f64>) -> Self {
        Self::new(origin, target - origin)
    }
}

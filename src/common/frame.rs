use nalgebra::Vector3;

use crate::consts;

/// The locally flat world's "up" and "north" directions. East completes the right handed
/// east/north/up basis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceFrame {
    up: Vector3<f64>,
    north: Vector3<f64>,
}

impl Default for ReferenceFrame {
    fn default() -> Self {
        Self {
            up: consts::world::default_up(),
            north: consts::world::default_north(),
        }
    }
}

impl ReferenceFrame {
    /// Returns `None` if `up` and `north` are degenerate or not perpendicular.
    pub fn new(up: Vector3<f64>, north: Vector3<f64>) -> Option<Self> {
        let up_len = up.norm();
        let north_len = north.norm();
        if up_len <= consts::math::EPSILON || north_len <= consts::math::EPSILON {
            return None;
        }
        let up = up / up_len;
        let north = north / north_len;
        if up.dot(&north).abs() > 1e-9 {
            return None;
        }
        Some(Self { up, north })
    }

    pub fn up(&self) -> Vector3<f64> {
        self.up
    }

    pub fn north(&self) -> Vector3<f64> {
        self.north
    }

    pub fn east(&self) -> Vector3<f64> {
        self.north.cross(&self.up)
    }
}

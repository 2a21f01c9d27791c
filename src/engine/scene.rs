use nalgebra::{Vector2, Vector3};

use crate::common::{error::OutOfBounds, ray::Ray};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub viewpoint: Vector3<f64>,
    pub forward: Vector3<f64>,
    pub up: Vector3<f64>,
}

/// What the editor needs from the host's 3D view. Positions are view space pixels.
pub trait SceneView {
    /// Picks the reference surface (terrain, ground plane, ...) under `position`.
    fn cast_to_surface(&self, position: &Vector2<f64>) -> Result<Vector3<f64>, OutOfBounds>;

    /// The world space ray through `position` starting at the viewpoint.
    fn pick_ray(&self, position: &Vector2<f64>) -> Ray;

    fn camera(&self) -> CameraPose;
}

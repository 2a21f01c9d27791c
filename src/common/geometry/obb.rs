use nalgebra::{Isometry3, Point3, Rotation3, Translation3, UnitQuaternion, Vector3};

use crate::common::{frame::ReferenceFrame, geometry::shape::Vertex, math};

/// Immutable box snapshot: a local frame placed at `transform` (east/north/up rotated by
/// `azimuth` about up) and the local extents `offset..offset + size` inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientedBox {
    pub transform: Isometry3<f64>,
    /// Degrees counter clockwise about up, within `(-180, 180]`.
    pub azimuth: f64,
    /// The local min corner.
    pub offset: Vector3<f64>,
    pub size: Vector3<f64>,
}

impl OrientedBox {
    pub fn new(
        origin: Vector3<f64>,
        azimuth: f64,
        offset: Vector3<f64>,
        size: Vector3<f64>,
        frame: &ReferenceFrame,
    ) -> Self {
        let azimuth = normalize_degrees(azimuth);
        Self {
            transform: Isometry3::from_parts(
                Translation3::from(origin),
                azimuth_rotation(frame, azimuth),
            ),
            azimuth,
            offset,
            size,
        }
    }

    pub fn origin(&self) -> Vector3<f64> {
        self.transform.translation.vector
    }

    /// World space directions of the local x, y and z axes.
    pub fn local_axes(&self) -> [Vector3<f64>; 3] {
        let rotation = &self.transform.rotation;
        [
            rotation.transform_vector(&Vector3::x()),
            rotation.transform_vector(&Vector3::y()),
            rotation.transform_vector(&Vector3::z()),
        ]
    }

    pub fn local_to_world(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.transform.transform_point(&Point3::from(*local)).coords
    }

    pub fn world_to_local(&self, world: &Vector3<f64>) -> Vector3<f64> {
        self.transform
            .inverse_transform_point(&Point3::from(*world))
            .coords
    }

    /// Corner `i` sits at the max end of local x, y and z when bit 2, 1 and 0 of `i` are
    /// clear respectively, so corner 7 is the min corner and corner 0 the max corner.
    pub fn corner(&self, i: usize) -> Vertex {
        debug_assert!(i < 8, "A box only has 8 corners.");
        let pick = |bit: usize| if i & bit == 0 { 1.0 } else { 0.0 };
        let local = self.offset + self.size.component_mul(&Vector3::new(pick(4), pick(2), pick(1)));
        self.local_to_world(&local)
    }

    pub fn corners(&self) -> [Vertex; 8] {
        std::array::from_fn(|i| self.corner(i))
    }

    pub fn center(&self) -> Vector3<f64> {
        self.local_to_world(&(self.offset + self.size * 0.5))
    }

    pub fn contains(&self, world: &Vector3<f64>) -> bool {
        let local = self.world_to_local(world) - self.offset;
        (0..3).all(|i| local[i] >= -1e-9 && local[i] <= self.size[i] + 1e-9)
    }
}

/// The east/north/up frame turned `azimuth` degrees about up.
pub fn azimuth_rotation(frame: &ReferenceFrame, azimuth: f64) -> UnitQuaternion<f64> {
    let up = frame.up();
    let x = math::rotate_around_axis(&frame.east(), &up, azimuth);
    let y = math::rotate_around_axis(&frame.north(), &up, azimuth);
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_basis_unchecked(&[x, y, up]))
}

/// Wraps an angle in degrees into `(-180, 180]`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

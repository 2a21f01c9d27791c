use nalgebra::Vector3;
use strum_macros::{Display, EnumIter};

use crate::common::{geometry::obb::OrientedBox, math};

pub type Vertex = Vector3<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Face ids are part of the resize contract: the id is the index into
/// [`create_face_polygons`], even ids are min faces and odd ids max faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display)]
pub enum FaceId {
    NegX = 0,
    PosX = 1,
    NegY = 2,
    PosY = 3,
    NegZ = 4,
    PosZ = 5,
}

impl FaceId {
    pub const ALL: [FaceId; 6] = [
        FaceId::NegX,
        FaceId::PosX,
        FaceId::NegY,
        FaceId::PosY,
        FaceId::NegZ,
        FaceId::PosZ,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn axis(self) -> Axis {
        match self {
            FaceId::NegX | FaceId::PosX => Axis::X,
            FaceId::NegY | FaceId::PosY => Axis::Y,
            FaceId::NegZ | FaceId::PosZ => Axis::Z,
        }
    }

    /// Whether this face bounds the max end of its axis' interval.
    pub fn is_max(self) -> bool {
        self.index() % 2 == 1
    }

    pub fn opposite(self) -> Self {
        match self {
            FaceId::NegX => FaceId::PosX,
            FaceId::PosX => FaceId::NegX,
            FaceId::NegY => FaceId::PosY,
            FaceId::PosY => FaceId::NegY,
            FaceId::NegZ => FaceId::PosZ,
            FaceId::PosZ => FaceId::NegZ,
        }
    }

    /// Box corner indices going around the face. Edges (1 - 0) and (3 - 0) span it.
    fn corner_indices(self) -> [usize; 4] {
        match self {
            FaceId::NegX => [7, 5, 4, 6],
            FaceId::PosX => [3, 1, 0, 2],
            FaceId::NegY => [7, 3, 2, 6],
            FaceId::PosY => [5, 1, 0, 4],
            FaceId::NegZ => [7, 3, 1, 5],
            FaceId::PosZ => [6, 2, 0, 4],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FacePolygon {
    pub id: FaceId,
    pub corners: [Vertex; 4],
    /// Points out of the box.
    pub normal: Vector3<f64>,
}

impl FacePolygon {
    pub fn center(&self) -> Vector3<f64> {
        self.corners.iter().sum::<Vector3<f64>>() * 0.25
    }

    pub fn intersect_ray(&self, origin: &Vector3<f64>, dir: &Vector3<f64>) -> Option<Vector3<f64>> {
        math::ray_rectangle_intersection(origin, dir, &self.corners)
    }
}

/// The six faces of `obb` ordered `[-X, +X, -Y, +Y, -Z, +Z]`.
pub fn create_face_polygons(obb: &OrientedBox) -> [FacePolygon; 6] {
    let corners = obb.corners();
    let axes = obb.local_axes();
    FaceId::ALL.map(|id| {
        let sign = if id.is_max() { 1.0 } else { -1.0 };
        FacePolygon {
            id,
            corners: id.corner_indices().map(|i| corners[i]),
            normal: axes[id.axis().index()] * sign,
        }
    })
}

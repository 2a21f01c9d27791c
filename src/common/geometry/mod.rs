pub mod obb;
pub mod shape;

pub mod error;
pub mod frame;
pub mod geometry;
pub mod math;
pub mod ray;

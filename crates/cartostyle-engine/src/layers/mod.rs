//! Concrete model variants.

pub mod point;

pub use point::PointModel;

pub mod geometry;
pub mod profile;

pub mod camera_facing;
pub mod orientation_normalizer;

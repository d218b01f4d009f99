pub mod moves;
pub mod sessions;

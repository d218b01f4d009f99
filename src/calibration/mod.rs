pub mod file;
pub mod profile;
pub mod store;

pub use file::FileCalibrationStore;
pub use profile::{compute_profile, sample_profile, ColorProfile, DEFAULT_SAMPLE_SIDE};
pub use store::{CalibrationSnapshot, CalibrationStore, MemoryCalibrationStore};

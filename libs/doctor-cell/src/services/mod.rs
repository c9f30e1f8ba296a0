pub mod directory;

pub use directory::{DoctorDirectory, StaticDoctorDirectory, MAX_LOOKUP_RESULTS};

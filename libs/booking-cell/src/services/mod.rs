pub mod workflow;

pub use workflow::{BookingWorkflow, PatientChannel};

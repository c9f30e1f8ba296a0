pub mod dates;
pub mod slots;
pub mod store;

pub use dates::DateResolver;
pub use slots::SlotGrid;
pub use store::AppointmentStore;

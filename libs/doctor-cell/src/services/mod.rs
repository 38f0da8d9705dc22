pub mod directory;
pub mod slots;

pub use directory::DoctorDirectory;
pub use slots::{clock_for, ClinicClock, Clock, FixedClock, SlotRepository, SystemClock};

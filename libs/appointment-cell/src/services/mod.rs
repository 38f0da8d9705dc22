pub mod booking;
pub mod read_models;
pub mod session;

pub use booking::BookingCoordinator;
pub use read_models::BookingReadModels;
pub use session::BookingSession;

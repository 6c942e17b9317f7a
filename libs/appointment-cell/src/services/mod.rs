pub mod booking;
pub mod cancellation;
pub mod history;

pub use booking::{BookingCoordinator, ValidatedBooking};
pub use cancellation::CancellationHandler;
pub use history::AppointmentHistoryService;

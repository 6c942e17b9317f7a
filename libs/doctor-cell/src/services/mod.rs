pub mod availability;
pub mod calendar;
pub mod doctor;
pub mod next_available;
pub mod slots;

pub use availability::AvailabilityService;
pub use calendar::{WorkingHoursCalendar, WorkingWindow};
pub use doctor::DoctorService;
pub use next_available::{find_next_available, NextSlot};
pub use slots::SlotGenerator;

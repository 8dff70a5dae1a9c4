pub mod booking;
pub mod lifecycle;

pub use booking::BookingService;
pub use lifecycle::{spawn_completion_sweep, ConsultationLifecycleService};

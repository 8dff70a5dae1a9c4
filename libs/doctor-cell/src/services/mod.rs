pub mod absence;
pub mod availability;
pub mod projector;
pub mod schedule;

pub use absence::AbsenceService;
pub use availability::AvailabilityService;
pub use projector::{check_slot_run, project_schedule, ScheduleProjector, SlotRunError};
pub use schedule::ScheduleService;

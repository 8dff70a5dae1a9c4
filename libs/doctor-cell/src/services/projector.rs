//! Merges availability windows, consultations and absences into a slot grid.
//!
//! Every cell is classified in strict priority order: an absence blocks the
//! whole day, then a covering consultation marks the cell booked, then any
//! applicable availability window offers it. Anything else is not offered and
//! shares the `Cancelled` status with absences.

use chrono::{NaiveDate, NaiveTime, Timelike};
use thiserror::Error;

use shared_models::schedule::{
    minute_of_day, time_from_minutes, Absence, AvailabilityWindow, Consultation, DaySchedule,
    ScheduleSlot, SlotStatus, MINUTES_PER_DAY, SLOTS_PER_DAY, SLOT_MINUTES,
};

/// Longest date range a single projection request may cover.
pub const MAX_RANGE_DAYS: i64 = 62;

const AVAILABLE_LABEL: &str = "Available Slot";
const AVAILABLE_DETAILS: &str = "Click to book";
const BOOKED_DETAILS: &str = "This slot is booked";
const ABSENT_DETAILS: &str = "Doctor is absent";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotRunError {
    #[error("Duration must be a positive multiple of {SLOT_MINUTES} minutes, got {0}")]
    InvalidDuration(u32),

    #[error("Start time {0} is not on a {SLOT_MINUTES}-minute slot boundary")]
    Misaligned(NaiveTime),

    #[error("Consultation would run past the end of the day")]
    PastEndOfDay,

    #[error("Date {0} is outside the projected schedule")]
    DateOutsideSchedule(NaiveDate),

    #[error("Selected slots are not all available (slot {0} is taken or not offered). Choose adjacent free slots.")]
    Unavailable(NaiveTime),
}

pub fn slot_times() -> impl Iterator<Item = NaiveTime> {
    (0..SLOTS_PER_DAY as u32).map(|index| time_from_minutes(index * SLOT_MINUTES))
}

pub fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<(), String> {
    if start > end {
        return Err("startDate must not be after endDate".to_string());
    }
    let days = (end - start).num_days() + 1;
    if days > MAX_RANGE_DAYS {
        return Err(format!("Date range spans {} days, at most {} allowed", days, MAX_RANGE_DAYS));
    }
    Ok(())
}

/// Pure projector over one doctor's rows; rows of other doctors are ignored.
pub struct ScheduleProjector<'a> {
    availability: Vec<&'a AvailabilityWindow>,
    consultations: Vec<&'a Consultation>,
    absences: Vec<&'a Absence>,
}

impl<'a> ScheduleProjector<'a> {
    pub fn new(
        doctor_id: i64,
        availability: &'a [AvailabilityWindow],
        consultations: &'a [Consultation],
        absences: &'a [Absence],
    ) -> Self {
        Self {
            availability: availability.iter().filter(|w| w.doctor_id == doctor_id).collect(),
            consultations: consultations.iter().filter(|c| c.doctor_id == doctor_id).collect(),
            absences: absences.iter().filter(|a| a.doctor_id == doctor_id).collect(),
        }
    }

    pub fn classify(&self, date: NaiveDate, time: NaiveTime) -> ScheduleSlot {
        if let Some(absence) = self.absences.iter().find(|a| a.covers(date)) {
            return ScheduleSlot {
                time,
                status: SlotStatus::Cancelled,
                kind: None,
                details: Some(
                    absence
                        .reason
                        .clone()
                        .filter(|reason| !reason.trim().is_empty())
                        .unwrap_or_else(|| ABSENT_DETAILS.to_string()),
                ),
            };
        }

        if let Some(consultation) = self.consultations.iter().find(|c| c.occupies(date, time)) {
            return ScheduleSlot {
                time,
                status: SlotStatus::Booked,
                kind: Some(consultation.kind.clone()),
                details: Some(BOOKED_DETAILS.to_string()),
            };
        }

        if self.availability.iter().any(|w| w.offers(date, time)) {
            return ScheduleSlot {
                time,
                status: SlotStatus::Available,
                kind: Some(AVAILABLE_LABEL.to_string()),
                details: Some(AVAILABLE_DETAILS.to_string()),
            };
        }

        ScheduleSlot {
            time,
            status: SlotStatus::Cancelled,
            kind: None,
            details: None,
        }
    }

    pub fn project_day(&self, date: NaiveDate) -> DaySchedule {
        DaySchedule {
            date,
            slots: slot_times().map(|time| self.classify(date, time)).collect(),
        }
    }

    /// Inclusive range; an inverted range yields an empty grid.
    pub fn project(&self, start: NaiveDate, end: NaiveDate) -> Vec<DaySchedule> {
        start
            .iter_days()
            .take_while(|date| *date <= end)
            .map(|date| self.project_day(date))
            .collect()
    }
}

pub fn project_schedule(
    doctor_id: i64,
    start: NaiveDate,
    end: NaiveDate,
    availability: &[AvailabilityWindow],
    consultations: &[Consultation],
    absences: &[Absence],
) -> Vec<DaySchedule> {
    ScheduleProjector::new(doctor_id, availability, consultations, absences).project(start, end)
}

/// Checks that `duration_minutes / 30` consecutive cells from `start` are all
/// available on `date`, returning the exclusive end time of the run.
pub fn check_slot_run(
    schedule: &[DaySchedule],
    date: NaiveDate,
    start: NaiveTime,
    duration_minutes: u32,
) -> Result<NaiveTime, SlotRunError> {
    if duration_minutes == 0 || duration_minutes % SLOT_MINUTES != 0 {
        return Err(SlotRunError::InvalidDuration(duration_minutes));
    }

    let start_minute = minute_of_day(start);
    if start_minute % SLOT_MINUTES != 0 || start.second() != 0 {
        return Err(SlotRunError::Misaligned(start));
    }
    if start_minute + duration_minutes > MINUTES_PER_DAY {
        return Err(SlotRunError::PastEndOfDay);
    }

    let day = schedule
        .iter()
        .find(|day| day.date == date)
        .ok_or(SlotRunError::DateOutsideSchedule(date))?;

    for offset in (0..duration_minutes).step_by(SLOT_MINUTES as usize) {
        let time = time_from_minutes(start_minute + offset);
        match day.slot_at(time) {
            Some(slot) if slot.is_available() => {}
            _ => return Err(SlotRunError::Unavailable(time)),
        }
    }

    Ok(time_from_minutes(start_minute + duration_minutes))
}

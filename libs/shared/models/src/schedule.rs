use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Width of one bookable cell.
pub const SLOT_MINUTES: u32 = 30;
pub const SLOTS_PER_DAY: usize = 48;
pub const MINUTES_PER_DAY: u32 = 24 * 60;

// ==============================================================================
// TIME HELPERS
// ==============================================================================

/// `HH:MM` on the wire; storage may hand back `HH:MM:SS`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid time '{}', expected HH:MM", raw)))
    }

    pub fn parse(raw: &str) -> Option<NaiveTime> {
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
            .ok()
    }
}

pub fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Inverse of [`minute_of_day`], wrapping at midnight.
pub fn time_from_minutes(minutes: u32) -> NaiveTime {
    let minutes = minutes % MINUTES_PER_DAY;
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap_or(NaiveTime::MIN)
}

/// Daily `[start, end)` range. `start > end` wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        let (start, end, t) = (
            minute_of_day(self.start),
            minute_of_day(self.end),
            minute_of_day(time),
        );
        if !self.wraps_midnight() {
            t >= start && t < end
        } else {
            t >= start || t < end
        }
    }

    /// Length in minutes; an end of `00:00` after a later start reads as midnight.
    pub fn duration_minutes(&self) -> u32 {
        let (start, end) = (minute_of_day(self.start), minute_of_day(self.end));
        if !self.wraps_midnight() {
            end - start
        } else {
            MINUTES_PER_DAY - start + end
        }
    }
}

pub fn date_in_range(date: NaiveDate, start: NaiveDate, end: NaiveDate) -> bool {
    start <= date && date <= end
}

// ==============================================================================
// WEEKDAYS
// ==============================================================================

static WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Set of weekdays, stored as the comma-separated `days_mask` text column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn with(self, day: Weekday) -> Self {
        Self(self.0 | (1 << day.num_days_from_monday()))
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        WEEK.iter().copied().filter(move |day| self.contains(*day))
    }
}

impl fmt::Display for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(weekday_name).collect();
        write!(f, "{}", names.join(","))
    }
}

impl FromStr for WeekdaySet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .try_fold(Self::empty(), |set, name| {
                name.parse::<Weekday>()
                    .map(|day| set.with(day))
                    .map_err(|_| format!("Unknown weekday '{}'", name))
            })
    }
}

impl Serialize for WeekdaySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

// Accepts the stored comma-separated text, a list of names, or null.
impl<'de> Deserialize<'de> for WeekdaySet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            List(Vec<String>),
        }

        let joined = match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Text(text)) => text,
            Some(Raw::List(names)) => names.join(","),
            None => String::new(),
        };
        joined.parse().map_err(serde::de::Error::custom)
    }
}

// ==============================================================================
// ENTITIES
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvailabilityKind {
    #[serde(rename = "Cyclic", alias = "Recurring")]
    Recurring,
    #[serde(rename = "Single", alias = "SingleDay")]
    SingleDay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub id: i64,
    pub doctor_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: AvailabilityKind,
    #[serde(default)]
    pub days_mask: WeekdaySet,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

impl AvailabilityWindow {
    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.end_time)
    }

    /// Whether the window is offered on `date` at all, ignoring time of day.
    pub fn applies_to(&self, date: NaiveDate) -> bool {
        match self.kind {
            AvailabilityKind::Recurring => {
                date_in_range(date, self.start_date, self.end_date)
                    && self.days_mask.contains(date.weekday())
            }
            AvailabilityKind::SingleDay => date == self.start_date,
        }
    }

    pub fn offers(&self, date: NaiveDate, time: NaiveTime) -> bool {
        self.applies_to(date) && self.time_range().contains(time)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Absence {
    pub id: i64,
    pub doctor_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

impl Absence {
    pub fn covers(&self, date: NaiveDate) -> bool {
        date_in_range(date, self.start_date, self.end_date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsultationStatus {
    Booked,
    Cancelled,
    Completed,
    Paid,
}

impl fmt::Display for ConsultationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsultationStatus::Booked => write!(f, "Booked"),
            ConsultationStatus::Cancelled => write!(f, "Cancelled"),
            ConsultationStatus::Completed => write!(f, "Completed"),
            ConsultationStatus::Paid => write!(f, "Paid"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consultation {
    pub id: i64,
    pub doctor_id: i64,
    pub patient_id: i64,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: ConsultationStatus,
    pub notes: Option<String>,
}

impl Consultation {
    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.end_time)
    }

    pub fn is_active(&self) -> bool {
        self.status != ConsultationStatus::Cancelled
    }

    pub fn occupies(&self, date: NaiveDate, time: NaiveTime) -> bool {
        self.is_active() && self.date == date && self.time_range().contains(time)
    }
}

// ==============================================================================
// PROJECTION OUTPUT
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotStatus {
    Available,
    Booked,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub status: SlotStatus,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ScheduleSlot {
    pub fn is_available(&self) -> bool {
        self.status == SlotStatus::Available
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub slots: Vec<ScheduleSlot>,
}

impl DaySchedule {
    pub fn slot_at(&self, time: NaiveTime) -> Option<&ScheduleSlot> {
        self.slots.iter().find(|slot| slot.time == time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_time_range_plain_and_wrapping() {
        let day = TimeRange::new(t(9, 0), t(10, 0));
        assert!(day.contains(t(9, 0)));
        assert!(day.contains(t(9, 30)));
        assert!(!day.contains(t(10, 0)));
        assert_eq!(day.duration_minutes(), 60);

        let night = TimeRange::new(t(22, 0), t(2, 0));
        assert!(night.wraps_midnight());
        assert!(night.contains(t(23, 30)));
        assert!(night.contains(t(0, 0)));
        assert!(night.contains(t(1, 30)));
        assert!(!night.contains(t(2, 0)));
        assert!(!night.contains(t(12, 0)));
        assert_eq!(night.duration_minutes(), 240);
    }

    #[test]
    fn test_range_ending_at_midnight() {
        let late = TimeRange::new(t(23, 0), t(0, 0));
        assert!(late.contains(t(23, 30)));
        assert!(!late.contains(t(0, 0)));
        assert_eq!(late.duration_minutes(), 60);
    }

    #[test]
    fn test_weekday_set_parsing_and_display() {
        let set: WeekdaySet = "Monday, wed,Fri".parse().unwrap();
        assert!(set.contains(Weekday::Mon));
        assert!(set.contains(Weekday::Wed));
        assert!(set.contains(Weekday::Fri));
        assert!(!set.contains(Weekday::Tue));
        assert_eq!(set.to_string(), "Monday,Wednesday,Friday");

        assert!("".parse::<WeekdaySet>().unwrap().is_empty());

        let from_list: WeekdaySet = serde_json::from_str(r#"["Tuesday","Sat"]"#).unwrap();
        assert_eq!(from_list.to_string(), "Tuesday,Saturday");
        assert!("Funday".parse::<WeekdaySet>().is_err());
    }

    #[test]
    fn test_availability_row_from_storage() {
        let window: AvailabilityWindow = serde_json::from_value(serde_json::json!({
            "id": 3,
            "doctor_id": 9,
            "start_date": "2024-05-01",
            "end_date": "2024-05-31",
            "type": "Cyclic",
            "days_mask": "Monday,Thursday",
            "start_time": "09:00:00",
            "end_time": "12:30:00"
        }))
        .unwrap();

        assert_eq!(window.kind, AvailabilityKind::Recurring);
        assert_eq!(window.start_time, t(9, 0));
        // 2024-05-06 is a Monday, 2024-05-07 a Tuesday
        assert!(window.offers(d("2024-05-06"), t(12, 0)));
        assert!(!window.offers(d("2024-05-06"), t(12, 30)));
        assert!(!window.applies_to(d("2024-05-07")));
        assert!(!window.applies_to(d("2024-06-03")));
    }

    #[test]
    fn test_single_day_window_matches_exact_date_only() {
        let window = AvailabilityWindow {
            id: 1,
            doctor_id: 1,
            start_date: d("2024-05-06"),
            end_date: d("2024-05-06"),
            kind: AvailabilityKind::SingleDay,
            days_mask: WeekdaySet::empty(),
            start_time: t(9, 0),
            end_time: t(10, 0),
        };
        assert!(window.applies_to(d("2024-05-06")));
        assert!(!window.applies_to(d("2024-05-13")));
    }

    #[test]
    fn test_consultation_serializes_wire_names() {
        let consultation = Consultation {
            id: 5,
            doctor_id: 2,
            patient_id: 3,
            date: d("2024-05-06"),
            start_time: t(9, 0),
            end_time: t(10, 0),
            kind: "First Visit".to_string(),
            status: ConsultationStatus::Booked,
            notes: None,
        };
        let json = serde_json::to_value(&consultation).unwrap();
        assert_eq!(json["type"], "First Visit");
        assert_eq!(json["start_time"], "09:00");
        assert_eq!(json["status"], "Booked");
    }

    #[test]
    fn test_cancelled_consultation_occupies_nothing() {
        let mut consultation = Consultation {
            id: 5,
            doctor_id: 2,
            patient_id: 3,
            date: d("2024-05-06"),
            start_time: t(9, 0),
            end_time: t(10, 0),
            kind: "Follow-up Visit".to_string(),
            status: ConsultationStatus::Booked,
            notes: None,
        };
        assert!(consultation.occupies(d("2024-05-06"), t(9, 30)));
        consultation.status = ConsultationStatus::Cancelled;
        assert!(!consultation.occupies(d("2024-05-06"), t(9, 30)));
    }
}

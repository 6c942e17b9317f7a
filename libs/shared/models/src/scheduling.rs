use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

/// Fixed slot granularity, in minutes.
pub const SLOT_MINUTES: u16 = 30;

const MINUTES_PER_DAY: u16 = 24 * 60;

// ==============================================================================
// TIME OF DAY
// ==============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid time '{0}', expected HH:MM")]
pub struct TimeParseError(pub String);

/// Wall-clock time as minutes since midnight.
///
/// Valid range is `00:00..=24:00`; `24:00` only makes sense as the end of a
/// working window. Serialized as zero-padded `"HH:MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);
    pub const END_OF_DAY: TimeOfDay = TimeOfDay(MINUTES_PER_DAY);

    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes <= MINUTES_PER_DAY).then_some(TimeOfDay(minutes))
    }

    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if minute >= 60 {
            return None;
        }
        Self::from_minutes(hour.checked_mul(60)?.checked_add(minute)?)
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    pub fn minute(self) -> u16 {
        self.0 % 60
    }

    /// Advances by `minutes`, returning `None` once past the end of the day.
    pub fn checked_add(self, minutes: u16) -> Option<Self> {
        Self::from_minutes(self.0.checked_add(minutes)?)
    }

    /// First multiple of `granularity` minutes at or after `time`.
    ///
    /// Sub-minute precision counts: 10:30:15 rounds to 11:00 for a 30 minute
    /// granularity. Saturates at `24:00`.
    pub fn boundary_at_or_after(time: NaiveTime, granularity: u16) -> Self {
        let step = u32::from(granularity.max(1)) * 60;
        let mut seconds = time.num_seconds_from_midnight();
        if time.nanosecond() > 0 {
            seconds += 1;
        }
        let rounded = seconds.div_ceil(step) * step / 60;
        TimeOfDay(rounded.min(u32::from(MINUTES_PER_DAY)) as u16)
    }

    pub fn is_aligned(self, granularity: u16) -> bool {
        granularity != 0 && self.0 % granularity == 0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeParseError;

    /// Accepts `HH:MM`, plus `HH:MM:SS` with zero seconds as returned by
    /// Postgres `time` columns.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TimeParseError(s.to_string());
        let mut parts = s.trim().split(':');

        let hour = parts.next().ok_or_else(invalid)?;
        let minute = parts.next().ok_or_else(invalid)?;
        if let Some(seconds) = parts.next() {
            if seconds.parse::<u8>().map_err(|_| invalid())? != 0 {
                return Err(invalid());
            }
        }
        if parts.next().is_some() || hour.len() != 2 || minute.len() != 2 {
            return Err(invalid());
        }

        let hour: u16 = hour.parse().map_err(|_| invalid())?;
        let minute: u16 = minute.parse().map_err(|_| invalid())?;
        TimeOfDay::from_hm(hour, minute).ok_or_else(invalid)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ==============================================================================
// DIRECTORY MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub specialization: String,
    pub bio: Option<String>,
    pub fee: f64,
}

/// One recurring weekly window. `day_of_week` counts from Sunday = 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingHours {
    pub doctor_id: Uuid,
    pub day_of_week: u8,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub author_name: Option<String>,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Confirmed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Confirmed => write!(f, "CONFIRMED"),
            AppointmentStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentType {
    #[default]
    InPerson,
    Video,
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentType::InPerson => write!(f, "IN_PERSON"),
            AppointmentType::Video => write!(f, "VIDEO"),
        }
    }
}

impl FromStr for AppointmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN_PERSON" => Ok(AppointmentType::InPerson),
            "VIDEO" => Ok(AppointmentType::Video),
            other => Err(format!("Invalid appointment type '{}', expected IN_PERSON or VIDEO", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub user_id: String,
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub status: AppointmentStatus,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    pub meeting_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn slot_key(&self) -> SlotKey {
        SlotKey {
            doctor_id: self.doctor_id,
            date: self.date,
            start_time: self.start_time,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == AppointmentStatus::Confirmed
    }
}

/// Everything the ledger needs to create a CONFIRMED row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    pub doctor_id: Uuid,
    pub user_id: String,
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub appointment_type: AppointmentType,
    pub meeting_reference: Option<String>,
}

impl NewAppointment {
    pub fn slot_key(&self) -> SlotKey {
        SlotKey {
            doctor_id: self.doctor_id,
            date: self.date,
            start_time: self.start_time,
        }
    }
}

/// The uniqueness key among CONFIRMED appointments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
}

/// A derived, never persisted, bookable slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub date: NaiveDate,
    pub time: TimeOfDay,
    pub available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    #[test]
    fn parses_and_formats_hh_mm() {
        assert_eq!(t("09:00").minutes(), 540);
        assert_eq!(t("16:30").to_string(), "16:30");
        assert_eq!(t("00:05").to_string(), "00:05");
        assert_eq!(t("24:00"), TimeOfDay::END_OF_DAY);
        assert_eq!(t("13:00:00"), t("13:00"));
    }

    #[test]
    fn rejects_malformed_times() {
        for raw in ["9:00", "09:60", "25:00", "24:01", "0900", "09:00:30", "ab:cd", ""] {
            assert!(raw.parse::<TimeOfDay>().is_err(), "{raw} should not parse");
        }
    }

    #[test]
    fn ordering_is_numeric() {
        assert!(t("09:30") < t("10:00"));
        assert!(t("23:30") < TimeOfDay::END_OF_DAY);
    }

    #[test]
    fn rounds_up_to_granularity() {
        let hms = |h, m, s| NaiveTime::from_hms_opt(h, m, s).unwrap();
        assert_eq!(TimeOfDay::boundary_at_or_after(hms(10, 7, 0), 30), t("10:30"));
        assert_eq!(TimeOfDay::boundary_at_or_after(hms(10, 30, 0), 30), t("10:30"));
        assert_eq!(TimeOfDay::boundary_at_or_after(hms(10, 30, 1), 30), t("11:00"));
        assert_eq!(TimeOfDay::boundary_at_or_after(hms(0, 0, 0), 30), TimeOfDay::MIDNIGHT);
        assert_eq!(TimeOfDay::boundary_at_or_after(hms(23, 45, 0), 30), TimeOfDay::END_OF_DAY);
    }

    #[test]
    fn checked_add_stops_at_end_of_day() {
        assert_eq!(t("23:30").checked_add(30), Some(TimeOfDay::END_OF_DAY));
        assert_eq!(TimeOfDay::END_OF_DAY.checked_add(30), None);
    }

    #[test]
    fn appointment_uses_camel_case_wire_format() {
        let appointment = Appointment {
            id: Uuid::nil(),
            doctor_id: Uuid::nil(),
            user_id: "user-1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            start_time: t("10:00"),
            status: AppointmentStatus::Confirmed,
            appointment_type: AppointmentType::InPerson,
            meeting_reference: None,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        };

        let value = serde_json::to_value(&appointment).unwrap();
        assert_eq!(value["startTime"], "10:00");
        assert_eq!(value["date"], "2025-12-01");
        assert_eq!(value["status"], "CONFIRMED");
        assert_eq!(value["type"], "IN_PERSON");
        assert_eq!(value["userId"], "user-1");
    }
}

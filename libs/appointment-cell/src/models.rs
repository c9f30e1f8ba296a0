// libs/appointment-cell/src/models.rs
use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use shared_models::AppError;

// ==============================================================================
// DEPARTMENT CATALOG
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Department {
    pub code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub static DEPARTMENTS: [Department; 6] = [
    Department {
        code: "D01",
        name: "Nội tổng hợp",
        description: "Khám tổng quát, điều trị các bệnh thông thường",
    },
    Department {
        code: "D02",
        name: "Răng hàm mặt",
        description: "Chăm sóc răng miệng, chỉnh nha, tiểu phẫu",
    },
    Department {
        code: "D03",
        name: "Tai mũi họng",
        description: "Khám, điều trị các bệnh lý về tai, mũi, họng",
    },
    Department {
        code: "D04",
        name: "Mắt",
        description: "Khám thị lực, điều trị cận thị, loạn thị",
    },
    Department {
        code: "D05",
        name: "Da liễu",
        description: "Điều trị mụn, viêm da, dị ứng, lão hóa",
    },
    Department {
        code: "D06",
        name: "Nhi khoa",
        description: "Khám trẻ em, tư vấn dinh dưỡng, tiêm chủng",
    },
];

/// Look up a catalog entry by its code, ignoring case and surrounding whitespace.
pub fn department_by_code(code: &str) -> Option<&'static Department> {
    let code = code.trim();
    DEPARTMENTS.iter().find(|d| d.code.eq_ignore_ascii_case(code))
}

/// Look up a catalog entry by its display name (case-insensitive).
pub fn department_by_name(name: &str) -> Option<&'static Department> {
    let name = name.trim().to_lowercase();
    DEPARTMENTS.iter().find(|d| d.name.to_lowercase() == name)
}

// ==============================================================================
// TIME SLOT
// ==============================================================================

/// A bookable time of day, rendered as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSlot(NaiveTime);

impl TimeSlot {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl FromStr for TimeSlot {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map(Self)
            .map_err(|_| AppointmentError::InvalidTime(s.to_string()))
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = AppointmentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeSlot> for String {
    fn from(slot: TimeSlot) -> Self {
        slot.to_string()
    }
}

// ==============================================================================
// APPOINTMENT RECORDS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub department: String,
    pub doctor: String,
    pub date: NaiveDate,
    pub time: TimeSlot,
    pub patient: String,
    #[serde(default)]
    pub notes: String,
}

impl Appointment {
    /// Build a record, rejecting blank identifying fields.
    pub fn new(
        department: impl Into<String>,
        doctor: impl Into<String>,
        date: NaiveDate,
        time: TimeSlot,
        patient: impl Into<String>,
        notes: impl Into<String>,
    ) -> Result<Self, AppointmentError> {
        let department = department.into().trim().to_string();
        let doctor = doctor.into().trim().to_string();
        let patient = patient.into().trim().to_string();

        if department.is_empty() {
            return Err(AppointmentError::ValidationError("department is required".into()));
        }
        if doctor.is_empty() {
            return Err(AppointmentError::ValidationError("doctor is required".into()));
        }
        if patient.is_empty() {
            return Err(AppointmentError::ValidationError("patient name is required".into()));
        }

        Ok(Self {
            department,
            doctor,
            date,
            time,
            patient,
            notes: notes.into().trim().to_string(),
        })
    }

    pub fn occupies(&self, department: &str, date: NaiveDate, time: TimeSlot) -> bool {
        self.department == department && self.date == date && self.time == time
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub department: String,
    pub doctor: String,
    pub date: NaiveDate,
    pub time: TimeSlot,
    pub patient: String,
    pub notes: String,
}

impl BookAppointmentRequest {
    pub fn into_appointment(self) -> Result<Appointment, AppointmentError> {
        Appointment::new(
            self.department,
            self.doctor,
            self.date,
            self.time,
            self.patient,
            self.notes,
        )
    }
}

/// Free slots per department name, in grid order.
pub type AvailableSlots = BTreeMap<String, Vec<TimeSlot>>;

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Invalid appointment time: {0}")]
    InvalidTime(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Appointment store error: {0}")]
    StoreIo(String),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::StoreIo(msg) => AppError::StoreIo(msg),
            other => AppError::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_department_codes_follow_pattern() {
        for (i, department) in DEPARTMENTS.iter().enumerate() {
            assert_eq!(department.code, format!("D0{}", i + 1));
            assert!(!department.description.is_empty());
        }
    }

    #[test]
    fn test_department_lookup() {
        assert_eq!(department_by_code("d04").map(|d| d.name), Some("Mắt"));
        assert_eq!(department_by_code(" D06 ").map(|d| d.name), Some("Nhi khoa"));
        assert!(department_by_code("D07").is_none());
        assert_eq!(department_by_name("da liễu").map(|d| d.code), Some("D05"));
    }

    #[test]
    fn test_time_slot_text_form() {
        let slot: TimeSlot = "09:30".parse().unwrap();
        assert_eq!(slot.to_string(), "09:30");
        assert_eq!(slot, TimeSlot::new(9, 30).unwrap());
        assert!("9h30".parse::<TimeSlot>().is_err());
        assert!("25:00".parse::<TimeSlot>().is_err());
    }

    #[test]
    fn test_appointment_rejects_blank_patient() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
        let time = TimeSlot::new(8, 0).unwrap();

        let err = Appointment::new("Mắt", "BS. Lan", date, time, "   ", "").unwrap_err();
        assert!(matches!(err, AppointmentError::ValidationError(_)));
    }

    #[test]
    fn test_appointment_without_notes_deserializes() {
        let json = r#"{"department":"Mắt","doctor":"BS. Lan","date":"2026-10-20",
            "time":"08:30","patient":"An"}"#;
        let appointment: Appointment = serde_json::from_str(json).unwrap();

        assert_eq!(appointment.notes, "");
        assert_eq!(appointment.time.to_string(), "08:30");
    }

    #[test]
    fn test_errors_map_to_app_error() {
        let err: AppError = AppointmentError::StoreIo("disk full".into()).into();
        assert_eq!(err, AppError::StoreIo("disk full".into()));

        let err: AppError = AppointmentError::InvalidTime("9h30".into()).into();
        assert!(matches!(err, AppError::Validation(_)));
    }
}

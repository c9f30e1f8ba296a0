// libs/booking-cell/src/models.rs
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use appointment_cell::models::{Appointment, BookAppointmentRequest, TimeSlot};
use shared_models::ChatMessage;

// ==============================================================================
// BOOKING SESSION
// ==============================================================================

/// Checkpoints of one booking attempt, in the order they are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingState {
    CollectPatient,
    CollectSymptoms,
    AnalyzeSymptoms,
    SelectDepartment,
    SelectDoctor,
    SelectDate,
    SelectSlot,
    CollectNotes,
    Confirm,
    Committed,
    Cancelled,
}

impl fmt::Display for BookingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Choices gathered so far in the active booking attempt. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookingSession {
    pub in_progress: bool,
    pub department: String,
    pub department_code: String,
    pub doctor: String,
    pub date: Option<NaiveDate>,
    pub time: Option<TimeSlot>,
    pub patient: String,
    pub symptoms: String,
    pub notes: String,
}

impl BookingSession {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The commit request, once a date and a slot have been chosen.
    pub fn to_request(&self) -> Option<BookAppointmentRequest> {
        Some(BookAppointmentRequest {
            department: self.department.clone(),
            doctor: self.doctor.clone(),
            date: self.date?,
            time: self.time?,
            patient: self.patient.clone(),
            notes: self.notes.clone(),
        })
    }
}

// ==============================================================================
// CONVERSATION CONTEXT
// ==============================================================================

/// Everything one interactive conversation carries between turns.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    pub session_id: Uuid,
    pub history: Vec<ChatMessage>,
    pub session: BookingSession,
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationContext {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            history: Vec::new(),
            session: BookingSession::default(),
        }
    }

    pub fn record_exchange(&mut self, user_text: impl Into<String>, reply: impl Into<String>) {
        self.history.push(ChatMessage::user(user_text));
        self.history.push(ChatMessage::assistant(reply));
    }
}

// ==============================================================================
// OUTCOMES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CancelReason {
    #[error("Đã hủy đặt lịch do không nhận được phản hồi.")]
    ChannelClosed,

    #[error("Đã hủy đặt lịch: thiếu họ tên bệnh nhân.")]
    MissingPatient,

    #[error("Mã khoa không hợp lệ: {0}. Đã hủy đặt lịch.")]
    InvalidDepartmentCode(String),

    #[error("Khoa {department} không còn giờ trống ngày {date}. Vui lòng đặt lại với ngày khác.")]
    NoFreeSlots { department: String, date: NaiveDate },

    #[error("Giờ khám không hợp lệ: {0}. Đã hủy đặt lịch.")]
    InvalidSlot(String),

    #[error("Đã hủy đặt lịch theo yêu cầu.")]
    Declined,

    #[error("Đặt lịch thất bại: khung giờ đã có người đặt.")]
    SlotTaken,

    #[error("Đặt lịch thất bại: thông tin lịch hẹn chưa đầy đủ.")]
    Incomplete,

    #[error("Đặt lịch thất bại: {0}")]
    StoreFailure(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BookingOutcome {
    Committed(Appointment),
    Cancelled(CancelReason),
}

impl BookingOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, BookingOutcome::Committed(_))
    }
}

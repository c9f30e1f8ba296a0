use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::fmt;

use shared_models::AppError;

// ==============================================================================
// SYMPTOM ANALYSIS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Accepts the English names and the Vietnamese labels the model answers with.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "low" | "thấp" => Some(Severity::Low),
            "medium" | "moderate" | "trung bình" => Some(Severity::Medium),
            "high" | "cao" => Some(Severity::High),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Low => "Thấp",
            Severity::Medium => "Trung bình",
            Severity::High => "Cao",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Departments suggested for a symptom description. `department_codes` and
/// `departments` are parallel lists; codes may be shorter when a suggestion
/// could not be mapped to the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymptomAnalysis {
    pub department_codes: Vec<String>,
    pub departments: Vec<String>,
    pub possible_conditions: Vec<String>,
    pub severity: Severity,
    pub recommendation: String,
}

impl SymptomAnalysis {
    pub fn has_suggestions(&self) -> bool {
        !self.departments.is_empty()
    }
}

// ==============================================================================
// INTENTS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    BookAppointment,
    CheckSlots,
    MyAppointments,
    DepartmentInfo,
    General,
}

impl Intent {
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label
            .trim()
            .trim_matches(|c: char| !c.is_ascii_alphabetic() && c != '_')
            .to_lowercase();
        match label.as_str() {
            "book_appointment" => Some(Intent::BookAppointment),
            "check_slots" => Some(Intent::CheckSlots),
            "my_appointments" => Some(Intent::MyAppointments),
            "department_info" => Some(Intent::DepartmentInfo),
            "general" => Some(Intent::General),
            _ => None,
        }
    }
}

// ==============================================================================
// CHAT
// ==============================================================================

/// Incrementally produced reply text, consumed in arrival order.
pub type ChatStream = BoxStream<'static, Result<String, AppError>>;

use serde::{Deserialize, Serialize};

use shared_models::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub experience: String,
    pub education: String,
    pub department_code: String,
}

impl Doctor {
    pub fn validate(&self) -> Result<(), DoctorError> {
        let required = [
            ("id", &self.id),
            ("name", &self.name),
            ("specialty", &self.specialty),
            ("department_code", &self.department_code),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DoctorError::ValidationError(format!("{} is required", field)));
            }
        }
        Ok(())
    }

    /// One-line label used when listing doctors to a patient.
    pub fn summary(&self) -> String {
        format!("{} - {} ({})", self.name, self.specialty, self.experience)
    }
}

/// Filters for a directory lookup; every field left as `None` matches all doctors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DoctorQuery {
    pub department_code: Option<String>,
    pub doctor_id: Option<String>,
    pub specialty: Option<String>,
}

impl DoctorQuery {
    pub fn for_department(code: impl Into<String>) -> Self {
        Self {
            department_code: Some(code.into()),
            ..Self::default()
        }
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            doctor_id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialty = Some(specialty.into());
        self
    }
}

// Error types specific to doctor operations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DoctorError {
    NotFound,
    InvalidDataset(String),
    ValidationError(String),
}

impl std::fmt::Display for DoctorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DoctorError::NotFound => write!(f, "Doctor not found"),
            DoctorError::InvalidDataset(msg) => write!(f, "Invalid doctor dataset: {}", msg),
            DoctorError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for DoctorError {}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => AppError::NotFound(err.to_string()),
            other => AppError::Collaborator(other.to_string()),
        }
    }
}

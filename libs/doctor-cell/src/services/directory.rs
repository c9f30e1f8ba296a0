// libs/doctor-cell/src/services/directory.rs
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

use shared_models::AppError;

use crate::models::{Doctor, DoctorError, DoctorQuery};

pub const MAX_LOOKUP_RESULTS: usize = 5;

const EMBEDDED_DOCTORS: &str = include_str!("../../data/doctors.json");

/// Source of doctor records for a department or specialty.
#[async_trait]
pub trait DoctorDirectory: Send + Sync {
    /// At most [`MAX_LOOKUP_RESULTS`] doctors matching every filter set on `query`.
    async fn lookup(&self, query: &DoctorQuery) -> Result<Vec<Doctor>, AppError>;
}

#[derive(Deserialize)]
struct DoctorDataset {
    doctors: Vec<Doctor>,
}

/// Directory backed by a fixed reference dataset held in memory.
#[derive(Debug, Clone)]
pub struct StaticDoctorDirectory {
    doctors: Vec<Doctor>,
}

impl StaticDoctorDirectory {
    /// The dataset compiled into the binary.
    pub fn embedded() -> Result<Self, DoctorError> {
        Self::from_json(EMBEDDED_DOCTORS)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DoctorError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DoctorError::InvalidDataset(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&contents)
    }

    /// Parse a `{"doctors": [...]}` document. Records missing required fields are skipped.
    pub fn from_json(json: &str) -> Result<Self, DoctorError> {
        let dataset: DoctorDataset =
            serde_json::from_str(json).map_err(|e| DoctorError::InvalidDataset(e.to_string()))?;

        let doctors = dataset
            .doctors
            .into_iter()
            .filter(|doctor| match doctor.validate() {
                Ok(()) => true,
                Err(e) => {
                    warn!("Skipping doctor record {:?}: {}", doctor.id, e);
                    false
                }
            })
            .collect::<Vec<_>>();

        debug!("Loaded {} doctors", doctors.len());
        Ok(Self { doctors })
    }

    pub fn len(&self) -> usize {
        self.doctors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doctors.is_empty()
    }

    pub fn find(&self, query: &DoctorQuery) -> Vec<Doctor> {
        let specialty = query.specialty.as_ref().map(|s| s.to_lowercase());

        self.doctors
            .iter()
            .filter(|d| {
                query
                    .department_code
                    .as_ref()
                    .map_or(true, |code| d.department_code.eq_ignore_ascii_case(code.trim()))
            })
            .filter(|d| query.doctor_id.as_ref().map_or(true, |id| d.id == *id))
            .filter(|d| {
                specialty
                    .as_ref()
                    .map_or(true, |s| d.specialty.to_lowercase().contains(s.as_str()))
            })
            .take(MAX_LOOKUP_RESULTS)
            .cloned()
            .collect()
    }

    pub fn get(&self, doctor_id: &str) -> Result<Doctor, DoctorError> {
        self.doctors
            .iter()
            .find(|d| d.id == doctor_id)
            .cloned()
            .ok_or(DoctorError::NotFound)
    }
}

#[async_trait]
impl DoctorDirectory for StaticDoctorDirectory {
    async fn lookup(&self, query: &DoctorQuery) -> Result<Vec<Doctor>, AppError> {
        debug!("Looking up doctors with {:?}", query);
        Ok(self.find(query))
    }
}

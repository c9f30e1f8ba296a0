// libs/appointment-cell/src/services/store.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::models::{
    department_by_code, Appointment, AppointmentError, AvailableSlots, BookAppointmentRequest,
    Department, TimeSlot, DEPARTMENTS,
};
use crate::services::slots::SlotGrid;

#[derive(Debug, Deserialize)]
struct StoreFile {
    #[serde(default)]
    appointments: Vec<Appointment>,
}

/// Flat JSON record of every booked appointment.
///
/// Each commit rewrites the whole file. There is no lock and no version check
/// against the file on disk, so two processes sharing one file resolve
/// overlapping commits as last-writer-wins.
pub struct AppointmentStore {
    path: PathBuf,
    appointments: Vec<Appointment>,
    slots: Vec<TimeSlot>,
}

impl AppointmentStore {
    /// Open the store at `path`. A missing file is created empty; a malformed
    /// file is logged and replaced in memory by an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut store = Self {
            path,
            appointments: Vec::new(),
            slots: SlotGrid::canonical_slots(),
        };

        match fs::read_to_string(&store.path) {
            Ok(contents) => match serde_json::from_str::<StoreFile>(&contents) {
                Ok(file) => {
                    info!(
                        "Loaded {} appointments from {}",
                        file.appointments.len(),
                        store.path.display()
                    );
                    store.appointments = file.appointments;
                }
                Err(e) => {
                    error!(
                        "Appointment file {} is malformed, starting with an EMPTY store; existing bookings are not visible and will be overwritten on the next commit: {}",
                        store.path.display(),
                        e
                    );
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No appointment file at {}, creating one", store.path.display());
                if let Err(e) = store.save() {
                    error!("Could not create appointment file: {}", e);
                }
            }
            Err(e) => {
                error!(
                    "Appointment file {} is unreadable, starting with an EMPTY store: {}",
                    store.path.display(),
                    e
                );
            }
        }

        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn departments(&self) -> &'static [Department] {
        &DEPARTMENTS
    }

    pub fn department_by_code(&self, code: &str) -> Option<&'static Department> {
        department_by_code(code)
    }

    /// Free slots on `date` per department.
    ///
    /// Without a filter the result covers every department that has ever been
    /// booked; a requested department is always included, with the full grid
    /// if it has no history.
    pub fn available_slots(&self, date: NaiveDate, department: Option<&str>) -> AvailableSlots {
        let booked: HashSet<(&str, TimeSlot)> = self
            .appointments
            .iter()
            .filter(|a| a.date == date && department.map_or(true, |d| a.department == d))
            .map(|a| (a.department.as_str(), a.time))
            .collect();

        let mut universe: BTreeSet<&str> = self
            .appointments
            .iter()
            .filter(|a| department.map_or(true, |d| a.department == d))
            .map(|a| a.department.as_str())
            .collect();
        if let Some(requested) = department {
            universe.insert(requested);
        }

        universe
            .into_iter()
            .map(|dept| {
                let free = self
                    .slots
                    .iter()
                    .filter(|slot| !booked.contains(&(dept, **slot)))
                    .copied()
                    .collect();
                (dept.to_string(), free)
            })
            .collect()
    }

    pub fn is_slot_free(&self, department: &str, date: NaiveDate, time: TimeSlot) -> bool {
        SlotGrid::contains(&time)
            && !self
                .appointments
                .iter()
                .any(|a| a.occupies(department, date, time))
    }

    /// Commit a booking. Availability is re-checked against the in-memory
    /// records within this call; `Ok(false)` means the slot is taken (or off the
    /// grid) and nothing changed. A failed write is rolled back in memory.
    pub fn add_appointment(
        &mut self,
        request: BookAppointmentRequest,
    ) -> Result<bool, AppointmentError> {
        let appointment = request.into_appointment()?;

        if !self.is_slot_free(&appointment.department, appointment.date, appointment.time) {
            warn!(
                "Slot {} {} for {} is not available",
                appointment.date, appointment.time, appointment.department
            );
            return Ok(false);
        }

        debug!(
            "Booking {} {} {} for patient {}",
            appointment.department, appointment.date, appointment.time, appointment.patient
        );
        self.appointments.push(appointment);

        if let Err(e) = self.save() {
            self.appointments.pop();
            error!("Failed to persist appointment, booking rolled back: {}", e);
            return Err(e);
        }

        info!("Appointment stored, {} total", self.appointments.len());
        Ok(true)
    }

    /// Every appointment whose patient name equals `name`, ignoring case.
    pub fn appointments_for_patient(&self, name: &str) -> Vec<Appointment> {
        let wanted = name.trim().to_lowercase();
        self.appointments
            .iter()
            .filter(|a| a.patient.to_lowercase() == wanted)
            .cloned()
            .collect()
    }

    // Write to a sibling temp file, then rename over the target.
    fn save(&self) -> Result<(), AppointmentError> {
        let io_err = |e: std::io::Error| {
            AppointmentError::StoreIo(format!("{}: {}", self.path.display(), e))
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(io_err)?;

        let body = serde_json::to_string_pretty(&StoreFileRef {
            appointments: &self.appointments,
        })
        .map_err(|e| AppointmentError::StoreIo(format!("serialization failed: {}", e)))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(body.as_bytes()).map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

#[derive(Serialize)]
struct StoreFileRef<'a> {
    appointments: &'a [Appointment],
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(department: &str, time: &str, patient: &str) -> BookAppointmentRequest {
        BookAppointmentRequest {
            department: department.to_string(),
            doctor: "BS. Minh".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
            time: time.parse().unwrap(),
            patient: patient.to_string(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_off_grid_time_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AppointmentStore::load(dir.path().join("appointments.json"));

        assert!(!store.add_appointment(request("Mắt", "16:30", "An")).unwrap());
        assert!(!store.add_appointment(request("Mắt", "09:15", "An")).unwrap());
        assert!(store.appointments().is_empty());
    }

    #[test]
    fn test_blank_patient_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AppointmentStore::load(dir.path().join("appointments.json"));

        let err = store.add_appointment(request("Mắt", "09:00", " ")).unwrap_err();
        assert!(matches!(err, AppointmentError::ValidationError(_)));
    }

    #[test]
    fn test_write_failure_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appointments.json");
        let mut store = AppointmentStore::load(&path);

        // A directory where the file should be makes the rename fail.
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        let result = store.add_appointment(request("Mắt", "09:00", "An"));
        assert!(matches!(result, Err(AppointmentError::StoreIo(_))));
        assert!(store.appointments().is_empty());
    }
}

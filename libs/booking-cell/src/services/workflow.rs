// libs/booking-cell/src/services/workflow.rs
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

use appointment_cell::models::{department_by_code, Appointment, TimeSlot, DEPARTMENTS};
use appointment_cell::services::{AppointmentStore, DateResolver};
use assistant_cell::services::SymptomAnalyzer;
use doctor_cell::models::{Doctor, DoctorQuery};
use doctor_cell::services::DoctorDirectory;
use shared_models::AppError;

use crate::models::{
    BookingOutcome, BookingSession, BookingState, CancelReason, ConversationContext,
};

const YES_ANSWERS: &[&str] = &["y", "yes", "có", "co", "c", "ok", "đồng ý"];

/// The patient side of a booking conversation.
#[async_trait]
pub trait PatientChannel: Send {
    /// Show `prompt` and wait for the patient's answer. An error means the
    /// patient can no longer be reached.
    async fn ask(&mut self, prompt: &str) -> Result<String, AppError>;

    fn notify(&mut self, message: &str);
}

/// Walks a patient through one booking attempt and commits at most one
/// appointment.
pub struct BookingWorkflow {
    symptom_analyzer: Arc<dyn SymptomAnalyzer>,
    doctor_directory: Arc<dyn DoctorDirectory>,
    date_resolver: DateResolver,
    reference_date: Option<NaiveDate>,
}

impl BookingWorkflow {
    pub fn new(
        symptom_analyzer: Arc<dyn SymptomAnalyzer>,
        doctor_directory: Arc<dyn DoctorDirectory>,
    ) -> Self {
        Self {
            symptom_analyzer,
            doctor_directory,
            date_resolver: DateResolver::new(),
            reference_date: None,
        }
    }

    /// Pin "today" instead of reading the local clock.
    pub fn with_reference_date(mut self, reference_date: NaiveDate) -> Self {
        self.reference_date = Some(reference_date);
        self
    }

    fn reference_date(&self) -> NaiveDate {
        self.reference_date.unwrap_or_else(DateResolver::today)
    }

    /// Run the whole booking conversation. The session in `ctx` is empty again
    /// when this returns, whatever the outcome.
    pub async fn run(
        &self,
        ctx: &mut ConversationContext,
        store: &mut AppointmentStore,
        channel: &mut dyn PatientChannel,
    ) -> BookingOutcome {
        let span = info_span!("booking", session_id = %ctx.session_id);

        async {
            ctx.session.reset();
            ctx.session.in_progress = true;
            info!("Booking started");

            let result = match self.collect(ctx, store, channel).await {
                Ok(()) => self.confirm(ctx, channel).await,
                Err(reason) => Err(reason),
            };

            match result {
                Ok(()) => self.commit(ctx, store, channel),
                Err(reason) => Self::cancel(ctx, channel, reason),
            }
        }
        .instrument(span)
        .await
    }

    /// Commit the session as it stands. Availability is re-checked by the
    /// store; a slot taken in the meantime cancels without retrying.
    pub fn commit(
        &self,
        ctx: &mut ConversationContext,
        store: &mut AppointmentStore,
        channel: &mut dyn PatientChannel,
    ) -> BookingOutcome {
        let Some(request) = ctx.session.to_request() else {
            return Self::cancel(ctx, channel, CancelReason::Incomplete);
        };

        let appointment = match request.clone().into_appointment() {
            Ok(appointment) => appointment,
            Err(e) => return Self::cancel(ctx, channel, CancelReason::StoreFailure(e.to_string())),
        };

        match store.add_appointment(request) {
            Ok(true) => {
                Self::enter(BookingState::Committed);
                info!(
                    "Booking committed: {} {} {}",
                    appointment.department, appointment.date, appointment.time
                );
                channel.notify(&format!(
                    "✅ Đặt lịch thành công!\n{}",
                    Self::summary(&appointment)
                ));
                ctx.session.reset();
                BookingOutcome::Committed(appointment)
            }
            Ok(false) => Self::cancel(ctx, channel, CancelReason::SlotTaken),
            Err(e) => Self::cancel(ctx, channel, CancelReason::StoreFailure(e.to_string())),
        }
    }

    fn cancel(
        ctx: &mut ConversationContext,
        channel: &mut dyn PatientChannel,
        reason: CancelReason,
    ) -> BookingOutcome {
        Self::enter(BookingState::Cancelled);
        warn!("Booking cancelled: {:?}", reason);
        if reason != CancelReason::ChannelClosed {
            channel.notify(&format!("❌ {}", reason));
        }
        ctx.session.reset();
        BookingOutcome::Cancelled(reason)
    }

    async fn ask(channel: &mut dyn PatientChannel, prompt: &str) -> Result<String, CancelReason> {
        channel.ask(prompt).await.map(|answer| answer.trim().to_string()).map_err(|e| {
            debug!("Patient channel closed: {}", e);
            CancelReason::ChannelClosed
        })
    }

    fn enter(state: BookingState) {
        debug!("Booking state: {}", state);
    }

    async fn collect(
        &self,
        ctx: &mut ConversationContext,
        store: &AppointmentStore,
        channel: &mut dyn PatientChannel,
    ) -> Result<(), CancelReason> {
        Self::enter(BookingState::CollectPatient);
        let patient = Self::ask(channel, "Họ tên bệnh nhân:").await?;
        if patient.is_empty() {
            return Err(CancelReason::MissingPatient);
        }
        ctx.session.patient = patient;

        Self::enter(BookingState::CollectSymptoms);
        ctx.session.symptoms = Self::ask(channel, "Mô tả triệu chứng của bạn:").await?;

        self.select_department(ctx, channel).await?;
        self.select_doctor(ctx, channel).await?;

        Self::enter(BookingState::SelectDate);
        let reference = self.reference_date();
        let expression = Self::ask(
            channel,
            "Ngày khám mong muốn (VD: ngày mai, 2026-10-20, thứ hai tuần sau):",
        )
        .await?;
        let mut date = self.date_resolver.resolve(&expression, reference);
        if !DateResolver::is_valid(date, reference) {
            date = reference.checked_add_days(Days::new(1)).unwrap_or(reference);
        }
        debug!("Resolved '{}' to {}", expression, date);
        ctx.session.date = Some(date);

        Self::enter(BookingState::SelectSlot);
        let department = ctx.session.department.clone();
        let free = store
            .available_slots(date, Some(&department))
            .remove(&department)
            .unwrap_or_default();
        if free.is_empty() {
            return Err(CancelReason::NoFreeSlots { department, date });
        }
        channel.notify(&format!(
            "Giờ trống ngày {}:\n{}",
            DateResolver::format_with_weekday(&date.to_string()),
            numbered(free.iter().map(TimeSlot::to_string))
        ));
        let answer = Self::ask(channel, "Chọn giờ khám (HH:MM hoặc số thứ tự):").await?;
        let slot = pick_slot(&answer, &free).ok_or(CancelReason::InvalidSlot(answer))?;
        ctx.session.time = Some(slot);

        Self::enter(BookingState::CollectNotes);
        ctx.session.notes = Self::ask(channel, "Ghi chú thêm (có thể để trống):").await?;

        Ok(())
    }

    async fn select_department(
        &self,
        ctx: &mut ConversationContext,
        channel: &mut dyn PatientChannel,
    ) -> Result<(), CancelReason> {
        Self::enter(BookingState::AnalyzeSymptoms);
        let analysis = match self.symptom_analyzer.analyze(&ctx.session.symptoms).await {
            Ok(analysis) if analysis.has_suggestions() => Some(analysis),
            Ok(_) => {
                debug!("No department suggestions for the symptoms");
                None
            }
            Err(e) => {
                e.log();
                warn!("Symptom analysis failed, falling back to manual selection");
                None
            }
        };

        Self::enter(BookingState::SelectDepartment);
        match analysis {
            Some(analysis) => {
                let mut message = format!(
                    "Mức độ: {}\n{}\nKhoa được gợi ý:\n{}",
                    analysis.severity,
                    analysis.recommendation,
                    numbered(analysis.departments.iter().cloned())
                );
                if !analysis.possible_conditions.is_empty() {
                    message.push_str(&format!(
                        "\nBệnh lý có thể gặp: {}",
                        analysis.possible_conditions.join(", ")
                    ));
                }
                channel.notify(&message);

                let answer = Self::ask(
                    channel,
                    &format!("Chọn khoa (1-{}):", analysis.departments.len()),
                )
                .await?;
                let index = pick_index(&answer, analysis.departments.len());
                ctx.session.department = analysis.departments[index].clone();
                ctx.session.department_code = analysis
                    .department_codes
                    .get(index)
                    .cloned()
                    .unwrap_or_else(|| format!("D0{}", index + 1));
            }
            None => {
                let catalog = DEPARTMENTS
                    .iter()
                    .map(|d| format!("{} - {}: {}", d.code, d.name, d.description))
                    .collect::<Vec<_>>()
                    .join("\n");
                channel.notify(&format!("Danh sách chuyên khoa:\n{}", catalog));

                let code = Self::ask(channel, "Nhập mã khoa (VD: D01):").await?;
                let department = department_by_code(&code)
                    .ok_or(CancelReason::InvalidDepartmentCode(code))?;
                ctx.session.department = department.name.to_string();
                ctx.session.department_code = department.code.to_string();
            }
        }

        info!(
            "Department selected: {} ({})",
            ctx.session.department, ctx.session.department_code
        );
        Ok(())
    }

    async fn select_doctor(
        &self,
        ctx: &mut ConversationContext,
        channel: &mut dyn PatientChannel,
    ) -> Result<(), CancelReason> {
        Self::enter(BookingState::SelectDoctor);
        let query = DoctorQuery::for_department(ctx.session.department_code.clone());
        let doctors: Vec<Doctor> = match self.doctor_directory.lookup(&query).await {
            Ok(doctors) => doctors.into_iter().filter(|d| !d.name.trim().is_empty()).collect(),
            Err(e) => {
                e.log();
                warn!("Doctor lookup failed, using placeholder");
                Vec::new()
            }
        };

        if doctors.is_empty() {
            ctx.session.doctor = format!("Bác sĩ khoa {}", ctx.session.department);
            channel.notify(&format!(
                "Chưa có thông tin bác sĩ, lịch hẹn sẽ được xếp với {}.",
                ctx.session.doctor
            ));
            return Ok(());
        }

        channel.notify(&format!(
            "Bác sĩ khoa {}:\n{}",
            ctx.session.department,
            numbered(doctors.iter().map(|d| d.summary()))
        ));
        let answer = Self::ask(channel, &format!("Chọn bác sĩ (1-{}):", doctors.len())).await?;
        ctx.session.doctor = doctors[pick_index(&answer, doctors.len())].name.clone();
        Ok(())
    }

    async fn confirm(
        &self,
        ctx: &mut ConversationContext,
        channel: &mut dyn PatientChannel,
    ) -> Result<(), CancelReason> {
        Self::enter(BookingState::Confirm);
        let appointment = pending_appointment(&ctx.session)?;
        channel.notify(&format!("Thông tin lịch hẹn:\n{}", Self::summary(&appointment)));

        let answer = Self::ask(channel, "Xác nhận đặt lịch? (có/không):").await?;
        if is_yes(&answer) {
            Ok(())
        } else {
            Err(CancelReason::Declined)
        }
    }

    fn summary(appointment: &Appointment) -> String {
        let mut lines = vec![
            format!("Bệnh nhân: {}", appointment.patient),
            format!("Khoa: {}", appointment.department),
            format!("Bác sĩ: {}", appointment.doctor),
            format!(
                "Thời gian: {} lúc {}",
                DateResolver::format_with_weekday(&appointment.date.to_string()),
                appointment.time
            ),
        ];
        if !appointment.notes.is_empty() {
            lines.push(format!("Ghi chú: {}", appointment.notes));
        }
        lines.join("\n")
    }
}

/// The record a confirmed session would commit, validated the same way the store does.
fn pending_appointment(session: &BookingSession) -> Result<Appointment, CancelReason> {
    let request = session.to_request().ok_or(CancelReason::Incomplete)?;
    request.into_appointment().map_err(|e| {
        debug!("Session does not form a valid appointment: {}", e);
        CancelReason::Incomplete
    })
}

fn numbered(items: impl Iterator<Item = String>) -> String {
    items
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Zero-based index for a 1-based answer; anything out of range picks the first option.
fn pick_index(answer: &str, len: usize) -> usize {
    match answer.trim().parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => n - 1,
        _ => 0,
    }
}

fn pick_slot(answer: &str, free: &[TimeSlot]) -> Option<TimeSlot> {
    if let Ok(slot) = answer.parse::<TimeSlot>() {
        return free.contains(&slot).then_some(slot);
    }
    match answer.parse::<usize>() {
        Ok(n) if (1..=free.len()).contains(&n) => Some(free[n - 1]),
        _ => None,
    }
}

fn is_yes(answer: &str) -> bool {
    YES_ANSWERS.contains(&answer.trim().to_lowercase().as_str())
}

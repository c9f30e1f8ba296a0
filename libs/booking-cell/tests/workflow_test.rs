// libs/booking-cell/tests/workflow_test.rs
use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::NaiveDate;
use mockall::mock;
use std::collections::VecDeque;
use std::sync::Arc;
use tempfile::TempDir;

use appointment_cell::models::{BookAppointmentRequest, TimeSlot};
use appointment_cell::services::{AppointmentStore, SlotGrid};
use assistant_cell::models::{Severity, SymptomAnalysis};
use assistant_cell::services::SymptomAnalyzer;
use booking_cell::models::{BookingOutcome, BookingSession, CancelReason, ConversationContext};
use booking_cell::services::{BookingWorkflow, PatientChannel};
use doctor_cell::models::{Doctor, DoctorQuery};
use doctor_cell::services::DoctorDirectory;
use shared_models::AppError;

// ==============================================================================
// TEST FIXTURES AND UTILITIES
// ==============================================================================

mock! {
    pub Analyzer {}

    #[async_trait]
    impl SymptomAnalyzer for Analyzer {
        async fn analyze(&self, symptoms: &str) -> Result<SymptomAnalysis, AppError>;
    }
}

mock! {
    pub Directory {}

    #[async_trait]
    impl DoctorDirectory for Directory {
        async fn lookup(&self, query: &DoctorQuery) -> Result<Vec<Doctor>, AppError>;
    }
}

/// Answers prompts from a fixed script; running out of answers closes the channel.
#[derive(Default)]
struct ScriptedChannel {
    answers: VecDeque<String>,
    prompts: Vec<String>,
    notices: Vec<String>,
}

impl ScriptedChannel {
    fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            ..Self::default()
        }
    }

    fn noticed(&self, text: &str) -> bool {
        self.notices.iter().any(|n| n.contains(text))
    }
}

#[async_trait]
impl PatientChannel for ScriptedChannel {
    async fn ask(&mut self, prompt: &str) -> Result<String, AppError> {
        self.prompts.push(prompt.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| AppError::Internal("input closed".into()))
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}

fn today() -> NaiveDate {
    // A Saturday
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

fn tomorrow() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

fn slot(text: &str) -> TimeSlot {
    text.parse().unwrap()
}

fn suggestion(codes: &[&str], names: &[&str]) -> SymptomAnalysis {
    SymptomAnalysis {
        department_codes: codes.iter().map(|c| c.to_string()).collect(),
        departments: names.iter().map(|n| n.to_string()).collect(),
        possible_conditions: vec!["Viêm kết mạc".to_string()],
        severity: Severity::Low,
        recommendation: "Nên đi khám sớm".to_string(),
    }
}

fn doctor(id: &str, name: &str, department_code: &str) -> Doctor {
    Doctor {
        id: id.to_string(),
        name: name.to_string(),
        specialty: "Nhãn khoa".to_string(),
        experience: "10 năm".to_string(),
        education: "Đại học Y Hà Nội".to_string(),
        department_code: department_code.to_string(),
    }
}

fn analyzer_returning(analysis: SymptomAnalysis) -> MockAnalyzer {
    let mut analyzer = MockAnalyzer::new();
    analyzer
        .expect_analyze()
        .returning(move |_| Ok(analysis.clone()));
    analyzer
}

fn directory_returning(doctors: Vec<Doctor>) -> MockDirectory {
    let mut directory = MockDirectory::new();
    directory
        .expect_lookup()
        .returning(move |_| Ok(doctors.clone()));
    directory
}

fn workflow(analyzer: MockAnalyzer, directory: MockDirectory) -> BookingWorkflow {
    BookingWorkflow::new(Arc::new(analyzer), Arc::new(directory)).with_reference_date(today())
}

fn temp_store() -> (TempDir, AppointmentStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = AppointmentStore::load(dir.path().join("appointments.json"));
    (dir, store)
}

fn book(store: &mut AppointmentStore, department: &str, date: NaiveDate, time: TimeSlot) {
    let booked = store
        .add_appointment(BookAppointmentRequest {
            department: department.to_string(),
            doctor: "BS. Khác".to_string(),
            date,
            time,
            patient: "Bệnh nhân khác".to_string(),
            notes: String::new(),
        })
        .unwrap();
    assert!(booked);
}

// ==============================================================================
// COMMITTED PATHS
// ==============================================================================

#[tokio::test]
async fn test_suggested_department_books_appointment() {
    let (dir, mut store) = temp_store();
    let workflow = workflow(
        analyzer_returning(suggestion(&["D04"], &["Mắt"])),
        directory_returning(vec![
            doctor("BS007", "BS. Trần Thị Lan", "D04"),
            doctor("BS008", "BS. Lê Minh Tuấn", "D04"),
        ]),
    );
    let mut ctx = ConversationContext::new();
    let mut channel = ScriptedChannel::new(&[
        "Nguyễn Văn An",
        "Mắt đỏ và ngứa",
        "1",
        "2",
        "ngày mai",
        "09:30",
        "Dị ứng phấn hoa",
        "có",
    ]);

    let outcome = workflow.run(&mut ctx, &mut store, &mut channel).await;

    let appointment = assert_matches!(outcome, BookingOutcome::Committed(a) => a);
    assert_eq!(appointment.patient, "Nguyễn Văn An");
    assert_eq!(appointment.department, "Mắt");
    assert_eq!(appointment.doctor, "BS. Lê Minh Tuấn");
    assert_eq!(appointment.date, tomorrow());
    assert_eq!(appointment.time, slot("09:30"));
    assert_eq!(appointment.notes, "Dị ứng phấn hoa");

    assert!(ctx.session.is_empty());
    assert!(channel.noticed("Đặt lịch thành công"));
    assert_eq!(store.appointments(), &[appointment.clone()]);

    let reloaded = AppointmentStore::load(dir.path().join("appointments.json"));
    assert_eq!(reloaded.appointments(), &[appointment]);
}

#[tokio::test]
async fn test_analyzer_failure_falls_back_to_manual_code() {
    let (_dir, mut store) = temp_store();
    let mut analyzer = MockAnalyzer::new();
    analyzer
        .expect_analyze()
        .returning(|_| Err(AppError::Collaborator("model unavailable".into())));
    let workflow = workflow(analyzer, directory_returning(vec![]));
    let mut ctx = ConversationContext::new();
    let mut channel = ScriptedChannel::new(&["An", "đau răng", "d02", "2026-10-20", "1", "", "y"]);

    let outcome = workflow.run(&mut ctx, &mut store, &mut channel).await;

    let appointment = assert_matches!(outcome, BookingOutcome::Committed(a) => a);
    assert_eq!(appointment.department, "Răng hàm mặt");
    // No doctors listed for the department: placeholder label instead of aborting
    assert_eq!(appointment.doctor, "Bác sĩ khoa Răng hàm mặt");
    assert_eq!(appointment.date, NaiveDate::from_ymd_opt(2026, 10, 20).unwrap());
    assert_eq!(appointment.time, slot("08:00"));
    assert!(channel.noticed("D01 - Nội tổng hợp"));
}

#[tokio::test]
async fn test_missing_codes_are_synthesized_by_position() {
    let (_dir, mut store) = temp_store();
    let mut directory = MockDirectory::new();
    directory
        .expect_lookup()
        .withf(|query| query.department_code.as_deref() == Some("D02"))
        .times(1)
        .returning(|_| Ok(vec![doctor("BS004", "BS. Phạm Hùng", "D02")]));
    let workflow = workflow(
        analyzer_returning(suggestion(&["D01"], &["Nội tổng hợp", "Răng hàm mặt"])),
        directory,
    );
    let mut ctx = ConversationContext::new();
    let mut channel = ScriptedChannel::new(&[
        "An", "đau đầu, đau răng", "2", "1", "ngày mai", "1", "", "ok",
    ]);

    let outcome = workflow.run(&mut ctx, &mut store, &mut channel).await;

    let appointment = assert_matches!(outcome, BookingOutcome::Committed(a) => a);
    assert_eq!(appointment.department, "Răng hàm mặt");
    assert_eq!(appointment.doctor, "BS. Phạm Hùng");
}

#[tokio::test]
async fn test_out_of_range_choices_pick_first_option() {
    let (_dir, mut store) = temp_store();
    let workflow = workflow(
        analyzer_returning(suggestion(&["D03", "D01"], &["Tai mũi họng", "Nội tổng hợp"])),
        directory_returning(vec![
            doctor("BS005", "BS. Võ Thanh Hà", "D03"),
            doctor("BS006", "BS. Đỗ Quang", "D03"),
        ]),
    );
    let mut ctx = ConversationContext::new();
    let mut channel = ScriptedChannel::new(&[
        "An", "ho", "9", "không biết", "ngày mai", "2", "", "yes",
    ]);

    let outcome = workflow.run(&mut ctx, &mut store, &mut channel).await;

    let appointment = assert_matches!(outcome, BookingOutcome::Committed(a) => a);
    assert_eq!(appointment.department, "Tai mũi họng");
    assert_eq!(appointment.doctor, "BS. Võ Thanh Hà");
    assert_eq!(appointment.time, slot("08:30"));
}

#[tokio::test]
async fn test_unrecognized_and_past_dates_never_abort() {
    let cases = [
        ("khi nào cũng được", tomorrow()),
        ("2026-01-01", today()),
    ];

    for (expression, expected) in cases {
        let (_dir, mut store) = temp_store();
        let workflow = workflow(
            analyzer_returning(suggestion(&["D05"], &["Da liễu"])),
            directory_returning(vec![]),
        );
        let mut ctx = ConversationContext::new();
        let mut channel = ScriptedChannel::new(&["An", "nổi mẩn", "1", expression, "1", "", "có"]);

        let outcome = workflow.run(&mut ctx, &mut store, &mut channel).await;

        let appointment = assert_matches!(outcome, BookingOutcome::Committed(a) => a);
        assert_eq!(appointment.date, expected, "{expression}");
    }
}

// ==============================================================================
// CANCELLED PATHS
// ==============================================================================

#[tokio::test]
async fn test_invalid_manual_code_cancels_without_reprompt() {
    let (_dir, mut store) = temp_store();
    let mut directory = MockDirectory::new();
    directory.expect_lookup().never();
    let workflow = workflow(analyzer_returning(suggestion(&[], &[])), directory);
    let mut ctx = ConversationContext::new();
    let mut channel = ScriptedChannel::new(&["An", "mệt", "D09", "D01"]);

    let outcome = workflow.run(&mut ctx, &mut store, &mut channel).await;

    assert_eq!(
        outcome,
        BookingOutcome::Cancelled(CancelReason::InvalidDepartmentCode("D09".into()))
    );
    assert_eq!(channel.prompts.len(), 3);
    assert!(ctx.session.is_empty());
    assert!(store.appointments().is_empty());
}

#[tokio::test]
async fn test_fully_booked_day_cancels() {
    let (_dir, mut store) = temp_store();
    for time in SlotGrid::canonical_slots() {
        book(&mut store, "Mắt", tomorrow(), time);
    }
    let workflow = workflow(
        analyzer_returning(suggestion(&["D04"], &["Mắt"])),
        directory_returning(vec![doctor("BS007", "BS. Trần Thị Lan", "D04")]),
    );
    let mut ctx = ConversationContext::new();
    let mut channel = ScriptedChannel::new(&[
        "An", "mờ mắt", "1", "1", "ngày mai", "09:00", "", "có",
    ]);

    let outcome = workflow.run(&mut ctx, &mut store, &mut channel).await;

    assert_matches!(
        outcome,
        BookingOutcome::Cancelled(CancelReason::NoFreeSlots { ref department, date })
            if department == "Mắt" && date == tomorrow()
    );
    assert_eq!(store.appointments().len(), 17);
    assert!(ctx.session.is_empty());
}

#[tokio::test]
async fn test_unknown_slot_answer_cancels() {
    let (_dir, mut store) = temp_store();
    book(&mut store, "Mắt", tomorrow(), slot("09:00"));
    let workflow = workflow(
        analyzer_returning(suggestion(&["D04"], &["Mắt"])),
        directory_returning(vec![]),
    );
    let mut ctx = ConversationContext::new();
    let mut channel = ScriptedChannel::new(&["An", "mờ mắt", "1", "ngày mai", "09:00"]);

    let outcome = workflow.run(&mut ctx, &mut store, &mut channel).await;

    assert_eq!(outcome, BookingOutcome::Cancelled(CancelReason::InvalidSlot("09:00".into())));
    assert_eq!(store.appointments().len(), 1);
}

#[tokio::test]
async fn test_declining_confirmation_leaves_store_untouched() {
    let (dir, mut store) = temp_store();
    let workflow = workflow(
        analyzer_returning(suggestion(&["D06"], &["Nhi khoa"])),
        directory_returning(vec![]),
    );
    let mut ctx = ConversationContext::new();
    let mut channel = ScriptedChannel::new(&[
        "Bé Na", "bé bị sốt", "1", "ngày mai", "10:00", "", "không",
    ]);

    let outcome = workflow.run(&mut ctx, &mut store, &mut channel).await;

    assert_eq!(outcome, BookingOutcome::Cancelled(CancelReason::Declined));
    assert!(ctx.session.is_empty());
    assert!(store.appointments().is_empty());
    assert!(AppointmentStore::load(dir.path().join("appointments.json"))
        .appointments()
        .is_empty());
}

#[tokio::test]
async fn test_slot_taken_before_commit_is_reported() {
    let (_dir, mut store) = temp_store();
    book(&mut store, "Mắt", tomorrow(), slot("09:30"));
    let workflow = workflow(MockAnalyzer::new(), MockDirectory::new());
    let mut ctx = ConversationContext::new();
    ctx.session = BookingSession {
        in_progress: true,
        department: "Mắt".into(),
        department_code: "D04".into(),
        doctor: "BS. Trần Thị Lan".into(),
        date: Some(tomorrow()),
        time: Some(slot("09:30")),
        patient: "An".into(),
        symptoms: "mờ mắt".into(),
        notes: String::new(),
    };
    let mut channel = ScriptedChannel::default();

    let outcome = workflow.commit(&mut ctx, &mut store, &mut channel);

    assert_eq!(outcome, BookingOutcome::Cancelled(CancelReason::SlotTaken));
    assert!(channel.noticed("khung giờ đã có người đặt"));
    assert!(ctx.session.is_empty());
    assert_eq!(store.appointments().len(), 1);
}

#[tokio::test]
async fn test_closed_channel_and_blank_name_cancel() {
    let (_dir, mut store) = temp_store();
    let workflow = workflow(MockAnalyzer::new(), MockDirectory::new());
    let mut ctx = ConversationContext::new();

    let mut blank = ScriptedChannel::new(&["   "]);
    let outcome = workflow.run(&mut ctx, &mut store, &mut blank).await;
    assert_eq!(outcome, BookingOutcome::Cancelled(CancelReason::MissingPatient));

    let mut closed = ScriptedChannel::new(&[]);
    let outcome = workflow.run(&mut ctx, &mut store, &mut closed).await;
    assert_eq!(outcome, BookingOutcome::Cancelled(CancelReason::ChannelClosed));
    assert!(closed.notices.is_empty());
    assert!(ctx.session.is_empty());
}

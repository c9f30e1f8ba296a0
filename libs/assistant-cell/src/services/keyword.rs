// libs/assistant-cell/src/services/keyword.rs
use async_trait::async_trait;
use tracing::debug;

use appointment_cell::models::department_by_code;
use shared_models::AppError;

use crate::models::{Intent, Severity, SymptomAnalysis};
use crate::services::collaborators::{IntentClassifier, SymptomAnalyzer};

struct DepartmentRule {
    code: &'static str,
    keywords: &'static [&'static str],
    condition: &'static str,
}

const DEPARTMENT_RULES: &[DepartmentRule] = &[
    DepartmentRule {
        code: "D02",
        keywords: &["răng", "nướu", "lợi", "hàm", "sâu răng", "tooth", "teeth", "toothache", "gum"],
        condition: "Bệnh lý răng miệng",
    },
    DepartmentRule {
        code: "D03",
        keywords: &[
            "tai", "mũi", "họng", "ho", "viêm họng", "nghẹt mũi", "sổ mũi", "ù tai", "ear", "nose",
            "throat", "cough",
        ],
        condition: "Viêm đường hô hấp trên",
    },
    DepartmentRule {
        code: "D04",
        keywords: &["mắt", "nhìn mờ", "cận thị", "đỏ mắt", "eye", "eyes", "vision", "blurry"],
        condition: "Tật khúc xạ hoặc viêm kết mạc",
    },
    DepartmentRule {
        code: "D05",
        keywords: &[
            "da", "mụn", "ngứa", "phát ban", "nổi mẩn", "dị ứng", "skin", "rash", "acne", "itchy",
        ],
        condition: "Viêm da hoặc dị ứng",
    },
    DepartmentRule {
        code: "D06",
        keywords: &["trẻ", "bé", "con tôi", "trẻ em", "em bé", "child", "baby", "kid"],
        condition: "Bệnh lý nhi khoa",
    },
    DepartmentRule {
        code: "D01",
        keywords: &[
            "sốt", "đau đầu", "mệt", "đau bụng", "tiêu chảy", "cảm", "fever", "headache", "tired",
            "stomach",
        ],
        condition: "Cảm cúm hoặc rối loạn tiêu hóa",
    },
];

const URGENT_KEYWORDS: &[&str] = &[
    "khó thở",
    "đau ngực",
    "bất tỉnh",
    "co giật",
    "chest pain",
    "can't breathe",
    "unconscious",
];
const FEVER_KEYWORDS: &[&str] = &["sốt", "sốt cao", "fever"];

/// Pads a lowercase, punctuation-free copy of `text` with spaces so phrases can
/// be matched on word boundaries.
fn word_padded(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '\'' { c } else { ' ' })
        .collect();
    format!(" {} ", cleaned.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn contains_phrase(padded: &str, phrase: &str) -> bool {
    padded.contains(&format!(" {} ", phrase))
}

/// Rule-based department suggestions used when no model is available.
#[derive(Debug, Default, Clone)]
pub struct KeywordSymptomAnalyzer;

impl KeywordSymptomAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze_text(&self, symptoms: &str) -> SymptomAnalysis {
        let padded = word_padded(symptoms);

        let matched: Vec<&DepartmentRule> = DEPARTMENT_RULES
            .iter()
            .filter(|rule| rule.keywords.iter().any(|kw| contains_phrase(&padded, kw)))
            .collect();

        let severity = if URGENT_KEYWORDS.iter().any(|kw| contains_phrase(&padded, kw)) {
            Severity::High
        } else if matched.len() > 1
            || FEVER_KEYWORDS.iter().any(|kw| contains_phrase(&padded, kw))
        {
            Severity::Medium
        } else {
            Severity::Low
        };

        let recommendation = match severity {
            Severity::High => {
                "Triệu chứng có thể nghiêm trọng, hãy đến cơ sở cấp cứu gần nhất ngay."
            }
            Severity::Medium => "Bạn nên đặt lịch khám trong vài ngày tới.",
            Severity::Low => "Bạn có thể đặt lịch khám vào thời gian thuận tiện.",
        }
        .to_string();

        let departments = matched
            .iter()
            .filter_map(|rule| department_by_code(rule.code))
            .collect::<Vec<_>>();
        debug!("Keyword analysis matched {} departments", departments.len());

        SymptomAnalysis {
            department_codes: departments.iter().map(|d| d.code.to_string()).collect(),
            departments: departments.iter().map(|d| d.name.to_string()).collect(),
            possible_conditions: matched.iter().map(|rule| rule.condition.to_string()).collect(),
            severity,
            recommendation,
        }
    }
}

#[async_trait]
impl SymptomAnalyzer for KeywordSymptomAnalyzer {
    async fn analyze(&self, symptoms: &str) -> Result<SymptomAnalysis, AppError> {
        Ok(self.analyze_text(symptoms))
    }
}

const INTENT_RULES: &[(Intent, &[&str])] = &[
    (
        Intent::MyAppointments,
        &["lịch hẹn của tôi", "xem lịch hẹn", "lịch đã đặt", "my appointment", "my appointments"],
    ),
    (
        Intent::CheckSlots,
        &["lịch trống", "còn trống", "giờ trống", "slot", "slots", "available", "availability"],
    ),
    (
        Intent::BookAppointment,
        &[
            "đặt lịch",
            "đặt hẹn",
            "hẹn khám",
            "đăng ký khám",
            "muốn khám",
            "book",
            "booking",
            "appointment",
            "schedule",
        ],
    ),
    (
        Intent::DepartmentInfo,
        &["khoa nào", "chuyên khoa", "các khoa", "department", "departments"],
    ),
];

/// First-match keyword rules over the patient's message.
#[derive(Debug, Default, Clone)]
pub struct KeywordIntentClassifier;

impl KeywordIntentClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify_text(&self, text: &str) -> Intent {
        let padded = word_padded(text);
        INTENT_RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|kw| contains_phrase(&padded, kw)))
            .map_or(Intent::General, |(intent, _)| *intent)
    }
}

#[async_trait]
impl IntentClassifier for KeywordIntentClassifier {
    async fn classify(&self, text: &str) -> Intent {
        self.classify_text(text)
    }
}

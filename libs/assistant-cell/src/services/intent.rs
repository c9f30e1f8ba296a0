// libs/assistant-cell/src/services/intent.rs
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::Intent;
use crate::services::collaborators::{ChatAssistant, IntentClassifier};
use crate::services::keyword::KeywordIntentClassifier;

const CLASSIFICATION_PROMPT: &str = "Phân loại yêu cầu sau của bệnh nhân. \
Chỉ trả lời đúng một nhãn trong danh sách: \
book_appointment, check_slots, my_appointments, department_info, general.\n\nYêu cầu: ";

/// Asks the chat model for an intent label and falls back to keyword rules
/// when the model fails or answers with something unrecognized.
pub struct ModelIntentClassifier {
    assistant: Arc<dyn ChatAssistant>,
    fallback: KeywordIntentClassifier,
}

impl ModelIntentClassifier {
    pub fn new(assistant: Arc<dyn ChatAssistant>) -> Self {
        Self {
            assistant,
            fallback: KeywordIntentClassifier::new(),
        }
    }
}

#[async_trait]
impl IntentClassifier for ModelIntentClassifier {
    async fn classify(&self, text: &str) -> Intent {
        let prompt = format!("{}{}", CLASSIFICATION_PROMPT, text);
        match self.assistant.respond(&prompt, &[]).await {
            Ok(label) => match Intent::from_label(&label) {
                Some(intent) => {
                    debug!("Model classified intent as {:?}", intent);
                    intent
                }
                None => {
                    debug!("Unrecognized intent label '{}', using keyword rules", label);
                    self.fallback.classify_text(text)
                }
            },
            Err(e) => {
                warn!("Intent classification failed, using keyword rules: {}", e);
                self.fallback.classify_text(text)
            }
        }
    }
}

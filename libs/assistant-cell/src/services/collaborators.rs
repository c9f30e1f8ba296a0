// libs/assistant-cell/src/services/collaborators.rs
use async_trait::async_trait;

use shared_models::{AppError, ChatMessage};

use crate::models::{ChatStream, Intent, SymptomAnalysis};

/// Maps a free-text symptom description to suggested departments.
#[async_trait]
pub trait SymptomAnalyzer: Send + Sync {
    async fn analyze(&self, symptoms: &str) -> Result<SymptomAnalysis, AppError>;
}

/// Generates conversational replies. `history` holds earlier turns only; the
/// implementation appends `user_text` itself.
#[async_trait]
pub trait ChatAssistant: Send + Sync {
    async fn respond(&self, user_text: &str, history: &[ChatMessage]) -> Result<String, AppError>;

    /// Same reply delivered as a finite, non-restartable stream of text chunks.
    async fn respond_streaming(
        &self,
        user_text: &str,
        history: &[ChatMessage],
    ) -> Result<ChatStream, AppError>;
}

/// Decides what the patient is asking for.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Intent;
}

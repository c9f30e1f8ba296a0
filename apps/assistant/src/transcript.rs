// apps/assistant/src/transcript.rs
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use shared_models::{ChatMessage, ChatRole};

const HEADER: &str = "🏥 Medical Assistant CLI - Conversation Log";

/// User and assistant turns as plain text; system messages are left out.
pub fn format_transcript(history: &[ChatMessage]) -> String {
    let mut text = format!("{}\n\n", HEADER);
    for message in history {
        let speaker = match message.role {
            ChatRole::User => "User",
            ChatRole::Assistant => "Assistant",
            ChatRole::System => continue,
        };
        text.push_str(&format!("{}: {}\n\n", speaker, message.content));
    }
    text
}

/// Write the conversation to `dir/conversation_<timestamp>.txt`. Returns
/// `None` when there is nothing to save.
pub fn save_transcript(
    dir: &Path,
    history: &[ChatMessage],
    now: NaiveDateTime,
) -> Result<Option<PathBuf>> {
    if history.is_empty() {
        return Ok(None);
    }

    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(format!("conversation_{}.txt", now.format("%Y%m%d_%H%M%S")));
    fs::write(&path, format_transcript(history))
        .with_context(|| format!("writing {}", path.display()))?;

    info!("Conversation saved to {}", path.display());
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn history() -> Vec<ChatMessage> {
        vec![
            ChatMessage::system("persona"),
            ChatMessage::user("Tôi bị ho"),
            ChatMessage::assistant("Bạn nên khám khoa Tai mũi họng."),
        ]
    }

    #[test]
    fn test_format_skips_system_messages() {
        let text = format_transcript(&history());
        assert!(text.starts_with(HEADER));
        assert!(text.contains("User: Tôi bị ho\n\n"));
        assert!(text.contains("Assistant: Bạn nên khám khoa Tai mũi họng.\n\n"));
        assert!(!text.contains("persona"));
    }

    #[test]
    fn test_save_uses_timestamped_name() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("conversation_logs");
        let now = NaiveDate::from_ymd_opt(2026, 10, 17)
            .unwrap()
            .and_hms_opt(14, 5, 9)
            .unwrap();

        let path = save_transcript(&logs, &history(), now).unwrap().unwrap();

        assert_eq!(path, logs.join("conversation_20261017_140509.txt"));
        assert_eq!(fs::read_to_string(path).unwrap(), format_transcript(&history()));
    }

    #[test]
    fn test_empty_history_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let now = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap().and_hms_opt(0, 0, 0).unwrap();

        assert!(save_transcript(dir.path(), &[], now).unwrap().is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}

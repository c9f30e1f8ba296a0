use std::env;
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_APPOINTMENTS_FILE: &str = "data/appointments.json";
pub const DEFAULT_CONVERSATION_LOG_DIR: &str = "conversation_logs";
pub const DEFAULT_AZURE_API_VERSION: &str = "2023-05-15";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub appointments_file: PathBuf,
    pub conversation_log_dir: PathBuf,
    pub doctors_file: Option<PathBuf>,
    pub azure_openai_endpoint: String,
    pub azure_openai_api_key: String,
    pub azure_deployment_name: String,
    pub azure_openai_api_version: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            appointments_file: env::var("APPOINTMENTS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    warn!("APPOINTMENTS_FILE not set, using default");
                    PathBuf::from(DEFAULT_APPOINTMENTS_FILE)
                }),
            conversation_log_dir: env::var("CONVERSATION_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONVERSATION_LOG_DIR)),
            doctors_file: env::var("DOCTORS_FILE").ok().map(PathBuf::from),
            azure_openai_endpoint: env::var("AZURE_OPENAI_ENDPOINT")
                .unwrap_or_else(|_| {
                    warn!("AZURE_OPENAI_ENDPOINT not set, using empty value");
                    String::new()
                }),
            azure_openai_api_key: env::var("AZURE_OPENAI_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("AZURE_OPENAI_API_KEY not set, using empty value");
                    String::new()
                }),
            azure_deployment_name: env::var("AZURE_DEPLOYMENT_NAME")
                .unwrap_or_else(|_| {
                    warn!("AZURE_DEPLOYMENT_NAME not set, using empty value");
                    String::new()
                }),
            azure_openai_api_version: env::var("AZURE_OPENAI_API_VERSION")
                .unwrap_or_else(|_| DEFAULT_AZURE_API_VERSION.to_string()),
        };

        if !config.is_ai_configured() {
            warn!("Azure OpenAI not fully configured - falling back to keyword rules");
        }

        config
    }

    /// Configuration pointing at a given store file with no model access.
    pub fn offline(appointments_file: impl Into<PathBuf>) -> Self {
        Self {
            appointments_file: appointments_file.into(),
            conversation_log_dir: PathBuf::from(DEFAULT_CONVERSATION_LOG_DIR),
            doctors_file: None,
            azure_openai_endpoint: String::new(),
            azure_openai_api_key: String::new(),
            azure_deployment_name: String::new(),
            azure_openai_api_version: DEFAULT_AZURE_API_VERSION.to_string(),
        }
    }

    pub fn is_ai_configured(&self) -> bool {
        !self.azure_openai_endpoint.is_empty()
            && !self.azure_openai_api_key.is_empty()
            && !self.azure_deployment_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_config_is_not_ai_configured() {
        let config = AppConfig::offline("/tmp/appointments.json");
        assert!(!config.is_ai_configured());
        assert_eq!(config.azure_openai_api_version, DEFAULT_AZURE_API_VERSION);
        assert_eq!(config.appointments_file, PathBuf::from("/tmp/appointments.json"));
    }

    #[test]
    fn test_ai_configured_requires_all_three_values() {
        let mut config = AppConfig::offline("a.json");
        config.azure_openai_endpoint = "https://clinic.openai.azure.com".to_string();
        config.azure_openai_api_key = "key".to_string();
        assert!(!config.is_ai_configured());

        config.azure_deployment_name = "gpt-35".to_string();
        assert!(config.is_ai_configured());
    }
}

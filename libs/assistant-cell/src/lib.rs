pub mod models;
pub mod services;

pub use models::*;
pub use services::*;

use std::sync::Arc;

use shared_config::AppConfig;

/// The collaborators a front end needs, chosen by whether the model is configured.
pub struct Collaborators {
    pub chat: Arc<dyn ChatAssistant>,
    pub symptoms: Arc<dyn SymptomAnalyzer>,
    pub intents: Arc<dyn IntentClassifier>,
}

impl Collaborators {
    pub fn from_config(config: &AppConfig) -> Self {
        let azure = Arc::new(AzureOpenAiClient::new(config));

        if azure.is_configured() {
            Self {
                chat: azure.clone(),
                symptoms: azure.clone(),
                intents: Arc::new(ModelIntentClassifier::new(azure)),
            }
        } else {
            Self {
                chat: azure,
                symptoms: Arc::new(KeywordSymptomAnalyzer::new()),
                intents: Arc::new(KeywordIntentClassifier::new()),
            }
        }
    }
}

pub mod azure;
pub mod collaborators;
pub mod intent;
pub mod keyword;

pub use azure::AzureOpenAiClient;
pub use collaborators::{ChatAssistant, IntentClassifier, SymptomAnalyzer};
pub use intent::ModelIntentClassifier;
pub use keyword::{KeywordIntentClassifier, KeywordSymptomAnalyzer};

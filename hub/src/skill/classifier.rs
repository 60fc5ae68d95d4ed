//! Intent classification over the text-generation failover chain

use std::sync::Arc;

use tracing::debug;

use crate::failover::ProviderError;
use crate::providers::{TextClient, TextRequest};

const CLASSIFY_MAX_TOKENS: u32 = 50;

/// Classifies a free-form instruction into one registered intent tag
///
/// The classifier is an external capability reached through the failover
/// chain; provider retries are invisible here, only the final outcome
/// surfaces.
pub struct IntentClassifier {
    client: Arc<TextClient>,
}

impl IntentClassifier {
    pub fn new(client: Arc<TextClient>) -> Self {
        debug!("IntentClassifier::new: called");
        Self { client }
    }

    /// Classify `instruction` into one of `catalog`'s intent tags
    ///
    /// Returns the normalized label the model produced; the caller decides
    /// what to do with labels that match no registered intent.
    pub async fn classify(&self, instruction: &str, catalog: &[(&str, &str)]) -> Result<String, ProviderError> {
        debug!(intent_count = catalog.len(), "IntentClassifier::classify: called");

        let request = TextRequest::new(system_prompt(catalog), instruction).with_max_tokens(CLASSIFY_MAX_TOKENS);
        let response = self.client.execute(request).await?;

        let label = normalize(&response.content);
        debug!(%label, "IntentClassifier::classify: classified");
        Ok(label)
    }
}

fn system_prompt(catalog: &[(&str, &str)]) -> String {
    let mut prompt = String::from(
        "You classify a user instruction for a device-control assistant. \
         Reply with exactly one intent tag from the list below, nothing else. \
         If no tag fits, reply: unknown.\n\nIntents:\n",
    );
    for (intent, description) in catalog {
        prompt.push_str(&format!("- {}: {}\n", intent, description));
    }
    prompt
}

/// Strip the label down to a comparable tag
fn normalize(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

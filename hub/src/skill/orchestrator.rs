//! Orchestrator - classify an instruction and route it to a skill

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::classifier::IntentClassifier;
use super::{Skill, SkillError, SkillRegistry};

/// Default skill used when no registered intent matches
///
/// Politely declines rather than guessing at an unsupported action.
pub struct FallbackSkill;

#[async_trait]
impl Skill for FallbackSkill {
    fn intent(&self) -> &str {
        "fallback"
    }

    fn description(&self) -> &str {
        "declines instructions no other skill can service"
    }

    async fn handle(&self, instruction: &str) -> Result<String, SkillError> {
        debug!(%instruction, "FallbackSkill::handle: called");
        Ok("Sorry, I can't help with that yet.".to_string())
    }
}

/// Routes classified instructions to registered skills
pub struct Orchestrator {
    registry: SkillRegistry,
    classifier: IntentClassifier,
    fallback: Arc<dyn Skill>,
}

impl Orchestrator {
    /// Create an orchestrator with the default fallback skill
    pub fn new(registry: SkillRegistry, classifier: IntentClassifier) -> Self {
        Self::with_fallback(registry, classifier, Arc::new(FallbackSkill))
    }

    /// Create an orchestrator with an explicit fallback skill
    pub fn with_fallback(registry: SkillRegistry, classifier: IntentClassifier, fallback: Arc<dyn Skill>) -> Self {
        debug!(skill_count = registry.len(), "Orchestrator::with_fallback: called");
        Self {
            registry,
            classifier,
            fallback,
        }
    }

    /// Classify an instruction and invoke the matching skill
    ///
    /// The matched skill's result or error crosses this boundary
    /// untranslated. An unknown label falls through to the fallback skill;
    /// an exhausted classification chain is surfaced as
    /// [`SkillError::Classification`].
    pub async fn handle(&self, instruction: &str) -> Result<String, SkillError> {
        debug!(%instruction, "Orchestrator::handle: called");

        let label = self.classifier.classify(instruction, &self.registry.catalog()).await?;

        match self.registry.find(&label) {
            Some(skill) => {
                info!(intent = %label, "Dispatching instruction to skill");
                skill.handle(instruction).await
            }
            None => {
                info!(intent = %label, "No skill for intent, using fallback");
                self.fallback.handle(instruction).await
            }
        }
    }
}

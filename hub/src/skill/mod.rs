//! Capability-based skill dispatch
//!
//! Skills are registered once at startup and looked up by intent tag. The
//! orchestrator classifies free-form instructions through a failover-backed
//! classifier and routes them to the matching skill; adding a device-control
//! or language skill never touches the orchestrator itself.

mod classifier;
mod orchestrator;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use std::sync::Arc;

use crate::failover::ProviderError;

pub use classifier::IntentClassifier;
pub use orchestrator::{FallbackSkill, Orchestrator};

/// Errors from skill handling
#[derive(Debug, Error)]
pub enum SkillError {
    /// Skill-originated failure, propagated untranslated
    #[error("{0}")]
    Failed(String),

    /// The classification chain was exhausted
    #[error("intent classification failed: {0}")]
    Classification(#[from] ProviderError),
}

/// A handler capable of servicing one class of classified instruction
#[async_trait]
pub trait Skill: Send + Sync {
    /// Identifying tag used for registry lookup and intent matching
    fn intent(&self) -> &str;

    /// One-line description shown to the classifier
    fn description(&self) -> &str;

    /// Service an instruction
    async fn handle(&self, instruction: &str) -> Result<String, SkillError>;
}

/// Intent-to-skill table, populated once at startup
///
/// Iteration order is insertion order, which is also the order intents are
/// presented to the classifier.
#[derive(Default)]
pub struct SkillRegistry {
    skills: Vec<Arc<dyn Skill>>,
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a skill to the table
    pub fn register(&mut self, skill: Arc<dyn Skill>) {
        debug!(intent = skill.intent(), "SkillRegistry::register: called");
        self.skills.push(skill);
    }

    /// Find the skill registered for an intent (case-insensitive)
    pub fn find(&self, intent: &str) -> Option<Arc<dyn Skill>> {
        debug!(%intent, "SkillRegistry::find: called");
        self.skills
            .iter()
            .find(|s| s.intent().eq_ignore_ascii_case(intent))
            .cloned()
    }

    /// Registered intent tags, in insertion order
    pub fn intents(&self) -> Vec<&str> {
        self.skills.iter().map(|s| s.intent()).collect()
    }

    /// Intent/description pairs for the classification prompt
    pub fn catalog(&self) -> Vec<(&str, &str)> {
        self.skills.iter().map(|s| (s.intent(), s.description())).collect()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

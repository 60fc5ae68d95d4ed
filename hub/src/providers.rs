//! Provider request/response shapes
//!
//! The two provider kinds the failover client is instantiated with. The
//! vendor wire clients implementing [`Provider`](crate::failover::Provider)
//! for these shapes live outside this crate; only the seam is defined here.

use serde::{Deserialize, Serialize};

use crate::failover::FailoverClient;

/// Text-generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRequest {
    /// System prompt framing the call
    pub system_prompt: String,
    /// User instruction
    pub prompt: String,
    /// Maximum tokens in the response
    pub max_tokens: u32,
}

impl TextRequest {
    pub fn new(system_prompt: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            prompt: prompt.into(),
            max_tokens: 1024,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Text-generation response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextResponse {
    /// Generated text
    pub content: String,
}

/// Audio-transcription request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscribeRequest {
    /// Raw audio bytes; container/codec handling is the provider's concern
    pub audio: Vec<u8>,
    /// Optional language hint (BCP 47)
    pub language: Option<String>,
}

/// Audio-transcription response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Recognized text
    pub text: String,
}

/// Failover chain over text-generation providers
pub type TextClient = FailoverClient<TextRequest, TextResponse>;

/// Failover chain over audio-transcription providers
pub type TranscribeClient = FailoverClient<TranscribeRequest, Transcript>;

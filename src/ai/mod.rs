//! AI test-synthesis client and capability trait.
//!
//! The generation engine calls the synthesizer only through
//! [`TestSynthesizer`]; [`AiClient`] is the chat-completions HTTP
//! implementation.

mod client;
mod types;

pub use client::AiClient;
pub use types::{CandidateStep, CandidateTest};

use async_trait::async_trait;

use crate::error::AiResult;

/// Capability the AI generator provides to the engine: one prompt in, a
/// batch of candidate test cases out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TestSynthesizer: Send + Sync {
    async fn synthesize(&self, system_prompt: &str, user_prompt: &str)
        -> AiResult<Vec<CandidateTest>>;
}

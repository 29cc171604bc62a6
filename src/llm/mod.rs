//! Remote language-model classification
//!
//! The remote model is the last, optional stage of intent classification.
//! Anything that can answer `classify_remote` can stand in for the HTTP
//! client, which keeps the classifier testable without a network.

pub mod client;
pub mod context;
pub mod parser;

use crate::core::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub use client::LlmClient;
pub use context::ContextSummary;
pub use parser::RemoteVerdict;

/// Boundary to an external intent classifier
///
/// Transport errors, timeouts and unparseable answers are all treated by
/// the caller as "no opinion".
#[async_trait]
pub trait RemoteClassifier: Send + Sync {
    async fn classify_remote(
        &self,
        text: &str,
        context_summary: &str,
        timeout: Duration,
    ) -> Result<RemoteVerdict>;
}

#[async_trait]
impl RemoteClassifier for LlmClient {
    async fn classify_remote(
        &self,
        text: &str,
        context_summary: &str,
        timeout: Duration,
    ) -> Result<RemoteVerdict> {
        parser::classify_utterance(self, text, context_summary, timeout).await
    }
}

// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no pipeline logic.
// The pipeline (worker.rs) is generic over them so tests can swap in
// scripted fakes from testing.rs.

use async_trait::async_trait;

use crate::error::Result;
use crate::evidence::EvidenceItem;
use crate::prompt::GenerationRequest;

// =============================================================================
// Text Generator Trait (Infrastructure - LLM article generation)
// =============================================================================

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate the raw model response for an assembled request
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

// =============================================================================
// Evidence Searcher Trait (Infrastructure - web evidence collection)
// =============================================================================

#[async_trait]
pub trait EvidenceSearcher: Send + Sync {
    /// Collect web evidence for a keyword
    /// Best-effort: surfaces that fail are skipped, never an error
    async fn collect(&self, keyword: &str) -> Vec<EvidenceItem>;
}

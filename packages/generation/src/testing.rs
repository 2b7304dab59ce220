// Scripted fakes for pipeline tests
//
// Generator and searcher doubles that can be injected into Pipeline.
// Clones share the call log and scripted outcomes, so a test can keep
// a view after handing the fake to a pipeline.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use crate::error::{GenerationError, Result};
use crate::evidence::EvidenceItem;
use crate::prompt::GenerationRequest;
use crate::traits::{EvidenceSearcher, TextGenerator};

static KEYWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"키워드: "([^"]+)""#).unwrap());

/// Returned for any keyword without a scripted outcome.
pub const DEFAULT_RESPONSE: &str = "[제목]\n테스트 제목\n\n[본문]\n테스트 본문입니다.";

// =============================================================================
// Mock Text Generator
// =============================================================================

/// Arguments captured from a generate call
#[derive(Debug, Clone)]
pub struct MockGeneratorCall {
    /// Keyword parsed out of the request text, if present
    pub keyword: Option<String>,
    pub image_count: usize,
}

#[derive(Clone)]
enum Outcome {
    Respond(String),
    FailAuth,
    FailRateLimited,
    FailService(String),
}

#[derive(Clone)]
pub struct MockGenerator {
    outcomes: Arc<Mutex<HashMap<String, Outcome>>>,
    calls: Arc<Mutex<Vec<MockGeneratorCall>>>,
    delay: Option<Duration>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Script a response for a keyword
    pub fn with_response(self, keyword: &str, response: impl Into<String>) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .insert(keyword.to_string(), Outcome::Respond(response.into()));
        self
    }

    /// Script an authentication failure for a keyword
    pub fn with_auth_failure(self, keyword: &str) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .insert(keyword.to_string(), Outcome::FailAuth);
        self
    }

    /// Script a rate-limit failure for a keyword
    pub fn with_rate_limit(self, keyword: &str) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .insert(keyword.to_string(), Outcome::FailRateLimited);
        self
    }

    /// Script a generic service failure for a keyword
    pub fn with_service_failure(self, keyword: &str, message: &str) -> Self {
        self.outcomes.lock().unwrap().insert(
            keyword.to_string(),
            Outcome::FailService(message.to_string()),
        );
        self
    }

    /// Sleep this long before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get all captured calls
    pub fn calls(&self) -> Vec<MockGeneratorCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Get the number of times the generator was called
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let keyword = extract_keyword(request);

        // Record the call
        self.calls.lock().unwrap().push(MockGeneratorCall {
            keyword: keyword.clone(),
            image_count: request.image_count(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = keyword
            .as_deref()
            .and_then(|k| self.outcomes.lock().unwrap().get(k).cloned());

        match outcome {
            Some(Outcome::Respond(text)) => Ok(text),
            Some(Outcome::FailAuth) => Err(GenerationError::Auth("invalid x-api-key".to_string())),
            Some(Outcome::FailRateLimited) => Err(GenerationError::RateLimited(
                "rate limit exceeded".to_string(),
            )),
            Some(Outcome::FailService(message)) => Err(GenerationError::Service(message)),
            None => Ok(DEFAULT_RESPONSE.to_string()),
        }
    }
}

fn extract_keyword(request: &GenerationRequest) -> Option<String> {
    KEYWORD_RE
        .captures(&request.user_text())
        .map(|caps| caps[1].to_string())
}

// =============================================================================
// Mock Evidence Searcher
// =============================================================================

#[derive(Clone)]
pub struct MockSearcher {
    results: Arc<Mutex<HashMap<String, Vec<EvidenceItem>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockSearcher {
    pub fn new() -> Self {
        Self {
            results: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script evidence for a keyword; unscripted keywords get none
    pub fn with_results(self, keyword: &str, items: Vec<EvidenceItem>) -> Self {
        self.results
            .lock()
            .unwrap()
            .insert(keyword.to_string(), items);
        self
    }

    /// Get all keywords that were searched
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EvidenceSearcher for MockSearcher {
    async fn collect(&self, keyword: &str) -> Vec<EvidenceItem> {
        // Record the call
        self.calls.lock().unwrap().push(keyword.to_string());

        self.results
            .lock()
            .unwrap()
            .get(keyword)
            .cloned()
            .unwrap_or_default()
    }
}

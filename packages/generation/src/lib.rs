//! Keyword-Driven Article Generation Pipeline
//!
//! Turns admissions keywords into long-form Korean blog articles. Each
//! run grounds the model with a writing style guide, sample posts scored
//! against the keyword, and fresh web evidence scraped from Naver search,
//! then parses, cleans, and persists the generated article while
//! streaming progress events to the caller.
//!
//! # Usage
//!
//! ```rust,ignore
//! use anthropic_client::AnthropicClient;
//! use generation::{AnthropicGenerator, NaverSearch, Pipeline, PipelineConfig};
//!
//! let generator = AnthropicGenerator::new(AnthropicClient::from_env()?);
//! let pipeline = Pipeline::new(generator, NaverSearch::new(), PipelineConfig::default())?;
//!
//! let mut handle = pipeline.spawn_batch(vec!["수학 세특".into(), "국어 세특".into()])?;
//! while let Some(event) = handle.next_or_heartbeat().await {
//!     let done = event.is_terminal();
//!     forward(event);
//!     if done {
//!         break;
//!     }
//! }
//! ```
//!
//! # Modules
//!
//! - [`worker`] - Batch and single-article workers behind [`Pipeline`]
//! - [`events`] - Progress events streamed by the workers
//! - [`channel`] - Event receiver with heartbeat synthesis
//! - [`corpus`] - Style guide loading and sample post retrieval
//! - [`evidence`] - Naver web evidence aggregation
//! - [`prompt`] - Prompt assembly for both generation modes
//! - [`parser`] - Response parsing and invisible-character cleaning
//! - [`output`] - Flat-file article persistence
//! - [`ai`] - Anthropic-backed [`TextGenerator`] implementation
//! - [`testing`] - Scripted fakes for pipeline tests

pub mod ai;
pub mod channel;
pub mod config;
pub mod corpus;
pub mod error;
pub mod events;
pub mod evidence;
pub mod output;
pub mod parser;
pub mod prompt;
pub mod testing;
pub mod traits;
pub mod worker;

// Re-export core types at crate root
pub use ai::AnthropicGenerator;
pub use channel::ProgressReceiver;
pub use config::PipelineConfig;
pub use corpus::{load_style_guide, SampleLibrary};
pub use error::{GenerationError, Result, Severity};
pub use events::{ProgressEvent, HEARTBEAT_MSG};
pub use evidence::{EvidenceItem, NaverSearch, Surface};
pub use output::{OutputRecord, OutputStore, OutputSummary};
pub use parser::{char_count, clean_invisible_chars, parse_response, ParsedArticle};
pub use prompt::{GenerationRequest, ImageAttachment, RequestContent};
pub use traits::{EvidenceSearcher, TextGenerator};
pub use worker::{Pipeline, PipelineHandle, SingleRequest};

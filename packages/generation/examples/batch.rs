//! Batch generation example
//!
//! Expects `style_guide.txt` and the sample directories from
//! `PipelineConfig::default()` in the working directory, plus
//! ANTHROPIC_API_KEY in the environment. Keywords come from the
//! command line.

use anthropic_client::AnthropicClient;
use generation::{AnthropicGenerator, NaverSearch, Pipeline, PipelineConfig, ProgressEvent};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut keywords: Vec<String> = std::env::args().skip(1).collect();
    if keywords.is_empty() {
        keywords.push("수학 세특".to_string());
    }

    let client = AnthropicClient::from_env()?;
    let pipeline = Pipeline::new(
        AnthropicGenerator::new(client),
        NaverSearch::new(),
        PipelineConfig::default(),
    )?;

    let mut handle = pipeline.spawn_batch(keywords)?;
    while let Some(event) = handle.next_or_heartbeat().await {
        let terminal = event.is_terminal();
        match event {
            ProgressEvent::KeywordDone {
                title,
                char_count,
                filename,
                ..
            } => println!("완료: {title} ({char_count}자) -> {filename}"),
            ProgressEvent::AllDone { total } => println!("전체 완료: {total}개 키워드 처리"),
            ProgressEvent::KeywordStart { msg, .. }
            | ProgressEvent::Step { msg, .. }
            | ProgressEvent::KeywordError { msg, .. }
            | ProgressEvent::Error { msg }
            | ProgressEvent::Heartbeat { msg } => println!("{msg}"),
            ProgressEvent::Done { .. } => {}
        }
        if terminal {
            break;
        }
    }

    Ok(())
}

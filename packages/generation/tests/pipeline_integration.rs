//! Integration tests for the generation pipeline.
//!
//! These tests drive the full worker loop with scripted fakes:
//! 1. Spawn a batch or single-article run
//! 2. Drain progress events from the handle
//! 3. Check the event sequence and the persisted article

use std::time::Duration;

use futures::StreamExt;
use tempfile::TempDir;

use generation::testing::{MockGenerator, MockSearcher};
use generation::{
    EvidenceItem, ImageAttachment, Pipeline, PipelineConfig, PipelineHandle, ProgressEvent,
    Severity, SingleRequest, Surface,
};

/// Helper to create a workspace with a style guide and one sample post.
fn setup_workspace() -> (TempDir, PipelineConfig) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("style_guide.txt"), "스타일 가이드 본문").unwrap();

    let samples = dir.path().join("posts");
    std::fs::create_dir(&samples).unwrap();
    std::fs::write(samples.join("0001_수학 세특 작성법.txt"), "예시 본문입니다.").unwrap();

    let config = PipelineConfig::default()
        .with_style_guide(dir.path().join("style_guide.txt"))
        .with_sample_dirs(vec![samples])
        .with_output_dir(dir.path().join("output"))
        .with_rate_limit_cooldown(Duration::from_millis(10))
        .with_poll_timeouts(Duration::from_secs(5), Duration::from_secs(5));

    (dir, config)
}

fn evidence(title: &str, snippet: &str) -> EvidenceItem {
    EvidenceItem {
        title: title.to_string(),
        snippet: snippet.to_string(),
        surface: Surface::Community,
    }
}

fn image() -> ImageAttachment {
    ImageAttachment {
        media_type: "image/png".to_string(),
        data: vec![0x89, 0x50, 0x4E, 0x47],
    }
}

/// Drain every event until the worker exits and the channel closes.
async fn collect_events(handle: &mut PipelineHandle) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Some(event) = handle.recv().await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_batch_emits_full_event_sequence() {
    let (_dir, config) = setup_workspace();
    let generator = MockGenerator::new()
        .with_response("수학 세특", "[제목]\n수학 제목\n\n[본문]\n수학 본문입니다.")
        .with_response("국어 세특", "[제목]\n국어 제목\n\n[본문]\n국어 본문입니다.");
    let searcher =
        MockSearcher::new().with_results("수학 세특", vec![evidence("블로그 글", "요약문")]);

    let pipeline = Pipeline::new(generator, searcher, config).unwrap();
    let mut handle = pipeline
        .spawn_batch(vec!["수학 세특".into(), "국어 세특".into()])
        .unwrap();

    let events = collect_events(&mut handle).await;

    // per keyword: keyword_start + steps 2-5 + keyword_done, then all_done
    assert_eq!(events.len(), 13);

    match &events[0] {
        ProgressEvent::KeywordStart {
            keyword,
            current,
            total,
            step,
            msg,
        } => {
            assert_eq!(keyword, "수학 세특");
            assert_eq!((*current, *total, *step), (1, 2, 1));
            assert_eq!(msg, "[1/2] '수학 세특' - 참고 글 로딩 중...");
        }
        other => panic!("expected keyword_start, got {other:?}"),
    }

    let steps: Vec<u8> = events[1..5]
        .iter()
        .map(|event| match event {
            ProgressEvent::Step { step, keyword, .. } => {
                assert_eq!(keyword.as_deref(), Some("수학 세특"));
                *step
            }
            other => panic!("expected step, got {other:?}"),
        })
        .collect();
    assert_eq!(steps, vec![2, 3, 4, 5]);

    match &events[5] {
        ProgressEvent::KeywordDone {
            keyword,
            current,
            title,
            body,
            char_count,
            filename,
            web_count,
            ..
        } => {
            assert_eq!(keyword, "수학 세특");
            assert_eq!(*current, 1);
            assert_eq!(title, "수학 제목");
            assert_eq!(body, "수학 본문입니다.");
            assert_eq!(*char_count, 9);
            assert!(filename.starts_with("수학 세특_"));
            assert_eq!(*web_count, 1);
        }
        other => panic!("expected keyword_done, got {other:?}"),
    }

    match &events[6] {
        ProgressEvent::KeywordStart { keyword, msg, .. } => {
            assert_eq!(keyword, "국어 세특");
            assert_eq!(msg, "[2/2] '국어 세특' - 참고 글 로딩 중...");
        }
        other => panic!("expected keyword_start, got {other:?}"),
    }

    match &events[11] {
        ProgressEvent::KeywordDone {
            keyword, web_count, ..
        } => {
            assert_eq!(keyword, "국어 세특");
            assert_eq!(*web_count, 0);
        }
        other => panic!("expected keyword_done, got {other:?}"),
    }

    match &events[12] {
        ProgressEvent::AllDone { total } => assert_eq!(*total, 2),
        other => panic!("expected all_done, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limited_keyword_skipped_batch_continues() {
    let (_dir, config) = setup_workspace();
    let generator = MockGenerator::new().with_rate_limit("국어 세특");

    let pipeline = Pipeline::new(generator, MockSearcher::new(), config).unwrap();
    let mut handle = pipeline
        .spawn_batch(vec![
            "수학 세특".into(),
            "국어 세특".into(),
            "영어 세특".into(),
        ])
        .unwrap();

    let events = collect_events(&mut handle).await;

    let errors: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            ProgressEvent::KeywordError {
                keyword,
                current,
                msg,
                ..
            } => Some((keyword.clone(), *current, msg.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, "국어 세특");
    assert_eq!(errors[0].1, 2);
    assert_eq!(
        errors[0].2,
        "[2/3] '국어 세특' - API 요청 한도 초과. 잠시 후 재시도..."
    );

    let done_keywords: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            ProgressEvent::KeywordDone { keyword, .. } => Some(keyword.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(done_keywords, vec!["수학 세특", "영어 세특"]);

    match events.last() {
        Some(ProgressEvent::AllDone { total }) => assert_eq!(*total, 3),
        other => panic!("expected all_done, got {other:?}"),
    }
}

#[tokio::test]
async fn test_auth_failure_stops_batch_without_all_done() {
    let (_dir, config) = setup_workspace();
    let generator = MockGenerator::new().with_auth_failure("수학 세특");
    let generator_view = generator.clone();

    let pipeline = Pipeline::new(generator, MockSearcher::new(), config).unwrap();
    let mut handle = pipeline
        .spawn_batch(vec![
            "수학 세특".into(),
            "국어 세특".into(),
            "영어 세특".into(),
        ])
        .unwrap();

    let events = collect_events(&mut handle).await;

    match events.last() {
        Some(ProgressEvent::KeywordError {
            keyword,
            current,
            total,
            msg,
        }) => {
            assert_eq!(keyword, "수학 세특");
            assert_eq!((*current, *total), (1, 3));
            assert_eq!(msg, "[1/3] '수학 세특' - API 키가 유효하지 않습니다.");
        }
        other => panic!("expected keyword_error last, got {other:?}"),
    }

    // the batch stopped cold: no completion marker, no further keywords
    assert!(!events.iter().any(|event| matches!(
        event,
        ProgressEvent::AllDone { .. } | ProgressEvent::KeywordDone { .. }
    )));
    assert_eq!(generator_view.call_count(), 1);
}

#[tokio::test]
async fn test_batch_input_validation() {
    let (_dir, config) = setup_workspace();
    let pipeline = Pipeline::new(MockGenerator::new(), MockSearcher::new(), config).unwrap();

    let err = pipeline.spawn_batch(vec![]).unwrap_err();
    assert_eq!(err.to_string(), "키워드를 입력해주세요.");
    assert_eq!(err.severity(), Severity::Validation);

    // whitespace-only keywords are dropped before validation
    let err = pipeline
        .spawn_batch(vec!["  ".into(), "\n".into()])
        .unwrap_err();
    assert_eq!(err.to_string(), "키워드를 입력해주세요.");

    let many: Vec<String> = (0..51).map(|i| format!("키워드{i}")).collect();
    let err = pipeline.spawn_batch(many).unwrap_err();
    assert_eq!(err.to_string(), "키워드는 최대 50개까지 입력 가능합니다.");
}

#[tokio::test]
async fn test_single_input_validation() {
    let (_dir, config) = setup_workspace();
    let pipeline = Pipeline::new(MockGenerator::new(), MockSearcher::new(), config).unwrap();

    let err = pipeline
        .spawn_single(SingleRequest {
            keyword: "  ".into(),
            title: "제목".into(),
            images: vec![image()],
        })
        .unwrap_err();
    assert_eq!(err.to_string(), "키워드를 입력해주세요.");

    let err = pipeline
        .spawn_single(SingleRequest {
            keyword: "수학 세특".into(),
            title: " ".into(),
            images: vec![image()],
        })
        .unwrap_err();
    assert_eq!(err.to_string(), "제목을 입력해주세요.");

    let err = pipeline
        .spawn_single(SingleRequest {
            keyword: "수학 세특".into(),
            title: "제목".into(),
            images: vec![],
        })
        .unwrap_err();
    assert_eq!(err.to_string(), "세특 사진을 최소 1장 업로드해주세요.");
}

#[tokio::test]
async fn test_keywords_trimmed_before_run() {
    let (_dir, config) = setup_workspace();
    let pipeline = Pipeline::new(MockGenerator::new(), MockSearcher::new(), config).unwrap();
    let mut handle = pipeline
        .spawn_batch(vec!["  수학 세특  ".into(), String::new()])
        .unwrap();

    let events = collect_events(&mut handle).await;

    match &events[0] {
        ProgressEvent::KeywordStart { keyword, total, .. } => {
            assert_eq!(keyword, "수학 세특");
            assert_eq!(*total, 1);
        }
        other => panic!("expected keyword_start, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_style_guide_fails_batch_before_first_keyword() {
    let (dir, config) = setup_workspace();
    let config = config.with_style_guide(dir.path().join("missing.txt"));

    let pipeline = Pipeline::new(MockGenerator::new(), MockSearcher::new(), config).unwrap();
    let mut handle = pipeline.spawn_batch(vec!["수학 세특".into()]).unwrap();

    let events = collect_events(&mut handle).await;

    assert_eq!(events.len(), 1);
    match &events[0] {
        ProgressEvent::Error { msg } => {
            assert!(msg.starts_with("스타일 가이드 로딩 실패: "), "got: {msg}");
        }
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_single_run_reuses_title_and_counts_images() {
    let (dir, config) = setup_workspace();
    let generator = MockGenerator::new().with_response("수학 세특", "[본문]\n사진 기반 본문입니다.");
    let generator_view = generator.clone();

    let pipeline = Pipeline::new(generator, MockSearcher::new(), config).unwrap();
    let mut handle = pipeline
        .spawn_single(SingleRequest {
            keyword: "수학 세특".into(),
            title: "수학 세특, 합격생처럼 쓰는 법...".into(),
            images: vec![image(), image()],
        })
        .unwrap();

    let events = collect_events(&mut handle).await;

    // five bare steps then done
    assert_eq!(events.len(), 6);
    for (i, event) in events[..5].iter().enumerate() {
        match event {
            ProgressEvent::Step {
                keyword,
                current,
                total,
                step,
                ..
            } => {
                assert!(keyword.is_none() && current.is_none() && total.is_none());
                assert_eq!(*step as usize, i + 1);
            }
            other => panic!("expected step, got {other:?}"),
        }
    }

    match &events[2] {
        ProgressEvent::Step { msg, .. } => {
            assert_eq!(msg, "Claude API로 글 생성 중... (사진 2장 분석)");
        }
        other => panic!("expected step, got {other:?}"),
    }

    match &events[5] {
        ProgressEvent::Done {
            title,
            body,
            char_count,
            filename,
            web_count,
            image_count,
        } => {
            assert_eq!(title, "수학 세특, 합격생처럼 쓰는 법...");
            assert_eq!(body, "사진 기반 본문입니다.");
            assert_eq!(*char_count, 12);
            assert_eq!(*web_count, 0);
            assert_eq!(*image_count, 2);

            let saved =
                std::fs::read_to_string(dir.path().join("output").join(filename)).unwrap();
            assert!(saved.starts_with("제목: 수학 세특, 합격생처럼 쓰는 법...\n"));
            assert!(saved.ends_with("사진 기반 본문입니다."));
        }
        other => panic!("expected done, got {other:?}"),
    }

    // both images reached the generator
    let calls = generator_view.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].image_count, 2);
}

#[tokio::test]
async fn test_single_run_maps_service_failure_to_error_event() {
    let (_dir, config) = setup_workspace();
    let generator = MockGenerator::new().with_service_failure("수학 세특", "connection reset");

    let pipeline = Pipeline::new(generator, MockSearcher::new(), config).unwrap();
    let mut handle = pipeline
        .spawn_single(SingleRequest {
            keyword: "수학 세특".into(),
            title: "제목".into(),
            images: vec![image()],
        })
        .unwrap();

    let events = collect_events(&mut handle).await;

    match events.last() {
        Some(ProgressEvent::Error { msg }) => {
            assert!(msg.starts_with("오류: "), "got: {msg}");
            assert!(msg.contains("connection reset"));
        }
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_dropping_handle_cancels_batch() {
    let (_dir, config) = setup_workspace();
    let generator = MockGenerator::new().with_delay(Duration::from_millis(100));
    let generator_view = generator.clone();

    let pipeline = Pipeline::new(generator, MockSearcher::new(), config).unwrap();
    let mut handle = pipeline
        .spawn_batch(vec![
            "수학 세특".into(),
            "국어 세특".into(),
            "영어 세특".into(),
        ])
        .unwrap();

    // wait for the first keyword to get underway, then walk away
    let first = handle.recv().await.unwrap();
    assert!(matches!(first, ProgressEvent::KeywordStart { .. }));
    drop(handle);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(
        generator_view.call_count() <= 1,
        "worker kept generating after the handle was dropped"
    );
}

#[tokio::test]
async fn test_into_stream_ends_after_terminal_event() {
    let (_dir, config) = setup_workspace();
    let pipeline = Pipeline::new(MockGenerator::new(), MockSearcher::new(), config).unwrap();
    let handle = pipeline.spawn_batch(vec!["수학 세특".into()]).unwrap();

    let events: Vec<ProgressEvent> = handle.into_stream().collect().await;

    assert!(!events.is_empty());
    match events.last() {
        Some(ProgressEvent::AllDone { total }) => assert_eq!(*total, 1),
        other => panic!("expected all_done, got {other:?}"),
    }
}

#[tokio::test]
async fn test_heartbeat_during_slow_generation() {
    let (_dir, config) = setup_workspace();
    let config = config.with_poll_timeouts(Duration::from_millis(20), Duration::from_millis(20));
    let generator = MockGenerator::new().with_delay(Duration::from_millis(200));

    let pipeline = Pipeline::new(generator, MockSearcher::new(), config).unwrap();
    let mut handle = pipeline.spawn_batch(vec!["수학 세특".into()]).unwrap();

    let mut saw_heartbeat = false;
    loop {
        match handle.next_or_heartbeat().await {
            Some(ProgressEvent::Heartbeat { msg }) => {
                assert_eq!(msg, "처리 중...");
                saw_heartbeat = true;
            }
            Some(event) if event.is_terminal() => break,
            Some(_) => {}
            None => break,
        }
    }

    assert!(saw_heartbeat, "quiet poll windows should synthesize heartbeats");
}

//! Batch and single-article generation workers.
//!
//! [`Pipeline`] spawns one detached worker task per run and hands back a
//! [`PipelineHandle`] that receives progress events. The worker owns the
//! whole job sequence; the consumer only relays events. Dropping the
//! handle cancels the worker at its next checkpoint, so an abandoned
//! client never leaves a generation loop running.

use std::sync::Arc;

use async_stream::stream;
use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{info, warn};

use crate::channel::{progress_channel, ProgressReceiver};
use crate::config::PipelineConfig;
use crate::corpus::{load_style_guide, SampleLibrary};
use crate::error::{GenerationError, Result, Severity};
use crate::events::ProgressEvent;
use crate::output::OutputStore;
use crate::parser::{char_count, clean_invisible_chars, extract_body, parse_response};
use crate::prompt::{build_batch_request, build_single_request, ImageAttachment};
use crate::traits::{EvidenceSearcher, TextGenerator};

/// Input for a single-article run with a fixed title.
#[derive(Debug, Clone)]
pub struct SingleRequest {
    pub keyword: String,
    pub title: String,
    pub images: Vec<ImageAttachment>,
}

/// One keyword job inside a batch.
struct JobContext<'a> {
    style_guide: &'a str,
    keyword: &'a str,
    current: usize,
    total: usize,
}

/// Article generation pipeline.
///
/// Generic over the text generator and evidence searcher so tests can
/// swap in scripted fakes from [`crate::testing`].
pub struct Pipeline<G, E> {
    generator: Arc<G>,
    searcher: Arc<E>,
    store: Arc<OutputStore>,
    config: Arc<PipelineConfig>,
}

impl<G, E> Clone for Pipeline<G, E> {
    fn clone(&self) -> Self {
        Self {
            generator: Arc::clone(&self.generator),
            searcher: Arc::clone(&self.searcher),
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
        }
    }
}

impl<G, E> Pipeline<G, E>
where
    G: TextGenerator + 'static,
    E: EvidenceSearcher + 'static,
{
    /// Create a pipeline; the output directory is created if missing.
    pub fn new(generator: G, searcher: E, config: PipelineConfig) -> Result<Self> {
        let store = OutputStore::new(&config.output_dir)?;
        Ok(Self {
            generator: Arc::new(generator),
            searcher: Arc::new(searcher),
            store: Arc::new(store),
            config: Arc::new(config),
        })
    }

    /// The store generated articles land in.
    pub fn store(&self) -> &OutputStore {
        &self.store
    }

    /// Start a batch run over the given keywords.
    ///
    /// Keywords are trimmed and empties dropped before validation.
    /// Returns `Validation` errors synchronously; no worker is started
    /// for rejected input.
    pub fn spawn_batch(&self, keywords: Vec<String>) -> Result<PipelineHandle> {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        if keywords.is_empty() {
            return Err(GenerationError::Validation(
                "키워드를 입력해주세요.".to_string(),
            ));
        }
        if keywords.len() > self.config.max_keywords {
            return Err(GenerationError::Validation(format!(
                "키워드는 최대 {}개까지 입력 가능합니다.",
                self.config.max_keywords
            )));
        }

        info!(keywords = keywords.len(), "starting batch generation");

        let (tx, events) = progress_channel(self.config.batch_poll_timeout);
        let cancel = CancellationToken::new();
        let guard = cancel.clone().drop_guard();
        let token = cancel.clone();

        let this = self.clone();
        let worker = tokio::spawn(async move {
            this.run_batch(keywords, tx, token).await;
        });

        Ok(PipelineHandle {
            events,
            cancel,
            worker,
            _cancel_guard: guard,
        })
    }

    /// Start a single-article run from uploaded record images.
    pub fn spawn_single(&self, request: SingleRequest) -> Result<PipelineHandle> {
        let keyword = request.keyword.trim().to_string();
        let title = request.title.trim().to_string();

        if keyword.is_empty() {
            return Err(GenerationError::Validation(
                "키워드를 입력해주세요.".to_string(),
            ));
        }
        if title.is_empty() {
            return Err(GenerationError::Validation(
                "제목을 입력해주세요.".to_string(),
            ));
        }
        if request.images.is_empty() {
            return Err(GenerationError::Validation(
                "세특 사진을 최소 1장 업로드해주세요.".to_string(),
            ));
        }

        info!(
            keyword = %keyword,
            images = request.images.len(),
            "starting single-article generation"
        );

        let (tx, events) = progress_channel(self.config.single_poll_timeout);
        let cancel = CancellationToken::new();
        let guard = cancel.clone().drop_guard();
        let token = cancel.clone();

        let this = self.clone();
        let worker = tokio::spawn(async move {
            this.run_single(keyword, title, request.images, tx, token)
                .await;
        });

        Ok(PipelineHandle {
            events,
            cancel,
            worker,
            _cancel_guard: guard,
        })
    }

    async fn run_batch(
        self,
        keywords: Vec<String>,
        tx: mpsc::UnboundedSender<ProgressEvent>,
        cancel: CancellationToken,
    ) {
        let style_guide = match load_style_guide(&self.config.style_guide_path) {
            Ok(guide) => guide,
            Err(e) => {
                warn!(error = %e, "style guide load failed, batch not started");
                let _ = tx.send(ProgressEvent::Error {
                    msg: style_guide_error_msg(&e),
                });
                return;
            }
        };

        let mut library = SampleLibrary::from_config(&self.config);
        let total = keywords.len();

        for (idx, keyword) in keywords.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("batch cancelled");
                return;
            }
            let current = idx + 1;

            let _ = tx.send(ProgressEvent::KeywordStart {
                keyword: keyword.clone(),
                current,
                total,
                step: 1,
                msg: format!("[{current}/{total}] '{keyword}' - 참고 글 로딩 중..."),
            });

            let ctx = JobContext {
                style_guide: &style_guide,
                keyword,
                current,
                total,
            };

            match self.run_keyword_job(&ctx, &mut library, &tx, &cancel).await {
                Ok(Some(done)) => {
                    let _ = tx.send(done);
                }
                Ok(None) => {
                    info!("batch cancelled");
                    return;
                }
                Err(e) => {
                    warn!(keyword = %keyword, error = %e, "keyword job failed");
                    let msg = match &e {
                        GenerationError::Auth(_) => {
                            format!("[{current}/{total}] '{keyword}' - API 키가 유효하지 않습니다.")
                        }
                        GenerationError::RateLimited(_) => format!(
                            "[{current}/{total}] '{keyword}' - API 요청 한도 초과. 잠시 후 재시도..."
                        ),
                        other => format!("[{current}/{total}] '{keyword}' - 오류: {other}"),
                    };
                    let _ = tx.send(ProgressEvent::KeywordError {
                        keyword: keyword.clone(),
                        current,
                        total,
                        msg,
                    });

                    match e.severity() {
                        Severity::BatchFatal => return,
                        Severity::RecoverableDelayed => {
                            tokio::select! {
                                _ = cancel.cancelled() => {
                                    info!("batch cancelled during cooldown");
                                    return;
                                }
                                _ = tokio::time::sleep(self.config.rate_limit_cooldown) => {}
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        info!(total, "batch complete");
        let _ = tx.send(ProgressEvent::AllDone { total });
    }

    /// Run one keyword job to completion.
    ///
    /// `Ok(None)` means a cancellation checkpoint fired; the caller
    /// stops the batch without emitting further events.
    async fn run_keyword_job(
        &self,
        ctx: &JobContext<'_>,
        library: &mut SampleLibrary,
        tx: &mpsc::UnboundedSender<ProgressEvent>,
        cancel: &CancellationToken,
    ) -> Result<Option<ProgressEvent>> {
        let samples = library.select(ctx.keyword)?;
        if cancel.is_cancelled() {
            return Ok(None);
        }

        send_batch_step(tx, ctx, 2, "네이버 검색 중...");
        let evidence = self.searcher.collect(ctx.keyword).await;
        if cancel.is_cancelled() {
            return Ok(None);
        }

        send_batch_step(tx, ctx, 3, "Claude API 생성 중...");
        let request = build_batch_request(ctx.style_guide, &samples, &evidence, ctx.keyword);
        let raw = self.generator.generate(&request).await?;
        if cancel.is_cancelled() {
            return Ok(None);
        }

        send_batch_step(tx, ctx, 4, "결과 파싱 중...");
        let parsed = parse_response(&raw);
        let body = clean_invisible_chars(&parsed.body);
        let chars = char_count(&body);
        if cancel.is_cancelled() {
            return Ok(None);
        }

        send_batch_step(tx, ctx, 5, "저장 중...");
        let record = self.store.save(ctx.keyword, &parsed.title, &body)?;

        Ok(Some(ProgressEvent::KeywordDone {
            keyword: ctx.keyword.to_string(),
            current: ctx.current,
            total: ctx.total,
            title: parsed.title,
            body,
            char_count: chars,
            filename: record.filename,
            web_count: evidence.len(),
        }))
    }

    async fn run_single(
        self,
        keyword: String,
        title: String,
        images: Vec<ImageAttachment>,
        tx: mpsc::UnboundedSender<ProgressEvent>,
        cancel: CancellationToken,
    ) {
        match self
            .run_single_job(&keyword, &title, &images, &tx, &cancel)
            .await
        {
            Ok(Some(done)) => {
                let _ = tx.send(done);
            }
            Ok(None) => {
                info!("single-article generation cancelled");
            }
            Err(e) => {
                warn!(keyword = %keyword, error = %e, "single-article generation failed");
                let msg = match &e {
                    GenerationError::Auth(_) => "API 키가 유효하지 않습니다.".to_string(),
                    GenerationError::RateLimited(_) => {
                        "API 요청 한도 초과. 잠시 후 재시도해주세요.".to_string()
                    }
                    other => format!("오류: {other}"),
                };
                let _ = tx.send(ProgressEvent::Error { msg });
            }
        }
    }

    async fn run_single_job(
        &self,
        keyword: &str,
        title: &str,
        images: &[ImageAttachment],
        tx: &mpsc::UnboundedSender<ProgressEvent>,
        cancel: &CancellationToken,
    ) -> Result<Option<ProgressEvent>> {
        send_step(tx, 1, "스타일 가이드 및 참고 글 로딩 중...");
        let style_guide = load_style_guide(&self.config.style_guide_path)?;
        let mut library = SampleLibrary::from_config(&self.config);
        let samples = library.select(keyword)?;
        if cancel.is_cancelled() {
            return Ok(None);
        }

        send_step(tx, 2, "네이버 검색 중...");
        let evidence = self.searcher.collect(keyword).await;
        if cancel.is_cancelled() {
            return Ok(None);
        }

        send_step(
            tx,
            3,
            format!("Claude API로 글 생성 중... (사진 {}장 분석)", images.len()),
        );
        let request = build_single_request(&style_guide, &samples, &evidence, keyword, title, images);
        let raw = self.generator.generate(&request).await?;
        if cancel.is_cancelled() {
            return Ok(None);
        }

        send_step(tx, 4, "결과 파싱 중...");
        let body = clean_invisible_chars(&extract_body(&raw));
        let title = clean_invisible_chars(title);
        let chars = char_count(&body);
        if cancel.is_cancelled() {
            return Ok(None);
        }

        send_step(tx, 5, "저장 중...");
        let record = self.store.save(keyword, &title, &body)?;

        info!(keyword = %keyword, filename = %record.filename, "article saved");

        Ok(Some(ProgressEvent::Done {
            title,
            body,
            char_count: chars,
            filename: record.filename,
            web_count: evidence.len(),
            image_count: images.len(),
        }))
    }
}

fn send_batch_step(
    tx: &mpsc::UnboundedSender<ProgressEvent>,
    ctx: &JobContext<'_>,
    step: u8,
    action: &str,
) {
    let _ = tx.send(ProgressEvent::Step {
        keyword: Some(ctx.keyword.to_string()),
        current: Some(ctx.current),
        total: Some(ctx.total),
        step,
        msg: format!(
            "[{}/{}] '{}' - {action}",
            ctx.current, ctx.total, ctx.keyword
        ),
    });
}

fn send_step(tx: &mpsc::UnboundedSender<ProgressEvent>, step: u8, msg: impl Into<String>) {
    let _ = tx.send(ProgressEvent::Step {
        keyword: None,
        current: None,
        total: None,
        step,
        msg: msg.into(),
    });
}

fn style_guide_error_msg(error: &GenerationError) -> String {
    let detail = match error {
        GenerationError::StyleGuide(source) => source.to_string(),
        other => other.to_string(),
    };
    format!("스타일 가이드 로딩 실패: {detail}")
}

/// Running generation task plus its event receiver.
///
/// Dropping the handle (or the stream made from it) cancels the worker;
/// the cancellation token guard fires on drop.
#[derive(Debug)]
pub struct PipelineHandle {
    events: ProgressReceiver,
    cancel: CancellationToken,
    worker: JoinHandle<()>,
    _cancel_guard: DropGuard,
}

impl PipelineHandle {
    /// Next event, or a synthetic heartbeat when the poll window
    /// passes with nothing to deliver.
    pub async fn next_or_heartbeat(&mut self) -> Option<ProgressEvent> {
        self.events.next_or_heartbeat().await
    }

    /// Next event, waiting as long as it takes. `None` once the worker
    /// is gone and the queue is drained.
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        self.events.recv().await
    }

    /// Ask the worker to stop at its next checkpoint.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the worker task has exited.
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Adapt the handle into an event stream that ends after the
    /// terminal event. The handle lives inside the stream, so dropping
    /// the stream cancels the worker.
    pub fn into_stream(self) -> impl Stream<Item = ProgressEvent> {
        stream! {
            let mut handle = self;
            loop {
                match handle.next_or_heartbeat().await {
                    Some(event) => {
                        let terminal = event.is_terminal();
                        yield event;
                        if terminal {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }
}

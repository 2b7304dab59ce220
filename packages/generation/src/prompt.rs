//! Prompt assembly for article generation.
//!
//! The system prompt carries the style guide and sample posts; the user
//! prompt carries the keyword, the web evidence digest, and the writing
//! rules. Single-article runs prepend the uploaded record images to the
//! user content, then ask for a body-only response since the title is
//! already fixed.

use crate::evidence::EvidenceItem;

/// Introduces the web evidence digest.
pub const EVIDENCE_HEADER: &str =
    "아래는 최신 웹 검색 결과입니다. 이 중 신뢰할 만한 정보를 활용하세요:\n\n";

/// Stands in for the digest when every surface came back empty.
pub const EVIDENCE_EMPTY: &str = "(웹 검색 결과가 없습니다. 일반적인 입시 지식을 활용하세요.)\n";

/// Introduces the sample post section of the system prompt.
pub const SAMPLE_HEADER: &str =
    "아래는 기존에 작성된 블로그 글의 예시입니다. 문체와 구조를 참고하세요:\n\n";

/// Separates the style guide from the sample section.
pub const SECTION_BANNER: &str = "═══════════════════════════════════════";

/// Writing rules for keyword-only generation. The model invents the
/// title, so the output format asks for both sections.
const BATCH_RULES: &str = r#"작성 규칙:
1. 반드시 4단계 구조를 따르세요: 도입/공감(10%) → 정보/분석(35%) → 결핍 만들기(40%) → CTA/마무리(15%)
2. 본문 약 2000~2600자 (공백 포함, 빈 줄 제외) 분량으로 작성
3. 웹 검색에서 얻은 최신 정보(2025~2026년)를 자연스럽게 반영
4. 제목은 "키워드, 호기심 유발 문구" 패턴으로 작성 (제목 끝에 "..."을 자주 붙임)
5. 네이버 블로그에 바로 붙여넣기 할 수 있도록 순수 텍스트로 작성 (마크다운 금지)
6. 글 끝에 생기부 연구소 CTA 블록을 반드시 포함
7. 문단은 1~3문장으로 짧게 끊고, 문단 사이에 빈 줄을 넣으세요 (평균 18.5개 문단)
8. 격식체(-합니다, -입니다) 위주로 작성하세요
9. 한 문장은 50자 이내로 짧게 작성
10. 3단계 '결핍 만들기'에서는 합격생 생기부를 모르면 불합격한다는 긴박감을 조성하고, 생기부 자료집이 그 해답임을 자연스럽게 연결하세요
11. 마무리 인사: '감사합니다. 대학 심사관 출신들과 서울대 출신 연구진들의, 생기부 연구소였습니다.'
12. 이모지/이모티콘 사용 금지, AI가 쓴 티가 나는 기계적 전환 표현 금지
"#;

const TITLED_OUTPUT_FORMAT: &str = "출력 형식:\n[제목]\n(제목만 한 줄)\n\n[본문]\n(본문 전체)\n";

const BODY_OUTPUT_FORMAT: &str = "출력 형식:\n[본문]\n(본문 전체)\n";

/// Writing rules for record-image generation. The title is fixed by the
/// operator and the record photos feed the analysis section.
fn single_rules(title: &str) -> String {
    format!(
        r#"작성 규칙:
1. 반드시 4단계 구조를 따르세요: 도입/공감(10%) → 정보/분석(35%) → 결핍 만들기(40%) → CTA/마무리(15%)
2. 본문 약 2000~2600자 (공백 포함, 빈 줄 제외) 분량으로 작성
3. 웹 검색에서 얻은 최신 정보(2025~2026년)를 자연스럽게 반영
4. 제목은 반드시 "{title}"을 그대로 사용하세요
5. 사진 속 세특 내용(과목, 활동, 탐구 주제, 선생님 코멘트 등)을 2단계 정보/분석 파트에서 구체적으로 인용하고 분석하세요
6. 네이버 블로그에 바로 붙여넣기 할 수 있도록 순수 텍스트로 작성 (마크다운 금지)
7. 글 끝에 생기부 연구소 CTA 블록을 반드시 포함
8. 문단은 1~3문장으로 짧게 끊고, 문단 사이에 빈 줄을 넣으세요 (평균 18.5개 문단)
9. 격식체(-합니다, -입니다) 위주로 작성하세요
10. 한 문장은 50자 이내로 짧게 작성
11. 3단계 '결핍 만들기'에서는 합격생 생기부를 모르면 불합격한다는 긴박감을 조성하고, 생기부 자료집이 그 해답임을 자연스럽게 연결하세요
12. 마무리 인사: '감사합니다. 대학 심사관 출신들과 서울대 출신 연구진들의, 생기부 연구소였습니다.'
13. 이모지/이모티콘 사용 금지, AI가 쓴 티가 나는 기계적 전환 표현 금지
"#
    )
}

/// Uploaded image, raw bytes plus MIME type. Encoding happens at the
/// service boundary.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub media_type: String,
    pub data: Vec<u8>,
}

/// One block of user content.
#[derive(Debug, Clone)]
pub enum RequestContent {
    Text(String),
    Image(ImageAttachment),
}

/// Assembled request for the text generator.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Style guide plus sample section
    pub system: String,

    /// User content blocks; images precede the request text
    pub content: Vec<RequestContent>,
}

impl GenerationRequest {
    /// The text blocks of the user content, concatenated.
    pub fn user_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                RequestContent::Text(text) => Some(text.as_str()),
                RequestContent::Image(_) => None,
            })
            .collect()
    }

    /// How many image blocks the request carries.
    pub fn image_count(&self) -> usize {
        self.content
            .iter()
            .filter(|block| matches!(block, RequestContent::Image(_)))
            .count()
    }
}

/// Render collected evidence as a numbered digest.
pub fn format_evidence(items: &[EvidenceItem]) -> String {
    if items.is_empty() {
        return EVIDENCE_EMPTY.to_string();
    }
    let mut out = EVIDENCE_HEADER.to_string();
    for (i, item) in items.iter().enumerate() {
        out.push_str(&format!("[{}] {}\n{}\n\n", i + 1, item.title, item.snippet));
    }
    out
}

/// Render sample posts as a numbered example section.
pub fn format_samples(samples: &[String]) -> String {
    if samples.is_empty() {
        return String::new();
    }
    let mut out = SAMPLE_HEADER.to_string();
    for (i, sample) in samples.iter().enumerate() {
        out.push_str(&format!("--- 예시 {} ---\n{}\n\n", i + 1, sample));
    }
    out
}

/// System prompt: style guide, banner, sample section.
pub fn build_system_prompt(style_guide: &str, samples: &[String]) -> String {
    format!(
        "{style_guide}\n\n{SECTION_BANNER}\n[참고 예시 글]\n{SECTION_BANNER}\n{}",
        format_samples(samples)
    )
}

/// Request for keyword-only generation.
pub fn build_batch_request(
    style_guide: &str,
    samples: &[String],
    evidence: &[EvidenceItem],
    keyword: &str,
) -> GenerationRequest {
    let web_info = format_evidence(evidence);
    let user = format!(
        "키워드: \"{keyword}\"\n\n{web_info}\n위 키워드로 블로그 글을 작성해주세요.\n\n{BATCH_RULES}\n{TITLED_OUTPUT_FORMAT}"
    );

    GenerationRequest {
        system: build_system_prompt(style_guide, samples),
        content: vec![RequestContent::Text(user)],
    }
}

/// Request for record-image generation with a fixed title.
pub fn build_single_request(
    style_guide: &str,
    samples: &[String],
    evidence: &[EvidenceItem],
    keyword: &str,
    title: &str,
    images: &[ImageAttachment],
) -> GenerationRequest {
    let web_info = format_evidence(evidence);
    let rules = single_rules(title);
    let user = format!(
        "키워드: \"{keyword}\"\n제목: \"{title}\"\n\n위 사진들은 실제 합격생의 세부특기사항(세특) 이미지입니다.\n사진 속 세특 내용을 꼼꼼히 읽고, 이를 바탕으로 블로그 글을 작성해주세요.\n\n{web_info}\n{rules}\n{BODY_OUTPUT_FORMAT}"
    );

    let mut content: Vec<RequestContent> =
        images.iter().cloned().map(RequestContent::Image).collect();
    content.push(RequestContent::Text(user));

    GenerationRequest {
        system: build_system_prompt(style_guide, samples),
        content,
    }
}

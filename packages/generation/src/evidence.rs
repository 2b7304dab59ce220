//! Web evidence collection from Naver search.
//!
//! Three verticals are scraped in a fixed order: the blog/cafe VIEW tab,
//! the news tab, and, only when those two come back thin, the integrated
//! results page. Collection is best-effort end to end: a failed surface
//! is logged and skipped, and an empty result set is a valid outcome the
//! prompt layer knows how to phrase.
//!
//! No JavaScript rendering; the mobile-free HTML Naver serves to plain
//! browser user agents is enough for titles and preview snippets.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::traits::EvidenceSearcher;

const SEARCH_URL: &str = "https://search.naver.com/search.naver";

/// Browser-like User-Agent to avoid bot detection
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Below this many combined items the integrated fallback runs too.
const MIN_COMBINED_RESULTS: usize = 3;

/// Which search vertical produced an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    /// Blog/cafe VIEW tab
    Community,
    /// News tab
    News,
    /// Integrated results fallback
    Integrated,
}

/// One piece of web evidence fed into a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub title: String,
    pub snippet: String,
    pub surface: Surface,
}

/// Naver search scraper.
pub struct NaverSearch {
    client: reqwest::Client,
    base_url: String,
    num_results: usize,
}

impl NaverSearch {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: SEARCH_URL.to_string(),
            num_results: 8,
        }
    }

    /// Set a custom search URL (for proxies, test servers, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set how many items a collection aims for.
    pub fn with_num_results(mut self, num_results: usize) -> Self {
        self.num_results = num_results;
        self
    }

    /// Fetch one search page. Naver serves an error page rather than an
    /// error status for throttled queries, so the body is returned as-is
    /// and the parsers simply find nothing in it.
    async fn fetch(&self, params: &[(&str, &str)]) -> reqwest::Result<String> {
        let response = self.client.get(&self.base_url).query(params).send().await?;
        response.text().await
    }
}

impl Default for NaverSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EvidenceSearcher for NaverSearch {
    async fn collect(&self, keyword: &str) -> Vec<EvidenceItem> {
        let mut results = Vec::new();

        let query = format!("{keyword} 입시 2025 2026");
        match self
            .fetch(&[("where", "view"), ("query", &query), ("sm", "tab_jum")])
            .await
        {
            Ok(html) => collect_community(&html, self.num_results, &mut results),
            Err(e) => warn!(error = %e, keyword = %keyword, "community surface search failed"),
        }

        let query = format!("{keyword} 입시 2025");
        match self.fetch(&[("where", "news"), ("query", &query)]).await {
            Ok(html) => collect_news(&html, self.num_results + 3, &mut results),
            Err(e) => warn!(error = %e, keyword = %keyword, "news surface search failed"),
        }

        if results.len() < MIN_COMBINED_RESULTS {
            let query = format!("{keyword} 대입 2026");
            match self.fetch(&[("where", "nexearch"), ("query", &query)]).await {
                Ok(html) => collect_integrated(&html, self.num_results, &mut results),
                Err(e) => warn!(error = %e, keyword = %keyword, "integrated surface search failed"),
            }
        }

        info!(keyword = %keyword, count = results.len(), "web evidence collected");
        results
    }
}

/// Blog and cafe links from the VIEW tab. Anchors of 15 characters or
/// fewer are navigation chrome, not post titles.
fn collect_community(html: &str, cap: usize, results: &mut Vec<EvidenceItem>) {
    let document = Html::parse_document(html);
    let selector =
        match Selector::parse(r#"a[href*="blog.naver.com"], a[href*="post.naver.com"]"#) {
            Ok(s) => s,
            Err(_) => return,
        };

    for anchor in document.select(&selector) {
        if results.len() >= cap {
            break;
        }
        let title = element_text(&anchor);
        if title.chars().count() <= 15 {
            continue;
        }
        if results.iter().any(|item| item.title == title) {
            continue;
        }
        let snippet = community_snippet(&anchor);
        results.push(EvidenceItem {
            title,
            snippet,
            surface: Surface::Community,
        });
    }
}

/// News headlines, tagged so the prompt can tell them apart from posts.
/// The news cap is looser than the community one; headlines are short
/// and cheap context.
fn collect_news(html: &str, cap: usize, results: &mut Vec<EvidenceItem>) {
    let document = Html::parse_document(html);
    let anchor_selector = match Selector::parse("a.news_tit") {
        Ok(s) => s,
        Err(_) => return,
    };
    let desc_selector = match Selector::parse(".news_dsc, .dsc_wrap, .api_txt_lines.dsc_txt") {
        Ok(s) => s,
        Err(_) => return,
    };

    for anchor in document.select(&anchor_selector) {
        let title = element_text(&anchor);
        if title.chars().count() <= 10 {
            continue;
        }
        let tagged = format!("[뉴스] {title}");
        if !results.iter().any(|item| item.title == tagged) {
            let snippet = news_snippet(&anchor, &desc_selector);
            results.push(EvidenceItem {
                title: tagged,
                snippet,
                surface: Surface::News,
            });
        }
        if results.len() >= cap {
            break;
        }
    }
}

/// Integrated-search fallback: any anchor whose href looks like a
/// content link.
fn collect_integrated(html: &str, cap: usize, results: &mut Vec<EvidenceItem>) {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("a") {
        Ok(s) => s,
        Err(_) => return,
    };

    for anchor in document.select(&selector) {
        let href = anchor.value().attr("href").unwrap_or("");
        let content_link =
            href.contains("blog") || href.contains("news") || href.contains("post");
        let title = element_text(&anchor);
        if content_link && title.chars().count() > 15 {
            if !results.iter().any(|item| item.title == title) {
                results.push(EvidenceItem {
                    title,
                    snippet: String::new(),
                    surface: Surface::Integrated,
                });
            }
            if results.len() >= cap {
                break;
            }
        }
    }
}

/// Preview text near a VIEW anchor. The result card puts the title and
/// preview in sibling nodes two levels up; joining the card's text
/// fragments with pipes and taking the second long segment lands on the
/// preview.
fn community_snippet(anchor: &ElementRef) -> String {
    let container = anchor
        .parent()
        .and_then(ElementRef::wrap)
        .and_then(|parent| parent.parent())
        .and_then(ElementRef::wrap);
    let container = match container {
        Some(container) => container,
        None => return String::new(),
    };

    let joined = container
        .text()
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect::<Vec<_>>()
        .join("|");
    let segments: Vec<&str> = joined
        .split('|')
        .map(str::trim)
        .filter(|segment| segment.chars().count() > 20)
        .collect();

    match segments.get(1) {
        Some(segment) => segment.chars().take(200).collect(),
        None => String::new(),
    }
}

/// Description text for a news headline, looked up inside the nearest
/// enclosing result container.
fn news_snippet(anchor: &ElementRef, desc_selector: &Selector) -> String {
    let container = ancestor_element(anchor, "div").or_else(|| ancestor_element(anchor, "li"));
    let container = match container {
        Some(container) => container,
        None => return String::new(),
    };

    container
        .select(desc_selector)
        .next()
        .map(|desc| element_text(&desc).chars().take(200).collect::<String>())
        .unwrap_or_default()
}

/// Nearest enclosing element with the given tag name.
fn ancestor_element<'a>(el: &ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|candidate| candidate.value().name() == name)
}

fn element_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

//! Flat-file persistence for generated articles.
//!
//! Every article is one UTF-8 text file: a three-line metadata header,
//! a dashed separator, then the body. The same layout is used by the
//! crawler for sample posts, so corpus loading shares the separator.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;

use chrono::Local;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;

/// Line separating the metadata header from the body in stored files.
pub(crate) const HEADER_SEPARATOR: &str =
    "--------------------------------------------------";

/// Characters that are unsafe in filenames on common filesystems.
static FORBIDDEN_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/:*?"<>|]"#).unwrap());

/// Handle to one saved article file.
#[derive(Debug, Clone)]
pub struct OutputRecord {
    pub filename: String,
    pub path: PathBuf,
}

/// Header fields of a stored article, for history listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputSummary {
    pub filename: String,
    pub title: String,
    pub keyword: String,
    pub created: String,
}

/// Flat-file article store.
///
/// Filenames carry the sanitized keyword, a wall-clock timestamp, and a
/// store-wide sequence number, so saves landing in the same second never
/// collide while staying recognizable in a file browser.
pub struct OutputStore {
    dir: PathBuf,
    seq: AtomicU64,
}

impl OutputStore {
    /// Open the output directory, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            seq: AtomicU64::new(0),
        })
    }

    /// Where articles are written.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist one article and return its filename.
    pub fn save(&self, keyword: &str, title: &str, body: &str) -> Result<OutputRecord> {
        let now = Local::now();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let filename = format!(
            "{}_{}_{:02}.txt",
            sanitize_keyword(keyword),
            now.format("%Y%m%d_%H%M%S"),
            seq
        );
        let path = self.dir.join(&filename);

        let content = format!(
            "제목: {title}\n키워드: {keyword}\n생성일: {}\n{HEADER_SEPARATOR}\n\n{body}",
            now.format("%Y-%m-%d %H:%M:%S")
        );
        fs::write(&path, content)?;

        info!(filename = %filename, chars = body.chars().count(), "article saved");
        Ok(OutputRecord { filename, path })
    }

    /// Stored articles, newest first.
    ///
    /// Only the metadata header of each file is read. Unreadable files
    /// and files without any header fields are skipped silently.
    pub fn list(&self) -> Result<Vec<OutputSummary>> {
        let mut names: Vec<String> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".txt"))
            .collect();
        names.sort_by(|a, b| b.cmp(a));

        let mut summaries = Vec::with_capacity(names.len());
        for name in names {
            match self.read_header(&name) {
                Some(summary) => summaries.push(summary),
                None => debug!(filename = %name, "unreadable article skipped"),
            }
        }
        Ok(summaries)
    }

    /// Parse the metadata header of one stored file. Reading stops at the
    /// separator line; the body is never loaded.
    fn read_header(&self, filename: &str) -> Option<OutputSummary> {
        let file = fs::File::open(self.dir.join(filename)).ok()?;
        let reader = BufReader::new(file);

        let mut title = String::new();
        let mut keyword = String::new();
        let mut created = String::new();

        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(_) => break,
            };
            let line = line.trim();
            if let Some(rest) = line.strip_prefix("제목:") {
                title = rest.trim().to_string();
            } else if let Some(rest) = line.strip_prefix("키워드:") {
                keyword = rest.trim().to_string();
            } else if let Some(rest) = line.strip_prefix("생성일:") {
                created = rest.trim().to_string();
            } else if line.starts_with("---") {
                break;
            }
        }

        if title.is_empty() && keyword.is_empty() && created.is_empty() {
            return None;
        }

        Some(OutputSummary {
            filename: filename.to_string(),
            title,
            keyword,
            created,
        })
    }
}

/// Strip characters that are unsafe in filenames.
fn sanitize_keyword(keyword: &str) -> String {
    FORBIDDEN_FILENAME_CHARS
        .replace_all(keyword, "")
        .into_owned()
}

//! Style guide and sample post loading.
//!
//! Sample posts live in flat directories written by the crawler, one
//! `.txt` per post, filenames shaped `NNNN_<title>.txt`. Selection ranks
//! titles against the requested keyword and falls back to a random draw
//! when nothing matches, so the prompt always carries style references.

use std::cmp::Reverse;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::PipelineConfig;
use crate::error::{GenerationError, Result};
use crate::output::HEADER_SEPARATOR;

/// Load the writing style guide.
///
/// A missing or unreadable guide is fatal for any run that needs it.
pub fn load_style_guide(path: &Path) -> Result<String> {
    let guide = fs::read_to_string(path).map_err(GenerationError::StyleGuide)?;
    debug!(path = %path.display(), chars = guide.chars().count(), "style guide loaded");
    Ok(guide)
}

/// Keyword-ranked access to the sample post directories.
pub struct SampleLibrary {
    dirs: Vec<PathBuf>,
    sample_count: usize,
    max_body_chars: usize,
    rng: fastrand::Rng,
}

impl SampleLibrary {
    /// Library over the given directories with default limits.
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self {
            dirs,
            sample_count: 3,
            max_body_chars: 4000,
            rng: fastrand::Rng::new(),
        }
    }

    /// Library configured from pipeline settings.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let rng = match config.sample_seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self {
            dirs: config.sample_dirs.clone(),
            sample_count: config.sample_count,
            max_body_chars: config.sample_max_chars,
            rng,
        }
    }

    /// Set how many samples one selection returns.
    pub fn with_sample_count(mut self, count: usize) -> Self {
        self.sample_count = count;
        self
    }

    /// Set the body length cap applied before truncation.
    pub fn with_max_body_chars(mut self, max: usize) -> Self {
        self.max_body_chars = max;
        self
    }

    /// Pin the fallback draw to a fixed seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = fastrand::Rng::with_seed(seed);
        self
    }

    /// Pick sample bodies for a keyword.
    ///
    /// Titles are scored against the keyword; ties keep directory order.
    /// When no title matches at all, a random draw keeps the prompt
    /// populated. An empty corpus yields an empty selection.
    pub fn select(&mut self, keyword: &str) -> Result<Vec<String>> {
        let files = self.enumerate();
        if files.is_empty() {
            debug!(keyword = %keyword, "sample corpus is empty");
            return Ok(Vec::new());
        }

        let mut ranked: Vec<(u32, usize)> = Vec::new();
        for (index, (_, name)) in files.iter().enumerate() {
            let score = score_fragment(&title_fragment(name), keyword);
            if score > 0 {
                ranked.push((score, index));
            }
        }
        ranked.sort_by_key(|(score, _)| Reverse(*score));

        let matched = !ranked.is_empty();
        let picked: Vec<usize> = if matched {
            ranked
                .into_iter()
                .take(self.sample_count)
                .map(|(_, index)| index)
                .collect()
        } else {
            let mut indices: Vec<usize> = (0..files.len()).collect();
            self.rng.shuffle(&mut indices);
            indices.truncate(self.sample_count.min(files.len()));
            indices
        };

        let mut samples = Vec::with_capacity(picked.len());
        for index in &picked {
            let (dir, name) = &files[*index];
            let text = fs::read_to_string(dir.join(name))?;
            samples.push(self.prepare_body(&text));
        }

        debug!(
            keyword = %keyword,
            selected = samples.len(),
            matched,
            "samples selected"
        );
        Ok(samples)
    }

    /// All sample filenames across the directories, sorted per directory.
    /// Missing directories are skipped.
    fn enumerate(&self) -> Vec<(PathBuf, String)> {
        let mut files = Vec::new();
        for dir in &self.dirs {
            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(_) => {
                    debug!(dir = %dir.display(), "sample directory missing, skipped");
                    continue;
                }
            };
            let mut names: Vec<String> = entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .filter(|name| name.ends_with(".txt"))
                .collect();
            names.sort();
            files.extend(names.into_iter().map(|name| (dir.clone(), name)));
        }
        files
    }

    /// Strip the crawler header and cap the body length.
    fn prepare_body(&self, text: &str) -> String {
        let body = match text.split_once(HEADER_SEPARATOR) {
            Some((_, rest)) => rest.trim().to_string(),
            None => text.to_string(),
        };
        if body.chars().count() > self.max_body_chars {
            let kept: String = body.chars().take(self.max_body_chars).collect();
            format!("{kept}\n...(이하 생략)")
        } else {
            body
        }
    }
}

/// Title fragment of a sample filename: the stem minus the `NNNN_` prefix.
fn title_fragment(filename: &str) -> String {
    let stem = filename.strip_suffix(".txt").unwrap_or(filename);
    stem.chars().skip(5).collect()
}

/// Keyword affinity of a title fragment: 2 points per keyword token it
/// contains, 3 more when the whole keyword appears verbatim.
fn score_fragment(fragment: &str, keyword: &str) -> u32 {
    let mut score = 0;
    for token in keyword.split_whitespace() {
        if fragment.contains(token) {
            score += 2;
        }
    }
    if fragment.contains(keyword) {
        score += 3;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_sample(dir: &Path, name: &str, body: &str) {
        let mut file = fs::File::create(dir.join(name)).unwrap();
        write!(
            file,
            "제목: t\n키워드: k\n생성일: d\n{HEADER_SEPARATOR}\n\n{body}"
        )
        .unwrap();
    }

    #[test]
    fn test_title_fragment_skips_index_prefix() {
        assert_eq!(title_fragment("0001_수학 세특 관리법.txt"), "수학 세특 관리법");
        assert_eq!(title_fragment("0042_생기부.txt"), "생기부");
    }

    #[test]
    fn test_score_fragment() {
        // one token hit
        assert_eq!(score_fragment("수학 공부법 정리", "수학 내신"), 2);
        // both tokens plus the verbatim phrase
        assert_eq!(score_fragment("수학 내신 대비", "수학 내신"), 7);
        // no hits
        assert_eq!(score_fragment("영어 독해", "수학"), 0);
    }

    #[test]
    fn test_select_prefers_matching_titles() {
        let dir = tempfile::tempdir().unwrap();
        write_sample(dir.path(), "0001_영어 공부법.txt", "영어 본문");
        write_sample(dir.path(), "0002_수학 세특 정리.txt", "수학 본문");
        write_sample(dir.path(), "0003_과학 실험.txt", "과학 본문");

        let mut library =
            SampleLibrary::new(vec![dir.path().to_path_buf()]).with_sample_count(1);
        let samples = library.select("수학 세특").unwrap();

        assert_eq!(samples, vec!["수학 본문".to_string()]);
    }

    #[test]
    fn test_select_tie_keeps_directory_order() {
        let dir = tempfile::tempdir().unwrap();
        write_sample(dir.path(), "0002_수학 공부.txt", "둘째");
        write_sample(dir.path(), "0001_수학 정리.txt", "첫째");

        let mut library =
            SampleLibrary::new(vec![dir.path().to_path_buf()]).with_sample_count(2);
        let samples = library.select("수학").unwrap();

        // equal scores, sorted filenames decide
        assert_eq!(samples, vec!["첫째".to_string(), "둘째".to_string()]);
    }

    #[test]
    fn test_select_fallback_is_seed_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..8 {
            write_sample(dir.path(), &format!("000{i}_제목 {i}.txt"), &format!("본문 {i}"));
        }

        let pick = |seed: u64| {
            let mut library = SampleLibrary::new(vec![dir.path().to_path_buf()])
                .with_sample_count(3)
                .with_seed(seed);
            library.select("매칭되지않는키워드").unwrap()
        };

        assert_eq!(pick(7), pick(7));
        assert_eq!(pick(7).len(), 3);
    }

    #[test]
    fn test_select_empty_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = SampleLibrary::new(vec![dir.path().to_path_buf()]);
        assert!(library.select("수학").unwrap().is_empty());
    }

    #[test]
    fn test_select_skips_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_sample(dir.path(), "0001_수학.txt", "본문");

        let mut library = SampleLibrary::new(vec![
            PathBuf::from("/nonexistent/samples"),
            dir.path().to_path_buf(),
        ]);
        let samples = library.select("수학").unwrap();

        assert_eq!(samples, vec!["본문".to_string()]);
    }

    #[test]
    fn test_prepare_body_without_header_keeps_whole_text() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("0001_수학.txt"), "헤더 없는 전체 텍스트").unwrap();

        let mut library = SampleLibrary::new(vec![dir.path().to_path_buf()]);
        let samples = library.select("수학").unwrap();

        assert_eq!(samples, vec!["헤더 없는 전체 텍스트".to_string()]);
    }

    #[test]
    fn test_prepare_body_truncates_long_samples() {
        let dir = tempfile::tempdir().unwrap();
        write_sample(dir.path(), "0001_수학.txt", &"가".repeat(50));

        let mut library = SampleLibrary::new(vec![dir.path().to_path_buf()])
            .with_max_body_chars(10);
        let samples = library.select("수학").unwrap();

        assert_eq!(samples[0], format!("{}\n...(이하 생략)", "가".repeat(10)));
    }

    #[test]
    fn test_ignores_non_txt_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.md"), "md 파일").unwrap();
        write_sample(dir.path(), "0001_수학.txt", "본문");

        let mut library = SampleLibrary::new(vec![dir.path().to_path_buf()]);
        assert_eq!(library.select("수학").unwrap().len(), 1);
    }
}

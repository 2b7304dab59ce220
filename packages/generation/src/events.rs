//! Progress events streamed by generation workers.
//!
//! Every phase transition inside a worker produces one event. Events are
//! tagged for wire serialization so an embedding app can forward them to
//! a browser as-is (e.g. over SSE).

use serde::{Deserialize, Serialize};

/// Message shown to the user while a quiet poll window passes.
pub const HEARTBEAT_MSG: &str = "처리 중...";

/// One progress event from a generation worker.
///
/// Batch runs emit `keyword_start` / `step` / `keyword_done` /
/// `keyword_error` per keyword and close with `all_done`. Single-article
/// runs emit bare `step` events and close with `done` or `error`.
/// `heartbeat` is synthesized on the consumer side, never by a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// A keyword job entered its first phase
    KeywordStart {
        keyword: String,
        current: usize,
        total: usize,
        step: u8,
        msg: String,
    },

    /// A job moved to a later phase
    Step {
        #[serde(skip_serializing_if = "Option::is_none")]
        keyword: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        current: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        total: Option<usize>,
        step: u8,
        msg: String,
    },

    /// A keyword job finished and its article was persisted
    KeywordDone {
        keyword: String,
        current: usize,
        total: usize,
        title: String,
        body: String,
        char_count: usize,
        filename: String,
        web_count: usize,
    },

    /// A keyword job failed; the batch may still continue
    KeywordError {
        keyword: String,
        current: usize,
        total: usize,
        msg: String,
    },

    /// Every keyword in the batch was attempted
    AllDone { total: usize },

    /// A single-article run finished
    Done {
        title: String,
        body: String,
        char_count: usize,
        filename: String,
        web_count: usize,
        image_count: usize,
    },

    /// A run ended without producing an article
    Error { msg: String },

    /// Synthetic keep-alive for quiet poll windows
    Heartbeat { msg: String },
}

impl ProgressEvent {
    /// Synthetic keep-alive event.
    pub fn heartbeat() -> Self {
        ProgressEvent::Heartbeat {
            msg: HEARTBEAT_MSG.to_string(),
        }
    }

    /// Whether a consumer should stop relaying after this event.
    ///
    /// `keyword_error` is not terminal: the batch keeps going after a
    /// recoverable per-keyword failure.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::AllDone { .. } | ProgressEvent::Done { .. } | ProgressEvent::Error { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_tags() {
        let start = ProgressEvent::KeywordStart {
            keyword: "수학 세특".into(),
            current: 1,
            total: 3,
            step: 1,
            msg: "[1/3] '수학 세특' - 참고 글 로딩 중...".into(),
        };
        let json = serde_json::to_value(&start).unwrap();
        assert_eq!(json["type"], "keyword_start");
        assert_eq!(json["current"], 1);

        let all_done = serde_json::to_value(ProgressEvent::AllDone { total: 3 }).unwrap();
        assert_eq!(all_done["type"], "all_done");
    }

    #[test]
    fn test_bare_step_omits_batch_fields() {
        let step = ProgressEvent::Step {
            keyword: None,
            current: None,
            total: None,
            step: 2,
            msg: "네이버 검색 중...".into(),
        };
        let json = serde_json::to_value(&step).unwrap();

        assert_eq!(json["type"], "step");
        assert_eq!(json["step"], 2);
        assert!(json.get("keyword").is_none());
        assert!(json.get("current").is_none());
    }

    #[test]
    fn test_terminal_events() {
        assert!(ProgressEvent::AllDone { total: 1 }.is_terminal());
        assert!(ProgressEvent::Error { msg: "x".into() }.is_terminal());
        assert!(ProgressEvent::Done {
            title: "t".into(),
            body: "b".into(),
            char_count: 1,
            filename: "f.txt".into(),
            web_count: 0,
            image_count: 1,
        }
        .is_terminal());

        assert!(!ProgressEvent::KeywordError {
            keyword: "k".into(),
            current: 1,
            total: 2,
            msg: "m".into(),
        }
        .is_terminal());
        assert!(!ProgressEvent::heartbeat().is_terminal());
    }

    #[test]
    fn test_heartbeat_message() {
        match ProgressEvent::heartbeat() {
            ProgressEvent::Heartbeat { msg } => assert_eq!(msg, "처리 중..."),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_round_trip() {
        let done = ProgressEvent::KeywordDone {
            keyword: "생기부".into(),
            current: 2,
            total: 2,
            title: "생기부, 지금 확인해야 하는 이유...".into(),
            body: "본문".into(),
            char_count: 2,
            filename: "생기부_20250101_120000_00.txt".into(),
            web_count: 5,
        };
        let json = serde_json::to_string(&done).unwrap();
        let back: ProgressEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, done);
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::review::parser::ParseOutcome;
use crate::review::scoring::SentimentBreakdown;
use crate::review::tags::TagSummary;

/// Sentiment literal the model is instructed to emit for a favourable review.
pub const POSITIVE: &str = "Positive";
/// Sentiment literal the model is instructed to emit for an unfavourable review.
pub const NEGATIVE: &str = "Negative";

/// One parsed (sentiment, keywords, tags) triple from a single model-output line.
/// Values are kept verbatim; `sentiment` is not validated at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub sentiment: String,
    pub keywords: String,
    pub tags: String,
}

/// Where a session is on its submission budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPhase {
    Idle,
    Collecting,
    Limited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisPhase {
    NoAnalysis,
    Analyzing,
    Analyzed,
    Failed,
}

/// Non-halting, user-visible message attached to a successful report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub code: String,
    pub message: String,
}

impl Notice {
    pub fn insufficient_tags() -> Self {
        Self {
            code: "INSUFFICIENT_TAGS".to_string(),
            message: "Not enough tags to build a word cloud".to_string(),
        }
    }
}

/// Everything one analyze run produces: the table, the score, and the word-cloud input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub review_count: usize,
    pub raw_response: String,
    pub records: Vec<AnalysisRecord>,
    pub irrelevant_lines: usize,
    pub malformed_lines: usize,
    pub breakdown: SentimentBreakdown,
    /// 0.00 – 5.00
    pub score: f64,
    /// `None` when no tag survived filtering; see `notices`.
    pub tags: Option<TagSummary>,
    pub notices: Vec<Notice>,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisReport {
    pub fn new(
        review_count: usize,
        raw_response: String,
        outcome: ParseOutcome,
        breakdown: SentimentBreakdown,
        score: f64,
        tags: Option<TagSummary>,
    ) -> Self {
        let notices = match tags {
            Some(_) => vec![],
            None => vec![Notice::insufficient_tags()],
        };
        Self {
            review_count,
            raw_response,
            records: outcome.records,
            irrelevant_lines: outcome.irrelevant_lines,
            malformed_lines: outcome.malformed_lines,
            breakdown,
            score,
            tags,
            notices,
            analyzed_at: Utc::now(),
        }
    }
}

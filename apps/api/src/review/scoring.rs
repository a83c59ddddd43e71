use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::review::models::{AnalysisRecord, NEGATIVE, POSITIVE};

/// Upper bound of the satisfaction score.
pub const MAX_SCORE: f64 = 5.0;

/// Counts of each sentiment value across a record set.
/// Anything other than the two known literals lands in `other`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentBreakdown {
    pub positive: usize,
    pub negative: usize,
    pub other: usize,
    pub total: usize,
    /// 0.0 when `total` is 0.
    pub positive_ratio: f64,
    pub negative_ratio: f64,
}

impl SentimentBreakdown {
    pub fn from_records(records: &[AnalysisRecord]) -> Self {
        let mut acc = records.iter().fold(Self::default(), |mut acc, r| {
            match r.sentiment.as_str() {
                POSITIVE => acc.positive += 1,
                NEGATIVE => acc.negative += 1,
                _ => acc.other += 1,
            }
            acc.total += 1;
            acc
        });
        if acc.total > 0 {
            acc.positive_ratio = acc.positive as f64 / acc.total as f64;
            acc.negative_ratio = acc.negative as f64 / acc.total as f64;
        }
        acc
    }
}

/// Satisfaction score: share of "Positive" records scaled to 0–5, rounded to 2 decimals.
/// Fails with `NoData` on an empty record set.
pub fn satisfaction_score(records: &[AnalysisRecord]) -> Result<f64, AppError> {
    if records.is_empty() {
        return Err(AppError::NoData);
    }
    let breakdown = SentimentBreakdown::from_records(records);
    Ok(round2(breakdown.positive_ratio * MAX_SCORE))
}

/// Two decimals, ties to even: 0.625 → 0.62, 3.125 → 3.12.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

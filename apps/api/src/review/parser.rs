//! Response parser — turns the model's line-oriented reply into `AnalysisRecord`s.
//!
//! Expected line shapes:
//!   `<n>. Sentiment: <value> | Keywords: <value> | Tags: <value>`
//!   `<n>. Irrelevant`
//!
//! The parser is lenient: any line that doesn't fit is dropped without an error. Only the
//! counts of dropped lines are kept, for diagnostics.

use serde::{Deserialize, Serialize};

use crate::review::models::AnalysisRecord;

/// Case-sensitive marker the prompt asks the model to emit for unrelated reviews.
const IRRELEVANT_MARKER: &str = "Irrelevant";
const FIELD_SEPARATOR: char = '|';
const FIELD_COUNT: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOutcome {
    pub records: Vec<AnalysisRecord>,
    pub irrelevant_lines: usize,
    /// Non-blank lines without exactly three `|`-separated fields.
    pub malformed_lines: usize,
}

pub fn parse_response(raw: &str) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();

    for line in raw.trim().split('\n') {
        if line.contains(IRRELEVANT_MARKER) {
            outcome.irrelevant_lines += 1;
            continue;
        }

        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        if fields.len() != FIELD_COUNT {
            if !line.trim().is_empty() {
                outcome.malformed_lines += 1;
            }
            continue;
        }

        outcome.records.push(AnalysisRecord {
            sentiment: field_value(fields[0]),
            keywords: field_value(fields[1]),
            tags: field_value(fields[2]),
        });
    }

    outcome
}

/// `"1. Sentiment: Positive "` → `"Positive"`. Splits on the first colon only, so values
/// may themselves contain colons. A field with no colon is taken whole.
fn field_value(field: &str) -> String {
    field
        .split_once(':')
        .map_or(field, |(_, value)| value)
        .trim()
        .to_string()
}

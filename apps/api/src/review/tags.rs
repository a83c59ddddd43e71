//! Tag summarizer — frequency table and word-cloud text for the tags column.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::review::models::AnalysisRecord;

/// Tags shorter than this many characters (after trimming) are discarded.
const MIN_TAG_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagSummary {
    /// Tags in order of first appearance.
    pub frequencies: Vec<TagCount>,
    /// Each tag repeated `count` times, space separated. Input for word-cloud weighting.
    pub blob: String,
}

#[cfg(test)]
impl TagSummary {
    pub fn count_of(&self, tag: &str) -> Option<usize> {
        self.frequencies
            .iter()
            .find(|t| t.tag == tag)
            .map(|t| t.count)
    }
}

/// Splits one tags field on commas, trims each piece, and drops pieces under two characters.
pub fn split_tags(field: &str) -> impl Iterator<Item = &str> {
    field
        .split(',')
        .map(str::trim)
        .filter(|t| t.chars().count() >= MIN_TAG_CHARS)
}

/// Builds the tag frequency table. Returns `None` when no tag survives filtering,
/// which callers surface as "insufficient tag data" instead of rendering a cloud.
pub fn summarize_tags(records: &[AnalysisRecord]) -> Option<TagSummary> {
    let mut frequencies: Vec<TagCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for tag in records.iter().flat_map(|r| split_tags(&r.tags)) {
        match index.get(tag) {
            Some(&i) => frequencies[i].count += 1,
            None => {
                index.insert(tag, frequencies.len());
                frequencies.push(TagCount {
                    tag: tag.to_string(),
                    count: 1,
                });
            }
        }
    }

    if frequencies.is_empty() {
        return None;
    }

    let blob = frequencies
        .iter()
        .flat_map(|t| std::iter::repeat(t.tag.as_str()).take(t.count))
        .collect::<Vec<_>>()
        .join(" ");

    Some(TagSummary { frequencies, blob })
}

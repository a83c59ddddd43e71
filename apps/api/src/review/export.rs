use anyhow::{Context, Result};

use crate::review::models::AnalysisRecord;

/// Download name of the exported table.
pub const EXPORT_FILE_NAME: &str = "review_analysis.csv";
pub const EXPORT_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

const HEADER: [&str; 3] = ["Sentiment", "Keywords", "Tags"];

/// Serializes the analysis table to UTF-8 CSV with a header row, in table order.
pub fn records_to_csv(records: &[AnalysisRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;
    for record in records {
        writer.write_record([&record.sentiment, &record.keywords, &record.tags])?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("{}", e.error()))
        .context("Failed to flush CSV export")
}

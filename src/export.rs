//! CSV export of everything a query yields

use std::io::Write;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::fetcher::{NavState, OperationFetcher};
use crate::record::Record;
use crate::source::RecordSource;

const COLUMNS: [&str; 7] = [
    "id",
    "paging_token",
    "type",
    "source_account",
    "transaction_hash",
    "created_at",
    "details",
];

/// Walk the fetcher forward until the stream is exhausted or `max_pages`
/// display pages have been collected.
pub async fn fetch_all<S: RecordSource>(
    fetcher: &OperationFetcher<S>,
    max_pages: usize,
) -> Result<Vec<Record>> {
    let mut nav = NavState::new();
    let mut current = fetcher.fetch_records().await?;
    let mut records = current.records.clone();
    let mut pages = 1;

    while !current.is_exhausted() {
        if pages >= max_pages {
            warn!(pages, records = records.len(), "export stopped at the page budget");
            break;
        }
        current = fetcher.next(&mut nav, &current).await?;
        records.extend(current.records.iter().cloned());
        pages += 1;
    }

    debug!(pages, records = records.len(), "export.collected");
    Ok(records)
}

/// Write records as CSV. Attributes beyond the fixed columns go into
/// `details` as a compact JSON object.
pub fn write_csv<W: Write>(records: &[Record], mut out: W) -> Result<()> {
    writeln!(out, "{}", COLUMNS.join(","))?;
    for record in records {
        let details = if record.extra.is_empty() {
            String::new()
        } else {
            Value::Object(record.extra.clone()).to_string()
        };
        let row = [
            record.id.as_str(),
            record.paging_token.as_str(),
            record.op_type.as_str(),
            record.source_account.as_deref().unwrap_or(""),
            record.transaction_hash.as_deref().unwrap_or(""),
            record.created_at.as_deref().unwrap_or(""),
            details.as_str(),
        ];
        let line: Vec<String> = row.iter().map(|f| escape(f)).collect();
        writeln!(out, "{}", line.join(","))?;
    }
    out.flush()?;
    Ok(())
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

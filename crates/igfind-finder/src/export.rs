//! CSV input, CSV/JSON output and atomic snapshot files.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use igfind_core::{DiscoveryResult, SearchTarget};

use crate::error::FinderError;

const OUTPUT_COLUMNS: &[&str] = &[
    "BUSINESS_ID",
    "STORE_ID",
    "RESTAURANT NAME",
    "ADDRESS",
    "PHONE",
    "INSTAGRAM_HANDLE",
    "STATUS",
    "MESSAGE",
    "CONFIDENCE_SCORE",
    "CONFIDENCE_GRADE",
    "DISCOVERY_METHOD",
    "AI_CONFIDENCE",
    "RED_FLAGS",
    "PROCESSING_TIME_MS",
    "REVIEW",
];

/// Header comparison key: upper-case, underscores as spaces, trimmed.
fn header_key(header: &str) -> String {
    header.trim().replace('_', " ").to_uppercase()
}

fn column(headers: &csv::StringRecord, name: &'static str) -> Option<usize> {
    headers.iter().position(|h| header_key(h) == name)
}

fn required(headers: &csv::StringRecord, name: &'static str) -> Result<usize, FinderError> {
    column(headers, name).ok_or(FinderError::MissingColumn(name))
}

/// Read search targets from CSV. Required columns are `BUSINESS_ID`,
/// `STORE_ID`, `RESTAURANT NAME` and `ADDRESS`; `PHONE` is optional.
/// Header matching ignores case and treats `_` and space alike, so
/// `restaurant_name` works too. Rows without a name are skipped.
///
/// # Errors
///
/// [`FinderError::MissingColumn`] for a missing required column, or CSV
/// read failures.
pub fn read_targets(reader: impl std::io::Read) -> Result<Vec<SearchTarget>, FinderError> {
    let mut csv = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv.headers()?.clone();
    let business = required(&headers, "BUSINESS ID")?;
    let store = required(&headers, "STORE ID")?;
    let name = required(&headers, "RESTAURANT NAME")?;
    let address = required(&headers, "ADDRESS")?;
    let phone = column(&headers, "PHONE");

    let mut targets = Vec::new();
    for (line, record) in csv.records().enumerate() {
        let record = record?;
        let field = |idx: usize| record.get(idx).unwrap_or("").trim();
        if field(name).is_empty() {
            tracing::warn!(row = line + 2, "skipping row without a restaurant name");
            continue;
        }
        let mut target = SearchTarget::new(field(name), field(address))
            .with_ids(field(business), field(store));
        if let Some(idx) = phone {
            target = target.with_phone(field(idx));
        }
        targets.push(target);
    }
    Ok(targets)
}

/// Convenience wrapper over [`read_targets`] for a file path.
///
/// # Errors
///
/// [`FinderError::Io`] if the file cannot be opened, otherwise as
/// [`read_targets`].
pub fn read_targets_file(path: &Path) -> Result<Vec<SearchTarget>, FinderError> {
    let file = std::fs::File::open(path).map_err(|e| FinderError::io(path, e))?;
    read_targets(file)
}

/// Write results as CSV with the input columns first.
///
/// # Errors
///
/// CSV or I/O failures from the underlying writer.
pub fn write_csv(writer: impl Write, results: &[DiscoveryResult]) -> Result<(), FinderError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(OUTPUT_COLUMNS)?;
    for r in results {
        let status = r.status.to_string();
        let score = r.confidence.map(|c| format!("{:.1}", c.value)).unwrap_or_default();
        let grade = r.confidence.map(|c| c.grade.to_string()).unwrap_or_default();
        let ai = r.ai_confidence.map(|c| format!("{c:.2}")).unwrap_or_default();
        let red_flags = r.red_flags.join("; ");
        let elapsed = r.processing_time_ms.to_string();
        csv.write_record([
            r.business_id.as_str(),
            r.store_id.as_str(),
            r.restaurant_name.as_str(),
            r.address.as_str(),
            r.phone.as_str(),
            r.instagram_handle.as_str(),
            status.as_str(),
            r.message.as_str(),
            score.as_str(),
            grade.as_str(),
            r.discovery_method.as_str(),
            ai.as_str(),
            red_flags.as_str(),
            elapsed.as_str(),
            r.review.as_str(),
        ])?;
    }
    csv.flush().map_err(|e| FinderError::Csv(e.into()))?;
    Ok(())
}

/// Write `bytes` to `path` via a temp file in the same directory and a
/// rename, so readers never see a half-written file.
///
/// # Errors
///
/// [`FinderError::Io`] on any filesystem failure.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), FinderError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| FinderError::io(parent, e))?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| FinderError::io(parent, e))?;
    tmp.write_all(bytes).map_err(|e| FinderError::io(path, e))?;
    tmp.as_file().sync_all().map_err(|e| FinderError::io(path, e))?;
    tmp.persist(path).map_err(|e| FinderError::io(path, e.error))?;
    Ok(())
}

/// Pretty JSON array of results, written atomically.
///
/// # Errors
///
/// Serialization or filesystem failures.
pub fn write_json_file(path: &Path, results: &[DiscoveryResult]) -> Result<(), FinderError> {
    let json = serde_json::to_vec_pretty(results)?;
    atomic_write(path, &json)
}

/// CSV file written atomically.
///
/// # Errors
///
/// CSV or filesystem failures.
pub fn write_csv_file(path: &Path, results: &[DiscoveryResult]) -> Result<(), FinderError> {
    let mut buf = Vec::new();
    write_csv(&mut buf, results)?;
    atomic_write(path, &buf)
}

/// `<dir>/igfind_results_<YYYYmmdd_HHMMSS>.json` and `.csv`.
#[must_use]
pub fn output_paths(dir: &Path, at: DateTime<Local>) -> (PathBuf, PathBuf) {
    let stem = format!("igfind_results_{}", at.format("%Y%m%d_%H%M%S"));
    (
        dir.join(format!("{stem}.json")),
        dir.join(format!("{stem}.csv")),
    )
}

#[cfg(test)]
#[path = "export_test.rs"]
mod tests;

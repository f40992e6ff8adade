use crate::dataset::{finalize_headers, normalize_cell};
use crate::error::DatasetError;
use common::model::participant::{Dataset, ParticipantRecord};
use csv::ReaderBuilder;

const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Picks the candidate delimiter that occurs most often in the header line.
/// Ties resolve to the earlier candidate; no candidate at all means `,`.
pub fn detect_delimiter(header_line: &str) -> u8 {
    let mut best = b',';
    let mut best_count = 0;
    for &candidate in &CANDIDATE_DELIMITERS {
        let count = header_line.bytes().filter(|&b| b == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

/// Parses delimited text with a mandatory header row.
///
/// Rows may be shorter or longer than the header: missing cells read as empty,
/// extra cells are ignored.
pub fn parse_csv(bytes: &[u8]) -> Result<Dataset, DatasetError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let text = String::from_utf8_lossy(bytes);
    let header_line = text.lines().next().unwrap_or_default();
    if header_line.trim().is_empty() {
        return Err(DatasetError::Empty("missing header row".to_string()));
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(detect_delimiter(header_line))
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = finalize_headers(reader.headers()?.iter().map(str::to_string).collect())?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cells = record.iter().map(normalize_cell);
        rows.push(ParticipantRecord::from_cells(&headers, cells));
    }

    Ok(Dataset::new(headers, rows))
}

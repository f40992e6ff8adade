//! # Dataset loading
//!
//! Turns an uploaded participant list into a [`Dataset`]: a header row plus one
//! [`ParticipantRecord`](common::model::participant::ParticipantRecord) per data row,
//! every cell normalized to text.
//!
//! Supported inputs are delimited text (`.csv`, `.tsv`, `.txt`, delimiter detected
//! from the header line) and Excel workbooks (`.xlsx`, first sheet).

mod delimited;
mod workbook;

pub use delimited::{detect_delimiter, parse_csv};
pub use workbook::{number_to_text, parse_xlsx};

use crate::error::DatasetError;
use common::model::participant::Dataset;
use std::collections::HashSet;
use std::path::Path;

/// Parses `bytes` according to the extension of `filename`.
pub fn load_dataset(filename: &str, bytes: &[u8]) -> Result<Dataset, DatasetError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" | "tsv" | "txt" => parse_csv(bytes),
        "xlsx" | "xlsm" => parse_xlsx(bytes),
        other => Err(DatasetError::UnsupportedFormat(if other.is_empty() {
            filename.to_string()
        } else {
            format!(".{}", other)
        })),
    }
}

/// Hex MD5 digest of the uploaded bytes, used to recognise a re-upload of the same file.
pub fn fingerprint(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}

/// Trims header cells, names empty ones `Column{n}` and rejects duplicates.
pub(crate) fn finalize_headers(raw: Vec<String>) -> Result<Vec<String>, DatasetError> {
    if raw.is_empty() {
        return Err(DatasetError::Empty("no header row".to_string()));
    }

    let mut seen = HashSet::new();
    let mut headers = Vec::with_capacity(raw.len());
    for (i, cell) in raw.into_iter().enumerate() {
        let title = normalize_cell(&cell).unwrap_or_else(|| format!("Column{}", i + 1));
        if !seen.insert(title.clone()) {
            return Err(DatasetError::DuplicateColumn(title));
        }
        headers.push(title);
    }
    Ok(headers)
}

/// Trims a cell, strips one pair of surrounding quotes and maps non-breaking
/// spaces to plain ones. Returns `None` for an empty cell.
pub(crate) fn normalize_cell(cell: &str) -> Option<String> {
    let s = cell.trim();
    let s = s
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| s.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(s);
    let s = s.replace('\u{00A0}', " ").trim().to_string();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_on_extension() {
        let dataset = load_dataset("people.CSV", b"Name,Email\nJane,j@x.io\n").unwrap();
        assert_eq!(dataset.headers, vec!["Name", "Email"]);
        assert_eq!(dataset.len(), 1);

        assert!(matches!(
            load_dataset("people.pdf", b""),
            Err(DatasetError::UnsupportedFormat(ext)) if ext == ".pdf"
        ));
        assert!(matches!(
            load_dataset("people", b""),
            Err(DatasetError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn headers_are_normalized() {
        let headers = finalize_headers(vec![" Name ".into(), "".into(), "\"Email\"".into()]).unwrap();
        assert_eq!(headers, vec!["Name", "Column2", "Email"]);
    }

    #[test]
    fn duplicate_headers_are_rejected() {
        let err = finalize_headers(vec!["Name".into(), "Name".into()]).unwrap_err();
        assert!(matches!(err, DatasetError::DuplicateColumn(c) if c == "Name"));
    }

    #[test]
    fn cells_lose_quotes_and_nbsp() {
        assert_eq!(normalize_cell("  'Jane\u{00A0}Doe' "), Some("Jane Doe".to_string()));
        assert_eq!(normalize_cell("   "), None);
    }

    #[test]
    fn fingerprint_is_hex_md5() {
        assert_eq!(fingerprint(b""), "d41d8cd98f00b204e9800998ecf8427e");
    }
}

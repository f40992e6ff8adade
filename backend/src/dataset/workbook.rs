use crate::dataset::{finalize_headers, normalize_cell};
use crate::error::DatasetError;
use calamine::{Data, Reader, Xlsx};
use common::model::participant::{Dataset, ParticipantRecord};
use std::io::Cursor;

/// Parses the first sheet of an `.xlsx` workbook. Row 1 is the header row.
pub fn parse_xlsx(bytes: &[u8]) -> Result<Dataset, DatasetError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| DatasetError::Xlsx(format!("failed to read workbook: {}", e)))?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| DatasetError::Empty("workbook has no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| DatasetError::Xlsx(format!("failed to read sheet '{}': {}", sheet, e)))?;

    let mut rows = range.rows();
    let header_row = rows
        .next()
        .ok_or_else(|| DatasetError::Empty(format!("sheet '{}' is empty", sheet)))?;
    let headers = finalize_headers(
        header_row
            .iter()
            .map(|cell| cell_to_text(cell).unwrap_or_default())
            .collect(),
    )?;

    let records = rows
        .map(|row| ParticipantRecord::from_cells(&headers, row.iter().map(cell_to_text)))
        .collect();

    Ok(Dataset::new(headers, records))
}

fn cell_to_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => normalize_cell(s),
        Data::Float(f) => Some(number_to_text(*f)),
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        other => normalize_cell(&other.to_string()),
    }
}

/// Spreadsheets store every number as a float; integral values print without
/// the trailing `.0` so that an id column reads `42`, not `42.0`.
pub fn number_to_text(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_floats_drop_the_fraction() {
        assert_eq!(number_to_text(42.0), "42");
        assert_eq!(number_to_text(-3.0), "-3");
        assert_eq!(number_to_text(2.5), "2.5");
    }

    #[test]
    fn cells_are_normalized_to_text() {
        assert_eq!(cell_to_text(&Data::Empty), None);
        assert_eq!(cell_to_text(&Data::String("  Jane ".into())), Some("Jane".into()));
        assert_eq!(cell_to_text(&Data::String("   ".into())), None);
        assert_eq!(cell_to_text(&Data::Float(7.0)), Some("7".into()));
        assert_eq!(cell_to_text(&Data::Int(12)), Some("12".into()));
        assert_eq!(cell_to_text(&Data::Bool(true)), Some("true".into()));
    }

    #[test]
    fn garbage_is_not_a_workbook() {
        assert!(matches!(parse_xlsx(b"not a zip"), Err(DatasetError::Xlsx(_))));
    }
}

use serde::{Deserialize, Serialize};

/// One dataset row: ordered `(column, value)` pairs with every value normalized
/// to text. Missing and null cells are stored as empty strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    fields: Vec<(String, String)>,
}

impl ParticipantRecord {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// Builds a record from a header row and the cells of one data row.
    ///
    /// Short rows are padded with empty values; `None` cells become `""`.
    pub fn from_cells<I>(headers: &[String], cells: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let mut cells = cells.into_iter();
        let fields = headers
            .iter()
            .map(|h| (h.clone(), cells.next().flatten().unwrap_or_default()))
            .collect();
        Self { fields }
    }

    /// Value of `column`, or `""` when the record has no such column.
    pub fn get(&self, column: &str) -> &str {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    }

    pub fn contains_column(&self, column: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == column)
    }

    /// First column's value, conventionally the participant's display name.
    pub fn display_name(&self) -> &str {
        self.fields.first().map(|(_, v)| v.as_str()).unwrap_or("")
    }

    /// True when every value is empty after trimming.
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|(_, v)| v.trim().is_empty())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// A loaded participant list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<ParticipantRecord>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, rows: Vec<ParticipantRecord>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> Vec<String> {
        vec!["Name".into(), "Email".into(), "Course".into()]
    }

    #[test]
    fn missing_cells_become_empty_strings() {
        let record = ParticipantRecord::from_cells(
            &headers(),
            vec![Some("Jane Doe".to_string()), None],
        );
        assert_eq!(record.get("Name"), "Jane Doe");
        assert_eq!(record.get("Email"), "");
        assert_eq!(record.get("Course"), "");
        assert_eq!(record.get("Unknown"), "");
        assert!(record.contains_column("Course"));
        assert!(!record.contains_column("Unknown"));
    }

    #[test]
    fn blank_detection_ignores_whitespace() {
        let blank = ParticipantRecord::from_cells(
            &headers(),
            vec![Some("  ".to_string()), None, Some(String::new())],
        );
        assert!(blank.is_blank());

        let filled = ParticipantRecord::from_cells(&headers(), vec![None, None, Some("x".into())]);
        assert!(!filled.is_blank());
        assert_eq!(filled.display_name(), "");
    }
}

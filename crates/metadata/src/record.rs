use serde::{Deserialize, Serialize};

/// Sentinel used for title and description when an id has no metadata.
pub const MISSING_FIELD: &str = "N/A";

/// One paper as described by the metadata source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    /// Stable identifier shared with the vector collections.
    pub id: String,
    pub title: String,
    /// Free text abstract; may be long.
    pub description: String,
}

impl PaperRecord {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
        }
    }

    /// Returns at most `max_chars` characters of the description.
    ///
    /// Counts characters, not bytes, so multi-byte text is never split.
    pub fn description_prefix(&self, max_chars: usize) -> &str {
        truncate_chars(&self.description, max_chars)
    }
}

/// Row layout of the CSV source. Extra columns are ignored and empty cells
/// deserialize to empty strings.
#[derive(Debug, Deserialize)]
pub(crate) struct CsvRow {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

impl From<CsvRow> for PaperRecord {
    fn from(row: CsvRow) -> Self {
        PaperRecord {
            id: row.id,
            title: row.title.unwrap_or_default(),
            description: row.description.unwrap_or_default(),
        }
    }
}

/// Char-boundary safe prefix of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_shorter_text_is_unchanged() {
        assert_eq!(truncate_chars("short", 100), "short");
    }

    #[test]
    fn truncate_exact_length() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("abc", 3), "abc");
    }

    #[test]
    fn truncate_respects_multibyte_chars() {
        let text = "naïve café ünïcödé";
        let prefix = truncate_chars(text, 4);
        assert_eq!(prefix, "naïv");
        assert_eq!(prefix.chars().count(), 4);
    }

    #[test]
    fn truncate_zero_is_empty() {
        assert_eq!(truncate_chars("anything", 0), "");
    }

    #[test]
    fn description_prefix_uses_char_count() {
        let record = PaperRecord::new("p1", "Deep Learning", "A".repeat(250));
        assert_eq!(record.description_prefix(100).len(), 100);
    }

    #[test]
    fn csv_row_defaults_empty_cells() {
        let row = CsvRow {
            id: "p9".into(),
            title: None,
            description: Some("text".into()),
        };
        let record = PaperRecord::from(row);
        assert_eq!(record.title, "");
        assert_eq!(record.description, "text");
    }

    #[test]
    fn record_serializes_all_fields() {
        let record = PaperRecord::new("p1", "Title", "Desc");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "p1");
        assert_eq!(json["title"], "Title");
        assert_eq!(json["description"], "Desc");
    }
}

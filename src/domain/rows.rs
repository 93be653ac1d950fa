//! Typed content rows parsed from the Posts worksheet

use crate::constants::HEADER_ROWS;

/// One content record from the backing sheet.
///
/// Parsing is deliberately forgiving: the sheet is hand-edited, so every
/// field except `text` has a defined default instead of a hard error.
#[derive(Debug, Clone)]
pub struct Row {
    pub text: String,
    pub media_path: Option<String>,
    pub posted: bool,
    pub thread_id: Option<String>,
    pub thread_order: i64,
    /// 1-based sheet row (data position offset by the header row)
    pub row_index: u32,
}

/// Column positions resolved from the header row by name.
#[derive(Debug, Clone, Default)]
pub struct Header {
    text: Option<usize>,
    media_path: Option<usize>,
    posted: Option<usize>,
    thread_id: Option<usize>,
    thread_order: Option<usize>,
}

impl Header {
    /// Resolve column positions from the first sheet row. Unknown columns
    /// are ignored; `image_path` is accepted as a legacy alias for
    /// `media_path`.
    pub fn from_row(cells: &[String]) -> Self {
        let mut header = Header::default();
        for (i, name) in cells.iter().enumerate() {
            match name.trim().to_ascii_lowercase().as_str() {
                "text" => header.text = Some(i),
                "media_path" | "image_path" => header.media_path = Some(i),
                "posted" => header.posted = Some(i),
                "thread_id" => header.thread_id = Some(i),
                "thread_order" => header.thread_order = Some(i),
                _ => {}
            }
        }
        header
    }

    fn cell<'a>(&self, cells: &'a [String], col: Option<usize>) -> &'a str {
        col.and_then(|i| cells.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }
}

impl Row {
    /// Parse one data row. `position` is the 0-based index within the data
    /// rows (i.e. excluding the header).
    pub fn parse(header: &Header, cells: &[String], position: usize) -> Self {
        let text = header.cell(cells, header.text).to_string();

        let media_path = {
            let raw = header.cell(cells, header.media_path).trim();
            if raw.is_empty() {
                None
            } else {
                Some(raw.to_string())
            }
        };

        let posted = header
            .cell(cells, header.posted)
            .trim()
            .eq_ignore_ascii_case("true");

        let thread_id = {
            let raw = header.cell(cells, header.thread_id).trim();
            if raw.is_empty() {
                None
            } else {
                Some(raw.to_string())
            }
        };

        let thread_order = header
            .cell(cells, header.thread_order)
            .trim()
            .parse::<i64>()
            .unwrap_or(0);

        Row {
            text,
            media_path,
            posted,
            thread_id,
            thread_order,
            row_index: position as u32 + HEADER_ROWS + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn header() -> Header {
        Header::from_row(&cells(&[
            "text",
            "image_path",
            "posted",
            "thread_id",
            "thread_order",
            "post_id",
        ]))
    }

    #[test]
    fn posted_sentinel_is_case_insensitive() {
        let h = header();
        for value in ["TRUE", "true", "True", " tRuE "] {
            let row = Row::parse(&h, &cells(&["hi", "", value]), 0);
            assert!(row.posted, "{value:?} should count as posted");
        }
        for value in ["", "FALSE", "false", "0", "yes"] {
            let row = Row::parse(&h, &cells(&["hi", "", value]), 0);
            assert!(!row.posted, "{value:?} should count as not posted");
        }
    }

    #[test]
    fn thread_order_defaults_to_zero() {
        let h = header();
        let row = Row::parse(&h, &cells(&["a", "", "", "t1", "not-a-number"]), 0);
        assert_eq!(row.thread_order, 0);
        let row = Row::parse(&h, &cells(&["a", "", "", "t1"]), 0);
        assert_eq!(row.thread_order, 0);
        let row = Row::parse(&h, &cells(&["a", "", "", "t1", "2"]), 0);
        assert_eq!(row.thread_order, 2);
    }

    #[test]
    fn empty_optionals_become_none() {
        let h = header();
        let row = Row::parse(&h, &cells(&["a", "  ", "", "  "]), 0);
        assert!(row.media_path.is_none());
        assert!(row.thread_id.is_none());
    }

    #[test]
    fn row_index_offsets_past_the_header() {
        let h = header();
        assert_eq!(Row::parse(&h, &cells(&["a"]), 0).row_index, 2);
        assert_eq!(Row::parse(&h, &cells(&["a"]), 4).row_index, 6);
    }

    #[test]
    fn short_rows_parse_with_defaults() {
        // Sheets omits trailing empty cells in its responses
        let h = header();
        let row = Row::parse(&h, &cells(&["only text"]), 1);
        assert_eq!(row.text, "only text");
        assert!(!row.posted);
        assert!(row.thread_id.is_none());
        assert_eq!(row.thread_order, 0);
    }
}

//! Sheet-backed row store for the cycle controller

use crate::constants::{POST_ID_COLUMN, POSTED_COLUMN, POSTS_SHEET};
use crate::cycle::PostStore;
use crate::domain::rows::{Header, Row};
use crate::services::sheets::{SheetsClient, SheetsError};

pub struct SheetsStore {
    sheets: SheetsClient,
}

impl SheetsStore {
    pub fn new(sheets: SheetsClient) -> Self {
        Self { sheets }
    }
}

impl PostStore for SheetsStore {
    /// Fetch every data row from the Posts worksheet, mapped through the
    /// header row into typed records.
    async fn load_rows(&self) -> Result<Vec<Row>, SheetsError> {
        let values = self.sheets.get_values(POSTS_SHEET).await?;

        let mut iter = values.into_iter();
        let header = match iter.next() {
            Some(cells) => Header::from_row(&cells),
            None => return Ok(Vec::new()),
        };

        Ok(iter
            .enumerate()
            .map(|(position, cells)| Row::parse(&header, &cells, position))
            .collect())
    }

    /// Record one row's completion: the posted flag and the returned id.
    /// Writes land right after the row's own publish so a later abort in
    /// the same group cannot undo them.
    async fn mark_posted(&self, row_index: u32, post_id: &str) -> Result<(), SheetsError> {
        self.sheets
            .update_cell(POSTS_SHEET, row_index, POSTED_COLUMN, "TRUE")
            .await?;
        self.sheets
            .update_cell(POSTS_SHEET, row_index, POST_ID_COLUMN, post_id)
            .await
    }

    /// Reopen every row for a new cycle with one bulk write.
    async fn reset_posted(&self, row_count: usize) -> Result<(), SheetsError> {
        let range = format!(
            "{}!{}2:{}{}",
            POSTS_SHEET,
            POSTED_COLUMN,
            POSTED_COLUMN,
            row_count + 1
        );
        let values = vec![vec!["FALSE".to_string()]; row_count];
        self.sheets.update_range(&range, values).await
    }
}

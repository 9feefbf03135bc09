//! Grid/Table Navigator.
//!
//! Tables are addressed by the locator a grid page object declares as its
//! loaded marker. Rows and columns are 1-based throughout; column positions
//! count blank headers so they line up with `td:nth-child(n)`.

use std::collections::BTreeMap;

use tracing::debug;

use crate::driver::{BrowserDriver, ElementHandle};
use crate::locator::Locator;
use crate::result::{PagewrightError, PagewrightResult};

const HEADER_CELL: &str = "th";
const BODY_ROW: &str = "tbody tr";

fn cell_locator(position: usize) -> Locator {
    Locator::css(format!("td:nth-child({position})"))
}

/// Table queries over a borrowed driver
#[derive(Debug)]
pub struct GridNavigator<'a, D: ?Sized> {
    driver: &'a D,
}

impl<'a, D> GridNavigator<'a, D>
where
    D: BrowserDriver + ?Sized,
{
    /// Create a navigator
    #[must_use]
    pub const fn new(driver: &'a D) -> Self {
        Self { driver }
    }

    /// Trimmed header texts, blanks included
    pub async fn headers(&self, table: &Locator) -> PagewrightResult<Vec<String>> {
        let table = self.driver.find_element(table).await?;
        let mut headers = Vec::new();
        for cell in self
            .driver
            .find_all_within(&table, &Locator::css(HEADER_CELL))
            .await?
        {
            headers.push(self.driver.text(&cell).await?.trim().to_string());
        }
        Ok(headers)
    }

    /// Header texts without blanks
    pub async fn visible_headers(&self, table: &Locator) -> PagewrightResult<Vec<String>> {
        Ok(self
            .headers(table)
            .await?
            .into_iter()
            .filter(|h| !h.is_empty())
            .collect())
    }

    /// 1-based position of `column` among all headers
    pub async fn column_position(&self, table: &Locator, column: &str) -> PagewrightResult<usize> {
        let headers = self.headers(table).await?;
        position_in(&headers, column)
    }

    /// Number of body rows
    pub async fn row_count(&self, table: &Locator) -> PagewrightResult<usize> {
        Ok(self.rows(table).await?.len())
    }

    async fn rows(&self, table: &Locator) -> PagewrightResult<Vec<ElementHandle>> {
        let table = self.driver.find_element(table).await?;
        self.driver
            .find_all_within(&table, &Locator::css(BODY_ROW))
            .await
    }

    async fn cell_text(&self, row: &ElementHandle, position: usize) -> PagewrightResult<String> {
        let cell = self.driver.find_within(row, &cell_locator(position)).await?;
        Ok(self.driver.text(&cell).await?.trim().to_string())
    }

    /// Cell texts of every body row, per requested column
    pub async fn column_values(
        &self,
        table: &Locator,
        columns: &[&str],
    ) -> PagewrightResult<BTreeMap<String, Vec<String>>> {
        let headers = self.headers(table).await?;
        let rows = self.rows(table).await?;
        let mut values = BTreeMap::new();
        for column in columns {
            let position = position_in(&headers, column)?;
            let mut cells = Vec::with_capacity(rows.len());
            for row in &rows {
                cells.push(self.cell_text(row, position).await?);
            }
            let _ = values.insert((*column).to_string(), cells);
        }
        Ok(values)
    }

    /// Text of one cell, `None` when empty
    pub async fn cell_value(
        &self,
        table: &Locator,
        row: usize,
        column: &str,
    ) -> PagewrightResult<Option<String>> {
        let position = self.column_position(table, column).await?;
        let row_element = self.nth_row(table, row).await?;
        let text = self.cell_text(&row_element, position).await?;
        Ok(Some(text).filter(|t| !t.is_empty()))
    }

    /// Texts of several cells in one row, `None` for empty cells
    pub async fn row_values(
        &self,
        table: &Locator,
        row: usize,
        columns: &[&str],
    ) -> PagewrightResult<BTreeMap<String, Option<String>>> {
        let headers = self.headers(table).await?;
        let row_element = self.nth_row(table, row).await?;
        let mut values = BTreeMap::new();
        for column in columns {
            let position = position_in(&headers, column)?;
            debug!(row, column, position, "reading grid cell");
            let text = self.cell_text(&row_element, position).await?;
            let _ = values.insert((*column).to_string(), Some(text).filter(|t| !t.is_empty()));
        }
        Ok(values)
    }

    async fn nth_row(&self, table: &Locator, row: usize) -> PagewrightResult<ElementHandle> {
        let rows = self.rows(table).await?;
        row.checked_sub(1)
            .and_then(|index| rows.into_iter().nth(index))
            .ok_or_else(|| PagewrightError::ElementNotFound {
                locator: table.row(row).to_string(),
            })
    }

    /// Locator of a body row
    #[must_use]
    pub fn row_locator(&self, table: &Locator, row: usize) -> Locator {
        table.row(row)
    }

    /// 1-based index of the first row whose `column` cell equals `value`.
    /// Cell text is trimmed before comparison; `value` is compared as given.
    pub async fn find_row_by_column_value(
        &self,
        table: &Locator,
        column: &str,
        value: &str,
    ) -> PagewrightResult<Option<usize>> {
        let values = self.column_values(table, &[column]).await?;
        Ok(values
            .get(column)
            .and_then(|cells| cells.iter().position(|c| c == value))
            .map(|index| index + 1))
    }

    /// Like [`find_row_by_column_value`](Self::find_row_by_column_value) but a miss is an error
    pub async fn require_row_by_column_value(
        &self,
        table: &Locator,
        column: &str,
        value: &str,
    ) -> PagewrightResult<usize> {
        self.find_row_by_column_value(table, column, value)
            .await?
            .ok_or_else(|| PagewrightError::RowNotFound {
                column: column.to_string(),
                value: value.to_string(),
            })
    }

    /// Element matching `field` inside a body row
    pub async fn row_field(
        &self,
        table: &Locator,
        row: usize,
        field: &Locator,
    ) -> PagewrightResult<ElementHandle> {
        let row_element = self.driver.find_element(&self.row_locator(table, row)).await?;
        self.driver.find_within(&row_element, field).await
    }
}

fn position_in(headers: &[String], column: &str) -> PagewrightResult<usize> {
    headers
        .iter()
        .position(|h| h == column)
        .map(|index| index + 1)
        .ok_or_else(|| PagewrightError::ColumnNotFound {
            column: column.to_string(),
            headers: headers.to_vec(),
        })
}

//! Step definitions for behavioural tests.

use cucumber::gherkin::Step;
use pagewright::DataTable;

mod field_steps;
mod grid_steps;
mod page_steps;
mod session_steps;
mod window_steps;

/// Data table attached to `step`, header row first
pub(crate) fn table(step: &Step) -> DataTable {
    let rows = step
        .table
        .as_ref()
        .map(|t| t.rows.clone())
        .unwrap_or_default();
    DataTable::from_rows(rows)
}

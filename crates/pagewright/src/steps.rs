//! Step surface.
//!
//! One method per step sentence family. Field, grid and state steps resolve
//! names against the page object recorded by the last page state step, so a
//! scenario starts with one of [`Scenario::should_be_on_page`],
//! [`Scenario::focus_on_section`], [`Scenario::focus_on_grid`],
//! [`Scenario::should_be_on_dialog`] or [`Scenario::should_be_on_tab`].
//!
//! Arguments containing `$` go through token expansion before they are used.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::data_table::DataTable;
use crate::driver::BrowserDriver;
use crate::field::FieldType;
use crate::interaction::{FieldEngine, ScrollDirection};
use crate::locator::Locator;
use crate::page_object::{PageObjectDescriptor, PageObjectKind};
use crate::result::{PagewrightError, PagewrightResult};
use crate::scenario::Scenario;
use crate::session::SessionValue;
use crate::state;
use crate::temporal::{format_date, looks_like_date_expression};
use crate::window::WindowMatch;

const FIELD_TABLE: [&str; 3] = ["field", "fieldType", "value"];
const ROW_COLUMN: &str = "row";

fn cell<'r>(row: &'r HashMap<String, String>, header: &str) -> &'r str {
    row.get(header).map(String::as_str).unwrap_or_default()
}

fn ensure(holds: bool, message: impl FnOnce() -> String) -> PagewrightResult<()> {
    if holds {
        Ok(())
    } else {
        Err(PagewrightError::assertion(message()))
    }
}

fn parse_count(argument: &str, raw: &str) -> PagewrightResult<usize> {
    raw.trim()
        .parse()
        .map_err(|_| PagewrightError::InvalidArgument {
            argument: argument.to_string(),
            value: raw.to_string(),
            accepted: vec!["a non-negative whole number".to_string()],
        })
}

impl<D: BrowserDriver> Scenario<D> {
    // ========================================================================
    // Resolution helpers
    // ========================================================================

    fn field_locator(&self, field: &str) -> PagewrightResult<Locator> {
        let page = self.current_page()?;
        Ok(self.registry().resolve_locator(&page, field)?.locator)
    }

    fn grid_table(&self) -> PagewrightResult<Locator> {
        let page = self.current_page()?;
        Ok(self
            .registry()
            .resolve_locator(&page, PageObjectKind::Grid.loaded_marker())?
            .locator)
    }

    fn expand(&mut self, value: &str) -> PagewrightResult<String> {
        if value.contains('$') {
            self.transformer().transform(value)
        } else {
            Ok(value.to_string())
        }
    }

    fn date_value(&self, value: &str) -> PagewrightResult<String> {
        if looks_like_date_expression(value) {
            format_date(value, self.clock())
        } else {
            Ok(value.to_string())
        }
    }

    fn expected_value(&mut self, value: &str, field_type: &str) -> PagewrightResult<String> {
        let value = self.expand(value)?;
        if field_type.to_lowercase().contains("date") {
            self.date_value(&value)
        } else {
            Ok(value)
        }
    }

    async fn write_field(
        &self,
        field: &str,
        field_type: FieldType,
        value: &str,
    ) -> PagewrightResult<()> {
        let locator = self.field_locator(field)?;
        match field_type {
            FieldType::DateField => {
                let value = self.date_value(value)?;
                self.engine().write_date(&locator, &value).await
            }
            other => self.engine().write(&locator, other, value).await,
        }
    }

    async fn read_field(&self, field: &str, field_type: &str) -> PagewrightResult<String> {
        let field_type: FieldType = field_type.parse()?;
        let locator = self.field_locator(field)?;
        self.engine().read(&locator, field_type).await
    }

    // ========================================================================
    // Page state
    // ========================================================================

    async fn enter(
        &mut self,
        kind: PageObjectKind,
        name: &str,
        workflow: &str,
    ) -> PagewrightResult<Arc<PageObjectDescriptor>> {
        let descriptor = self
            .registry()
            .resolve_descriptor(&kind, name, Some(workflow))?;
        let marker = self
            .registry()
            .resolve_locator(&descriptor, kind.loaded_marker())?
            .locator;
        let _ = self.engine().wait_ready(&marker).await?;
        if kind == PageObjectKind::Page && !state::in_viewport(self.driver(), &marker).await? {
            warn!(page = name, %marker, "loaded marker is outside the viewport");
        }
        info!(kind = %kind, name, workflow, "page object in focus");
        self.context_mut().set_current_page(Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// "I should be on the {page} page under the {workflow} workflow"
    pub async fn should_be_on_page(&mut self, page: &str, workflow: &str) -> PagewrightResult<()> {
        self.enter(PageObjectKind::Page, page, workflow).await.map(drop)
    }

    /// "I focus on the {section} section under the {workflow} workflow"
    pub async fn focus_on_section(&mut self, section: &str, workflow: &str) -> PagewrightResult<()> {
        self.enter(PageObjectKind::Section, section, workflow)
            .await
            .map(drop)
    }

    /// "I focus on the {grid} grid under the {workflow} workflow"
    pub async fn focus_on_grid(&mut self, grid: &str, workflow: &str) -> PagewrightResult<()> {
        self.enter(PageObjectKind::Grid, grid, workflow).await.map(drop)
    }

    /// "I should be on the {dialog} dialog under the {workflow} workflow"
    pub async fn should_be_on_dialog(&mut self, dialog: &str, workflow: &str) -> PagewrightResult<()> {
        self.enter(PageObjectKind::Dialog, dialog, workflow)
            .await
            .map(drop)
    }

    /// "I should be on the {tab} tab of the {page} page under the {workflow} workflow"
    pub async fn should_be_on_tab(
        &mut self,
        tab: &str,
        page: &str,
        workflow: &str,
    ) -> PagewrightResult<()> {
        let kind = PageObjectKind::Tab {
            page: page.to_string(),
        };
        self.enter(kind, tab, workflow).await.map(drop)
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// "I launch the browser and open the home page"
    pub async fn open_home_page(&mut self) -> PagewrightResult<()> {
        let url = self
            .config()
            .home_page
            .clone()
            .ok_or_else(|| PagewrightError::Config {
                message: "home_page is not configured".to_string(),
            })?;
        self.driver().set_viewport(self.config().viewport).await?;
        info!(url = %url, "opening home page");
        self.driver().navigate(&url).await
    }

    /// "I navigate to {page} page"
    pub async fn navigate_to_page(
        &mut self,
        page: &str,
        workflow: Option<&str>,
    ) -> PagewrightResult<()> {
        let descriptor = self
            .registry()
            .resolve_descriptor(&PageObjectKind::Page, page, workflow)?;
        let url = descriptor
            .default_url()
            .ok_or_else(|| PagewrightError::MissingDefaultUrl {
                path: descriptor.path_in(self.registry().namespace()),
            })?;
        info!(page, url, "navigating");
        self.driver().navigate(url).await
    }

    // ========================================================================
    // Field interaction
    // ========================================================================

    /// "I set the {field} text field/area as {value}"
    pub async fn set_text_field(&mut self, field: &str, value: &str) -> PagewrightResult<()> {
        let value = self.expand(value)?;
        self.write_field(field, FieldType::TextField, &value).await
    }

    /// "I set the {field} date field as {value}". Date expressions are evaluated first.
    pub async fn set_date_field(&mut self, field: &str, value: &str) -> PagewrightResult<()> {
        let value = self.expand(value)?;
        self.write_field(field, FieldType::DateField, &value).await
    }

    /// "I set the {field} dropdown as {value}"
    pub async fn set_dropdown(&mut self, field: &str, value: &str) -> PagewrightResult<()> {
        let value = self.expand(value)?;
        self.write_field(field, FieldType::Dropdown, &value).await
    }

    /// "I set the {field} checkbox as {checked|unchecked}"
    pub async fn set_checkbox(&mut self, field: &str, value: &str) -> PagewrightResult<()> {
        self.write_field(field, FieldType::Checkbox, value).await
    }

    /// "I set the {field} angular dropdown as {value}"
    pub async fn set_angular_dropdown(&mut self, field: &str, value: &str) -> PagewrightResult<()> {
        let value = self.expand(value)?;
        let locator = self.field_locator(field)?;
        self.engine().select_angular_option(&locator, &value).await
    }

    /// "I click the {field} button/link/icon/radio/field/tab"
    pub async fn click(&mut self, field: &str) -> PagewrightResult<()> {
        let locator = self.field_locator(field)?;
        self.engine().click(&locator).await
    }

    /// "I send {key} key for {field} field"
    pub async fn send_key(&mut self, key: &str, field: &str) -> PagewrightResult<()> {
        let locator = self.field_locator(field)?;
        self.engine().send_key(&locator, key).await
    }

    /// "I set these fields with following values:" with headers field, fieldType, value
    pub async fn set_fields(&mut self, table: &DataTable) -> PagewrightResult<()> {
        table.require_headers(&FIELD_TABLE)?;
        for row in table.rows_as_maps() {
            let field_type: FieldType = cell(&row, "fieldType").parse()?;
            let value = self.expand(cell(&row, "value"))?;
            self.write_field(cell(&row, "field"), field_type, &value)
                .await?;
        }
        Ok(())
    }

    // ========================================================================
    // Field values
    // ========================================================================

    /// "I should see the {field} {type} value as {value}"
    pub async fn verify_field_value(
        &mut self,
        field: &str,
        field_type: &str,
        expected: &str,
    ) -> PagewrightResult<()> {
        let actual = self.read_field(field, field_type).await?;
        let actual = actual.trim();
        let expected = self.expected_value(expected, field_type)?;
        ensure(actual == expected, || {
            format!("Incorrect value obtained for field: {field}. Expected: {expected}, Got: {actual}")
        })
    }

    /// "I should see the {field} {type} value contains {value}"
    pub async fn verify_field_value_contains(
        &mut self,
        field: &str,
        field_type: &str,
        expected: &str,
    ) -> PagewrightResult<()> {
        let actual = self.read_field(field, field_type).await?;
        let actual = actual.trim();
        let expected = self.expected_value(expected, field_type)?;
        ensure(actual.contains(expected.as_str()), || {
            format!("Incorrect value obtained for field: {field}. Expected: {expected}, Got: {actual}")
        })
    }

    /// "I should see the following field values as:"
    pub async fn verify_field_values(&mut self, table: &DataTable) -> PagewrightResult<()> {
        table.require_headers(&FIELD_TABLE)?;
        for row in table.rows_as_maps() {
            self.verify_field_value(cell(&row, "field"), cell(&row, "fieldType"), cell(&row, "value"))
                .await?;
        }
        Ok(())
    }

    /// "I should see the following field values contains:"
    pub async fn verify_field_values_contain(&mut self, table: &DataTable) -> PagewrightResult<()> {
        table.require_headers(&FIELD_TABLE)?;
        for row in table.rows_as_maps() {
            self.verify_field_value_contains(
                cell(&row, "field"),
                cell(&row, "fieldType"),
                cell(&row, "value"),
            )
            .await?;
        }
        Ok(())
    }

    /// "I should see the {field} {type} value contains the following:" with header values
    pub async fn verify_field_value_contains_all(
        &mut self,
        field: &str,
        field_type: &str,
        table: &DataTable,
    ) -> PagewrightResult<()> {
        table.require_headers(&["values"])?;
        let actual = self.read_field(field, field_type).await?;
        for expected in table.column("values").unwrap_or_default() {
            let expected = self.expected_value(&expected, field_type)?;
            ensure(actual.contains(expected.as_str()), || {
                format!("{expected} not included in the {actual}")
            })?;
        }
        Ok(())
    }

    // ========================================================================
    // Field state
    // ========================================================================

    /// "I should see the {field} field/button/link/label is {state}"
    pub async fn verify_field_state(&mut self, field: &str, state_name: &str) -> PagewrightResult<()> {
        let locator = self.field_locator(field)?;
        let holds = state::check_state(self.driver(), &locator, state_name).await?;
        ensure(holds, || format!("{field} is not {state_name}"))
    }

    /// "I should see the following fields are {state}:" with header field
    pub async fn verify_fields_state(
        &mut self,
        state_name: &str,
        table: &DataTable,
    ) -> PagewrightResult<()> {
        table.require_headers(&["field"])?;
        for field in table.column("field").unwrap_or_default() {
            self.verify_field_state(&field, state_name).await?;
        }
        Ok(())
    }

    /// "I should see the count of {field} as {count}"
    pub async fn verify_element_count(&mut self, field: &str, expected: &str) -> PagewrightResult<()> {
        let expected = self.expand(expected)?;
        let expected = parse_count("element count", &expected)?;
        let locator = self.field_locator(field)?;
        let actual = self.engine().element_count(&locator).await?;
        ensure(actual == expected, || {
            format!("Expected {expected} elements for {field}, found {actual}")
        })
    }

    // ========================================================================
    // Grid
    // ========================================================================

    fn grid_lookup_value(&mut self, column: &str, value: &str) -> PagewrightResult<String> {
        let value = if column.to_lowercase().contains("date") {
            self.date_value(value)?
        } else {
            value.to_string()
        };
        self.expand(&value)
    }

    /// "I should see the following values in the grid:" keyed by a row column
    pub async fn verify_grid_values(&mut self, table: &DataTable) -> PagewrightResult<()> {
        let grid_table = self.grid_table()?;
        let expected = self.transformer().transform_data_table(table)?;
        if !expected.headers().iter().any(|h| h == ROW_COLUMN) {
            return Err(PagewrightError::DataTableShape {
                expected: std::iter::once(ROW_COLUMN.to_string())
                    .chain(expected.headers().iter().cloned())
                    .collect(),
                found: expected.headers().to_vec(),
            });
        }
        let columns: Vec<&str> = expected
            .headers()
            .iter()
            .map(String::as_str)
            .filter(|h| *h != ROW_COLUMN)
            .collect();
        for row in expected.rows_as_maps() {
            let row_number = parse_count("grid row", cell(&row, ROW_COLUMN))?;
            let actual = self.grid().row_values(&grid_table, row_number, &columns).await?;
            for column in &columns {
                let wanted = Some(cell(&row, column)).filter(|v| !v.is_empty());
                let got = actual.get(*column).and_then(Option::as_deref);
                ensure(wanted == got, || {
                    format!(
                        "Grid row {row_number}, column '{column}': expected '{}', got '{}'",
                        wanted.unwrap_or_default(),
                        got.unwrap_or_default()
                    )
                })?;
            }
        }
        Ok(())
    }

    /// "I click the {field} link/button/icon/field on row {n} of the grid"
    pub async fn click_in_grid_row(&mut self, field: &str, row: usize) -> PagewrightResult<()> {
        let table = self.grid_table()?;
        let locator = self.field_locator(field)?;
        let element = self.grid().row_field(&table, row, &locator).await?;
        info!(field, row, "click in grid row");
        self.driver().click(&element).await
    }

    /// "I set the {field} checkbox as {value} on row {n} of the grid"
    pub async fn set_grid_checkbox(
        &mut self,
        field: &str,
        value: &str,
        row: usize,
    ) -> PagewrightResult<()> {
        let desired = FieldEngine::<D>::checkbox_value(value)?;
        let table = self.grid_table()?;
        let locator = self.field_locator(field)?;
        let element = self.grid().row_field(&table, row, &locator).await?;
        self.engine().set_checkbox_element(&element, desired).await
    }

    /// "I click the {field} link on row with {column} column as {value} in the grid"
    pub async fn click_in_grid_row_where(
        &mut self,
        field: &str,
        column: &str,
        value: &str,
    ) -> PagewrightResult<()> {
        let value = self.grid_lookup_value(column, value)?;
        let table = self.grid_table()?;
        let row = self
            .grid()
            .require_row_by_column_value(&table, column, &value)
            .await?;
        self.click_in_grid_row(field, row).await
    }

    /// "I set the {field} checkbox as {state} on row with {column} column as {value} in the grid"
    pub async fn set_grid_checkbox_where(
        &mut self,
        field: &str,
        state_value: &str,
        column: &str,
        value: &str,
    ) -> PagewrightResult<()> {
        let value = self.grid_lookup_value(column, value)?;
        let table = self.grid_table()?;
        let row = self
            .grid()
            .require_row_by_column_value(&table, column, &value)
            .await?;
        self.set_grid_checkbox(field, state_value, row).await
    }

    /// "I should see {n} row(s) in the grid"
    pub async fn verify_grid_row_count(&mut self, expected: usize) -> PagewrightResult<()> {
        let table = self.grid_table()?;
        let actual = self.grid().row_count(&table).await?;
        ensure(actual == expected, || {
            format!("Incorrect number of rows unexpectedly displayed: expected {expected}, found {actual}")
        })
    }

    /// "I should see the grid contains the following headers:"
    pub async fn verify_grid_headers(&mut self, table: &DataTable) -> PagewrightResult<()> {
        let grid_table = self.grid_table()?;
        let expected = self.transformer().transform_list(table)?;
        let actual = self.grid().visible_headers(&grid_table).await?;
        ensure(expected == actual, || {
            format!(
                "Unexpected display of table headers in the defined table. Expected [{}], found [{}]",
                expected.join(", "),
                actual.join(", ")
            )
        })
    }

    // ========================================================================
    // Session variables
    // ========================================================================

    /// "I set the session variable {name} as {value}". The expanded text is stored as is.
    pub fn set_session_variable(&mut self, name: &str, value: &str) -> PagewrightResult<()> {
        let value = self.expand(value)?;
        info!(name, value = %value, "session variable");
        self.context_mut()
            .set_variable(name, SessionValue::Text(value));
        Ok(())
    }

    /// "I add the session variable values {a} and {b} saved in {result}"
    pub fn add_session_variables(
        &mut self,
        first: &str,
        second: &str,
        result: &str,
    ) -> PagewrightResult<()> {
        let sum = self.context().add_integers(first, second)?;
        info!(name = result, value = sum, "session variable");
        self.context_mut().set_variable(result, sum);
        Ok(())
    }

    // ========================================================================
    // Windows and browser
    // ========================================================================

    /// "I switch to the new window with url containing {part}"
    pub async fn switch_to_window_with_url(&mut self, part: &str) -> PagewrightResult<()> {
        self.windows()
            .switch_to_window(WindowMatch::Url, part)
            .await
            .map(drop)
    }

    /// "I switch to the new window titled as {title}"
    pub async fn switch_to_window_titled(&mut self, title: &str) -> PagewrightResult<()> {
        self.windows()
            .switch_to_window(WindowMatch::Title, title)
            .await
            .map(drop)
    }

    /// "I close the window with url containing {part}"
    pub async fn close_window_with_url(&mut self, part: &str) -> PagewrightResult<()> {
        self.windows().close_window(WindowMatch::Url, part).await
    }

    /// "I close the window titled as {title}"
    pub async fn close_window_titled(&mut self, title: &str) -> PagewrightResult<()> {
        self.windows().close_window(WindowMatch::Title, title).await
    }

    /// "I should see the number of open window handles as {n}"
    pub async fn verify_window_count(&mut self, expected: usize) -> PagewrightResult<()> {
        let actual = self.windows().window_count().await?;
        ensure(actual == expected, || {
            format!("A new window is not either opened or closed! Expected {expected}, found {actual}")
        })
    }

    /// "I refresh the page"
    pub async fn refresh(&mut self) -> PagewrightResult<()> {
        self.driver().reload().await
    }

    /// "I navigate to the previous page"
    pub async fn go_back(&mut self) -> PagewrightResult<()> {
        self.driver().go_back().await
    }

    /// "I wait {n} seconds for delayed page load"
    pub async fn wait_seconds(&mut self, seconds: u64) -> PagewrightResult<()> {
        info!(seconds, "waiting");
        self.clock().sleep(Duration::from_secs(seconds)).await;
        Ok(())
    }

    /// "I scroll to the bottom/middle of the page"
    pub async fn scroll(&mut self, direction: &str) -> PagewrightResult<()> {
        let direction: ScrollDirection = direction.parse()?;
        self.engine().scroll(direction).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::config::PagewrightConfig;
    use crate::mock::{MockDriver, MockElement, MockTable};
    use crate::page_object::PageObjectRegistry;
    use chrono::NaiveDate;

    fn registry() -> PageObjectRegistry {
        let mut registry = PageObjectRegistry::new();
        let _ = registry.register(
            PageObjectDescriptor::builder(PageObjectKind::Page, "Login")
                .with_workflow("Main")
                .with_default_url("https://app.test/login")
                .with_loaded_marker("#login")
                .with_locator("Email", "#email")
                .with_locator("Start Date", "#start")
                .with_locator("State", "#state")
                .with_locator("Remember Me", "#remember")
                .with_locator("Submit", "#submit")
                .with_locator("Error", "#error")
                .with_locator("Menu Item", "li.menu")
                .build(),
        );
        let _ = registry.register(
            PageObjectDescriptor::builder(PageObjectKind::Page, "Help")
                .with_workflow("Main")
                .with_loaded_marker("#help")
                .build(),
        );
        let _ = registry.register(
            PageObjectDescriptor::builder(PageObjectKind::Grid, "Orders")
                .with_workflow("Sales")
                .with_loaded_marker("#orders")
                .with_locator("Select", "input.select")
                .with_locator("Open", "a.open")
                .build(),
        );
        registry
    }

    fn clock() -> Arc<FakeClock> {
        Arc::new(FakeClock::at(
            NaiveDate::from_ymd_opt(2024, 3, 14)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
        ))
    }

    fn scenario_with(driver: MockDriver, clock: Arc<FakeClock>) -> Scenario<MockDriver> {
        Scenario::new(driver, Arc::new(registry()))
            .with_config(PagewrightConfig::for_tests())
            .with_clock(clock)
    }

    fn login_driver() -> MockDriver {
        let driver = MockDriver::new();
        let _ = driver.add(MockElement::new("form", "#login"));
        let _ = driver.add(MockElement::input("#email"));
        let _ = driver.add(MockElement::input("#start"));
        let _ = driver.add(MockElement::select("#state", &["Ohio", "Utah"]));
        let _ = driver.add(MockElement::checkbox("#remember"));
        let _ = driver.add(MockElement::new("button", "#submit").disabled());
        let _ = driver.add(MockElement::label("#error", "").hidden());
        for item in ["Home", "Orders", "Reports"] {
            let _ = driver.add(MockElement::label("li.menu", item));
        }
        driver
    }

    async fn on_login() -> Scenario<MockDriver> {
        let mut scenario = scenario_with(login_driver(), clock());
        scenario.should_be_on_page("Login", "Main").await.unwrap();
        scenario
    }

    mod page_state_tests {
        use super::*;

        #[tokio::test]
        async fn test_page_state_records_current_page() {
            let mut scenario = on_login().await;
            assert_eq!(scenario.current_page().unwrap().name(), "Login");
            assert!(scenario.driver().was_called("evaluate_on:#login"));
            scenario.teardown().await.unwrap();
        }

        #[tokio::test]
        async fn test_page_state_overwrites_previous_page() {
            let driver = login_driver();
            let _ = driver.add(MockElement::new("main", "#help"));
            let mut scenario = scenario_with(driver, clock());
            scenario.should_be_on_page("Login", "Main").await.unwrap();
            scenario.should_be_on_page("Help", "Main").await.unwrap();
            assert_eq!(scenario.current_page().unwrap().name(), "Help");
            scenario.teardown().await.unwrap();
        }

        #[tokio::test]
        async fn test_missing_marker_times_out() {
            let mut scenario = scenario_with(MockDriver::new(), clock());
            let err = scenario.should_be_on_page("Login", "Main").await.unwrap_err();
            assert!(matches!(err, PagewrightError::Timeout { .. }));
            assert!(scenario.current_page().is_err());
            scenario.teardown().await.unwrap();
        }

        #[tokio::test]
        async fn test_unknown_page_names_path() {
            let mut scenario = scenario_with(MockDriver::new(), clock());
            let err = scenario.should_be_on_page("Billing", "Main").await.unwrap_err();
            assert!(err.to_string().contains("pages.main.Billing"));
            scenario.teardown().await.unwrap();
        }

        #[tokio::test]
        async fn test_field_step_needs_page() {
            let mut scenario = scenario_with(login_driver(), clock());
            let err = scenario.set_text_field("Email", "x").await.unwrap_err();
            assert!(matches!(err, PagewrightError::NoCurrentPage));
            scenario.teardown().await.unwrap();
        }
    }

    mod field_tests {
        use super::*;

        #[tokio::test]
        async fn test_set_and_verify_text() {
            let mut scenario = on_login().await;
            scenario.set_text_field("Email", "ada@test.dev").await.unwrap();
            scenario
                .verify_field_value("Email", "text field", "ada@test.dev")
                .await
                .unwrap();
            scenario
                .verify_field_value_contains("Email", "text field", "@test")
                .await
                .unwrap();
            let err = scenario
                .verify_field_value("Email", "text field", "bob@test.dev")
                .await
                .unwrap_err();
            assert_eq!(
                err.to_string(),
                "Assertion failed: Incorrect value obtained for field: Email. Expected: bob@test.dev, Got: ada@test.dev"
            );
            scenario.teardown().await.unwrap();
        }

        #[tokio::test]
        async fn test_unknown_field_names_locator() {
            let mut scenario = on_login().await;
            let err = scenario.click("Forgot Password").await.unwrap_err();
            assert!(err.to_string().contains("FORGOT_PASSWORD"));
            scenario.teardown().await.unwrap();
        }

        #[tokio::test]
        async fn test_date_expression_is_evaluated() {
            let mut scenario = on_login().await;
            scenario.set_date_field("Start Date", "t+1").await.unwrap();
            assert_eq!(scenario.driver().value_of("#start").as_deref(), Some("03/15/2024"));
            scenario
                .verify_field_value("Start Date", "date field", "t+1")
                .await
                .unwrap();
            scenario.teardown().await.unwrap();
        }

        #[tokio::test]
        async fn test_malformed_date_expression_fails() {
            let mut scenario = on_login().await;
            let err = scenario
                .set_date_field("Start Date", "t&dtf=bogus")
                .await
                .unwrap_err();
            assert!(matches!(err, PagewrightError::UnsupportedFormat { .. }));
            let err = scenario
                .set_date_field("Start Date", "t+1d")
                .await
                .unwrap_err();
            assert!(matches!(err, PagewrightError::InvalidDateExpression { .. }));
            assert_eq!(scenario.driver().value_of("#start").as_deref(), Some(""));
            scenario.set_date_field("Start Date", "03/01/2024").await.unwrap();
            assert_eq!(scenario.driver().value_of("#start").as_deref(), Some("03/01/2024"));
            scenario.teardown().await.unwrap();
        }

        #[tokio::test]
        async fn test_set_fields_table() {
            let mut scenario = on_login().await;
            scenario.context_mut().set_variable("user", "ada");
            let table = DataTable::from_slices(&[
                &["field", "fieldType", "value"],
                &["Email", "text field", "$SESSION_VARIABLE:user$@test.dev"],
                &["State", "dropdown", "Utah"],
                &["Remember Me", "checkbox", "checked"],
                &["Start Date", "date field", "t"],
            ]);
            scenario.set_fields(&table).await.unwrap();
            assert_eq!(scenario.driver().value_of("#email").as_deref(), Some("ada@test.dev"));
            assert_eq!(scenario.driver().value_of("#start").as_deref(), Some("03/14/2024"));
            let check = DataTable::from_slices(&[
                &["field", "fieldType", "value"],
                &["State", "dropdown", "Utah"],
                &["Remember Me", "checkbox", "Checked"],
            ]);
            scenario.verify_field_values(&check).await.unwrap();
            scenario.teardown().await.unwrap();
        }

        #[tokio::test]
        async fn test_set_fields_rejects_bad_headers() {
            let mut scenario = on_login().await;
            let table = DataTable::from_slices(&[&["field", "value"], &["Email", "x"]]);
            let err = scenario.set_fields(&table).await.unwrap_err();
            assert!(matches!(err, PagewrightError::DataTableShape { .. }));
            assert!(!scenario.driver().was_called("fill"));
            scenario.teardown().await.unwrap();
        }

        #[tokio::test]
        async fn test_checkbox_set_twice_clicks_once() {
            let mut scenario = on_login().await;
            scenario.set_checkbox("Remember Me", "checked").await.unwrap();
            scenario.set_checkbox("Remember Me", "Checked").await.unwrap();
            assert_eq!(scenario.driver().call_count("click:#remember"), 1);
            scenario.teardown().await.unwrap();
        }

        #[tokio::test]
        async fn test_value_contains_all() {
            let mut scenario = on_login().await;
            scenario.set_text_field("Email", "ada lovelace").await.unwrap();
            let table = DataTable::from_slices(&[&["values"], &["ada"], &["love"]]);
            scenario
                .verify_field_value_contains_all("Email", "text field", &table)
                .await
                .unwrap();
            let missing = DataTable::from_slices(&[&["values"], &["babbage"]]);
            let err = scenario
                .verify_field_value_contains_all("Email", "text field", &missing)
                .await
                .unwrap_err();
            assert!(err.to_string().contains("babbage not included in the ada lovelace"));
            scenario.teardown().await.unwrap();
        }

        #[tokio::test]
        async fn test_send_key_and_scroll() {
            let mut scenario = on_login().await;
            scenario.send_key("Enter", "Email").await.unwrap();
            scenario.scroll("bottom").await.unwrap();
            assert!(scenario.driver().was_called("press:#email:Enter"));
            assert!(scenario.driver().was_called("evaluate:window.scrollTo(0, 360)"));
            scenario.teardown().await.unwrap();
        }
    }

    mod state_tests {
        use super::*;

        #[tokio::test]
        async fn test_single_states() {
            let mut scenario = on_login().await;
            scenario.verify_field_state("Email", "visible").await.unwrap();
            scenario.verify_field_state("Submit", "readonly").await.unwrap();
            scenario.verify_field_state("Error", "not visible").await.unwrap();
            let err = scenario.verify_field_state("Error", "visible").await.unwrap_err();
            assert!(err.to_string().contains("Error is not visible"));
            scenario.teardown().await.unwrap();
        }

        #[tokio::test]
        async fn test_table_states_and_counts() {
            let mut scenario = on_login().await;
            let table = DataTable::from_slices(&[&["field"], &["Email"], &["State"]]);
            scenario.verify_fields_state("editable", &table).await.unwrap();
            scenario.verify_element_count("Menu Item", "3").await.unwrap();
            scenario.context_mut().set_variable("items", 3_i64);
            scenario
                .verify_element_count("Menu Item", "$SESSION_VARIABLE:items$")
                .await
                .unwrap();
            assert!(scenario.verify_element_count("Menu Item", "2").await.is_err());
            scenario.teardown().await.unwrap();
        }
    }

    mod grid_tests {
        use super::*;

        fn orders_driver() -> (MockDriver, MockTable) {
            let driver = MockDriver::new();
            let table = driver.add_table(
                &Locator::css("#orders"),
                &["", "Order", "Status", "Total"],
                &[
                    &["", "A-1", "Open", "10.00"],
                    &["", "A-2", "Closed", ""],
                ],
            );
            for row in &table.rows {
                let _ = driver.add_child(row, MockElement::checkbox("input.select"));
                let _ = driver.add_child(row, MockElement::new("a", "a.open"));
            }
            (driver, table)
        }

        async fn on_orders() -> (Scenario<MockDriver>, MockTable) {
            let (driver, table) = orders_driver();
            let mut scenario = scenario_with(driver, clock());
            scenario.focus_on_grid("Orders", "Sales").await.unwrap();
            (scenario, table)
        }

        #[tokio::test]
        async fn test_grid_values_and_headers() {
            let (mut scenario, _) = on_orders().await;
            let values = DataTable::from_slices(&[
                &["row", "Order", "Total"],
                &["1", "A-1", "10.00"],
                &["2", "A-2", ""],
            ]);
            scenario.verify_grid_values(&values).await.unwrap();
            let headers = DataTable::from_slices(&[&["headers"], &["Order"], &["Status"], &["Total"]]);
            scenario.verify_grid_headers(&headers).await.unwrap();
            scenario.verify_grid_row_count(2).await.unwrap();
            assert!(scenario.verify_grid_row_count(3).await.is_err());
            scenario.teardown().await.unwrap();
        }

        #[tokio::test]
        async fn test_grid_value_mismatch() {
            let (mut scenario, _) = on_orders().await;
            let values = DataTable::from_slices(&[&["row", "Status"], &["2", "Open"]]);
            let err = scenario.verify_grid_values(&values).await.unwrap_err();
            assert!(err.to_string().contains("expected 'Open', got 'Closed'"));
            scenario.teardown().await.unwrap();
        }

        #[tokio::test]
        async fn test_row_scoped_checkbox() {
            let (mut scenario, _) = on_orders().await;
            scenario.set_grid_checkbox("Select", "checked", 2).await.unwrap();
            assert_eq!(scenario.driver().call_count("click:input.select"), 1);
            scenario
                .set_grid_checkbox_where("Select", "checked", "Order", "A-2")
                .await
                .unwrap();
            assert_eq!(scenario.driver().call_count("click:input.select"), 1);
            scenario.teardown().await.unwrap();
        }

        #[tokio::test]
        async fn test_click_where_column_matches() {
            let (mut scenario, _) = on_orders().await;
            scenario
                .click_in_grid_row_where("Open", "Order", "A-2")
                .await
                .unwrap();
            assert!(scenario.driver().was_called("click:a.open"));
            let err = scenario
                .click_in_grid_row_where("Open", "Order", "Z-9")
                .await
                .unwrap_err();
            assert!(matches!(err, PagewrightError::RowNotFound { .. }));
            scenario.teardown().await.unwrap();
        }
    }

    mod session_tests {
        use super::*;

        #[tokio::test]
        async fn test_set_and_add() {
            let mut scenario = scenario_with(MockDriver::new(), clock());
            scenario.set_session_variable("first", "5").unwrap();
            scenario.set_session_variable("second", "37").unwrap();
            scenario.add_session_variables("first", "second", "sum").unwrap();
            assert_eq!(scenario.context().integer("sum").unwrap(), 42);
            scenario.set_session_variable("name", "Ada").unwrap();
            let err = scenario
                .add_session_variables("name", "first", "bad")
                .unwrap_err();
            assert!(matches!(err, PagewrightError::TypeMismatch { .. }));
            scenario.teardown().await.unwrap();
        }

        #[tokio::test]
        async fn test_stored_value_expands_unchanged() {
            let mut scenario = scenario_with(MockDriver::new(), clock());
            for (name, raw) in [("zip", "02134"), ("price", "1.50"), ("delta", "+5"), ("big", "1e3")] {
                scenario.set_session_variable(name, raw).unwrap();
                let token = format!("$SESSION_VARIABLE${name}$");
                assert_eq!(scenario.transformer().transform(&token).unwrap(), raw);
            }
            scenario
                .set_session_variable("stamp", "$CURRENT_DATE_FOR_NAME$")
                .unwrap();
            assert_eq!(scenario.context().text("stamp").unwrap(), "03142024");
            scenario.teardown().await.unwrap();
        }
    }

    mod browser_tests {
        use super::*;

        #[tokio::test]
        async fn test_navigation() {
            let mut scenario = scenario_with(MockDriver::new(), clock());
            scenario.navigate_to_page("Login", Some("Main")).await.unwrap();
            assert!(scenario.driver().was_called("navigate:https://app.test/login"));
            let err = scenario
                .navigate_to_page("Help", Some("Main"))
                .await
                .unwrap_err();
            assert!(matches!(err, PagewrightError::MissingDefaultUrl { .. }));
            scenario.go_back().await.unwrap();
            scenario.refresh().await.unwrap();
            assert_eq!(scenario.driver().current_url().await.unwrap(), "about:blank");
            assert!(scenario.driver().was_called("reload"));
            scenario.teardown().await.unwrap();
        }

        #[tokio::test]
        async fn test_open_home_page_sets_viewport() {
            let mut config = PagewrightConfig::for_tests();
            config.home_page = Some("https://app.test/".to_string());
            let mut scenario =
                Scenario::new(MockDriver::new(), Arc::new(registry())).with_config(config);
            scenario.open_home_page().await.unwrap();
            assert_eq!(scenario.driver().history()[0], "set_viewport:1920x1080");
            assert!(scenario.driver().was_called("navigate:https://app.test/"));
            scenario.teardown().await.unwrap();
        }

        #[tokio::test]
        async fn test_home_page_must_be_configured() {
            let mut scenario = scenario_with(MockDriver::new(), clock());
            let err = scenario.open_home_page().await.unwrap_err();
            assert!(matches!(err, PagewrightError::Config { .. }));
            scenario.teardown().await.unwrap();
        }

        #[tokio::test]
        async fn test_windows_and_waits() {
            let driver = MockDriver::new();
            driver.open_window_later("Invoice 7", "https://app.test/invoice/7", 2);
            let clock = clock();
            let mut scenario = scenario_with(driver, Arc::clone(&clock));
            scenario.switch_to_window_titled("Invoice").await.unwrap();
            scenario.verify_window_count(2).await.unwrap();
            scenario.close_window_with_url("/invoice/7").await.unwrap();
            scenario.verify_window_count(1).await.unwrap();
            scenario.wait_seconds(3).await.unwrap();
            assert_eq!(clock.total_slept(), Duration::from_secs(3));
            scenario.teardown().await.unwrap();
        }
    }
}

//! Steps for the grid in focus.

use cucumber::{gherkin::Step, then, when};

use pagewright::{FieldType, Locator};

use super::table;
use crate::world::{PagewrightWorld, ORDERS_TABLE, ROW_SELECTOR};

#[when(regex = r"^I set the (.+) checkbox as (checked|unchecked) on row (\d+) of the grid$")]
async fn set_row_checkbox(world: &mut PagewrightWorld, field: String, value: String, row: usize) {
    PagewrightWorld::check(world.scenario.set_grid_checkbox(&field, &value, row).await);
}

#[when(regex = r#"^I set the (.+) checkbox as (checked|unchecked) on row with (.+) column as "(.*)" in the grid$"#)]
async fn set_checkbox_where(
    world: &mut PagewrightWorld,
    field: String,
    value: String,
    column: String,
    lookup: String,
) {
    PagewrightWorld::check(
        world
            .scenario
            .set_grid_checkbox_where(&field, &value, &column, &lookup)
            .await,
    );
}

#[when(regex = r"^I click the (.+) (?:button|link|icon) on row (\d+) of the grid$")]
async fn click_in_row(world: &mut PagewrightWorld, field: String, row: usize) {
    PagewrightWorld::check(world.scenario.click_in_grid_row(&field, row).await);
}

#[when(regex = r#"^I click the (.+) (?:button|link|icon) on row with (.+) column as "(.*)" in the grid$"#)]
async fn click_where(world: &mut PagewrightWorld, field: String, column: String, lookup: String) {
    PagewrightWorld::check(
        world
            .scenario
            .click_in_grid_row_where(&field, &column, &lookup)
            .await,
    );
}

#[when(regex = r#"^I try to click the (.+) link on row with (.+) column as "(.*)" in the grid$"#)]
async fn try_click_where(
    world: &mut PagewrightWorld,
    field: String,
    column: String,
    lookup: String,
) {
    let result = world
        .scenario
        .click_in_grid_row_where(&field, &column, &lookup)
        .await;
    world.record(result);
}

#[then("I should see the following values in the grid:")]
async fn grid_values(world: &mut PagewrightWorld, step: &Step) {
    let expected = table(step);
    PagewrightWorld::check(world.scenario.verify_grid_values(&expected).await);
}

#[then(regex = r"^I should see (\d+) rows? in the grid$")]
async fn row_count(world: &mut PagewrightWorld, rows: usize) {
    PagewrightWorld::check(world.scenario.verify_grid_row_count(rows).await);
}

#[then("I should see the grid contains the following headers:")]
async fn headers(world: &mut PagewrightWorld, step: &Step) {
    let expected = table(step);
    PagewrightWorld::check(world.scenario.verify_grid_headers(&expected).await);
}

#[then(regex = r"^the row selector on row (\d+) of the grid should be (Checked|Unchecked)$")]
async fn row_selector_is(world: &mut PagewrightWorld, row: usize, expected: String) {
    let scenario = &world.scenario;
    let element = PagewrightWorld::check(
        scenario
            .grid()
            .row_field(&Locator::css(ORDERS_TABLE), row, &Locator::css(ROW_SELECTOR))
            .await,
    );
    let actual = PagewrightWorld::check(
        scenario
            .engine()
            .read_element(&element, FieldType::Checkbox)
            .await,
    );
    assert_eq!(actual, expected);
}

//! Steps for field writes, reads and state checks.

use cucumber::{gherkin::Step, then, when};

use super::table;
use crate::world::PagewrightWorld;

#[when(regex = r#"^I set the (.+) text field as "(.*)"$"#)]
async fn set_text(world: &mut PagewrightWorld, field: String, value: String) {
    PagewrightWorld::check(world.scenario.set_text_field(&field, &value).await);
}

#[when(regex = r#"^I set the (.+) date field as "(.*)"$"#)]
async fn set_date(world: &mut PagewrightWorld, field: String, value: String) {
    PagewrightWorld::check(world.scenario.set_date_field(&field, &value).await);
}

#[when(regex = r#"^I set the (.+) dropdown as "(.*)"$"#)]
async fn set_dropdown(world: &mut PagewrightWorld, field: String, value: String) {
    PagewrightWorld::check(world.scenario.set_dropdown(&field, &value).await);
}

#[when(regex = r"^I set the (.+) checkbox as (checked|unchecked)$")]
async fn set_checkbox(world: &mut PagewrightWorld, field: String, value: String) {
    PagewrightWorld::check(world.scenario.set_checkbox(&field, &value).await);
}

#[when(regex = r"^I click the (.+) (?:button|link|icon)$")]
async fn click(world: &mut PagewrightWorld, field: String) {
    PagewrightWorld::check(world.scenario.click(&field).await);
}

#[when("I set these fields with following values:")]
async fn set_fields(world: &mut PagewrightWorld, step: &Step) {
    let fields = table(step);
    PagewrightWorld::check(world.scenario.set_fields(&fields).await);
}

#[when(regex = r#"^I try to set the (.+) dropdown as "(.*)"$"#)]
async fn try_set_dropdown(world: &mut PagewrightWorld, field: String, value: String) {
    let result = world.scenario.set_dropdown(&field, &value).await;
    world.record(result);
}

#[then(regex = r#"^I should see the (.+) (text field|date field|dropdown|checkbox|label) value as "(.*)"$"#)]
async fn value_is(world: &mut PagewrightWorld, field: String, field_type: String, value: String) {
    PagewrightWorld::check(
        world
            .scenario
            .verify_field_value(&field, &field_type, &value)
            .await,
    );
}

#[then(regex = r#"^I should see the (.+) (text field|label) value contains "(.*)"$"#)]
async fn value_contains(
    world: &mut PagewrightWorld,
    field: String,
    field_type: String,
    value: String,
) {
    PagewrightWorld::check(
        world
            .scenario
            .verify_field_value_contains(&field, &field_type, &value)
            .await,
    );
}

#[then(regex = r#"^I try to verify the (.+) (text field|date field|dropdown|label) value as "(.*)"$"#)]
async fn try_value_is(
    world: &mut PagewrightWorld,
    field: String,
    field_type: String,
    value: String,
) {
    let result = world
        .scenario
        .verify_field_value(&field, &field_type, &value)
        .await;
    world.record(result);
}

#[then("I should see the following field values as:")]
async fn values_are(world: &mut PagewrightWorld, step: &Step) {
    let fields = table(step);
    PagewrightWorld::check(world.scenario.verify_field_values(&fields).await);
}

#[then(regex = r"^I should see the (.+) (?:field|button|label) is (visible|not visible|readonly|editable)$")]
async fn state_is(world: &mut PagewrightWorld, field: String, state: String) {
    PagewrightWorld::check(world.scenario.verify_field_state(&field, &state).await);
}

#[then(regex = r"^I should see the following fields are (visible|not visible|readonly|editable):$")]
async fn states_are(world: &mut PagewrightWorld, state: String, step: &Step) {
    let fields = table(step);
    PagewrightWorld::check(world.scenario.verify_fields_state(&state, &fields).await);
}

#[then(regex = r"^I should see the count of (.+) as (\S+)$")]
async fn count_is(world: &mut PagewrightWorld, field: String, count: String) {
    PagewrightWorld::check(world.scenario.verify_element_count(&field, &count).await);
}

#[then(regex = r#"^the step fails with "(.+)"$"#)]
fn step_failed(world: &mut PagewrightWorld, message: String) {
    let err = world
        .last_error
        .take()
        .unwrap_or_else(|| panic!("expected a failure mentioning {message:?}"));
    assert!(
        err.to_string().contains(&message),
        "{err} does not mention {message:?}"
    );
}

//! Steps for session variables and token expansion.

use cucumber::{then, when};

use crate::world::PagewrightWorld;

#[when(regex = r#"^I set the session variable (\S+) as "(.*)"$"#)]
fn set_variable(world: &mut PagewrightWorld, name: String, value: String) {
    PagewrightWorld::check(world.scenario.set_session_variable(&name, &value));
}

#[when(regex = r"^I add the session variable values (\S+) and (\S+) saved in (\S+)$")]
fn add_variables(world: &mut PagewrightWorld, first: String, second: String, result: String) {
    PagewrightWorld::check(
        world
            .scenario
            .add_session_variables(&first, &second, &result),
    );
}

#[when(regex = r"^I try to add the session variable values (\S+) and (\S+) saved in (\S+)$")]
fn try_add_variables(world: &mut PagewrightWorld, first: String, second: String, result: String) {
    let outcome = world
        .scenario
        .add_session_variables(&first, &second, &result);
    world.record(outcome);
}

#[then(regex = r#"^the session variable (\S+) should be "(.*)"$"#)]
fn variable_is(world: &mut PagewrightWorld, name: String, expected: String) {
    let value = PagewrightWorld::check(world.scenario.context().variable(&name));
    assert_eq!(value.to_string(), expected);
}

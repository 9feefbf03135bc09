//! Steps for browser windows and tabs.

use cucumber::{given, then, when};

use crate::world::PagewrightWorld;

#[given(regex = r#"^a window titled "(.+)" at "(.+)" opens after (\d+) checks?$"#)]
fn window_opens_later(world: &mut PagewrightWorld, title: String, url: String, checks: u32) {
    world.scenario.driver().open_window_later(&title, &url, checks);
}

#[when(regex = r#"^I switch to the new window titled as "(.+)"$"#)]
async fn switch_titled(world: &mut PagewrightWorld, title: String) {
    PagewrightWorld::check(world.scenario.switch_to_window_titled(&title).await);
}

#[when(regex = r#"^I switch to the window with url containing "(.+)"$"#)]
async fn switch_url(world: &mut PagewrightWorld, part: String) {
    PagewrightWorld::check(world.scenario.switch_to_window_with_url(&part).await);
}

#[when(regex = r#"^I close the window with url containing "(.+)"$"#)]
async fn close_url(world: &mut PagewrightWorld, part: String) {
    PagewrightWorld::check(world.scenario.close_window_with_url(&part).await);
}

#[when(regex = r#"^I try to switch to the new window titled as "(.+)"$"#)]
async fn try_switch_titled(world: &mut PagewrightWorld, title: String) {
    let result = world.scenario.switch_to_window_titled(&title).await;
    world.record(result);
}

#[then(regex = r"^I should see the number of open window handles as (\d+)$")]
async fn window_count(world: &mut PagewrightWorld, expected: usize) {
    PagewrightWorld::check(world.scenario.verify_window_count(expected).await);
}

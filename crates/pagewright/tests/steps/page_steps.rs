//! Steps for page focus and browser navigation.

use cucumber::{given, then, when};
use pagewright::BrowserDriver;

use crate::world::PagewrightWorld;

#[given("I launch the browser and open the home page")]
async fn open_home_page(world: &mut PagewrightWorld) {
    PagewrightWorld::check(world.scenario.open_home_page().await);
}

#[given(regex = r"^I should be on the (.+) page under the (.+) workflow$")]
async fn on_page(world: &mut PagewrightWorld, page: String, workflow: String) {
    PagewrightWorld::check(world.scenario.should_be_on_page(&page, &workflow).await);
}

#[given(regex = r"^I focus on the (.+) grid under the (.+) workflow$")]
async fn on_grid(world: &mut PagewrightWorld, grid: String, workflow: String) {
    PagewrightWorld::check(world.scenario.focus_on_grid(&grid, &workflow).await);
}

#[when(regex = r"^I navigate to the (.+) page under the (.+) workflow$")]
async fn navigate(world: &mut PagewrightWorld, page: String, workflow: String) {
    PagewrightWorld::check(
        world
            .scenario
            .navigate_to_page(&page, Some(workflow.as_str()))
            .await,
    );
}

#[when("I refresh the page")]
async fn refresh(world: &mut PagewrightWorld) {
    PagewrightWorld::check(world.scenario.refresh().await);
}

#[when("I navigate to the previous page")]
async fn go_back(world: &mut PagewrightWorld) {
    PagewrightWorld::check(world.scenario.go_back().await);
}

#[when(regex = r"^I wait (\d+) seconds? for delayed page load$")]
async fn wait(world: &mut PagewrightWorld, seconds: u64) {
    PagewrightWorld::check(world.scenario.wait_seconds(seconds).await);
}

#[when(regex = r"^I scroll to the (.+) of the page$")]
async fn scroll(world: &mut PagewrightWorld, direction: String) {
    PagewrightWorld::check(world.scenario.scroll(&direction).await);
}

#[then(regex = r#"^the browser should show "(.+)"$"#)]
async fn shows_url(world: &mut PagewrightWorld, url: String) {
    let current = PagewrightWorld::check(world.scenario.driver().current_url().await);
    assert_eq!(current, url);
}

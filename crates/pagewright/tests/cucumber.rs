//! Behavioural tests for the pagewright step surface.
//!
//! Feature files under `tests/features` drive a scenario backed by the
//! in-memory driver. Each scenario is torn down in an after hook so the
//! session ends even when a step fails.

mod steps;

use cucumber::World as _;
use futures::FutureExt as _;
use world::PagewrightWorld;

#[tokio::main]
async fn main() {
    let _ = pagewright::logging::init();
    PagewrightWorld::cucumber()
        .after(|_feature, _rule, _scenario, _finished, world| {
            async move {
                if let Some(world) = world {
                    world.teardown().await;
                }
            }
            .boxed_local()
        })
        .run_and_exit("tests/features")
        .await;
}

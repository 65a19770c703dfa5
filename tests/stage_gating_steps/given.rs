//! Given steps for stage gating BDD scenarios.

use super::world::{GatingWorld, run_async};
use rstest_bdd_macros::given;

#[given("an idea on the backlog with a bound design document")]
fn an_idea_with_a_design(world: &mut GatingWorld) -> Result<(), eyre::Report> {
    run_async(world.seed_idea_with_design())
}

#[given("an idea in progress with every artifact bound")]
fn an_idea_in_progress(world: &mut GatingWorld) -> Result<(), eyre::Report> {
    run_async(world.march_to_in_progress())
}

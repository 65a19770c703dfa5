//! Behaviour tests for stage gating and weighted review points.

mod stage_gating_steps;

use rstest_bdd_macros::scenario;
use stage_gating_steps::world::{GatingWorld, world};

#[scenario(
    path = "tests/features/stage_gating.feature",
    name = "Review points accumulate until the ready gate opens"
)]
#[tokio::test(flavor = "multi_thread")]
async fn points_accumulate_to_the_gate(world: GatingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/stage_gating.feature",
    name = "A clarification request sends a ready idea back to the backlog"
)]
#[tokio::test(flavor = "multi_thread")]
async fn clarification_resets_the_idea(world: GatingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/stage_gating.feature",
    name = "The terminal stage needs a validated paper, not more points"
)]
#[tokio::test(flavor = "multi_thread")]
async fn a_paper_outweighs_points_at_the_end(world: GatingWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/stage_gating.feature",
    name = "A backlog idea cannot jump straight into progress"
)]
#[tokio::test(flavor = "multi_thread")]
async fn stages_are_never_skipped(world: GatingWorld) {
    let _ = world;
}

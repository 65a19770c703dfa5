//! When steps for stage gating BDD scenarios.

use super::world::{GatingWorld, run_async};
use rstest_bdd_macros::when;
use vasari::pipeline::domain::{ArtifactKind, Stage};

#[when("{count:usize} model reviews of the design are recorded")]
fn model_reviews_of_the_design(
    world: &mut GatingWorld,
    count: usize,
) -> Result<(), eyre::Report> {
    run_async(world.record_model_reviews(ArtifactKind::DesignDoc, count))
}

#[when("a human review of the design is recorded")]
fn a_human_review_of_the_design(world: &mut GatingWorld) -> Result<(), eyre::Report> {
    run_async(world.record_human_reviews(ArtifactKind::DesignDoc, 1))
}

#[when("another human review of the design is recorded")]
fn another_human_review_of_the_design(world: &mut GatingWorld) -> Result<(), eyre::Report> {
    run_async(world.record_human_reviews(ArtifactKind::DesignDoc, 1))
}

#[when("{count:usize} human reviews of the design are recorded")]
fn human_reviews_of_the_design(
    world: &mut GatingWorld,
    count: usize,
) -> Result<(), eyre::Report> {
    run_async(world.record_human_reviews(ArtifactKind::DesignDoc, count))
}

#[when("{count:usize} human reviews of the paper are recorded")]
fn human_reviews_of_the_paper(
    world: &mut GatingWorld,
    count: usize,
) -> Result<(), eyre::Report> {
    run_async(world.record_human_reviews(ArtifactKind::Paper, count))
}

#[when("the idea advances to the ready stage")]
fn the_idea_advances_to_ready(world: &mut GatingWorld) -> Result<(), eyre::Report> {
    run_async(world.advance_to(Stage::Ready))
}

#[when("a human review requesting clarification is recorded")]
fn a_clarifying_review_is_recorded(world: &mut GatingWorld) -> Result<(), eyre::Report> {
    run_async(world.record_clarification_request(ArtifactKind::DesignDoc))
}

#[when("the paper references are marked validated")]
fn the_references_are_marked_validated(world: &mut GatingWorld) -> Result<(), eyre::Report> {
    let (id, _) = world.tracked()?;
    run_async(world.store.mark_references_validated(&id))
        .map_err(|err| eyre::eyre!("mark references validated failed: {err}"))
}

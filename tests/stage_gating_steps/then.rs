//! Then steps for stage gating BDD scenarios.

use super::world::{GatingWorld, run_async};
use chrono::Utc;
use rstest_bdd_macros::then;
use vasari::pipeline::domain::{ArtifactKind, PipelineDomainError, Points, Stage};

#[then("the design scores {points:f64} points")]
fn the_design_scores(world: &mut GatingWorld, points: f64) -> Result<(), eyre::Report> {
    score_matches(world, ArtifactKind::DesignDoc, points)
}

#[then("the paper scores {points:f64} points")]
fn the_paper_scores(world: &mut GatingWorld, points: f64) -> Result<(), eyre::Report> {
    score_matches(world, ArtifactKind::Paper, points)
}

#[then("the idea is not ready to advance")]
fn not_ready_to_advance(world: &mut GatingWorld) -> Result<(), eyre::Report> {
    let state = run_async(world.state())?;
    let pending = state.pending_transition(&world.thresholds);
    if let Some(stage) = pending {
        return Err(eyre::eyre!("expected no pending transition, found {stage}"));
    }
    Ok(())
}

#[then("the idea is ready to enter the {stage} stage")]
fn ready_to_enter(world: &mut GatingWorld, stage: String) -> Result<(), eyre::Report> {
    let expected = Stage::try_from(stage.as_str())?;
    let state = run_async(world.state())?;
    let pending = state.pending_transition(&world.thresholds);
    if pending != Some(expected) {
        return Err(eyre::eyre!(
            "expected a pending transition to {expected}, found {pending:?}"
        ));
    }
    Ok(())
}

#[then("the idea sits in the {stage} stage")]
fn sits_in_stage(world: &mut GatingWorld, stage: String) -> Result<(), eyre::Report> {
    let expected = Stage::try_from(stage.as_str())?;
    let state = run_async(world.state())?;
    if state.stage() != expected {
        return Err(eyre::eyre!(
            "expected the idea in {expected}, found {}",
            state.stage()
        ));
    }
    Ok(())
}

#[then("the idea is flagged as needing clarification")]
fn flagged_for_clarification(world: &mut GatingWorld) -> Result<(), eyre::Report> {
    let state = run_async(world.state())?;
    if !state.needs_clarification() {
        return Err(eyre::eyre!("expected the needs-clarification flag to be set"));
    }
    Ok(())
}

#[then("the idea cannot skip straight to in progress")]
fn cannot_skip_ahead(world: &mut GatingWorld) -> Result<(), eyre::Report> {
    let (id, _) = world.tracked()?;
    let mut fetched = run_async(world.store.get_idea(&id))
        .map_err(|err| eyre::eyre!("fetch idea for skip check failed: {err}"))?;
    let result = fetched
        .idea
        .advance_stage(Stage::InProgress, &world.thresholds, Utc::now());
    if !matches!(result, Err(PipelineDomainError::StageNotAdjacent { .. })) {
        return Err(eyre::eyre!(
            "expected a stage adjacency rejection, got {result:?}"
        ));
    }
    Ok(())
}

fn score_matches(
    world: &mut GatingWorld,
    target: ArtifactKind,
    points: f64,
) -> Result<(), eyre::Report> {
    let expected = Points::try_from_f64(points)?;
    let state = run_async(world.state())?;
    let actual = state.score(target);
    if actual != expected {
        return Err(eyre::eyre!(
            "expected a {target} score of {expected}, found {actual}"
        ));
    }
    Ok(())
}

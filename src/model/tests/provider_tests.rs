//! Tests for provider ranking, ceiling enforcement, and fallback.

use std::collections::BTreeSet;
use std::sync::Arc;

use rstest::rstest;

use crate::model::adapters::memory::{ScriptedOutcome, StaticCatalog};
use crate::model::domain::{
    Availability, GenerationRequest, ModelCandidate, ModelId, ParamCount,
};
use crate::model::services::{ModelPolicy, ModelProvider, ProviderError};

fn model_id(raw: &str) -> ModelId {
    ModelId::new(raw).expect("valid model id")
}

fn params(millions: u64) -> ParamCount {
    ParamCount::from_millions(millions).expect("valid parameter count")
}

fn candidate(raw: &str, millions: u64) -> ModelCandidate {
    ModelCandidate::new(model_id(raw), params(millions))
}

fn provider(catalog: &Arc<StaticCatalog>) -> ModelProvider<StaticCatalog> {
    let policy = ModelPolicy::new(model_id("pocket-1b"), params(7000));
    ModelProvider::new(Arc::clone(catalog), policy)
}

fn no_tags() -> BTreeSet<String> {
    BTreeSet::new()
}

fn request(prompt: &str) -> GenerationRequest {
    GenerationRequest::new(prompt, 512).expect("valid request")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn selection_prefers_trending_then_identifier() {
    let catalog = Arc::new(StaticCatalog::new());
    catalog
        .add_model(candidate("zephyr-3b", 3000).with_trending(5))
        .expect("model added");
    catalog
        .add_model(candidate("hermes-7b", 7000).with_trending(9))
        .expect("model added");
    catalog
        .add_model(candidate("aria-7b", 7000).with_trending(9))
        .expect("model added");

    let chosen = provider(&catalog).select_model(&no_tags()).await;
    assert_eq!(chosen, model_id("aria-7b"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn selection_skips_models_over_the_parameter_ceiling() {
    let catalog = Arc::new(StaticCatalog::new());
    catalog
        .add_model(candidate("colossus-13b", 13_000).with_trending(10))
        .expect("model added");
    catalog
        .add_model(candidate("hermes-7b", 7000).with_trending(1))
        .expect("model added");

    let chosen = provider(&catalog).select_model(&no_tags()).await;
    assert_eq!(chosen, model_id("hermes-7b"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn selection_skips_offline_models() {
    let catalog = Arc::new(StaticCatalog::new());
    catalog
        .add_model(
            candidate("hermes-7b", 7000)
                .with_trending(9)
                .with_availability(Availability::Offline),
        )
        .expect("model added");
    catalog
        .add_model(candidate("zephyr-3b", 3000).with_trending(2))
        .expect("model added");

    let chosen = provider(&catalog).select_model(&no_tags()).await;
    assert_eq!(chosen, model_id("zephyr-3b"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn selection_requires_every_requested_tag() {
    let catalog = Arc::new(StaticCatalog::new());
    catalog
        .add_model(candidate("prose-3b", 3000).with_trending(9))
        .expect("model added");
    catalog
        .add_model(candidate("coder-3b", 3000).with_trending(1).with_tag("code"))
        .expect("model added");

    let tags = BTreeSet::from(["code".to_owned()]);
    let chosen = provider(&catalog).select_model(&tags).await;
    assert_eq!(chosen, model_id("coder-3b"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn selection_falls_back_when_nothing_is_eligible() {
    let catalog = Arc::new(StaticCatalog::new());
    catalog
        .add_model(candidate("colossus-13b", 13_000))
        .expect("model added");

    let chosen = provider(&catalog).select_model(&no_tags()).await;
    assert_eq!(chosen, model_id("pocket-1b"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn busy_models_are_skipped_without_consuming_attempts() {
    let catalog = Arc::new(StaticCatalog::new());
    catalog
        .add_model(
            candidate("hermes-7b", 7000)
                .with_trending(9)
                .with_availability(Availability::Busy),
        )
        .expect("model added");
    catalog
        .add_model(candidate("zephyr-3b", 3000).with_trending(2))
        .expect("model added");
    catalog
        .script(
            &model_id("zephyr-3b"),
            ScriptedOutcome::Text("A serviceable draft.".to_owned()),
        )
        .expect("outcome scripted");

    let generated = provider(&catalog)
        .generate(&request("Draft a design."))
        .await
        .expect("generation succeeds");

    assert_eq!(generated.model(), &model_id("zephyr-3b"));
    let calls = catalog.calls().expect("calls readable");
    assert_eq!(calls.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_generation_moves_to_a_distinct_candidate() {
    let catalog = Arc::new(StaticCatalog::new());
    catalog
        .add_model(candidate("hermes-7b", 7000).with_trending(9))
        .expect("model added");
    catalog
        .add_model(candidate("zephyr-3b", 3000).with_trending(2))
        .expect("model added");
    catalog
        .script(
            &model_id("hermes-7b"),
            ScriptedOutcome::Failure("context overflow".to_owned()),
        )
        .expect("outcome scripted");
    catalog
        .script(
            &model_id("zephyr-3b"),
            ScriptedOutcome::Text("A serviceable draft.".to_owned()),
        )
        .expect("outcome scripted");

    let generated = provider(&catalog)
        .generate(&request("Draft a design."))
        .await
        .expect("generation succeeds");

    assert_eq!(generated.model(), &model_id("zephyr-3b"));
    let calls = catalog.calls().expect("calls readable");
    let models: Vec<&str> = calls.iter().map(|call| call.model.as_str()).collect();
    assert_eq!(models, vec!["hermes-7b", "zephyr-3b"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_bodies_consume_an_attempt_and_fall_through() {
    let catalog = Arc::new(StaticCatalog::new());
    catalog
        .add_model(candidate("hermes-7b", 7000).with_trending(9))
        .expect("model added");
    catalog
        .add_model(candidate("zephyr-3b", 3000).with_trending(2))
        .expect("model added");
    catalog
        .script(&model_id("hermes-7b"), ScriptedOutcome::Text("   ".to_owned()))
        .expect("outcome scripted");
    catalog
        .script(
            &model_id("zephyr-3b"),
            ScriptedOutcome::Text("A serviceable draft.".to_owned()),
        )
        .expect("outcome scripted");

    let generated = provider(&catalog)
        .generate(&request("Draft a design."))
        .await
        .expect("generation succeeds");
    assert_eq!(generated.model(), &model_id("zephyr-3b"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repeated_failures_exhaust_the_attempt_budget() {
    let catalog = Arc::new(StaticCatalog::new());
    for (name, trending) in [("hermes-7b", 9), ("zephyr-3b", 5), ("aria-3b", 3), ("nano-1b", 1)] {
        catalog
            .add_model(candidate(name, 3000).with_trending(trending))
            .expect("model added");
        catalog
            .script(
                &model_id(name),
                ScriptedOutcome::Failure("context overflow".to_owned()),
            )
            .expect("outcome scripted");
    }

    let result = provider(&catalog).generate(&request("Draft a design.")).await;
    assert!(matches!(
        result,
        Err(ProviderError::AttemptsExhausted { attempts: 3 })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn nothing_loadable_reports_no_eligible_model() {
    let catalog = Arc::new(StaticCatalog::new());
    catalog
        .add_model(candidate("hermes-7b", 7000).with_availability(Availability::Busy))
        .expect("model added");

    let result = provider(&catalog).generate(&request("Draft a design.")).await;
    assert!(matches!(result, Err(ProviderError::NoEligibleModel { .. })));
}

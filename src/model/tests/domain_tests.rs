//! Domain-focused tests for model identifiers, sizes, and requests.

use std::collections::BTreeSet;

use rstest::rstest;

use crate::model::domain::{
    Availability, GenerationRequest, MAX_MODEL_ID_LENGTH, ModelCandidate, ModelDomainError,
    ModelId, ParamCount,
};

fn model_id(raw: &str) -> ModelId {
    ModelId::new(raw).expect("valid model id")
}

fn params(millions: u64) -> ParamCount {
    ParamCount::from_millions(millions).expect("valid parameter count")
}

#[rstest]
#[case("hermes-7b")]
#[case("lab/qwen2.5-coder:3b")]
#[case("Meta-Llama_3.1")]
fn model_id_accepts_registry_names(#[case] raw: &str) {
    assert_eq!(model_id(raw).as_str(), raw);
}

#[rstest]
fn model_id_trims_surrounding_whitespace() {
    assert_eq!(model_id("  hermes-7b ").as_str(), "hermes-7b");
}

#[rstest]
#[case("")]
#[case("   ")]
fn model_id_rejects_empty_input(#[case] raw: &str) {
    assert_eq!(ModelId::new(raw), Err(ModelDomainError::EmptyModelId));
}

#[rstest]
fn model_id_rejects_spaces_inside() {
    assert_eq!(
        ModelId::new("hermes 7b"),
        Err(ModelDomainError::InvalidModelId {
            actual: "hermes 7b".to_owned(),
        })
    );
}

#[rstest]
fn model_id_rejects_overlong_names() {
    let raw = "m".repeat(MAX_MODEL_ID_LENGTH + 1);
    assert_eq!(
        ModelId::new(&raw),
        Err(ModelDomainError::ModelIdTooLong {
            length: MAX_MODEL_ID_LENGTH + 1,
            max: MAX_MODEL_ID_LENGTH,
        })
    );
}

#[rstest]
fn param_counts_reject_zero() {
    assert_eq!(
        ParamCount::from_millions(0),
        Err(ModelDomainError::ZeroParamCount)
    );
    assert_eq!(
        ParamCount::from_billions(0),
        Err(ModelDomainError::ZeroParamCount)
    );
}

#[rstest]
#[case(7000, "7b")]
#[case(350, "350m")]
#[case(1500, "1500m")]
fn param_counts_display_in_registry_units(#[case] millions: u64, #[case] rendered: &str) {
    assert_eq!(params(millions).to_string(), rendered);
}

#[rstest]
fn billions_convert_to_millions() {
    assert_eq!(
        ParamCount::from_billions(7).expect("valid parameter count"),
        params(7000)
    );
}

#[rstest]
#[case("available", Availability::Available)]
#[case("ready", Availability::Available)]
#[case("busy", Availability::Busy)]
#[case("loading", Availability::Busy)]
#[case("offline", Availability::Offline)]
fn availability_parses_endpoint_states(#[case] raw: &str, #[case] expected: Availability) {
    assert_eq!(Availability::try_from(raw), Ok(expected));
}

#[rstest]
fn availability_rejects_unknown_states() {
    assert!(Availability::try_from("hibernating").is_err());
}

#[rstest]
fn candidates_fit_under_the_ceiling_inclusively() {
    let candidate = ModelCandidate::new(model_id("hermes-7b"), params(7000));
    assert!(candidate.fits_within(params(7000)));
    assert!(!candidate.fits_within(params(6999)));
}

#[rstest]
fn candidates_support_a_tag_subset() {
    let candidate = ModelCandidate::new(model_id("coder-3b"), params(3000))
        .with_tag("code")
        .with_tag("review");
    let required = BTreeSet::from(["code".to_owned()]);
    assert!(candidate.supports(&required));

    let missing = BTreeSet::from(["paper".to_owned()]);
    assert!(!candidate.supports(&missing));
    assert!(candidate.supports(&BTreeSet::new()));
}

#[rstest]
fn generation_requests_validate_prompt_and_budget() {
    assert_eq!(
        GenerationRequest::new("   ", 256).err(),
        Some(ModelDomainError::EmptyPrompt)
    );
    assert_eq!(
        GenerationRequest::new("Write a review.", 0).err(),
        Some(ModelDomainError::ZeroMaxTokens)
    );

    let request = GenerationRequest::new("Write a review.", 256)
        .expect("valid request")
        .with_tag("review");
    assert_eq!(request.prompt(), "Write a review.");
    assert_eq!(request.max_tokens(), 256);
    assert!(request.tags().contains("review"));
}

//! R script export: parameters, catalog, pipeline mirror and the embedded
//! verification block.

use care_pathways::scenario::{ScenarioEngine, ScenarioParameters};
use chrono::NaiveDate;

fn pinned_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 25).expect("valid date")
}

#[test]
fn script_carries_parameters_catalog_and_pipeline() {
    let engine = ScenarioEngine::standard();
    let script = engine
        .rscript("baseline", pinned_date(), &ScenarioParameters::illustrative())
        .expect("script renders");

    assert!(script.contains("# Scenario: baseline"));
    assert!(script.contains("# Generated: 2026-08-25"));
    assert!(script.contains("access_correlation <- 0.5"));
    assert!(script.contains("round_half_up <- function(value) floor(value + 0.5)"));
    assert!(script.contains("pmin(round_half_up(pool * clamp01(proportion)), pool)"));
    assert!(script.contains("n_unintended_pregnancies <- 120000"));
    assert!(script.contains("\"facility_ma_combined\""));
    assert!(script.contains("consume_combo <- function(combo, state)"));
    assert!(script.contains(
        "stopifnot(abs(sum(facility_allocation$shares) + facility_allocation$no_abortion - 1) <= tolerance)"
    ));
    assert!(script
        .trim_end()
        .ends_with("cat(\"scenario 'baseline' verified\\n\", sep = \"\")"));
}

#[test]
fn verification_block_embeds_engine_results() {
    let engine = ScenarioEngine::standard();
    let params = ScenarioParameters::illustrative();
    let results = engine.run(&params).expect("run succeeds");
    let script = engine
        .rscript("baseline", pinned_date(), &params)
        .expect("script renders");

    let expected_total = format!(
        "stopifnot(abs(n_total_pregnancies - {}) <= tolerance)",
        results.family_planning.n_total_pregnancies
    );
    assert!(script.contains(&expected_total), "missing: {expected_total}");

    let expected_safe = format!(
        "stopifnot(abs(n_safe - {}) <= tolerance)",
        results.outcomes.n_safe
    );
    assert!(script.contains(&expected_safe), "missing: {expected_safe}");

    let expected_treated = format!(
        "stopifnot(abs(pac_moderate_treated - {}) <= tolerance)",
        results.post_abortion_care.moderate.n_treated
    );
    assert!(
        script.contains(&expected_treated),
        "missing: {expected_treated}"
    );
}

#[test]
fn policy_override_is_stamped_into_parameters() {
    let engine = ScenarioEngine::standard();
    let mut params = ScenarioParameters::illustrative();
    params.pregnancy_outcomes.p_contraindication = 0.3;

    let script = engine
        .rscript("baseline", pinned_date(), &params)
        .expect("script renders");

    assert!(script
        .contains("p_contraindication <- 0  # contraindication pathway disabled by engine policy"));
}

#[test]
fn script_is_reproducible_for_a_pinned_date() {
    let engine = ScenarioEngine::standard();
    let params = ScenarioParameters::illustrative();

    let first = engine
        .rscript("baseline", pinned_date(), &params)
        .expect("first render");
    let second = engine
        .rscript("baseline", pinned_date(), &params)
        .expect("second render");

    assert_eq!(first, second);
}

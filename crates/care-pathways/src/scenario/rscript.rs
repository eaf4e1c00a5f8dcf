//! Standalone R script export.
//!
//! The script re-derives the whole scenario from its parameters using the
//! same arithmetic as the engine, then asserts agreement with the embedded
//! engine results via `stopifnot`. Reviewers can hand the file to an analyst
//! with no access to this service and still reproduce every number.
//!
//! Parity rules, so the assertions hold when the script runs:
//! - `round_half_up` is emitted instead of R's `round`, which rounds half
//!   to even and would drift from [`f64::round`] on exact halves.
//! - Accumulations are explicit `for` loops. R's `sum` may accumulate in
//!   extended precision, which breaks bit-level agreement with f64 folds.
//! - Numbers are rendered with Rust's shortest-roundtrip formatting, which
//!   R parses back to the identical double.

use crate::scenario::catalog::{CareSetting, ResourceCombo, Service, ServiceCatalog};
use crate::scenario::params::{ReadinessMap, ScenarioParameters};
use crate::scenario::results::ScenarioResults;
use crate::scenario::EnginePolicy;
use chrono::NaiveDate;

const HELPER_FUNCTIONS: &str = r#"access_correlation <- 0.5

clamp01 <- function(value) pmin(pmax(value, 0), 1)

divide_or_zero <- function(numerator, denominator) {
  if (denominator == 0) 0 else numerator / denominator
}

round_half_up <- function(value) floor(value + 0.5)

rounded_share <- function(pool, proportion) {
  pmin(round_half_up(pool * clamp01(proportion)), pool)
}

combine_access <- function(distance, affordability) {
  access_correlation * pmin(distance, affordability) +
    (1 - access_correlation) * (distance * affordability)
}"#;

const ALLOCATOR_FUNCTIONS: &str = r#"consume_combo <- function(combo, state) {
  if (length(combo) == 0) {
    return(list(share = 0, state = state))
  }
  share <- Inf
  for (item in combo) {
    available <- if (item %in% names(state)) state[[item]] else 0
    share <- min(share, available)
  }
  share <- max(share, 0)
  list(share = share, state = pmax(state - share, 0))
}

ideal_shares <- function(services, readiness) {
  state <- clamp01(readiness)
  shares <- numeric(length(services))
  for (i in seq_along(services)) {
    service_share <- 0
    for (combo in services[[i]]$combos) {
      consumed <- consume_combo(combo, state)
      service_share <- service_share + consumed$share
      state <- consumed$state
    }
    shares[[i]] <- service_share
  }
  shares
}

raw_potential <- function(service, readiness) {
  best <- 0
  for (combo in service$combos) {
    if (length(combo) == 0) {
      next
    }
    limit <- 1
    for (item in combo) {
      available <- if (item %in% names(readiness)) readiness[[item]] else 0
      limit <- min(limit, clamp01(available))
    }
    best <- max(best, limit)
  }
  best
}

naive_shares <- function(services, readiness, target_total) {
  potentials <- numeric(length(services))
  for (i in seq_along(services)) {
    potentials[[i]] <- raw_potential(services[[i]], readiness)
  }
  raw_total <- 0
  for (potential in potentials) {
    raw_total <- raw_total + potential
  }
  shares <- numeric(length(services))
  for (i in seq_along(services)) {
    shares[[i]] <- divide_or_zero(potentials[[i]] * target_total, raw_total)
  }
  shares
}

allocate <- function(services, readiness) {
  ideal <- ideal_shares(services, readiness)
  hw <- if ("hw" %in% names(readiness)) readiness[["hw"]] else 0
  mixture <- clamp01(1 - clamp01(hw))
  if (mixture <= 0) {
    shares <- ideal
  } else {
    achieved <- 0
    for (share in ideal) {
      achieved <- achieved + share
    }
    naive <- naive_shares(services, readiness, achieved)
    if (mixture >= 1) {
      shares <- naive
    } else {
      shares <- ideal + mixture * (naive - ideal)
    }
  }
  allocated <- 0
  for (share in shares) {
    allocated <- allocated + share
  }
  list(mixture = mixture, shares = shares, no_abortion = max(1 - allocated, 0))
}"#;

/// Renders the complete script for an already computed scenario.
pub fn render(
    scenario_name: &str,
    generated_on: NaiveDate,
    params: &ScenarioParameters,
    catalog: &ServiceCatalog,
    policy: &EnginePolicy,
    results: &ScenarioResults,
) -> String {
    let mut script = String::new();

    push_line(&mut script, "# Abortion care pathways scenario export");
    push_line(&mut script, &format!("# Scenario: {scenario_name}"));
    push_line(
        &mut script,
        &format!("# Generated: {}", generated_on.format("%Y-%m-%d")),
    );
    push_line(
        &mut script,
        "# Run with Rscript. The script recomputes the scenario from the",
    );
    push_line(
        &mut script,
        "# parameters below and verifies each result against the engine.",
    );

    section(&mut script, "Shared arithmetic");
    push_line(&mut script, HELPER_FUNCTIONS);

    section(&mut script, "Scenario parameters");
    render_parameters(&mut script, params, policy);

    section(&mut script, "Service catalog");
    render_catalog(&mut script, catalog);

    section(&mut script, "Family planning");
    push_line(
        &mut script,
        "p_unintended <- clamp01(1 - fp_p_effectiveness * fp_p_demand * fp_p_met_need)",
    );
    push_line(
        &mut script,
        "n_total_pregnancies <- round_half_up(divide_or_zero(n_unintended_pregnancies, p_unintended))",
    );
    push_line(
        &mut script,
        "n_intended <- max(n_total_pregnancies - n_unintended_pregnancies, 0)",
    );

    section(&mut script, "Abortion demand");
    push_line(
        &mut script,
        "p_contraindication_capped <- min(p_contraindication, 1 - p_miscarriage)",
    );
    push_line(
        &mut script,
        "u_miscarriages <- rounded_share(n_unintended_pregnancies, p_miscarriage)",
    );
    push_line(&mut script, "u_contraindicated <- min(");
    push_line(
        &mut script,
        "  rounded_share(n_unintended_pregnancies, p_contraindication_capped),",
    );
    push_line(&mut script, "  n_unintended_pregnancies - u_miscarriages");
    push_line(&mut script, ")");
    push_line(
        &mut script,
        "u_remaining <- n_unintended_pregnancies - u_miscarriages - u_contraindicated",
    );
    push_line(
        &mut script,
        "u_seeking <- rounded_share(u_remaining, p_seek_abortion)",
    );
    push_line(&mut script, "u_continuing <- u_remaining - u_seeking");
    push_line(
        &mut script,
        "i_miscarriages <- rounded_share(n_intended, p_miscarriage)",
    );
    push_line(&mut script, "i_contraindicated <- min(");
    push_line(
        &mut script,
        "  rounded_share(n_intended, p_contraindication_capped),",
    );
    push_line(&mut script, "  n_intended - i_miscarriages");
    push_line(&mut script, ")");
    push_line(
        &mut script,
        "i_continuing <- n_intended - i_miscarriages - i_contraindicated",
    );
    push_line(
        &mut script,
        "n_miscarriages_early <- u_miscarriages + i_miscarriages",
    );
    push_line(
        &mut script,
        "n_contraindicated <- u_contraindicated + i_contraindicated",
    );
    push_line(
        &mut script,
        "n_seeking_abortion <- u_seeking + u_contraindicated + i_contraindicated",
    );

    section(&mut script, "Care access");
    push_line(
        &mut script,
        "n_seeking_facility <- rounded_share(n_seeking_abortion, p_prefer_facility)",
    );
    push_line(
        &mut script,
        "p_facility_arrival <- facility_p_legal * facility_p_offer_abortion *",
    );
    push_line(
        &mut script,
        "  combine_access(facility_p_distance, facility_p_afford)",
    );
    push_line(
        &mut script,
        "n_facility_arrivals <- rounded_share(n_seeking_facility, p_facility_arrival)",
    );
    push_line(
        &mut script,
        "n_rerouted <- n_seeking_facility - n_facility_arrivals",
    );
    push_line(
        &mut script,
        "n_seeking_oof <- n_seeking_abortion - n_seeking_facility + n_rerouted",
    );
    push_line(
        &mut script,
        "p_oof_arrival <- oof_p_offer_abortion * combine_access(oof_p_distance, oof_p_afford)",
    );
    push_line(
        &mut script,
        "n_oof_arrivals <- rounded_share(n_seeking_oof, p_oof_arrival)",
    );
    push_line(&mut script, "n_no_access <- n_seeking_oof - n_oof_arrivals");

    section(&mut script, "Service receipt");
    push_line(&mut script, ALLOCATOR_FUNCTIONS);
    push_line(&mut script, "");
    push_line(
        &mut script,
        "facility_allocation <- allocate(facility_services, facility_readiness)",
    );
    push_line(
        &mut script,
        "oof_allocation <- allocate(oof_services, oof_readiness)",
    );
    push_line(
        &mut script,
        "facility_n <- facility_allocation$shares * n_facility_arrivals",
    );
    push_line(&mut script, "oof_n <- oof_allocation$shares * n_oof_arrivals");

    section(&mut script, "Outcomes");
    push_line(&mut script, "n_safe <- 0");
    push_line(&mut script, "n_less_safe <- 0");
    push_line(&mut script, "n_least_safe <- 0");
    push_line(
        &mut script,
        "complication_totals <- rep(0, length(complication_ids))",
    );
    render_tier_loop(&mut script, "facility_services", "facility_n");
    render_tier_loop(&mut script, "oof_services", "oof_n");
    push_line(
        &mut script,
        "n_abortions <- n_safe + n_less_safe + n_least_safe",
    );
    push_line(
        &mut script,
        "n_unserved <- n_no_access + facility_allocation$no_abortion * n_facility_arrivals +",
    );
    push_line(
        &mut script,
        "  oof_allocation$no_abortion * n_oof_arrivals",
    );
    push_line(
        &mut script,
        "n_unserved_miscarriages <- rounded_share(n_unserved, p_miscarriage)",
    );
    push_line(
        &mut script,
        "n_unserved_live_births <- n_unserved - n_unserved_miscarriages",
    );
    push_line(
        &mut script,
        "n_miscarriages <- n_miscarriages_early + n_unserved_miscarriages",
    );
    push_line(
        &mut script,
        "n_live_births <- i_continuing + u_continuing + n_unserved_live_births",
    );
    push_line(&mut script, "n_moderate <- 0");
    push_line(&mut script, "n_severe <- 0");
    push_line(&mut script, "for (i in seq_along(complication_ids)) {");
    push_line(
        &mut script,
        "  if (complication_severity[[i]] == \"moderate\") {",
    );
    push_line(
        &mut script,
        "    n_moderate <- n_moderate + complication_totals[[i]]",
    );
    push_line(&mut script, "  } else {");
    push_line(
        &mut script,
        "    n_severe <- n_severe + complication_totals[[i]]",
    );
    push_line(&mut script, "  }");
    push_line(&mut script, "}");
    push_line(&mut script, "n_complications <- n_moderate + n_severe");

    section(&mut script, "Post-abortion care");
    push_line(
        &mut script,
        "p_pac_access <- facility_p_offer_pac * combine_access(facility_p_distance, facility_p_afford)",
    );
    push_line(
        &mut script,
        "p_pac_effective_moderate <- clamp01(facility_readiness[[\"hw\"]] * facility_readiness[[\"antibiotics\"]])",
    );
    push_line(
        &mut script,
        "p_pac_effective_severe <- clamp01(facility_readiness[[\"cemonc\"]])",
    );
    push_line(
        &mut script,
        "pac_moderate_with_access <- rounded_share(n_moderate, p_pac_access)",
    );
    push_line(&mut script, "pac_moderate_treated <- min(");
    push_line(
        &mut script,
        "  round_half_up(pac_moderate_with_access * p_pac_effective_moderate),",
    );
    push_line(&mut script, "  n_moderate");
    push_line(&mut script, ")");
    push_line(
        &mut script,
        "pac_moderate_untreated <- n_moderate - pac_moderate_treated",
    );
    push_line(
        &mut script,
        "pac_severe_with_access <- rounded_share(n_severe, p_pac_access)",
    );
    push_line(&mut script, "pac_severe_treated <- min(");
    push_line(
        &mut script,
        "  round_half_up(pac_severe_with_access * p_pac_effective_severe),",
    );
    push_line(&mut script, "  n_severe");
    push_line(&mut script, ")");
    push_line(
        &mut script,
        "pac_severe_untreated <- n_severe - pac_severe_treated",
    );

    section(&mut script, "Verification");
    push_line(&mut script, "tolerance <- 1e-6");
    render_verification(&mut script, results);
    push_line(&mut script, "");
    push_line(
        &mut script,
        &format!(
            "cat(\"scenario '{}' verified\\n\", sep = \"\")",
            r_escape(scenario_name)
        ),
    );

    script
}

fn render_parameters(script: &mut String, params: &ScenarioParameters, policy: &EnginePolicy) {
    let pregnancy = &params.pregnancy_outcomes;
    assign(
        script,
        "n_unintended_pregnancies",
        pregnancy.n_unintended_pregnancies,
    );
    assign(script, "p_miscarriage", pregnancy.p_miscarriage);
    if policy.contraindication_disabled {
        push_line(
            script,
            &format!(
                "p_contraindication <- {}  # contraindication pathway disabled by engine policy",
                fmt_num(pregnancy.p_contraindication)
            ),
        );
    } else {
        assign(script, "p_contraindication", pregnancy.p_contraindication);
    }

    let fp = &params.family_planning;
    assign(script, "fp_p_demand", fp.p_demand);
    assign(script, "fp_p_met_need", fp.p_met_need);
    assign(script, "fp_p_effectiveness", fp.p_effectiveness);

    assign(script, "p_seek_abortion", params.demand.p_seek_abortion);
    assign(script, "p_prefer_facility", params.demand.p_prefer_facility);

    let facility = &params.facility_access;
    assign(script, "facility_p_legal", facility.p_legal);
    assign(script, "facility_p_distance", facility.p_distance);
    assign(script, "facility_p_offer_abortion", facility.p_offer_abortion);
    assign(script, "facility_p_afford", facility.p_afford);
    assign(script, "facility_p_offer_pac", facility.p_offer_pac);

    let oof = &params.out_of_facility_access;
    assign(script, "oof_p_distance", oof.p_distance);
    assign(script, "oof_p_offer_abortion", oof.p_offer_abortion);
    assign(script, "oof_p_afford", oof.p_afford);

    render_readiness(script, "facility_readiness", &params.facility_readiness);
    render_readiness(
        script,
        "oof_readiness",
        &params.out_of_facility_readiness,
    );
}

fn render_readiness(script: &mut String, name: &str, readiness: &ReadinessMap) {
    push_line(script, &format!("{name} <- c("));
    let entries: Vec<String> = readiness
        .iter()
        .map(|(item, value)| format!("  {} = {}", r_string(item), fmt_num(value)))
        .collect();
    push_line(script, &entries.join(",\n"));
    push_line(script, ")");
}

fn render_catalog(script: &mut String, catalog: &ServiceCatalog) {
    render_services(
        script,
        "facility_services",
        &catalog.setting(CareSetting::Facility).services,
    );
    render_services(
        script,
        "oof_services",
        &catalog.setting(CareSetting::OutOfFacility).services,
    );

    let ids: Vec<String> = catalog
        .complications()
        .iter()
        .map(|complication| r_string(complication.id))
        .collect();
    push_line(
        script,
        &format!("complication_ids <- c({})", ids.join(", ")),
    );
    let severities: Vec<String> = catalog
        .complications()
        .iter()
        .map(|complication| r_string(complication.severity.key()))
        .collect();
    push_line(
        script,
        &format!("complication_severity <- c({})", severities.join(", ")),
    );
}

fn render_services(script: &mut String, name: &str, services: &[Service]) {
    push_line(script, &format!("{name} <- list("));
    for (index, service) in services.iter().enumerate() {
        push_line(script, "  list(");
        push_line(script, &format!("    id = {},", r_string(service.id)));
        push_line(
            script,
            &format!("    tier = {},", r_string(service.tier.key())),
        );
        let combos: Vec<String> = service.combos.iter().map(render_combo).collect();
        push_line(
            script,
            &format!("    combos = list({}),", combos.join(", ")),
        );
        let rates: Vec<String> = service
            .complication_rates
            .iter()
            .map(|rate| fmt_num(*rate))
            .collect();
        push_line(
            script,
            &format!("    complication_rates = c({})", rates.join(", ")),
        );
        push_line(script, if index + 1 == services.len() { "  )" } else { "  )," });
    }
    push_line(script, ")");
}

fn render_combo(combo: &ResourceCombo) -> String {
    let items: Vec<String> = combo.items.iter().map(|item| r_string(item)).collect();
    format!("c({})", items.join(", "))
}

fn render_tier_loop(script: &mut String, services: &str, counts: &str) {
    push_line(script, &format!("for (i in seq_along({services})) {{"));
    push_line(script, &format!("  tier <- {services}[[i]]$tier"));
    push_line(script, &format!("  n <- {counts}[[i]]"));
    push_line(script, "  if (tier == \"safe\") n_safe <- n_safe + n");
    push_line(
        script,
        "  if (tier == \"less_safe\") n_less_safe <- n_less_safe + n",
    );
    push_line(
        script,
        "  if (tier == \"least_safe\") n_least_safe <- n_least_safe + n",
    );
    push_line(
        script,
        &format!("  complication_totals <- complication_totals + n * {services}[[i]]$complication_rates"),
    );
    push_line(script, "}");
}

fn render_verification(script: &mut String, results: &ScenarioResults) {
    check_scalar(script, "p_unintended", results.family_planning.p_unintended);
    check_scalar(
        script,
        "n_total_pregnancies",
        results.family_planning.n_total_pregnancies,
    );
    check_scalar(script, "n_intended", results.family_planning.n_intended);
    check_scalar(
        script,
        "n_seeking_abortion",
        results.demand.n_seeking_abortion,
    );
    check_scalar(
        script,
        "n_facility_arrivals",
        results.access.n_facility_arrivals,
    );
    check_scalar(
        script,
        "n_oof_arrivals",
        results.access.n_out_of_facility_arrivals,
    );
    check_scalar(script, "n_no_access", results.access.n_no_access);

    check_scalar(
        script,
        "facility_allocation$mixture",
        results.facility_receipt.mixture,
    );
    check_scalar(
        script,
        "oof_allocation$mixture",
        results.out_of_facility_receipt.mixture,
    );
    let facility_shares: Vec<f64> = results
        .facility_receipt
        .services
        .iter()
        .map(|share| share.p)
        .collect();
    check_vector(script, "facility_allocation$shares", &facility_shares);
    let oof_shares: Vec<f64> = results
        .out_of_facility_receipt
        .services
        .iter()
        .map(|share| share.p)
        .collect();
    check_vector(script, "oof_allocation$shares", &oof_shares);
    push_line(
        script,
        "stopifnot(abs(sum(facility_allocation$shares) + facility_allocation$no_abortion - 1) <= tolerance)",
    );
    push_line(
        script,
        "stopifnot(abs(sum(oof_allocation$shares) + oof_allocation$no_abortion - 1) <= tolerance)",
    );

    check_scalar(script, "n_safe", results.outcomes.n_safe);
    check_scalar(script, "n_less_safe", results.outcomes.n_less_safe);
    check_scalar(script, "n_least_safe", results.outcomes.n_least_safe);
    check_scalar(script, "n_abortions", results.outcomes.n_abortions);
    check_scalar(script, "n_miscarriages", results.outcomes.n_miscarriages);
    check_scalar(script, "n_live_births", results.outcomes.n_live_births);

    let complication_totals: Vec<f64> = results
        .complications
        .by_type
        .iter()
        .map(|count| count.n)
        .collect();
    check_vector(script, "complication_totals", &complication_totals);
    check_scalar(script, "n_moderate", results.complications.n_moderate);
    check_scalar(script, "n_severe", results.complications.n_severe);

    check_scalar(
        script,
        "pac_moderate_treated",
        results.post_abortion_care.moderate.n_treated,
    );
    check_scalar(
        script,
        "pac_severe_treated",
        results.post_abortion_care.severe.n_treated,
    );
}

fn check_scalar(script: &mut String, expression: &str, value: f64) {
    push_line(
        script,
        &format!(
            "stopifnot(abs({expression} - {}) <= tolerance)",
            fmt_num(value)
        ),
    );
}

fn check_vector(script: &mut String, expression: &str, values: &[f64]) {
    if values.is_empty() {
        return;
    }
    let rendered: Vec<String> = values.iter().map(|value| fmt_num(*value)).collect();
    push_line(
        script,
        &format!(
            "stopifnot(max(abs({expression} - c({}))) <= tolerance)",
            rendered.join(", ")
        ),
    );
}

fn section(script: &mut String, title: &str) {
    push_line(script, "");
    let mut banner = format!("## {title} ");
    while banner.len() < 74 {
        banner.push('-');
    }
    push_line(script, &banner);
    push_line(script, "");
}

fn assign(script: &mut String, name: &str, value: f64) {
    push_line(script, &format!("{name} <- {}", fmt_num(value)));
}

fn push_line(script: &mut String, line: &str) {
    script.push_str(line);
    script.push('\n');
}

/// Shortest-roundtrip rendering. R's parser restores the identical double,
/// and the format never falls into scientific notation.
fn fmt_num(value: f64) -> String {
    format!("{value}")
}

fn r_string(text: &str) -> String {
    format!("\"{}\"", r_escape(text))
}

fn r_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_render_without_exponents() {
        assert_eq!(fmt_num(0.255), "0.255");
        assert_eq!(fmt_num(1_333.0), "1333");
        assert_eq!(fmt_num(0.0), "0");
        assert_eq!(fmt_num(0.0002), "0.0002");
    }

    #[test]
    fn strings_escape_quotes_and_backslashes() {
        assert_eq!(r_string("plain"), "\"plain\"");
        assert_eq!(r_string("quo\"te"), "\"quo\\\"te\"");
        assert_eq!(r_string("back\\slash"), "\"back\\\\slash\"");
    }

    #[test]
    fn sections_are_banner_separated() {
        let mut script = String::new();
        section(&mut script, "Outcomes");
        assert!(script.contains("## Outcomes "));
        assert!(script.trim_end().ends_with('-'));
    }
}

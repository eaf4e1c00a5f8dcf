use care_pathways::error::AppError;
use care_pathways::scenario::{
    CareSetting, PacOutcome, ScenarioEngine, ScenarioParameters, ScenarioResults, ServiceReceipt,
};
use care_pathways::workbook::ScenarioWorkbookImporter;
use chrono::{Local, NaiveDate};
use clap::Args;
use std::io;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct ScenarioRunArgs {
    /// Scenario workbook CSV (scenario,parameter,value rows). Defaults to
    /// the illustrative scenario when omitted.
    #[arg(long)]
    pub(crate) workbook: Option<PathBuf>,
    /// Scenario name to run when the workbook holds several.
    #[arg(long)]
    pub(crate) scenario: Option<String>,
    /// Include the service catalog in the output.
    #[arg(long)]
    pub(crate) list_services: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ScenarioExportArgs {
    /// Scenario workbook CSV (scenario,parameter,value rows). Defaults to
    /// the illustrative scenario when omitted.
    #[arg(long)]
    pub(crate) workbook: Option<PathBuf>,
    /// Scenario name to export when the workbook holds several.
    #[arg(long)]
    pub(crate) scenario: Option<String>,
    /// Write the R script to this path instead of stdout.
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Date stamped into the script header (YYYY-MM-DD, defaults to today).
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) generated_on: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Include the service catalog in the demo output.
    #[arg(long)]
    pub(crate) list_services: bool,
    /// Skip the R script preview at the end of the demo.
    #[arg(long)]
    pub(crate) skip_export: bool,
}

pub(crate) fn run_scenario_run(args: ScenarioRunArgs) -> Result<(), AppError> {
    let ScenarioRunArgs {
        workbook,
        scenario,
        list_services,
    } = args;

    let engine = ScenarioEngine::standard();
    let (name, parameters) = load_scenario(workbook, scenario)?;
    let results = engine.run(&parameters)?;

    if list_services {
        render_catalog(&engine);
    }
    render_scenario(&name, &results);

    Ok(())
}

pub(crate) fn run_scenario_export(args: ScenarioExportArgs) -> Result<(), AppError> {
    let ScenarioExportArgs {
        workbook,
        scenario,
        output,
        generated_on,
    } = args;

    let engine = ScenarioEngine::standard();
    let (name, parameters) = load_scenario(workbook, scenario)?;
    let generated_on = generated_on.unwrap_or_else(|| Local::now().date_naive());
    let script = engine.rscript(&name, generated_on, &parameters)?;

    match output {
        Some(path) => {
            std::fs::write(&path, script)?;
            println!(
                "Wrote R script for scenario '{}' to {}",
                name,
                path.display()
            );
        }
        None => print!("{script}"),
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        list_services,
        skip_export,
    } = args;

    println!("Care pathways scenario demo");
    let engine = ScenarioEngine::standard();
    let parameters = ScenarioParameters::illustrative();
    let results = engine.run(&parameters)?;

    if list_services {
        render_catalog(&engine);
    }
    render_scenario("illustrative", &results);

    if skip_export {
        return Ok(());
    }

    let generated_on = Local::now().date_naive();
    let script = engine.rscript("illustrative", generated_on, &parameters)?;
    let total_lines = script.lines().count();
    println!("\nR script preview (first 12 of {total_lines} lines)");
    for line in script.lines().take(12) {
        println!("  {line}");
    }

    Ok(())
}

fn load_scenario(
    workbook: Option<PathBuf>,
    scenario: Option<String>,
) -> Result<(String, ScenarioParameters), AppError> {
    let Some(path) = workbook else {
        return Ok((
            "illustrative".to_string(),
            ScenarioParameters::illustrative(),
        ));
    };

    let workbook = ScenarioWorkbookImporter::from_path(&path)?;
    for skipped in &workbook.skipped {
        println!("Skipped scenario '{}': {}", skipped.name, skipped.reason);
    }

    let selected = match scenario {
        Some(wanted) => workbook
            .scenarios
            .into_iter()
            .find(|entry| entry.name == wanted)
            .ok_or_else(|| not_found(format!("scenario '{wanted}' not found in workbook")))?,
        None => workbook
            .scenarios
            .into_iter()
            .next()
            .ok_or_else(|| not_found("workbook holds no loadable scenario".to_string()))?,
    };

    Ok((selected.name, selected.parameters))
}

fn not_found(message: String) -> AppError {
    AppError::Io(io::Error::new(io::ErrorKind::NotFound, message))
}

fn render_catalog(engine: &ScenarioEngine) {
    println!("\nService catalog (allocation priority order)");
    for setting in CareSetting::ordered() {
        println!("{}:", setting.label());
        for service in &engine.catalog().setting(setting).services {
            let combos: Vec<String> = service
                .combos
                .iter()
                .map(|combo| combo.items.join(" + "))
                .collect();
            println!(
                "- {} [{}] needs {}",
                service.label,
                service.tier.label(),
                combos.join(" or ")
            );
        }
    }
}

fn render_scenario(name: &str, results: &ScenarioResults) {
    println!("\nScenario: {name}");

    println!("\nPregnancies");
    println!(
        "- {:.0} total ({:.0} intended, {:.0} unintended, p_unintended {:.3})",
        results.family_planning.n_total_pregnancies,
        results.family_planning.n_intended,
        results.family_planning.n_unintended,
        results.family_planning.p_unintended
    );

    println!("\nDemand");
    println!(
        "- {:.0} early miscarriages | {:.0} contraindicated | {:.0} seeking abortion",
        results.demand.n_miscarriages,
        results.demand.n_contraindicated,
        results.demand.n_seeking_abortion
    );
    println!(
        "- Continuing pregnancies: {:.0} intended, {:.0} unintended",
        results.demand.n_continuing_intended, results.demand.n_continuing_unintended
    );

    println!("\nAccess");
    println!(
        "- Facility: {:.0} sought, {:.0} arrived (p {:.3})",
        results.access.n_seeking_facility,
        results.access.n_facility_arrivals,
        results.access.p_facility_arrival
    );
    println!(
        "- Out of facility: {:.0} sought, {:.0} arrived (p {:.3}, {:.0} rerouted in)",
        results.access.n_seeking_out_of_facility,
        results.access.n_out_of_facility_arrivals,
        results.access.p_out_of_facility_arrival,
        results.access.n_rerouted
    );
    println!("- No access anywhere: {:.0}", results.access.n_no_access);

    render_receipt(&results.facility_receipt);
    render_receipt(&results.out_of_facility_receipt);

    println!("\nOutcomes");
    println!(
        "- Abortions: {:.0} safe, {:.0} less safe, {:.0} least safe ({:.0} total)",
        results.outcomes.n_safe,
        results.outcomes.n_less_safe,
        results.outcomes.n_least_safe,
        results.outcomes.n_abortions
    );
    println!(
        "- {:.0} unserved -> {:.0} late miscarriages, {:.0} live births",
        results.outcomes.n_unserved,
        results.outcomes.n_unserved_miscarriages,
        results.outcomes.n_unserved_live_births
    );
    println!(
        "- Totals: {:.0} miscarriages, {:.0} live births",
        results.outcomes.n_miscarriages, results.outcomes.n_live_births
    );

    println!("\nComplications");
    for count in &results.complications.by_type {
        println!(
            "- {} [{}]: {:.1}",
            count.label, count.severity_label, count.n
        );
    }
    println!(
        "- {:.1} moderate, {:.1} severe ({:.1} total)",
        results.complications.n_moderate,
        results.complications.n_severe,
        results.complications.n_total
    );

    println!("\nPost-abortion care");
    render_pac(&results.post_abortion_care.moderate);
    render_pac(&results.post_abortion_care.severe);
}

fn render_receipt(receipt: &ServiceReceipt) {
    println!(
        "\nService receipt: {} ({:.0} arriving, mixture {:.2})",
        receipt.setting.label(),
        receipt.n_arriving,
        receipt.mixture
    );
    for share in &receipt.services {
        println!(
            "- {} [{}]: {:.0} ({:.1}%)",
            share.label,
            share.tier_label,
            share.n,
            share.p * 100.0
        );
    }
    println!(
        "- No abortion received: {:.0} ({:.1}%)",
        receipt.no_abortion.n,
        receipt.no_abortion.p * 100.0
    );
}

fn render_pac(outcome: &PacOutcome) {
    println!(
        "- {}: {:.1} complications, {:.1} reached care, {:.1} treated, {:.1} untreated",
        outcome.severity.label(),
        outcome.n_complications,
        outcome.n_with_access,
        outcome.n_treated,
        outcome.n_untreated
    );
}

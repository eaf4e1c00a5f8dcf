//! Scenario workbook import.
//!
//! Planning teams keep whole scenario suites in spreadsheets and hand them
//! over as long-format CSV, one `scenario,parameter,value` row per cell.
//! Import is structural only: a scenario loads when every scalar parameter
//! is present and numeric, and range checks stay with the engine so a
//! workbook and an API request fail with identical messages.

mod mapping;
mod parser;

use crate::scenario::ScenarioParameters;
use mapping::ScenarioParametersBuilder;
use std::io::Read;
use std::path::Path;

#[derive(Debug)]
pub enum WorkbookError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for WorkbookError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkbookError::Io(err) => write!(f, "failed to read scenario workbook: {}", err),
            WorkbookError::Csv(err) => write!(f, "invalid scenario workbook CSV: {}", err),
        }
    }
}

impl std::error::Error for WorkbookError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorkbookError::Io(err) => Some(err),
            WorkbookError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for WorkbookError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for WorkbookError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Why one scenario was left out of a structurally valid workbook.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("missing parameter '{0}'")]
    MissingParameter(&'static str),
    #[error("invalid value '{value}' for parameter '{parameter}'")]
    InvalidValue { parameter: String, value: String },
}

#[derive(Debug, Clone)]
pub struct LoadedScenario {
    pub name: String,
    pub parameters: ScenarioParameters,
}

#[derive(Debug, Clone)]
pub struct SkippedScenario {
    pub name: String,
    pub reason: SkipReason,
}

/// Scenarios in workbook row order, plus the ones that could not load.
#[derive(Debug)]
pub struct ScenarioWorkbook {
    pub scenarios: Vec<LoadedScenario>,
    pub skipped: Vec<SkippedScenario>,
}

pub struct ScenarioWorkbookImporter;

struct Slot {
    name: String,
    state: Result<ScenarioParametersBuilder, SkipReason>,
}

impl ScenarioWorkbookImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ScenarioWorkbook, WorkbookError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<ScenarioWorkbook, WorkbookError> {
        // Slots keep first-appearance order; workbook row order decides
        // scenario order everywhere downstream.
        let mut slots: Vec<Slot> = Vec::new();

        for row in parser::parse_rows(reader)? {
            let index = match slots.iter().position(|slot| slot.name == row.scenario) {
                Some(index) => index,
                None => {
                    slots.push(Slot {
                        name: row.scenario.clone(),
                        state: Ok(ScenarioParametersBuilder::default()),
                    });
                    slots.len() - 1
                }
            };
            let slot = &mut slots[index];

            // First error wins; later rows cannot resurrect the scenario.
            if slot.state.is_err() {
                continue;
            }

            let value: f64 = match row.value.parse() {
                Ok(value) => value,
                Err(_) => {
                    slot.state = Err(SkipReason::InvalidValue {
                        parameter: row.parameter,
                        value: row.value,
                    });
                    continue;
                }
            };

            if let Ok(builder) = &mut slot.state {
                // Unrecognized keys pass through untouched; workbooks carry
                // columns for other tools.
                builder.apply(&row.parameter, value);
            }
        }

        let mut scenarios = Vec::new();
        let mut skipped = Vec::new();
        for slot in slots {
            match slot.state {
                Ok(builder) => match builder.finish() {
                    Ok(parameters) => scenarios.push(LoadedScenario {
                        name: slot.name,
                        parameters,
                    }),
                    Err(missing) => skipped.push(SkippedScenario {
                        name: slot.name,
                        reason: SkipReason::MissingParameter(missing),
                    }),
                },
                Err(reason) => skipped.push(SkippedScenario {
                    name: slot.name,
                    reason,
                }),
            }
        }

        Ok(ScenarioWorkbook { scenarios, skipped })
    }
}

use crate::scenario::catalog::{CareSetting, ServiceCatalog};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Full input set for one scenario run. Every field is required; partial
/// scenarios are rejected at deserialization rather than silently defaulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParameters {
    pub pregnancy_outcomes: PregnancyOutcomes,
    pub family_planning: FamilyPlanning,
    pub demand: AbortionDemand,
    pub facility_access: FacilityAccess,
    pub out_of_facility_access: OutOfFacilityAccess,
    pub facility_readiness: ReadinessMap,
    pub out_of_facility_readiness: ReadinessMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PregnancyOutcomes {
    /// Annual unintended pregnancies, the anchor count for the whole run.
    pub n_unintended_pregnancies: f64,
    pub p_miscarriage: f64,
    pub p_contraindication: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyPlanning {
    pub p_demand: f64,
    pub p_met_need: f64,
    pub p_effectiveness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbortionDemand {
    pub p_seek_abortion: f64,
    pub p_prefer_facility: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityAccess {
    pub p_legal: f64,
    pub p_distance: f64,
    pub p_offer_abortion: f64,
    pub p_afford: f64,
    pub p_offer_pac: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutOfFacilityAccess {
    pub p_distance: f64,
    pub p_offer_abortion: f64,
    pub p_afford: f64,
}

/// Availability per resource item, keyed by catalog item id. BTreeMap keeps
/// iteration order stable so runs and exports are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadinessMap(BTreeMap<String, f64>);

impl ReadinessMap {
    pub fn from_pairs(pairs: &[(&str, f64)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(item, value)| (item.to_string(), *value))
                .collect(),
        )
    }

    pub fn set(&mut self, item: &str, value: f64) {
        self.0.insert(item.to_string(), value);
    }

    /// Availability for an item, zero when the item is untracked.
    pub fn availability(&self, item: &str) -> f64 {
        self.0.get(item).copied().unwrap_or(0.0)
    }

    pub fn get(&self, item: &str) -> Option<f64> {
        self.0.get(item).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(item, value)| (item.as_str(), *value))
    }
}

impl ScenarioParameters {
    /// Worked example used by the demo command and the docs.
    pub fn illustrative() -> Self {
        Self {
            pregnancy_outcomes: PregnancyOutcomes {
                n_unintended_pregnancies: 120_000.0,
                p_miscarriage: 0.1,
                p_contraindication: 0.02,
            },
            family_planning: FamilyPlanning {
                p_demand: 0.65,
                p_met_need: 0.55,
                p_effectiveness: 0.94,
            },
            demand: AbortionDemand {
                p_seek_abortion: 0.55,
                p_prefer_facility: 0.6,
            },
            facility_access: FacilityAccess {
                p_legal: 0.7,
                p_distance: 0.6,
                p_offer_abortion: 0.65,
                p_afford: 0.5,
                p_offer_pac: 0.75,
            },
            out_of_facility_access: OutOfFacilityAccess {
                p_distance: 0.85,
                p_offer_abortion: 0.7,
                p_afford: 0.65,
            },
            facility_readiness: ReadinessMap::from_pairs(&[
                ("hw", 0.7),
                ("mife", 0.45),
                ("miso", 0.6),
                ("mva", 0.55),
                ("surgical", 0.35),
                ("antibiotics", 0.65),
                ("cemonc", 0.4),
            ]),
            out_of_facility_readiness: ReadinessMap::from_pairs(&[
                ("hw", 0.25),
                ("mife", 0.3),
                ("miso", 0.5),
                ("info", 0.45),
                ("traditional", 0.9),
            ]),
        }
    }

    pub fn readiness(&self, setting: CareSetting) -> &ReadinessMap {
        match setting {
            CareSetting::Facility => &self.facility_readiness,
            CareSetting::OutOfFacility => &self.out_of_facility_readiness,
        }
    }

    /// Checks every probability, the pregnancy count and the readiness maps
    /// against the catalog before any arithmetic runs.
    pub fn validate(&self, catalog: &ServiceCatalog) -> Result<(), ValidationError> {
        check_count(
            "pregnancy_outcomes.n_unintended_pregnancies",
            self.pregnancy_outcomes.n_unintended_pregnancies,
        )?;
        check_probability(
            "pregnancy_outcomes.p_miscarriage",
            self.pregnancy_outcomes.p_miscarriage,
        )?;
        check_probability(
            "pregnancy_outcomes.p_contraindication",
            self.pregnancy_outcomes.p_contraindication,
        )?;

        check_probability("family_planning.p_demand", self.family_planning.p_demand)?;
        check_probability("family_planning.p_met_need", self.family_planning.p_met_need)?;
        check_probability(
            "family_planning.p_effectiveness",
            self.family_planning.p_effectiveness,
        )?;

        check_probability("demand.p_seek_abortion", self.demand.p_seek_abortion)?;
        check_probability("demand.p_prefer_facility", self.demand.p_prefer_facility)?;

        check_probability("facility_access.p_legal", self.facility_access.p_legal)?;
        check_probability("facility_access.p_distance", self.facility_access.p_distance)?;
        check_probability(
            "facility_access.p_offer_abortion",
            self.facility_access.p_offer_abortion,
        )?;
        check_probability("facility_access.p_afford", self.facility_access.p_afford)?;
        check_probability(
            "facility_access.p_offer_pac",
            self.facility_access.p_offer_pac,
        )?;

        check_probability(
            "out_of_facility_access.p_distance",
            self.out_of_facility_access.p_distance,
        )?;
        check_probability(
            "out_of_facility_access.p_offer_abortion",
            self.out_of_facility_access.p_offer_abortion,
        )?;
        check_probability(
            "out_of_facility_access.p_afford",
            self.out_of_facility_access.p_afford,
        )?;

        for setting in CareSetting::ordered() {
            let readiness = self.readiness(setting);
            for item in &catalog.setting(setting).items {
                match readiness.get(item) {
                    None => {
                        return Err(ValidationError::MissingReadinessItem {
                            setting,
                            item: item.to_string(),
                        })
                    }
                    Some(value) if !value.is_finite() || !(0.0..=1.0).contains(&value) => {
                        return Err(ValidationError::ReadinessOutOfRange {
                            setting,
                            item: item.to_string(),
                            value,
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(())
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::ProbabilityOutOfRange { name, value });
    }
    Ok(())
}

fn check_count(name: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidCount { name, value });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("parameter '{name}' must be a probability in [0, 1], got {value}")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },
    #[error("parameter '{name}' must be a finite non-negative count, got {value}")]
    InvalidCount { name: &'static str, value: f64 },
    #[error("{setting} readiness is missing item '{item}'")]
    MissingReadinessItem { setting: CareSetting, item: String },
    #[error("{setting} readiness for item '{item}' must be in [0, 1], got {value}")]
    ReadinessOutOfRange {
        setting: CareSetting,
        item: String,
        value: f64,
    },
}

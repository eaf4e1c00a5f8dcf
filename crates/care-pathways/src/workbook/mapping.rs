use crate::scenario::{
    AbortionDemand, FacilityAccess, FamilyPlanning, OutOfFacilityAccess, PregnancyOutcomes,
    ReadinessMap, ScenarioParameters,
};

/// Collects dotted workbook keys into a full parameter set. Readiness keys
/// are open-ended; scalar keys map one-to-one onto parameter fields.
#[derive(Debug, Default)]
pub(crate) struct ScenarioParametersBuilder {
    n_unintended_pregnancies: Option<f64>,
    p_miscarriage: Option<f64>,
    p_contraindication: Option<f64>,
    fp_p_demand: Option<f64>,
    fp_p_met_need: Option<f64>,
    fp_p_effectiveness: Option<f64>,
    p_seek_abortion: Option<f64>,
    p_prefer_facility: Option<f64>,
    facility_p_legal: Option<f64>,
    facility_p_distance: Option<f64>,
    facility_p_offer_abortion: Option<f64>,
    facility_p_afford: Option<f64>,
    facility_p_offer_pac: Option<f64>,
    oof_p_distance: Option<f64>,
    oof_p_offer_abortion: Option<f64>,
    oof_p_afford: Option<f64>,
    facility_readiness: ReadinessMap,
    out_of_facility_readiness: ReadinessMap,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum KeyOutcome {
    Applied,
    Unknown,
}

impl ScenarioParametersBuilder {
    pub(crate) fn apply(&mut self, key: &str, value: f64) -> KeyOutcome {
        if let Some(item) = key.strip_prefix("facility_readiness.") {
            self.facility_readiness.set(item, value);
            return KeyOutcome::Applied;
        }
        if let Some(item) = key.strip_prefix("out_of_facility_readiness.") {
            self.out_of_facility_readiness.set(item, value);
            return KeyOutcome::Applied;
        }

        let slot = match key {
            "pregnancy_outcomes.n_unintended_pregnancies" => &mut self.n_unintended_pregnancies,
            "pregnancy_outcomes.p_miscarriage" => &mut self.p_miscarriage,
            "pregnancy_outcomes.p_contraindication" => &mut self.p_contraindication,
            "family_planning.p_demand" => &mut self.fp_p_demand,
            "family_planning.p_met_need" => &mut self.fp_p_met_need,
            "family_planning.p_effectiveness" => &mut self.fp_p_effectiveness,
            "demand.p_seek_abortion" => &mut self.p_seek_abortion,
            "demand.p_prefer_facility" => &mut self.p_prefer_facility,
            "facility_access.p_legal" => &mut self.facility_p_legal,
            "facility_access.p_distance" => &mut self.facility_p_distance,
            "facility_access.p_offer_abortion" => &mut self.facility_p_offer_abortion,
            "facility_access.p_afford" => &mut self.facility_p_afford,
            "facility_access.p_offer_pac" => &mut self.facility_p_offer_pac,
            "out_of_facility_access.p_distance" => &mut self.oof_p_distance,
            "out_of_facility_access.p_offer_abortion" => &mut self.oof_p_offer_abortion,
            "out_of_facility_access.p_afford" => &mut self.oof_p_afford,
            _ => return KeyOutcome::Unknown,
        };
        *slot = Some(value);
        KeyOutcome::Applied
    }

    /// Err carries the first missing scalar key in declaration order.
    pub(crate) fn finish(self) -> Result<ScenarioParameters, &'static str> {
        Ok(ScenarioParameters {
            pregnancy_outcomes: PregnancyOutcomes {
                n_unintended_pregnancies: required(
                    self.n_unintended_pregnancies,
                    "pregnancy_outcomes.n_unintended_pregnancies",
                )?,
                p_miscarriage: required(self.p_miscarriage, "pregnancy_outcomes.p_miscarriage")?,
                p_contraindication: required(
                    self.p_contraindication,
                    "pregnancy_outcomes.p_contraindication",
                )?,
            },
            family_planning: FamilyPlanning {
                p_demand: required(self.fp_p_demand, "family_planning.p_demand")?,
                p_met_need: required(self.fp_p_met_need, "family_planning.p_met_need")?,
                p_effectiveness: required(
                    self.fp_p_effectiveness,
                    "family_planning.p_effectiveness",
                )?,
            },
            demand: AbortionDemand {
                p_seek_abortion: required(self.p_seek_abortion, "demand.p_seek_abortion")?,
                p_prefer_facility: required(self.p_prefer_facility, "demand.p_prefer_facility")?,
            },
            facility_access: FacilityAccess {
                p_legal: required(self.facility_p_legal, "facility_access.p_legal")?,
                p_distance: required(self.facility_p_distance, "facility_access.p_distance")?,
                p_offer_abortion: required(
                    self.facility_p_offer_abortion,
                    "facility_access.p_offer_abortion",
                )?,
                p_afford: required(self.facility_p_afford, "facility_access.p_afford")?,
                p_offer_pac: required(self.facility_p_offer_pac, "facility_access.p_offer_pac")?,
            },
            out_of_facility_access: OutOfFacilityAccess {
                p_distance: required(self.oof_p_distance, "out_of_facility_access.p_distance")?,
                p_offer_abortion: required(
                    self.oof_p_offer_abortion,
                    "out_of_facility_access.p_offer_abortion",
                )?,
                p_afford: required(self.oof_p_afford, "out_of_facility_access.p_afford")?,
            },
            facility_readiness: self.facility_readiness,
            out_of_facility_readiness: self.out_of_facility_readiness,
        })
    }
}

fn required(slot: Option<f64>, key: &'static str) -> Result<f64, &'static str> {
    slot.ok_or(key)
}

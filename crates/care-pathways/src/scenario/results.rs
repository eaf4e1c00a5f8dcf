use crate::scenario::catalog::{CareSetting, ComplicationSeverity, SafetyTier};
use serde::Serialize;

/// Everything one scenario run produces, stage by stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioResults {
    pub family_planning: FamilyPlanningOutcomes,
    pub demand: DemandOutcomes,
    pub access: AccessOutcomes,
    pub facility_receipt: ServiceReceipt,
    pub out_of_facility_receipt: ServiceReceipt,
    pub outcomes: AbortionOutcomes,
    pub complications: ComplicationOutcomes,
    pub post_abortion_care: PostAbortionCareOutcomes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamilyPlanningOutcomes {
    /// Share of pregnancies that are unintended once contraception is applied.
    pub p_unintended: f64,
    pub n_total_pregnancies: f64,
    pub n_intended: f64,
    pub n_unintended: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandOutcomes {
    pub n_miscarriages: f64,
    pub n_contraindicated: f64,
    pub n_continuing_intended: f64,
    pub n_continuing_unintended: f64,
    /// Contraindicated pregnancies are counted here as well: they need care
    /// whether or not the pregnancy was wanted.
    pub n_seeking_abortion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessOutcomes {
    pub n_seeking_facility: f64,
    pub p_facility_arrival: f64,
    pub n_facility_arrivals: f64,
    /// Facility seekers who could not get in and retry out of facility.
    pub n_rerouted: f64,
    pub n_seeking_out_of_facility: f64,
    pub p_out_of_facility_arrival: f64,
    pub n_out_of_facility_arrivals: f64,
    pub n_no_access: f64,
}

/// Allocation of one setting's arrivals across its services.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceReceipt {
    pub setting: CareSetting,
    /// Blend weight between priority-ordered and proportional allocation,
    /// driven by health worker scarcity.
    pub mixture: f64,
    pub n_arriving: f64,
    pub services: Vec<ServiceShare>,
    pub no_abortion: ReceiptShare,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceShare {
    pub service_id: &'static str,
    pub label: &'static str,
    pub tier: SafetyTier,
    pub tier_label: &'static str,
    pub p: f64,
    pub n: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReceiptShare {
    pub p: f64,
    pub n: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbortionOutcomes {
    pub n_safe: f64,
    pub n_less_safe: f64,
    pub n_least_safe: f64,
    pub n_abortions: f64,
    /// Seekers who received no abortion anywhere, then carry the background
    /// miscarriage risk like any continuing pregnancy.
    pub n_unserved: f64,
    pub n_unserved_miscarriages: f64,
    pub n_unserved_live_births: f64,
    pub n_miscarriages: f64,
    pub n_live_births: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplicationOutcomes {
    pub by_type: Vec<ComplicationCount>,
    pub n_moderate: f64,
    pub n_severe: f64,
    pub n_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplicationCount {
    pub complication_id: &'static str,
    pub label: &'static str,
    pub severity: ComplicationSeverity,
    pub severity_label: &'static str,
    pub n: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostAbortionCareOutcomes {
    pub moderate: PacOutcome,
    pub severe: PacOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PacOutcome {
    pub severity: ComplicationSeverity,
    pub n_complications: f64,
    pub p_access: f64,
    pub n_with_access: f64,
    pub p_effective: f64,
    pub n_treated: f64,
    pub n_untreated: f64,
}

//! Deterministic abortion care pathway engine.
//!
//! A [`ScenarioEngine`] owns a validated service catalog and a policy, and
//! turns one [`ScenarioParameters`] set into one [`ScenarioResults`] set.
//! Runs are pure: same inputs, same outputs, no clock, no randomness.

mod allocator;
pub mod catalog;
pub mod formula;
mod outcomes;
mod params;
mod pipeline;
mod results;
pub mod router;
pub mod rscript;

pub use catalog::{
    CareSetting, CatalogError, Complication, ComplicationSeverity, ResourceCombo, SafetyTier,
    Service, ServiceCatalog, SettingCatalog, COMPLICATION_COUNT,
};
pub use params::{
    AbortionDemand, FacilityAccess, FamilyPlanning, OutOfFacilityAccess, PregnancyOutcomes,
    ReadinessMap, ScenarioParameters, ValidationError,
};
pub use results::{
    AbortionOutcomes, AccessOutcomes, ComplicationCount, ComplicationOutcomes, DemandOutcomes,
    FamilyPlanningOutcomes, PacOutcome, PostAbortionCareOutcomes, ReceiptShare, ScenarioResults,
    ServiceReceipt, ServiceShare,
};
pub use router::scenario_router;

use chrono::NaiveDate;

/// The contraindication pathway stays in the data model but shipped runs
/// zero it out. Flip via [`EnginePolicy`] for sensitivity analysis.
pub const CONTRAINDICATION_DISABLED: bool = true;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnginePolicy {
    pub contraindication_disabled: bool,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            contraindication_disabled: CONTRAINDICATION_DISABLED,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioEngine {
    catalog: ServiceCatalog,
    policy: EnginePolicy,
}

impl ScenarioEngine {
    /// Engine over the built-in catalog with the default policy.
    pub fn standard() -> Self {
        Self {
            catalog: ServiceCatalog::standard(),
            policy: EnginePolicy::default(),
        }
    }

    /// Engine over a custom catalog, validated before first use.
    pub fn new(catalog: ServiceCatalog, policy: EnginePolicy) -> Result<Self, CatalogError> {
        catalog.validate()?;
        Ok(Self { catalog, policy })
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> EnginePolicy {
        self.policy
    }

    /// Runs the full pipeline for one parameter set.
    pub fn run(&self, params: &ScenarioParameters) -> Result<ScenarioResults, ValidationError> {
        params.validate(&self.catalog)?;
        let params = self.apply_policy(params);

        let family_planning =
            pipeline::family_planning(&params.pregnancy_outcomes, &params.family_planning);
        let demand = pipeline::demand(&params.pregnancy_outcomes, &family_planning, &params.demand);
        let access = pipeline::access(
            demand.n_seeking_abortion,
            &params.demand,
            &params.facility_access,
            &params.out_of_facility_access,
        );

        let facility_receipt = self.receipt(
            CareSetting::Facility,
            &params.facility_readiness,
            access.n_facility_arrivals,
        );
        let out_of_facility_receipt = self.receipt(
            CareSetting::OutOfFacility,
            &params.out_of_facility_readiness,
            access.n_out_of_facility_arrivals,
        );

        let (outcomes, complications) = outcomes::aggregate_outcomes(
            &self.catalog,
            &demand,
            &access,
            &facility_receipt,
            &out_of_facility_receipt,
            params.pregnancy_outcomes.p_miscarriage,
        );
        let post_abortion_care = outcomes::post_abortion_care(
            &complications,
            &params.facility_access,
            &params.facility_readiness,
        );

        Ok(ScenarioResults {
            family_planning,
            demand,
            access,
            facility_receipt,
            out_of_facility_receipt,
            outcomes,
            complications,
            post_abortion_care,
        })
    }

    /// Runs the scenario and renders a standalone R script that recomputes
    /// it and asserts agreement with these results.
    pub fn rscript(
        &self,
        scenario_name: &str,
        generated_on: NaiveDate,
        params: &ScenarioParameters,
    ) -> Result<String, ValidationError> {
        let results = self.run(params)?;
        let applied = self.apply_policy(params);
        Ok(rscript::render(
            scenario_name,
            generated_on,
            &applied,
            &self.catalog,
            &self.policy,
            &results,
        ))
    }

    fn apply_policy(&self, params: &ScenarioParameters) -> ScenarioParameters {
        let mut params = params.clone();
        if self.policy.contraindication_disabled {
            params.pregnancy_outcomes.p_contraindication = 0.0;
        }
        params
    }

    fn receipt(
        &self,
        setting: CareSetting,
        readiness: &ReadinessMap,
        n_arriving: f64,
    ) -> ServiceReceipt {
        let services = &self.catalog.setting(setting).services;
        let allocation = allocator::allocate(services, readiness);

        let shares = services
            .iter()
            .zip(allocation.shares.iter())
            .map(|(service, p)| ServiceShare {
                service_id: service.id,
                label: service.label,
                tier: service.tier,
                tier_label: service.tier.label(),
                p: *p,
                n: p * n_arriving,
            })
            .collect();

        ServiceReceipt {
            setting,
            mixture: allocation.mixture,
            n_arriving,
            services: shares,
            no_abortion: ReceiptShare {
                p: allocation.no_abortion,
                n: allocation.no_abortion * n_arriving,
            },
        }
    }
}

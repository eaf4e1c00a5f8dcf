//! Safety tier totals, complication loads and post-abortion care resolution.

use crate::scenario::catalog::{
    items, ComplicationSeverity, SafetyTier, ServiceCatalog, COMPLICATION_COUNT,
};
use crate::scenario::formula::{clamp01, combine_access, rounded_share};
use crate::scenario::params::{FacilityAccess, ReadinessMap};
use crate::scenario::results::{
    AbortionOutcomes, AccessOutcomes, ComplicationCount, ComplicationOutcomes, DemandOutcomes,
    PacOutcome, PostAbortionCareOutcomes, ServiceReceipt,
};

/// Folds both receipts into safety tiers and complication loads, then closes
/// the books on every pregnancy that entered the pipeline.
pub(crate) fn aggregate_outcomes(
    catalog: &ServiceCatalog,
    demand: &DemandOutcomes,
    access: &AccessOutcomes,
    facility: &ServiceReceipt,
    out_of_facility: &ServiceReceipt,
    p_miscarriage: f64,
) -> (AbortionOutcomes, ComplicationOutcomes) {
    let mut n_safe = 0.0;
    let mut n_less_safe = 0.0;
    let mut n_least_safe = 0.0;
    let mut by_type = [0.0_f64; COMPLICATION_COUNT];

    for receipt in [facility, out_of_facility] {
        let services = &catalog.setting(receipt.setting).services;
        for (share, service) in receipt.services.iter().zip(services.iter()) {
            match share.tier {
                SafetyTier::Safe => n_safe += share.n,
                SafetyTier::LessSafe => n_less_safe += share.n,
                SafetyTier::LeastSafe => n_least_safe += share.n,
            }
            for (slot, rate) in by_type.iter_mut().zip(service.complication_rates.iter()) {
                *slot += share.n * rate;
            }
        }
    }

    let n_abortions = n_safe + n_less_safe + n_least_safe;
    let n_unserved = access.n_no_access + facility.no_abortion.n + out_of_facility.no_abortion.n;
    // Unserved seekers continue the pregnancy under the same miscarriage risk
    // as everyone else.
    let n_unserved_miscarriages = rounded_share(n_unserved, p_miscarriage);
    let n_unserved_live_births = n_unserved - n_unserved_miscarriages;
    let n_miscarriages = demand.n_miscarriages + n_unserved_miscarriages;
    let n_live_births =
        demand.n_continuing_intended + demand.n_continuing_unintended + n_unserved_live_births;

    let outcomes = AbortionOutcomes {
        n_safe,
        n_less_safe,
        n_least_safe,
        n_abortions,
        n_unserved,
        n_unserved_miscarriages,
        n_unserved_live_births,
        n_miscarriages,
        n_live_births,
    };

    let counts: Vec<ComplicationCount> = catalog
        .complications()
        .iter()
        .zip(by_type.iter())
        .map(|(complication, n)| ComplicationCount {
            complication_id: complication.id,
            label: complication.label,
            severity: complication.severity,
            severity_label: complication.severity.label(),
            n: *n,
        })
        .collect();

    let n_moderate = severity_total(&counts, ComplicationSeverity::Moderate);
    let n_severe = severity_total(&counts, ComplicationSeverity::Severe);
    let complications = ComplicationOutcomes {
        by_type: counts,
        n_moderate,
        n_severe,
        n_total: n_moderate + n_severe,
    };

    (outcomes, complications)
}

fn severity_total(counts: &[ComplicationCount], severity: ComplicationSeverity) -> f64 {
    counts
        .iter()
        .filter(|count| count.severity == severity)
        .map(|count| count.n)
        .sum()
}

/// Resolves treatment for each severity band. Complications reach emergency
/// care regardless of the abortion's legal status, so the legality factor is
/// absent from the access probability.
pub(crate) fn post_abortion_care(
    complications: &ComplicationOutcomes,
    facility_access: &FacilityAccess,
    facility_readiness: &ReadinessMap,
) -> PostAbortionCareOutcomes {
    let p_access = facility_access.p_offer_pac
        * combine_access(facility_access.p_distance, facility_access.p_afford);

    PostAbortionCareOutcomes {
        moderate: resolve_tier(
            ComplicationSeverity::Moderate,
            complications.n_moderate,
            p_access,
            facility_readiness,
            &[items::HEALTH_WORKER, items::ANTIBIOTICS],
        ),
        severe: resolve_tier(
            ComplicationSeverity::Severe,
            complications.n_severe,
            p_access,
            facility_readiness,
            &[items::COMPREHENSIVE_EMOC],
        ),
    }
}

fn resolve_tier(
    severity: ComplicationSeverity,
    n_complications: f64,
    p_access: f64,
    readiness: &ReadinessMap,
    required: &[&str],
) -> PacOutcome {
    let p_effective = clamp01(
        required
            .iter()
            .fold(1.0, |product, item| product * readiness.availability(item)),
    );
    let n_with_access = rounded_share(n_complications, p_access);
    let n_treated = (n_with_access * p_effective).round().min(n_complications);
    let n_untreated = n_complications - n_treated;

    PacOutcome {
        severity,
        n_complications,
        p_access,
        n_with_access,
        p_effective,
        n_treated,
        n_untreated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_access() -> FacilityAccess {
        FacilityAccess {
            p_legal: 0.0,
            p_distance: 1.0,
            p_offer_abortion: 0.0,
            p_afford: 1.0,
            p_offer_pac: 1.0,
        }
    }

    fn empty_complications(n_moderate: f64, n_severe: f64) -> ComplicationOutcomes {
        ComplicationOutcomes {
            by_type: Vec::new(),
            n_moderate,
            n_severe,
            n_total: n_moderate + n_severe,
        }
    }

    #[test]
    fn pac_access_ignores_legality() {
        // p_legal and p_offer_abortion are zero; PAC access stays full.
        let readiness =
            ReadinessMap::from_pairs(&[("hw", 1.0), ("antibiotics", 1.0), ("cemonc", 1.0)]);
        let pac = post_abortion_care(&empty_complications(100.0, 10.0), &full_access(), &readiness);

        assert_eq!(pac.moderate.p_access, 1.0);
        assert_eq!(pac.moderate.n_treated, 100.0);
        assert_eq!(pac.severe.n_treated, 10.0);
    }

    #[test]
    fn moderate_care_needs_staff_and_antibiotics_together() {
        let readiness =
            ReadinessMap::from_pairs(&[("hw", 0.5), ("antibiotics", 0.5), ("cemonc", 1.0)]);
        let pac = post_abortion_care(&empty_complications(400.0, 0.0), &full_access(), &readiness);

        assert_eq!(pac.moderate.p_effective, 0.25);
        assert_eq!(pac.moderate.n_with_access, 400.0);
        assert_eq!(pac.moderate.n_treated, 100.0);
        assert_eq!(pac.moderate.n_untreated, 300.0);
    }

    #[test]
    fn treated_never_exceeds_the_complication_pool() {
        let readiness =
            ReadinessMap::from_pairs(&[("hw", 1.0), ("antibiotics", 1.0), ("cemonc", 1.0)]);
        let pac = post_abortion_care(&empty_complications(0.6, 0.0), &full_access(), &readiness);

        // round(0.6) would overdraw the fractional pool without the cap.
        assert_eq!(pac.moderate.n_with_access, 0.6);
        assert_eq!(pac.moderate.n_treated, 0.6);
        assert_eq!(pac.moderate.n_untreated, 0.0);
    }

    #[test]
    fn missing_emoc_leaves_severe_complications_untreated() {
        let readiness = ReadinessMap::from_pairs(&[("hw", 1.0), ("antibiotics", 1.0)]);
        let pac = post_abortion_care(&empty_complications(0.0, 50.0), &full_access(), &readiness);

        assert_eq!(pac.severe.p_effective, 0.0);
        assert_eq!(pac.severe.n_treated, 0.0);
        assert_eq!(pac.severe.n_untreated, 50.0);
    }
}

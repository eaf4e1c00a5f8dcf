//! Population flow stages, from pregnancies through care-seeking to arrival.
//!
//! Each stage is a pure function over validated inputs. Counts stay as f64
//! people throughout; rounding happens only inside [`rounded_share`] so the
//! generated R script can reproduce every intermediate value exactly.

use crate::scenario::formula::{clamp01, combine_access, divide_or_zero, rounded_share};
use crate::scenario::params::{
    AbortionDemand, FacilityAccess, FamilyPlanning, OutOfFacilityAccess, PregnancyOutcomes,
};
use crate::scenario::results::{AccessOutcomes, DemandOutcomes, FamilyPlanningOutcomes};

/// Back-solves total pregnancies from the unintended count and the modelled
/// contraception coverage.
pub(crate) fn family_planning(
    pregnancy: &PregnancyOutcomes,
    family_planning: &FamilyPlanning,
) -> FamilyPlanningOutcomes {
    let p_unintended = clamp01(
        1.0 - family_planning.p_effectiveness
            * family_planning.p_demand
            * family_planning.p_met_need,
    );
    let n_unintended = pregnancy.n_unintended_pregnancies;
    let n_total_pregnancies = divide_or_zero(n_unintended, p_unintended).round();
    let n_intended = (n_total_pregnancies - n_unintended).max(0.0);

    FamilyPlanningOutcomes {
        p_unintended,
        n_total_pregnancies,
        n_intended,
        n_unintended,
    }
}

/// Splits pregnancies into miscarriage, contraindication, elective seeking
/// and continuation. Intended pregnancies never seek electively; they enter
/// the abortion pathway only through contraindication.
pub(crate) fn demand(
    pregnancy: &PregnancyOutcomes,
    family_planning: &FamilyPlanningOutcomes,
    demand: &AbortionDemand,
) -> DemandOutcomes {
    // Miscarriage claims its share first, so contraindication can only cap
    // what remains.
    let p_contraindication_capped = pregnancy
        .p_contraindication
        .min(1.0 - pregnancy.p_miscarriage);

    let n_unintended = family_planning.n_unintended;
    let u_miscarriages = rounded_share(n_unintended, pregnancy.p_miscarriage);
    let u_contraindicated = rounded_share(n_unintended, p_contraindication_capped)
        .min(n_unintended - u_miscarriages);
    let u_remaining = n_unintended - u_miscarriages - u_contraindicated;
    let u_seeking = rounded_share(u_remaining, demand.p_seek_abortion);
    let u_continuing = u_remaining - u_seeking;

    let n_intended = family_planning.n_intended;
    let i_miscarriages = rounded_share(n_intended, pregnancy.p_miscarriage);
    let i_contraindicated =
        rounded_share(n_intended, p_contraindication_capped).min(n_intended - i_miscarriages);
    let i_continuing = n_intended - i_miscarriages - i_contraindicated;

    DemandOutcomes {
        n_miscarriages: u_miscarriages + i_miscarriages,
        n_contraindicated: u_contraindicated + i_contraindicated,
        n_continuing_intended: i_continuing,
        n_continuing_unintended: u_continuing,
        n_seeking_abortion: u_seeking + u_contraindicated + i_contraindicated,
    }
}

/// Routes seekers to a care setting. Facility seekers who cannot arrive are
/// rerouted into the out-of-facility pool before its arrival odds apply.
pub(crate) fn access(
    n_seeking_abortion: f64,
    demand: &AbortionDemand,
    facility: &FacilityAccess,
    out_of_facility: &OutOfFacilityAccess,
) -> AccessOutcomes {
    let n_seeking_facility = rounded_share(n_seeking_abortion, demand.p_prefer_facility);
    let p_facility_arrival = facility.p_legal
        * facility.p_offer_abortion
        * combine_access(facility.p_distance, facility.p_afford);
    let n_facility_arrivals = rounded_share(n_seeking_facility, p_facility_arrival);
    let n_rerouted = n_seeking_facility - n_facility_arrivals;

    let n_seeking_out_of_facility = n_seeking_abortion - n_seeking_facility + n_rerouted;
    let p_out_of_facility_arrival = out_of_facility.p_offer_abortion
        * combine_access(out_of_facility.p_distance, out_of_facility.p_afford);
    let n_out_of_facility_arrivals =
        rounded_share(n_seeking_out_of_facility, p_out_of_facility_arrival);
    let n_no_access = n_seeking_out_of_facility - n_out_of_facility_arrivals;

    AccessOutcomes {
        n_seeking_facility,
        p_facility_arrival,
        n_facility_arrivals,
        n_rerouted,
        n_seeking_out_of_facility,
        p_out_of_facility_arrival,
        n_out_of_facility_arrivals,
        n_no_access,
    }
}

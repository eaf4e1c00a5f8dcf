//! Service receipt allocation behaviour, exercised through full engine runs.

use care_pathways::scenario::catalog::items;
use care_pathways::scenario::{
    AbortionDemand, CareSetting, EnginePolicy, FacilityAccess, FamilyPlanning,
    OutOfFacilityAccess, PregnancyOutcomes, ReadinessMap, ResourceCombo, SafetyTier,
    ScenarioEngine, ScenarioParameters, Service, ServiceCatalog, ServiceReceipt, SettingCatalog,
    COMPLICATION_COUNT,
};

fn uniform_readiness(item_ids: &[&str], value: f64) -> ReadinessMap {
    let mut readiness = ReadinessMap::default();
    for item in item_ids {
        readiness.set(item, value);
    }
    readiness
}

/// 1000 abortion seekers with every access factor open, routed entirely by
/// `p_prefer_facility`. Receipt shares then depend on readiness alone.
fn full_access_parameters(
    facility_readiness: ReadinessMap,
    out_of_facility_readiness: ReadinessMap,
    p_prefer_facility: f64,
) -> ScenarioParameters {
    ScenarioParameters {
        pregnancy_outcomes: PregnancyOutcomes {
            n_unintended_pregnancies: 1_000.0,
            p_miscarriage: 0.0,
            p_contraindication: 0.0,
        },
        family_planning: FamilyPlanning {
            p_demand: 0.0,
            p_met_need: 0.0,
            p_effectiveness: 0.0,
        },
        demand: AbortionDemand {
            p_seek_abortion: 1.0,
            p_prefer_facility,
        },
        facility_access: FacilityAccess {
            p_legal: 1.0,
            p_distance: 1.0,
            p_offer_abortion: 1.0,
            p_afford: 1.0,
            p_offer_pac: 1.0,
        },
        out_of_facility_access: OutOfFacilityAccess {
            p_distance: 1.0,
            p_offer_abortion: 1.0,
            p_afford: 1.0,
        },
        facility_readiness,
        out_of_facility_readiness,
    }
}

fn scarce_facility_readiness() -> ReadinessMap {
    ReadinessMap::from_pairs(&[
        ("hw", 1.0),
        ("mife", 0.4),
        ("miso", 0.4),
        ("mva", 0.5),
        ("surgical", 0.0),
        ("antibiotics", 1.0),
        ("cemonc", 1.0),
    ])
}

fn share_of(receipt: &ServiceReceipt, id: &str) -> f64 {
    receipt
        .services
        .iter()
        .find(|share| share.service_id == id)
        .map(|share| share.p)
        .expect("service present in receipt")
}

#[test]
fn full_staffing_allocates_in_priority_order_with_depletion() {
    let params = full_access_parameters(
        scarce_facility_readiness(),
        uniform_readiness(items::OUT_OF_FACILITY, 1.0),
        1.0,
    );

    let results = ScenarioEngine::standard().run(&params).expect("runs");
    let receipt = &results.facility_receipt;

    assert_eq!(receipt.mixture, 0.0);
    assert_eq!(receipt.services[0].service_id, "facility_ma_combined");
    assert_eq!(receipt.services[0].p, 0.4);
    // Consuming the combined regimen drained the shared misoprostol stock.
    assert_eq!(receipt.services[1].p, 0.0);
    // 0.5 aspiration kits minus the 0.4 already drained.
    assert!((receipt.services[2].p - 0.1).abs() < 1e-12);
    assert_eq!(receipt.services[3].p, 0.0);
    assert_eq!(receipt.services[4].p, 0.0);
    assert!((receipt.no_abortion.p - 0.5).abs() < 1e-12);
}

#[test]
fn catalog_order_drives_allocation() {
    let standard = ServiceCatalog::standard();
    let facility = standard.setting(CareSetting::Facility);
    let mut reversed_services = facility.services.clone();
    reversed_services.reverse();
    let reversed = ServiceCatalog::new(
        SettingCatalog {
            items: facility.items.clone(),
            services: reversed_services,
        },
        standard.setting(CareSetting::OutOfFacility).clone(),
        standard.complications().to_vec(),
    )
    .expect("reversed catalog still validates");

    let params = full_access_parameters(
        scarce_facility_readiness(),
        uniform_readiness(items::OUT_OF_FACILITY, 1.0),
        1.0,
    );

    let standard_run = ScenarioEngine::standard()
        .run(&params)
        .expect("standard run");
    let reversed_run = ScenarioEngine::new(reversed, EnginePolicy::default())
        .expect("reversed catalog validates")
        .run(&params)
        .expect("reversed run");

    // Priority first: the combined regimen wins the scarce drug stock.
    assert_eq!(
        share_of(&standard_run.facility_receipt, "facility_ma_combined"),
        0.4
    );
    assert!((share_of(&standard_run.facility_receipt, "facility_mva") - 0.1).abs() < 1e-12);

    // Reversed, aspiration walks first and the regimen starves.
    assert_eq!(share_of(&reversed_run.facility_receipt, "facility_mva"), 0.5);
    assert_eq!(
        share_of(&reversed_run.facility_receipt, "facility_ma_combined"),
        0.0
    );
}

#[test]
fn absent_health_workers_fall_back_to_proportional_allocation() {
    let out_of_facility = ReadinessMap::from_pairs(&[
        ("hw", 0.0),
        ("mife", 0.5),
        ("miso", 0.5),
        ("info", 0.8),
        ("traditional", 0.9),
    ]);
    let params = full_access_parameters(
        uniform_readiness(items::FACILITY, 1.0),
        out_of_facility,
        0.0,
    );

    let results = ScenarioEngine::standard().run(&params).expect("runs");
    let receipt = &results.out_of_facility_receipt;

    assert_eq!(receipt.mixture, 1.0);
    // Every pharmacy combo needs a health worker, so its share is zero and
    // the rest split the walk's total 0.9 by raw potential (0.5 : 0.9).
    assert_eq!(receipt.services[0].service_id, "oof_pharmacy_ma");
    assert_eq!(receipt.services[0].p, 0.0);
    assert!((receipt.services[1].p - 0.5 * 0.9 / 1.4).abs() < 1e-12);
    assert!((receipt.services[2].p - 0.9 * 0.9 / 1.4).abs() < 1e-12);
    assert!((receipt.no_abortion.p - 0.1).abs() < 1e-12);
}

#[test]
fn receipt_shares_sum_to_one_at_any_mixture() {
    let engine = ScenarioEngine::standard();

    for hw in [0.0, 0.15, 0.33, 0.5, 0.75, 0.9, 1.0] {
        let mut params = ScenarioParameters::illustrative();
        params.facility_readiness.set("hw", hw);
        params.out_of_facility_readiness.set("hw", hw);

        let results = engine.run(&params).expect("grid point runs");

        for receipt in [&results.facility_receipt, &results.out_of_facility_receipt] {
            let allocated: f64 = receipt.services.iter().map(|share| share.p).sum();
            let total = allocated + receipt.no_abortion.p;
            assert!(
                (total - 1.0).abs() < 1e-6,
                "{} shares close to {total} at hw {hw}",
                receipt.setting
            );
        }
    }
}

#[test]
fn mixture_blends_monotonically_between_strategies() {
    // Two-service setting with no health worker requirement anywhere, so the
    // ideal walk is constant and only the mixture moves the shares.
    let standard = ServiceCatalog::standard();
    let out_of_facility = SettingCatalog {
        items: vec![
            items::HEALTH_WORKER,
            items::MISOPROSTOL,
            items::SELF_CARE_GUIDANCE,
            items::TRADITIONAL_PROVIDER,
        ],
        services: vec![
            Service {
                id: "oof_self_miso",
                label: "Self-managed misoprostol",
                tier: SafetyTier::LessSafe,
                combos: vec![ResourceCombo {
                    items: vec![items::MISOPROSTOL, items::SELF_CARE_GUIDANCE],
                }],
                complication_rates: [0.0; COMPLICATION_COUNT],
            },
            Service {
                id: "oof_traditional",
                label: "Traditional provider methods",
                tier: SafetyTier::LeastSafe,
                combos: vec![ResourceCombo {
                    items: vec![items::TRADITIONAL_PROVIDER],
                }],
                complication_rates: [0.0; COMPLICATION_COUNT],
            },
        ],
    };
    let catalog = ServiceCatalog::new(
        standard.setting(CareSetting::Facility).clone(),
        out_of_facility,
        standard.complications().to_vec(),
    )
    .expect("two-service catalog validates");
    let engine = ScenarioEngine::new(catalog, EnginePolicy::default()).expect("catalog validates");

    let share_at = |hw: f64| -> (f64, f64, f64) {
        let readiness = ReadinessMap::from_pairs(&[
            ("hw", hw),
            ("miso", 0.5),
            ("info", 0.8),
            ("traditional", 0.9),
        ]);
        let params =
            full_access_parameters(uniform_readiness(items::FACILITY, 1.0), readiness, 0.0);
        let results = engine.run(&params).expect("runs");
        let receipt = &results.out_of_facility_receipt;
        (
            receipt.services[0].p,
            receipt.services[1].p,
            receipt.no_abortion.p,
        )
    };

    // Full staffing is the pure priority walk.
    let (ideal_self, ideal_traditional, _) = share_at(1.0);
    assert_eq!(ideal_self, 0.5);
    assert!((ideal_traditional - 0.4).abs() < 1e-12);

    // No staffing is the pure proportional split of the same total.
    let (naive_self, naive_traditional, _) = share_at(0.0);
    assert!((naive_self - 0.5 * 0.9 / 1.4).abs() < 1e-12);
    assert!((naive_traditional - 0.9 * 0.9 / 1.4).abs() < 1e-12);

    let mut previous_self = ideal_self;
    let mut previous_traditional = ideal_traditional;
    for hw in [0.75, 0.5, 0.25] {
        let (self_share, traditional_share, no_abortion) = share_at(hw);
        assert!(self_share < previous_self && self_share > naive_self);
        assert!(traditional_share > previous_traditional && traditional_share < naive_traditional);
        assert!((self_share + traditional_share + no_abortion - 1.0).abs() < 1e-9);
        previous_self = self_share;
        previous_traditional = traditional_share;
    }
}

#[test]
fn depleted_combos_receive_nothing() {
    let params = full_access_parameters(
        uniform_readiness(items::FACILITY, 0.0),
        uniform_readiness(items::OUT_OF_FACILITY, 1.0),
        1.0,
    );

    let results = ScenarioEngine::standard().run(&params).expect("runs");
    let receipt = &results.facility_receipt;

    assert_eq!(receipt.mixture, 1.0);
    assert!(receipt.services.iter().all(|share| share.p == 0.0));
    assert_eq!(receipt.no_abortion.p, 1.0);
    assert_eq!(receipt.no_abortion.n, receipt.n_arriving);
}
